use axum::extract::State;
use axum::{Extension, Json};
use tracing::instrument;

use crate::dtos::commission::{CommandRequest, CommandResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::session::dispatch;
use crate::state::AppState;
use crate::store::CommissionStore;

// POST /session/commands - Apply one command to the caller's context
#[instrument(skip(state, auth, req), fields(user = %auth.username))]
pub async fn run_command<S: CommissionStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, AppError> {
    let (context, outcome) =
        dispatch(state.store.as_ref(), req.context, req.command, &auth.username).await?;
    Ok(Json(CommandResponse { context, outcome }))
}
