use axum::{routing::post, Router};

use crate::handlers::session::run_command;
use crate::state::AppState;
use crate::store::CommissionStore;

pub fn routes<S: CommissionStore>() -> Router<AppState<S>> {
    Router::new().route("/session/commands", post(run_command::<S>))
}
