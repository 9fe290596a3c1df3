pub mod commissions;
pub mod options;
pub mod session;
pub mod users;

use axum::{middleware, Router};

use crate::middleware::auth::require_auth;
use crate::state::AppState;
use crate::store::CommissionStore;

/// Every route here requires a bearer token.
pub fn create_router<S: CommissionStore>(state: AppState<S>) -> Router {
    Router::new()
        .merge(options::routes::<S>())
        .merge(commissions::routes::<S>())
        .merge(session::routes::<S>())
        .merge(users::routes::<S>())
        .route_layer(middleware::from_fn_with_state(
            state.jwt_secret.clone(),
            require_auth,
        ))
        .with_state(state)
}
