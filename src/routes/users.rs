use axum::{routing::get, Router};

use crate::handlers::user::get_me;
use crate::state::AppState;
use crate::store::CommissionStore;

pub fn routes<S: CommissionStore>() -> Router<AppState<S>> {
    Router::new().route("/me", get(get_me))
}
