use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::commission;
use crate::state::AppState;
use crate::store::CommissionStore;

pub fn routes<S: CommissionStore>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/commissions",
            get(commission::list_commissions::<S>).put(commission::upsert_commission::<S>),
        )
        .route("/commissions/batch", post(commission::create_batch::<S>))
        .route("/commissions/active", post(commission::set_active::<S>))
        .route("/commissions/delete", post(commission::delete_commissions::<S>))
}
