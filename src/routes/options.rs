use axum::{routing::get, Router};

use crate::handlers::options::{list_companies, list_products, list_programs};
use crate::state::AppState;
use crate::store::CommissionStore;

pub fn routes<S: CommissionStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/options/companies", get(list_companies::<S>))
        .route("/options/programs", get(list_programs::<S>))
        .route("/options/products", get(list_products::<S>))
}
