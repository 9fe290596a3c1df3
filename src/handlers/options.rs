use axum::extract::{Query, State};
use axum::Json;
use tracing::instrument;

use crate::cascade::Cascade;
use crate::dtos::commission::{ProductsQuery, ProgramsQuery};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::CommissionStore;

async fn load_cascade<S: CommissionStore>(store: &S) -> Result<Cascade, AppError> {
    Ok(Cascade::from_keys(store.known_keys().await?))
}

// GET /options/companies
#[instrument(skip(state))]
pub async fn list_companies<S: CommissionStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<String>>, AppError> {
    let cascade = load_cascade(state.store.as_ref()).await?;
    Ok(Json(cascade.companies()))
}

// GET /options/programs?company=
#[instrument(skip(state))]
pub async fn list_programs<S: CommissionStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<ProgramsQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let cascade = load_cascade(state.store.as_ref()).await?;
    Ok(Json(cascade.programs_for(params.company.as_deref())))
}

// GET /options/products?company=&program=
#[instrument(skip(state))]
pub async fn list_products<S: CommissionStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<ProductsQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let cascade = load_cascade(state.store.as_ref()).await?;
    Ok(Json(cascade.products_for(
        params.company.as_deref(),
        params.program.as_deref(),
    )))
}
