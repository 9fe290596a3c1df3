use axum::extract::{Query, State};
use axum::{Extension, Json};
use tracing::{info, instrument};

use crate::dtos::commission::{
    BatchEntryRequest, DeleteCommissionsRequest, DeletedResponse, ListCommissionsQuery,
    SetActiveRequest, UpdatedResponse,
};
use crate::entry::save_entries;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::commission::{sort_records, CommissionEntry, CommissionRecord};
use crate::state::AppState;
use crate::store::CommissionStore;

// GET /commissions - Filtered, sorted commission table
#[instrument(skip(state))]
pub async fn list_commissions<S: CommissionStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListCommissionsQuery>,
) -> Result<Json<Vec<CommissionRecord>>, AppError> {
    let (filter, sort) = params.into_parts();
    let mut records = state.store.fetch_all(&filter).await?;
    sort_records(&mut records, sort);
    Ok(Json(records))
}

// PUT /commissions - Validate and upsert one entry
#[instrument(skip(state, auth, entry), fields(user = %auth.username))]
pub async fn upsert_commission<S: CommissionStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Json(entry): Json<CommissionEntry>,
) -> Result<Json<CommissionRecord>, AppError> {
    let mut saved = save_entries(state.store.as_ref(), vec![entry], &auth.username).await?;
    saved
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::internal("Entry was not saved"))
}

// POST /commissions/batch - One record per product
#[instrument(skip(state, auth, req), fields(user = %auth.username))]
pub async fn create_batch<S: CommissionStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<BatchEntryRequest>,
) -> Result<Json<Vec<CommissionRecord>>, AppError> {
    let saved = save_entries(state.store.as_ref(), req.into_entries(), &auth.username).await?;
    Ok(Json(saved))
}

// POST /commissions/active - Approve or deactivate rows by key
#[instrument(skip(state, auth, req), fields(user = %auth.username, keys = req.keys.len()))]
pub async fn set_active<S: CommissionStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<UpdatedResponse>, AppError> {
    let updated = state
        .store
        .bulk_set_active(&req.keys, req.active, &auth.username)
        .await?;
    info!(updated, active = req.active, "Updated commission status");
    Ok(Json(UpdatedResponse { updated }))
}

// POST /commissions/delete - Delete rows by key
#[instrument(skip(state, auth, req), fields(user = %auth.username, keys = req.keys.len()))]
pub async fn delete_commissions<S: CommissionStore>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<DeleteCommissionsRequest>,
) -> Result<Json<DeletedResponse>, AppError> {
    let deleted = state.store.delete(&req.keys).await?;
    info!(deleted, "Deleted commissions");
    Ok(Json(DeletedResponse { deleted }))
}
