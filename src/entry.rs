//! Form submission: validate against the cascade, then upsert.

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::cascade::Cascade;
use crate::models::commission::{CommissionEntry, CommissionRecord};
use crate::store::{CommissionStore, StoreError};
use crate::validation::{validate_all, ValidationError};

#[derive(Debug, Error)]
pub enum EntryError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validate every entry, then upsert them one by one. Nothing is written if
/// any entry is rejected.
pub async fn save_entries<S: CommissionStore>(
    store: &S,
    entries: Vec<CommissionEntry>,
    actor: &str,
) -> Result<Vec<CommissionRecord>, EntryError> {
    let cascade = Cascade::from_keys(store.known_keys().await?);
    let records = validate_all(entries, &cascade, actor, Utc::now())?;

    for record in &records {
        store.upsert(record).await?;
    }
    info!(saved = records.len(), actor, "Saved commission entries");
    Ok(records)
}
