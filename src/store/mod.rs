//! Data access for the commissions table.
//!
//! Handlers and the session layer depend on [`CommissionStore`], not on a
//! concrete backend. Every method is one logical round trip; failures surface
//! as [`StoreError::Unavailable`] when the store cannot be reached and as
//! [`StoreError::Rejected`] when it refuses the statement. Neither is retried here.

mod memory;
mod postgres;

use std::future::Future;

use thiserror::Error;

use crate::models::commission::{CommissionFilter, CommissionRecord, NaturalKey};

pub use memory::MemoryCommissionStore;
pub use postgres::PgCommissionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached: connection, pool or IO failure.
    #[error("commission store unavailable: {0}")]
    Unavailable(String),
    /// The store was reached but refused or failed the statement.
    #[error("commission store rejected the request: {0}")]
    Rejected(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            other => StoreError::Rejected(other.to_string()),
        }
    }
}

pub trait CommissionStore: Send + Sync + 'static {
    /// Distinct natural keys the entry form may offer: the mapping table plus
    /// every key already present in the commissions table.
    fn known_keys(&self) -> impl Future<Output = Result<Vec<NaturalKey>, StoreError>> + Send;

    /// Rows matching `filter`, in whatever order the store returns them.
    fn fetch_all(
        &self,
        filter: &CommissionFilter,
    ) -> impl Future<Output = Result<Vec<CommissionRecord>, StoreError>> + Send;

    /// Overwrite the mutable fields of every row with the record's key, or
    /// insert it if none exists. Last write wins.
    fn upsert(
        &self,
        record: &CommissionRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Set `is_active` and restamp every row whose key is listed. Unknown keys
    /// are ignored. Returns the number of rows updated.
    fn bulk_set_active(
        &self,
        keys: &[NaturalKey],
        active: bool,
        actor: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Remove every row whose key is listed. Unknown keys are ignored.
    fn delete(&self, keys: &[NaturalKey]) -> impl Future<Output = Result<u64, StoreError>> + Send;
}
