use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;

use super::{CommissionStore, StoreError};
use crate::models::commission::{CommissionFilter, CommissionRecord, NaturalKey};

/// In-process store with the same semantics as the Postgres backend.
#[derive(Default)]
pub struct MemoryCommissionStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    mappings: BTreeSet<NaturalKey>,
    records: Vec<CommissionRecord>,
}

impl MemoryCommissionStore {
    pub fn with_mappings<I>(mappings: I) -> Self
    where
        I: IntoIterator<Item = NaturalKey>,
    {
        Self {
            inner: Mutex::new(Inner {
                mappings: mappings.into_iter().collect(),
                records: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl CommissionStore for MemoryCommissionStore {
    async fn known_keys(&self) -> Result<Vec<NaturalKey>, StoreError> {
        let inner = self.lock()?;
        let mut keys = inner.mappings.clone();
        keys.extend(inner.records.iter().map(CommissionRecord::key));
        Ok(keys.into_iter().collect())
    }

    async fn fetch_all(&self, filter: &CommissionFilter) -> Result<Vec<CommissionRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    async fn upsert(&self, record: &CommissionRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let key = record.key();
        let mut updated = 0;
        for existing in inner.records.iter_mut().filter(|r| r.has_key(&key)) {
            existing.commission_amount = record.commission_amount;
            existing.is_active = record.is_active;
            existing.updated_last = record.updated_last;
            existing.username = record.username.clone();
            updated += 1;
        }
        if updated == 0 {
            inner.records.push(record.clone());
        }
        debug!(updated, "Upserted commission");
        Ok(())
    }

    async fn bulk_set_active(
        &self,
        keys: &[NaturalKey],
        active: bool,
        actor: &str,
    ) -> Result<u64, StoreError> {
        let keys: BTreeSet<&NaturalKey> = keys.iter().collect();
        let now = Utc::now();
        let mut inner = self.lock()?;
        let mut updated = 0;
        for record in inner.records.iter_mut() {
            if keys.contains(&record.key()) {
                record.is_active = active;
                record.updated_last = now;
                record.username = actor.to_string();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, keys: &[NaturalKey]) -> Result<u64, StoreError> {
        let keys: BTreeSet<&NaturalKey> = keys.iter().collect();
        let mut inner = self.lock()?;
        let before = inner.records.len();
        inner.records.retain(|record| !keys.contains(&record.key()));
        Ok((before - inner.records.len()) as u64)
    }
}
