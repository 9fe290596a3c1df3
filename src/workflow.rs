//! Bulk approval over rows picked from the filtered table.
//!
//! A selection remembers the filter it was made under. Changing the filter
//! drops it, so a bulk transition only ever reaches rows the user could see
//! when they ticked them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::commission::{CommissionFilter, CommissionRecord, NaturalKey};
use crate::store::{CommissionStore, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BulkSelection {
    #[default]
    Idle,
    Selected {
        filter: CommissionFilter,
        keys: BTreeSet<NaturalKey>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Approve,
    Deactivate,
}

impl BulkAction {
    pub fn target_active(self) -> bool {
        matches!(self, BulkAction::Approve)
    }
}

impl BulkSelection {
    /// Select `keys` out of the rows `visible` under `filter`. Keys that are not
    /// visible are dropped; an empty result leaves the workflow idle.
    pub fn select<I>(filter: &CommissionFilter, visible: &[CommissionRecord], keys: I) -> Self
    where
        I: IntoIterator<Item = NaturalKey>,
    {
        let visible: BTreeSet<NaturalKey> = visible
            .iter()
            .filter(|record| filter.matches(record))
            .map(CommissionRecord::key)
            .collect();
        let keys: BTreeSet<NaturalKey> = keys
            .into_iter()
            .filter(|key| visible.contains(key))
            .collect();

        if keys.is_empty() {
            BulkSelection::Idle
        } else {
            BulkSelection::Selected {
                filter: filter.clone(),
                keys,
            }
        }
    }

    pub fn clear(&mut self) {
        *self = BulkSelection::Idle;
    }

    /// Reset unless the selection was made under exactly `filter`.
    pub fn on_filter_change(&mut self, filter: &CommissionFilter) {
        if let BulkSelection::Selected { filter: selected_under, .. } = self {
            if selected_under != filter {
                self.clear();
            }
        }
    }

    pub fn keys(&self) -> Vec<NaturalKey> {
        match self {
            BulkSelection::Idle => Vec::new(),
            BulkSelection::Selected { keys, .. } => keys.iter().cloned().collect(),
        }
    }

    /// Apply `action` to every selected row and return to idle. Idle applies
    /// nothing and makes no store call. On failure the selection is kept.
    pub async fn apply<S: CommissionStore>(
        &mut self,
        action: BulkAction,
        store: &S,
        actor: &str,
    ) -> Result<u64, StoreError> {
        let keys = self.keys();
        if keys.is_empty() {
            return Ok(0);
        }

        let updated = store
            .bulk_set_active(&keys, action.target_active(), actor)
            .await?;
        info!(?action, selected = keys.len(), updated, "Applied bulk transition");
        self.clear();
        Ok(updated)
    }
}
