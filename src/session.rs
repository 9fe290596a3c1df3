//! Explicit interaction context and command dispatch.
//!
//! The client holds an [`InteractionContext`] and sends it back with every
//! [`Command`]. Each command runs to completion and returns the updated
//! context with an [`Outcome`]; the server keeps no per-user state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cascade::{Cascade, FormOptions, Selection};
use crate::entry::{save_entries, EntryError};
use crate::models::commission::{CommissionEntry, CommissionFilter, CommissionRecord, NaturalKey};
use crate::store::{CommissionStore, StoreError};
use crate::validation::{Field, ValidationError};
use crate::workflow::{BulkAction, BulkSelection};

/// The four-step entry form: company, program, products, amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryForm {
    pub selection: Selection,
    pub amount: f64,
    pub active: bool,
}

impl Default for EntryForm {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            amount: 0.0,
            active: true,
        }
    }
}

impl EntryForm {
    /// One entry per selected product. With no product selected a single entry
    /// with a blank product is produced so validation reports it as missing.
    pub fn entries(&self) -> Vec<CommissionEntry> {
        let company = self.selection.company.clone().unwrap_or_default();
        let program = self.selection.program.clone().unwrap_or_default();
        let entry = |product: &str| CommissionEntry {
            company_name: company.clone(),
            program_code: program.clone(),
            product_code: product.to_string(),
            commission_amount: self.amount,
            is_active: self.active,
        };

        if self.selection.products.is_empty() {
            vec![entry("")]
        } else {
            self.selection.products.iter().map(|p| entry(p.as_str())).collect()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionContext {
    pub form: EntryForm,
    pub filter: CommissionFilter,
    pub bulk: BulkSelection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    SelectCompany {
        company: Option<String>,
    },
    SelectProgram {
        program: Option<String>,
    },
    SelectProducts {
        products: Vec<String>,
    },
    SetAmount {
        amount: f64,
    },
    SetActive {
        active: bool,
    },
    Submit,
    ResetForm,
    SetFilter {
        filter: CommissionFilter,
    },
    SelectRows {
        keys: Vec<NaturalKey>,
    },
    ClearRows,
    Approve,
    Deactivate,
    /// Edited table rows to save and removed rows to delete.
    ApplyEdits {
        #[serde(default)]
        updates: Vec<CommissionEntry>,
        #[serde(default)]
        deletions: Vec<NaturalKey>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Options { options: FormOptions },
    Saved { records: Vec<CommissionRecord> },
    Rejected { error: String, field: Option<Field> },
    Selected { count: usize },
    Updated { count: u64 },
    Edited { updated: usize, deleted: u64 },
    Done,
}

impl From<ValidationError> for Outcome {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::MissingField(field) => Some(*field),
            _ => None,
        };
        Outcome::Rejected {
            error: err.to_string(),
            field,
        }
    }
}

async fn load_cascade<S: CommissionStore>(store: &S) -> Result<Cascade, StoreError> {
    Ok(Cascade::from_keys(store.known_keys().await?))
}

async fn apply_bulk<S: CommissionStore>(
    store: &S,
    ctx: &mut InteractionContext,
    action: BulkAction,
    actor: &str,
) -> Result<Outcome, StoreError> {
    // A selection made under another filter than the current one is stale.
    ctx.bulk.on_filter_change(&ctx.filter);
    // The context comes back from the client; re-check the keys against the
    // rows the current filter actually shows.
    if !ctx.bulk.keys().is_empty() {
        let visible = store.fetch_all(&ctx.filter).await?;
        ctx.bulk = BulkSelection::select(&ctx.filter, &visible, ctx.bulk.keys());
    }
    let count = ctx.bulk.apply(action, store, actor).await?;
    Ok(Outcome::Updated { count })
}

/// Run one command. Validation failures come back as [`Outcome::Rejected`]
/// with the context untouched; only store failures are errors.
pub async fn dispatch<S: CommissionStore>(
    store: &S,
    mut ctx: InteractionContext,
    command: Command,
    actor: &str,
) -> Result<(InteractionContext, Outcome), StoreError> {
    debug!(?command, "Dispatching command");

    let outcome = match command {
        Command::SelectCompany { company } => {
            let cascade = load_cascade(store).await?;
            ctx.form.selection = cascade.select_company(ctx.form.selection, company);
            Outcome::Options {
                options: cascade.options(&ctx.form.selection),
            }
        }
        Command::SelectProgram { program } => {
            let cascade = load_cascade(store).await?;
            ctx.form.selection = cascade.select_program(ctx.form.selection, program);
            Outcome::Options {
                options: cascade.options(&ctx.form.selection),
            }
        }
        Command::SelectProducts { products } => {
            let cascade = load_cascade(store).await?;
            ctx.form.selection = cascade.select_products(ctx.form.selection, products);
            Outcome::Options {
                options: cascade.options(&ctx.form.selection),
            }
        }
        Command::SetAmount { amount } => {
            ctx.form.amount = amount;
            Outcome::Done
        }
        Command::SetActive { active } => {
            ctx.form.active = active;
            Outcome::Done
        }
        Command::Submit => match save_entries(store, ctx.form.entries(), actor).await {
            Ok(records) => {
                ctx.form = EntryForm::default();
                Outcome::Saved { records }
            }
            Err(EntryError::Invalid(err)) => err.into(),
            Err(EntryError::Store(err)) => return Err(err),
        },
        Command::ResetForm => {
            ctx.form = EntryForm::default();
            Outcome::Done
        }
        Command::SetFilter { filter } => {
            ctx.bulk.on_filter_change(&filter);
            ctx.filter = filter;
            Outcome::Done
        }
        Command::SelectRows { keys } => {
            let visible = store.fetch_all(&ctx.filter).await?;
            ctx.bulk = BulkSelection::select(&ctx.filter, &visible, keys);
            Outcome::Selected {
                count: ctx.bulk.keys().len(),
            }
        }
        Command::ClearRows => {
            ctx.bulk.clear();
            Outcome::Done
        }
        Command::Approve => apply_bulk(store, &mut ctx, BulkAction::Approve, actor).await?,
        Command::Deactivate => apply_bulk(store, &mut ctx, BulkAction::Deactivate, actor).await?,
        Command::ApplyEdits { updates, deletions } => {
            let updated = if updates.is_empty() {
                0
            } else {
                match save_entries(store, updates, actor).await {
                    Ok(records) => records.len(),
                    Err(EntryError::Invalid(err)) => return Ok((ctx, err.into())),
                    Err(EntryError::Store(err)) => return Err(err),
                }
            };
            let deleted = store.delete(&deletions).await?;
            Outcome::Edited { updated, deleted }
        }
    };

    Ok((ctx, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCommissionStore;

    fn store() -> MemoryCommissionStore {
        MemoryCommissionStore::with_mappings([
            NaturalKey::new("A", "P1", "X"),
            NaturalKey::new("A", "P1", "Y"),
            NaturalKey::new("B", "P2", "Z"),
        ])
    }

    async fn run(
        store: &MemoryCommissionStore,
        ctx: InteractionContext,
        command: Command,
    ) -> (InteractionContext, Outcome) {
        dispatch(store, ctx, command, "alice").await.unwrap()
    }

    async fn fill_form(store: &MemoryCommissionStore, products: &[&str], amount: f64) -> InteractionContext {
        let ctx = InteractionContext::default();
        let (ctx, _) = run(store, ctx, Command::SelectCompany { company: Some("A".into()) }).await;
        let (ctx, _) = run(store, ctx, Command::SelectProgram { program: Some("P1".into()) }).await;
        let (ctx, _) = run(
            store,
            ctx,
            Command::SelectProducts {
                products: products.iter().map(|p| p.to_string()).collect(),
            },
        )
        .await;
        let (ctx, _) = run(store, ctx, Command::SetAmount { amount }).await;
        ctx
    }

    #[tokio::test]
    async fn cascade_commands_return_scoped_options() {
        let store = store();
        let (ctx, outcome) = run(
            &store,
            InteractionContext::default(),
            Command::SelectCompany { company: Some("A".into()) },
        )
        .await;
        assert_eq!(
            outcome,
            Outcome::Options {
                options: FormOptions {
                    companies: vec!["A".into(), "B".into()],
                    programs: vec!["P1".into()],
                    products: vec![],
                }
            }
        );

        let (ctx, _) = run(&store, ctx, Command::SelectProgram { program: Some("P1".into()) }).await;
        let (ctx, _) = run(&store, ctx, Command::SelectCompany { company: Some("B".into()) }).await;
        assert_eq!(ctx.form.selection.program, None);
    }

    #[tokio::test]
    async fn submit_saves_one_record_per_product_and_resets_form() {
        let store = store();
        let ctx = fill_form(&store, &["X", "Y"], 2.5).await;

        let (ctx, outcome) = run(&store, ctx, Command::Submit).await;
        match outcome {
            Outcome::Saved { records } => assert_eq!(records.len(), 2),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(ctx.form, EntryForm::default());
    }

    #[tokio::test]
    async fn submit_without_products_is_rejected_and_keeps_form() {
        let store = store();
        let ctx = fill_form(&store, &[], 2.5).await;

        let (after, outcome) = run(&store, ctx.clone(), Command::Submit).await;
        assert_eq!(
            outcome,
            Outcome::Rejected {
                error: "product_code is required".into(),
                field: Some(Field::ProductCode),
            }
        );
        assert_eq!(after, ctx);
    }

    #[tokio::test]
    async fn negative_amount_is_rejected() {
        let store = store();
        let ctx = fill_form(&store, &["X"], -1.0).await;
        let (_, outcome) = run(&store, ctx, Command::Submit).await;
        assert!(matches!(outcome, Outcome::Rejected { field: None, .. }));
    }

    #[tokio::test]
    async fn filter_change_invalidates_row_selection() {
        let store = store();
        let ctx = fill_form(&store, &["X", "Y"], 1.0).await;
        let (ctx, _) = run(&store, ctx, Command::SetActive { active: false }).await;
        let (ctx, _) = run(&store, ctx, Command::Submit).await;

        let (ctx, outcome) = run(
            &store,
            ctx,
            Command::SelectRows {
                keys: vec![NaturalKey::new("A", "P1", "X")],
            },
        )
        .await;
        assert_eq!(outcome, Outcome::Selected { count: 1 });

        let (ctx, _) = run(
            &store,
            ctx,
            Command::SetFilter {
                filter: CommissionFilter {
                    product: Some("Y".into()),
                    ..Default::default()
                },
            },
        )
        .await;
        let (ctx, outcome) = run(&store, ctx, Command::Approve).await;
        assert_eq!(outcome, Outcome::Updated { count: 0 });
        assert_eq!(ctx.bulk, BulkSelection::Idle);

        let rows = store.fetch_all(&CommissionFilter::default()).await.unwrap();
        assert!(rows.iter().all(|r| !r.is_active));
    }

    #[tokio::test]
    async fn approve_then_deactivate_selected_rows() {
        let store = store();
        let ctx = fill_form(&store, &["X", "Y"], 1.0).await;
        let (ctx, _) = run(&store, ctx, Command::SetActive { active: false }).await;
        let (ctx, _) = run(&store, ctx, Command::Submit).await;

        let keys = vec![NaturalKey::new("A", "P1", "X"), NaturalKey::new("A", "P1", "Y")];
        let (ctx, _) = run(&store, ctx, Command::SelectRows { keys: keys.clone() }).await;
        let (ctx, outcome) = run(&store, ctx, Command::Approve).await;
        assert_eq!(outcome, Outcome::Updated { count: 2 });

        let (ctx, _) = run(&store, ctx, Command::SelectRows { keys }).await;
        let (_, outcome) = run(&store, ctx, Command::Deactivate).await;
        assert_eq!(outcome, Outcome::Updated { count: 2 });
        let rows = store.fetch_all(&CommissionFilter::default()).await.unwrap();
        assert!(rows.iter().all(|r| !r.is_active));
    }

    #[tokio::test]
    async fn apply_edits_updates_and_deletes() {
        let store = store();
        let ctx = fill_form(&store, &["X", "Y"], 1.0).await;
        let (ctx, _) = run(&store, ctx, Command::Submit).await;

        let (_, outcome) = run(
            &store,
            ctx,
            Command::ApplyEdits {
                updates: vec![CommissionEntry {
                    company_name: "A".into(),
                    program_code: "P1".into(),
                    product_code: "X".into(),
                    commission_amount: 7.0,
                    is_active: false,
                }],
                deletions: vec![NaturalKey::new("A", "P1", "Y")],
            },
        )
        .await;
        assert_eq!(outcome, Outcome::Edited { updated: 1, deleted: 1 });

        let rows = store.fetch_all(&CommissionFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commission_amount, 7.0);
        assert!(!rows[0].is_active);
    }

    #[test]
    fn context_round_trips_through_json() {
        let json = r#"{"type":"select_rows","keys":[{"company_name":"A","program_code":"P1","product_code":"X"}]}"#;
        let command: Command = serde_json::from_str(json).unwrap();
        assert_eq!(
            command,
            Command::SelectRows {
                keys: vec![NaturalKey::new("A", "P1", "X")]
            }
        );

        let ctx: InteractionContext = serde_json::from_str("{}").unwrap();
        assert_eq!(ctx, InteractionContext::default());
        assert!(ctx.form.active);
    }

    #[tokio::test]
    async fn clear_rows_returns_selection_to_idle() {
        let store = store();
        let ctx = fill_form(&store, &["X"], 1.0).await;
        let (ctx, _) = run(&store, ctx, Command::SetActive { active: false }).await;
        let (ctx, _) = run(&store, ctx, Command::Submit).await;

        let (ctx, outcome) = run(
            &store,
            ctx,
            Command::SelectRows {
                keys: vec![NaturalKey::new("A", "P1", "X")],
            },
        )
        .await;
        assert_eq!(outcome, Outcome::Selected { count: 1 });
        assert_ne!(ctx.bulk, BulkSelection::Idle);

        let (ctx, outcome) = run(&store, ctx, Command::ClearRows).await;
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(ctx.bulk, BulkSelection::Idle);

        let (_, outcome) = run(&store, ctx, Command::Approve).await;
        assert_eq!(outcome, Outcome::Updated { count: 0 });
        let rows = store.fetch_all(&CommissionFilter::default()).await.unwrap();
        assert!(!rows[0].is_active);
    }

    #[tokio::test]
    async fn approve_skips_keys_the_current_filter_hides() {
        let store = store();
        let ctx = fill_form(&store, &["X", "Y"], 1.0).await;
        let (ctx, _) = run(&store, ctx, Command::SetActive { active: false }).await;
        let (mut ctx, _) = run(&store, ctx, Command::Submit).await;

        // A context claiming Y is selected while the filter only shows X.
        let filter = CommissionFilter {
            product: Some("X".into()),
            ..Default::default()
        };
        ctx.filter = filter.clone();
        ctx.bulk = BulkSelection::Selected {
            filter,
            keys: [NaturalKey::new("A", "P1", "X"), NaturalKey::new("A", "P1", "Y")]
                .into_iter()
                .collect(),
        };

        let (ctx, outcome) = run(&store, ctx, Command::Approve).await;
        assert_eq!(outcome, Outcome::Updated { count: 1 });
        assert_eq!(ctx.bulk, BulkSelection::Idle);

        let rows = store.fetch_all(&CommissionFilter::default()).await.unwrap();
        for row in rows {
            assert_eq!(row.is_active, row.product_code == "X");
        }
    }
}
