use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, instrument};

use super::{CommissionStore, StoreError};
use crate::models::commission::{non_blank, CommissionFilter, CommissionRecord, NaturalKey};

const SELECT_COMMISSIONS: &str = "SELECT company_name, program_code, product_code,
        commission_amount, is_active, updated_last, username
 FROM commissions
 WHERE 1=1";

#[derive(Clone)]
pub struct PgCommissionStore {
    db_pool: PgPool,
}

impl PgCommissionStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

/// Column-wise arrays for `UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[])`.
fn key_columns(keys: &[NaturalKey]) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut companies = Vec::with_capacity(keys.len());
    let mut programs = Vec::with_capacity(keys.len());
    let mut products = Vec::with_capacity(keys.len());
    for key in keys {
        companies.push(key.company_name.clone());
        programs.push(key.program_code.clone());
        products.push(key.product_code.clone());
    }
    (companies, programs, products)
}

fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &CommissionFilter) {
    if let Some(company) = non_blank(&filter.company) {
        query.push(" AND company_name ILIKE ").push_bind(like_pattern(company));
    }
    if let Some(program) = non_blank(&filter.program) {
        query.push(" AND program_code ILIKE ").push_bind(like_pattern(program));
    }
    if let Some(product) = non_blank(&filter.product) {
        query.push(" AND product_code ILIKE ").push_bind(like_pattern(product));
    }
    if let Some(username) = non_blank(&filter.username) {
        query.push(" AND username = ").push_bind(username.to_string());
    }
    if let Some(active) = filter.active {
        query.push(" AND is_active = ").push_bind(active);
    }
    if let Some(from) = filter.updated_from {
        query.push(" AND updated_last >= ").push_bind(from);
    }
    if let Some(to) = filter.updated_to {
        query.push(" AND updated_last <= ").push_bind(to);
    }
    if let Some(min) = filter.min_amount {
        query.push(" AND commission_amount >= ").push_bind(min);
    }
    if let Some(max) = filter.max_amount {
        query.push(" AND commission_amount <= ").push_bind(max);
    }
}

impl CommissionStore for PgCommissionStore {
    #[instrument(skip(self))]
    async fn known_keys(&self) -> Result<Vec<NaturalKey>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            "SELECT company_name, program_code, product_code FROM commission_mappings
             UNION
             SELECT company_name, program_code, product_code FROM commissions",
        )
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| {
            error!(?e, "Failed to fetch commission keys");
            StoreError::from(e)
        })?;

        Ok(rows
            .into_iter()
            .map(|(company, program, product)| NaturalKey::new(company, program, product))
            .collect())
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self, filter: &CommissionFilter) -> Result<Vec<CommissionRecord>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_COMMISSIONS);
        push_filter(&mut query, filter);

        query
            .build_query_as::<CommissionRecord>()
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| {
                error!(?e, "Failed to fetch commissions");
                StoreError::from(e)
            })
    }

    #[instrument(skip(self, record), fields(company = %record.company_name, program = %record.program_code, product = %record.product_code))]
    async fn upsert(&self, record: &CommissionRecord) -> Result<(), StoreError> {
        // One statement against the natural-key constraint, so concurrent
        // writers of a new key cannot both insert.
        sqlx::query(
            "INSERT INTO commissions
             (company_name, program_code, product_code, commission_amount, is_active, updated_last, username)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (company_name, program_code, product_code) DO UPDATE SET
             commission_amount = EXCLUDED.commission_amount,
             is_active = EXCLUDED.is_active,
             updated_last = EXCLUDED.updated_last,
             username = EXCLUDED.username",
        )
        .bind(&record.company_name)
        .bind(&record.program_code)
        .bind(&record.product_code)
        .bind(record.commission_amount)
        .bind(record.is_active)
        .bind(record.updated_last)
        .bind(&record.username)
        .execute(&self.db_pool)
        .await
        .map_err(|e| {
            error!(?e, "Failed to upsert commission");
            StoreError::from(e)
        })?;

        Ok(())
    }

    #[instrument(skip(self, keys), fields(keys = keys.len()))]
    async fn bulk_set_active(
        &self,
        keys: &[NaturalKey],
        active: bool,
        actor: &str,
    ) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let (companies, programs, products) = key_columns(keys);

        let result = sqlx::query(
            "UPDATE commissions c SET
             is_active = $4,
             updated_last = NOW(),
             username = $5
             FROM UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[]) AS k(company_name, program_code, product_code)
             WHERE c.company_name = k.company_name
               AND c.program_code = k.program_code
               AND c.product_code = k.product_code",
        )
        .bind(companies)
        .bind(programs)
        .bind(products)
        .bind(active)
        .bind(actor)
        .execute(&self.db_pool)
        .await
        .map_err(|e| {
            error!(?e, "Failed to update commission status");
            StoreError::from(e)
        })?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, keys), fields(keys = keys.len()))]
    async fn delete(&self, keys: &[NaturalKey]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let (companies, programs, products) = key_columns(keys);

        let result = sqlx::query(
            "DELETE FROM commissions c
             USING UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[]) AS k(company_name, program_code, product_code)
             WHERE c.company_name = k.company_name
               AND c.program_code = k.program_code
               AND c.product_code = k.product_code",
        )
        .bind(companies)
        .bind(programs)
        .bind(products)
        .execute(&self.db_pool)
        .await
        .map_err(|e| {
            error!(?e, "Failed to delete commissions");
            StoreError::from(e)
        })?;

        Ok(result.rows_affected())
    }
}
