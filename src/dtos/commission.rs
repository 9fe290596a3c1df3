use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::commission::{CommissionEntry, CommissionFilter, NaturalKey, SortColumn};
use crate::session::{Command, InteractionContext, Outcome};

// Request DTOs

#[derive(Debug, Default, Deserialize)]
pub struct ListCommissionsQuery {
    pub company: Option<String>,
    pub program: Option<String>,
    pub product: Option<String>,
    pub active: Option<bool>,
    pub updated_from: Option<DateTime<Utc>>,
    pub updated_to: Option<DateTime<Utc>>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub username: Option<String>,
    pub sort: Option<SortColumn>,
}

impl ListCommissionsQuery {
    pub fn into_parts(self) -> (CommissionFilter, SortColumn) {
        let filter = CommissionFilter {
            company: self.company,
            program: self.program,
            product: self.product,
            active: self.active,
            updated_from: self.updated_from,
            updated_to: self.updated_to,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            username: self.username,
        };
        (filter, self.sort.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
pub struct ProgramsQuery {
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub company: Option<String>,
    pub program: Option<String>,
}

/// One amount applied to several products of the same company and program.
#[derive(Debug, Deserialize)]
pub struct BatchEntryRequest {
    pub company_name: String,
    pub program_code: String,
    pub product_codes: Vec<String>,
    pub commission_amount: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl BatchEntryRequest {
    /// With no products a single blank-product entry is produced so that
    /// validation reports the product as missing.
    pub fn into_entries(self) -> Vec<CommissionEntry> {
        let products = if self.product_codes.is_empty() {
            vec![String::new()]
        } else {
            self.product_codes
        };
        products
            .into_iter()
            .map(|product_code| CommissionEntry {
                company_name: self.company_name.clone(),
                program_code: self.program_code.clone(),
                product_code,
                commission_amount: self.commission_amount,
                is_active: self.is_active,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub keys: Vec<NaturalKey>,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCommissionsRequest {
    pub keys: Vec<NaturalKey>,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub context: InteractionContext,
    pub command: Command,
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub context: InteractionContext,
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
}
