use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// (company_name, program_code, product_code) identifying one logical commission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NaturalKey {
    pub company_name: String,
    pub program_code: String,
    pub product_code: String,
}

impl NaturalKey {
    pub fn new(
        company_name: impl Into<String>,
        program_code: impl Into<String>,
        product_code: impl Into<String>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            program_code: program_code.into(),
            product_code: product_code.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CommissionRecord {
    pub company_name: String,
    pub program_code: String,
    pub product_code: String,
    pub commission_amount: f64,
    pub is_active: bool,
    pub updated_last: DateTime<Utc>,
    pub username: String,
}

impl CommissionRecord {
    pub fn key(&self) -> NaturalKey {
        NaturalKey::new(&self.company_name, &self.program_code, &self.product_code)
    }

    pub fn has_key(&self, key: &NaturalKey) -> bool {
        self.company_name == key.company_name
            && self.program_code == key.program_code
            && self.product_code == key.product_code
    }
}

/// A commission as typed into the form, before it is validated and stamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub company_name: String,
    pub program_code: String,
    pub product_code: String,
    pub commission_amount: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Conjunction of optional constraints over the commissions table.
///
/// Company, program and product match case-insensitively on substrings,
/// `username` matches exactly, and both ends of the date and amount ranges
/// are inclusive. Blank strings impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionFilter {
    pub company: Option<String>,
    pub program: Option<String>,
    pub product: Option<String>,
    pub active: Option<bool>,
    pub updated_from: Option<DateTime<Utc>>,
    pub updated_to: Option<DateTime<Utc>>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub username: Option<String>,
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl CommissionFilter {
    pub fn matches(&self, record: &CommissionRecord) -> bool {
        if let Some(company) = non_blank(&self.company) {
            if !contains_ignore_case(&record.company_name, company) {
                return false;
            }
        }
        if let Some(program) = non_blank(&self.program) {
            if !contains_ignore_case(&record.program_code, program) {
                return false;
            }
        }
        if let Some(product) = non_blank(&self.product) {
            if !contains_ignore_case(&record.product_code, product) {
                return false;
            }
        }
        if let Some(username) = non_blank(&self.username) {
            if record.username != username {
                return false;
            }
        }
        if self.active.is_some_and(|active| record.is_active != active) {
            return false;
        }
        if self.updated_from.is_some_and(|from| record.updated_last < from) {
            return false;
        }
        if self.updated_to.is_some_and(|to| record.updated_last > to) {
            return false;
        }
        if self.min_amount.is_some_and(|min| record.commission_amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| record.commission_amount > max) {
            return false;
        }
        true
    }
}

/// Display ordering for the commissions table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    /// Most recently updated first.
    #[default]
    UpdatedLast,
    CompanyName,
    ProgramCode,
    ProductCode,
    IsActive,
}

pub fn sort_records(records: &mut [CommissionRecord], column: SortColumn) {
    records.sort_by(|a, b| match column {
        SortColumn::UpdatedLast => b.updated_last.cmp(&a.updated_last),
        SortColumn::CompanyName => a.company_name.cmp(&b.company_name),
        SortColumn::ProgramCode => a.program_code.cmp(&b.program_code),
        SortColumn::ProductCode => a.product_code.cmp(&b.product_code),
        SortColumn::IsActive => a.is_active.cmp(&b.is_active),
    });
}
