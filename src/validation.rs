use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::cascade::Cascade;
use crate::models::commission::{CommissionEntry, CommissionRecord, NaturalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CompanyName,
    ProgramCode,
    ProductCode,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::CompanyName => "company_name",
            Field::ProgramCode => "program_code",
            Field::ProductCode => "product_code",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(Field),
    #[error("commission amount must be a number greater than or equal to 0")]
    InvalidAmount,
    #[error("company, program and product do not form a known combination")]
    InconsistentSelection,
}

/// Check an entry and stamp it for persistence. The first failing rule wins:
/// required identifiers, then the amount, then cascade consistency.
pub fn validate(
    entry: CommissionEntry,
    cascade: &Cascade,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<CommissionRecord, ValidationError> {
    let company_name = required(&entry.company_name, Field::CompanyName)?;
    let program_code = required(&entry.program_code, Field::ProgramCode)?;
    let product_code = required(&entry.product_code, Field::ProductCode)?;

    if !entry.commission_amount.is_finite() || entry.commission_amount < 0.0 {
        return Err(ValidationError::InvalidAmount);
    }

    let key = NaturalKey::new(company_name, program_code, product_code);
    if !cascade.contains(&key) {
        return Err(ValidationError::InconsistentSelection);
    }

    Ok(CommissionRecord {
        company_name: key.company_name,
        program_code: key.program_code,
        product_code: key.product_code,
        commission_amount: entry.commission_amount,
        is_active: entry.is_active,
        updated_last: now,
        username: actor.to_string(),
    })
}

/// Validate every entry; nothing is returned unless all of them pass.
pub fn validate_all(
    entries: Vec<CommissionEntry>,
    cascade: &Cascade,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<Vec<CommissionRecord>, ValidationError> {
    entries
        .into_iter()
        .map(|entry| validate(entry, cascade, actor, now))
        .collect()
}

fn required(value: &str, field: Field) -> Result<&str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cascade() -> Cascade {
        Cascade::from_keys([
            NaturalKey::new("Acme", "P1", "X"),
            NaturalKey::new("Acme", "P1", "Y"),
            NaturalKey::new("Globex", "P2", "Z"),
        ])
    }

    fn entry(company: &str, program: &str, product: &str, amount: f64) -> CommissionEntry {
        CommissionEntry {
            company_name: company.to_string(),
            program_code: program.to_string(),
            product_code: product.to_string(),
            commission_amount: amount,
            is_active: true,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn accepts_and_stamps_well_formed_entry() {
        let record = validate(entry(" Acme ", "P1", "X", 12.5), &cascade(), "alice", now()).unwrap();
        assert_eq!(record.company_name, "Acme");
        assert_eq!(record.commission_amount, 12.5);
        assert_eq!(record.username, "alice");
        assert_eq!(record.updated_last, now());
        assert!(record.is_active);
    }

    #[test]
    fn zero_amount_is_allowed() {
        assert!(validate(entry("Acme", "P1", "Y", 0.0), &cascade(), "alice", now()).is_ok());
    }

    #[test]
    fn rejects_missing_identifiers_in_field_order() {
        let c = cascade();
        assert_eq!(
            validate(entry("", "", "", -1.0), &c, "alice", now()),
            Err(ValidationError::MissingField(Field::CompanyName))
        );
        assert_eq!(
            validate(entry("Acme", "  ", "X", 1.0), &c, "alice", now()),
            Err(ValidationError::MissingField(Field::ProgramCode))
        );
        assert_eq!(
            validate(entry("Acme", "P1", "", 1.0), &c, "alice", now()),
            Err(ValidationError::MissingField(Field::ProductCode))
        );
    }

    #[test]
    fn rejects_negative_and_non_finite_amounts() {
        let c = cascade();
        for amount in [-0.01, f64::NAN, f64::INFINITY] {
            assert_eq!(
                validate(entry("Acme", "P1", "X", amount), &c, "alice", now()),
                Err(ValidationError::InvalidAmount)
            );
        }
    }

    #[test]
    fn amount_is_checked_before_consistency() {
        assert_eq!(
            validate(entry("Nope", "P1", "X", -5.0), &cascade(), "alice", now()),
            Err(ValidationError::InvalidAmount)
        );
    }

    #[test]
    fn rejects_combinations_outside_the_cascade() {
        let c = cascade();
        for (company, program, product) in [("Acme", "P2", "Z"), ("Globex", "P1", "X"), ("Acme", "P1", "Z")] {
            assert_eq!(
                validate(entry(company, program, product, 1.0), &c, "alice", now()),
                Err(ValidationError::InconsistentSelection)
            );
        }
    }

    #[test]
    fn validate_all_fails_on_any_bad_entry() {
        let entries = vec![entry("Acme", "P1", "X", 1.0), entry("Acme", "P1", "", 1.0)];
        assert_eq!(
            validate_all(entries, &cascade(), "alice", now()),
            Err(ValidationError::MissingField(Field::ProductCode))
        );
    }
}
