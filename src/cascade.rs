//! Dependent dropdown state: company constrains program constrains product.
//!
//! Option sets are derived from a distinct projection of natural keys. An
//! unknown or unset upstream value never fails; it just yields no choices.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::commission::NaturalKey;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cascade {
    tree: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

/// The company / program / products currently chosen in the entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub company: Option<String>,
    pub program: Option<String>,
    pub products: Vec<String>,
}

/// Option sets presented for a given selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOptions {
    pub companies: Vec<String>,
    pub programs: Vec<String>,
    pub products: Vec<String>,
}

fn unset_if_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Cascade {
    /// Build from natural keys; keys with a blank part are skipped.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = NaturalKey>,
    {
        let mut tree: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
        for key in keys {
            let company = key.company_name.trim();
            let program = key.program_code.trim();
            let product = key.product_code.trim();
            if company.is_empty() || program.is_empty() || product.is_empty() {
                continue;
            }
            tree.entry(company.to_string())
                .or_default()
                .entry(program.to_string())
                .or_default()
                .insert(product.to_string());
        }
        Self { tree }
    }

    pub fn companies(&self) -> Vec<String> {
        self.tree.keys().cloned().collect()
    }

    pub fn programs_for(&self, company: Option<&str>) -> Vec<String> {
        company
            .and_then(|c| self.tree.get(c))
            .map(|programs| programs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn products_for(&self, company: Option<&str>, program: Option<&str>) -> Vec<String> {
        self.products(company, program)
            .map(|products| products.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn products(&self, company: Option<&str>, program: Option<&str>) -> Option<&BTreeSet<String>> {
        self.tree.get(company?)?.get(program?)
    }

    pub fn has_program(&self, company: &str, program: &str) -> bool {
        self.tree
            .get(company)
            .is_some_and(|programs| programs.contains_key(program))
    }

    pub fn contains(&self, key: &NaturalKey) -> bool {
        self.products(Some(&key.company_name), Some(&key.program_code))
            .is_some_and(|products| products.contains(&key.product_code))
    }

    pub fn options(&self, selection: &Selection) -> FormOptions {
        let company = selection.company.as_deref();
        let program = selection.program.as_deref();
        FormOptions {
            companies: self.companies(),
            programs: self.programs_for(company),
            products: self.products_for(company, program),
        }
    }

    /// Drop any downstream choice that is no longer valid under its upstream.
    pub fn reconcile(&self, mut selection: Selection) -> Selection {
        let program_valid = match (&selection.company, &selection.program) {
            (Some(company), Some(program)) => self.has_program(company, program),
            _ => false,
        };
        if !program_valid {
            selection.program = None;
            selection.products.clear();
            return selection;
        }

        let valid = self.products(selection.company.as_deref(), selection.program.as_deref());
        let mut seen = BTreeSet::new();
        selection.products.retain(|product| {
            valid.is_some_and(|v| v.contains(product)) && seen.insert(product.clone())
        });
        selection
    }

    pub fn select_company(&self, selection: Selection, company: Option<String>) -> Selection {
        self.reconcile(Selection {
            company: unset_if_blank(company),
            ..selection
        })
    }

    pub fn select_program(&self, selection: Selection, program: Option<String>) -> Selection {
        self.reconcile(Selection {
            program: unset_if_blank(program),
            ..selection
        })
    }

    pub fn select_products(&self, selection: Selection, products: Vec<String>) -> Selection {
        self.reconcile(Selection {
            products,
            ..selection
        })
    }
}
