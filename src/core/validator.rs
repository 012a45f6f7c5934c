// src/core/validator.rs

use crate::core::expression;
use crate::core::properties::PropertyStore;
use crate::core::selection::SelectionContext;
use crate::core::wildcard;
use serde::{Deserialize, Serialize};

/// Applicability gate for one menu entry.
///
/// A menu entry shows for a selection only when every configured check
/// passes. Validation is a pure test: it never mutates the store and never
/// errors; an expression that fails to evaluate simply fails the gate.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Validator {
    /// Properties that must exist with a non-empty value.
    #[serde(default)]
    pub properties: Vec<String>,
    /// Wildcard patterns; every selected path must match at least one.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Optional formula that must evaluate truthy.
    #[serde(default)]
    pub expression: Option<String>,
}

impl Validator {
    pub fn validate(&self, selection: &SelectionContext, store: &PropertyStore) -> bool {
        self.check_properties(store)
            && self.check_patterns(selection, store)
            && self.check_expression(store)
    }

    fn check_properties(&self, store: &PropertyStore) -> bool {
        for name in &self.properties {
            let name = match store.expand(name) {
                Ok(n) => n,
                Err(_) => return false,
            };
            if store.get(&name).is_empty() {
                log::debug!("validator: property '{}' is unset or empty", name);
                return false;
            }
        }
        true
    }

    fn check_patterns(&self, selection: &SelectionContext, store: &PropertyStore) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let patterns: Vec<String> = self
            .patterns
            .iter()
            .map(|p| store.expand(p).unwrap_or_else(|e| e.partial().to_string()))
            .collect();

        for element in selection.elements() {
            let candidate = element.to_string_lossy();
            let matched = patterns
                .iter()
                .any(|p| wildcard::solve(p, &candidate).is_some());
            if !matched {
                log::debug!("validator: '{}' matches no pattern", candidate);
                return false;
            }
        }
        true
    }

    fn check_expression(&self, store: &PropertyStore) -> bool {
        let Some(formula) = &self.expression else {
            return true;
        };
        let formula = match store.expand(formula) {
            Ok(f) => f,
            Err(_) => return false,
        };
        match expression::evaluate_truthy(&formula) {
            Ok(truthy) => truthy,
            Err(e) => {
                log::debug!("validator: expression '{}' failed: {}", formula, e);
                false
            }
        }
    }
}

// MARK: --- UNIT TESTS ---
