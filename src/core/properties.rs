// src/core/properties.rs

use crate::constants::{ENV_PROPERTY_PREFIX, MAX_EXPANSION_DEPTH};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

lazy_static! {
    // An unterminated `${` never matches and is therefore left as literal
    // text, which is the intended token grammar.
    static ref PROPERTY_TOKEN_RE: Regex = Regex::new(r"\$\{([^}]+)\}").unwrap();
}

#[derive(Error, Debug)]
pub enum ExpandError {
    #[error(
        "Maximum expansion depth ({depth}) exceeded. Check for cyclic property references."
    )]
    DepthExceeded {
        depth: u32,
        /// The partially expanded string at the point the ceiling was hit.
        partial: String,
    },
}

impl ExpandError {
    /// The best-effort expansion produced before the failure.
    pub fn partial(&self) -> &str {
        match self {
            Self::DepthExceeded { partial, .. } => partial,
        }
    }
}

/// Process-wide store of named string properties.
///
/// The store is an explicit, injectable object: components receive a
/// reference instead of reaching for ambient global state, so tests can run
/// against isolated instances. Interior synchronization is a single
/// store-wide lock; mutations exclude each other and the read traversal of
/// [`expand`](Self::expand).
#[derive(Debug, Default)]
pub struct PropertyStore {
    values: RwLock<HashMap<String, String>>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: &str, value: &str) {
        self.values
            .write()
            .insert(name.to_string(), value.to_string());
    }

    /// Returns the stored value, or the empty string if unset.
    pub fn get(&self, name: &str) -> String {
        self.values.read().get(name).cloned().unwrap_or_default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    pub fn clear(&self, name: &str) {
        self.values.write().remove(name);
    }

    pub fn clear_all(&self) {
        self.values.write().clear();
    }

    /// Seeds the store with the process environment as `env.NAME`
    /// properties. Variables whose name or value is not valid Unicode are
    /// skipped.
    pub fn register_environment(&self) {
        let mut values = self.values.write();
        for (name, value) in std::env::vars_os() {
            let (Some(name), Some(value)) = (name.to_str(), value.to_str()) else {
                log::debug!("skipping non-Unicode environment variable {:?}", name);
                continue;
            };
            values.insert(format!("{}{}", ENV_PROPERTY_PREFIX, name), value.to_string());
        }
    }

    /// Expands every `${name}` token in `template`, recursively.
    ///
    /// Unset properties expand to the empty string. Expansion of an expanded
    /// value continues until no token remains or the depth ceiling is hit;
    /// the ceiling turns self-reference and runaway indirection into an
    /// [`ExpandError::DepthExceeded`] carrying the partial result.
    pub fn expand(&self, template: &str) -> Result<String, ExpandError> {
        let mut current = template.to_string();
        for _ in 0..MAX_EXPANSION_DEPTH {
            if !PROPERTY_TOKEN_RE.is_match(&current) {
                return Ok(current);
            }
            current = PROPERTY_TOKEN_RE
                .replace_all(&current, |caps: &regex::Captures<'_>| self.get(&caps[1]))
                .into_owned();
        }
        if PROPERTY_TOKEN_RE.is_match(&current) {
            log::warn!(
                "expansion overflow after {} passes: '{}'",
                MAX_EXPANSION_DEPTH,
                current
            );
            return Err(ExpandError::DepthExceeded {
                depth: MAX_EXPANSION_DEPTH,
                partial: current,
            });
        }
        Ok(current)
    }
}

// MARK: --- UNIT TESTS ---
