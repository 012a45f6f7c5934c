// src/core/resolvers.rs

use crate::constants::DEFAULT_MAX_FILE_SIZE;
use crate::core::expression;
use crate::core::properties::PropertyStore;
use crate::models::ValueSource;
use crate::system::registry::RegistryLookup;
use rand::Rng;
use std::io::Read;
use thiserror::Error;

/// Resolver failure categories. Resolvers carry no detail beyond the
/// category plus the offending input; the owning action's fail policy
/// decides whether a failure aborts the sequence.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Value source unreachable: {0}")]
    SourceUnreachable(String),
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
    #[error("Parse failure: {0}")]
    Parse(String),
}

/// Outcome of a resolution attempt; never partial.
///
/// `Ok(Some(value))` — resolved. `Ok(None)` — the source names nothing
/// after expansion (skip, the target property is left untouched).
/// `Err` — hard failure.
pub type Resolution = Result<Option<String>, ResolverError>;

impl ValueSource {
    /// Computes the value for this source. All string parameters are passed
    /// through template expansion first.
    pub fn resolve(&self, store: &PropertyStore, registry: &dyn RegistryLookup) -> Resolution {
        match self {
            Self::Literal(value) => Ok(Some(expand(store, value)?)),
            Self::Expression(formula) => resolve_expression(store, formula),
            Self::File { path, max_bytes } => resolve_file(store, path, max_bytes.as_deref()),
            Self::Registry(key) => resolve_registry(store, registry, key),
            Self::SearchPath(name) => resolve_search_path(store, name),
            Self::Random { min, max } => resolve_random(store, min, max),
        }
    }
}

fn expand(store: &PropertyStore, template: &str) -> Result<String, ResolverError> {
    store
        .expand(template)
        .map_err(|e| ResolverError::Parse(e.to_string()))
}

fn resolve_expression(store: &PropertyStore, formula: &str) -> Resolution {
    let formula = expand(store, formula)?;
    let value = expression::evaluate(&formula).map_err(|e| {
        log::debug!("expression '{}' failed: {}", formula, e);
        ResolverError::Parse(e.to_string())
    })?;
    Ok(Some(value))
}

fn resolve_file(store: &PropertyStore, path: &str, max_bytes: Option<&str>) -> Resolution {
    let path = expand(store, path)?;
    if path.is_empty() {
        return Ok(None);
    }

    // Truncation policy: a file larger than the cap is read up to the cap
    // and that is success; a cap of 0 disables the limit.
    let cap = match max_bytes {
        None => DEFAULT_MAX_FILE_SIZE,
        Some(raw) => {
            let raw = expand(store, raw)?;
            raw.parse::<u64>()
                .map_err(|_| ResolverError::Parse(format!("invalid file size '{}'", raw)))?
        }
    };

    let file = std::fs::File::open(&path)
        .map_err(|e| ResolverError::SourceUnreachable(format!("{}: {}", path, e)))?;
    let mut content = Vec::new();
    let read = match cap {
        0 => std::io::BufReader::new(file).read_to_end(&mut content),
        cap => std::io::BufReader::new(file)
            .take(cap)
            .read_to_end(&mut content),
    };
    read.map_err(|e| ResolverError::SourceUnreachable(format!("{}: {}", path, e)))?;

    Ok(Some(String::from_utf8_lossy(&content).into_owned()))
}

fn resolve_registry(store: &PropertyStore, registry: &dyn RegistryLookup, key: &str) -> Resolution {
    let key = expand(store, key)?;
    if key.is_empty() {
        return Ok(None);
    }
    match registry.get_key_as_string(&key) {
        Some(value) => Ok(Some(value)),
        None => Err(ResolverError::SourceUnreachable(format!(
            "registry key '{}' not found",
            key
        ))),
    }
}

fn resolve_search_path(store: &PropertyStore, name: &str) -> Resolution {
    let name = expand(store, name)?;
    if name.is_empty() {
        return Ok(None);
    }

    // The search list comes from the `env.PATH` property when the store has
    // been seeded with the environment, falling back to the live variable.
    let search = if store.has("env.PATH") {
        store.get("env.PATH")
    } else {
        std::env::var("PATH").unwrap_or_default()
    };

    for dir in std::env::split_paths(&search) {
        let candidate = dir.join(&name);
        if candidate.is_file() {
            return Ok(Some(
                dunce::simplified(&candidate).to_string_lossy().into_owned(),
            ));
        }
    }
    Err(ResolverError::SourceUnreachable(format!(
        "'{}' not found on the search path",
        name
    )))
}

fn resolve_random(store: &PropertyStore, min: &str, max: &str) -> Resolution {
    let min_raw = expand(store, min)?;
    let max_raw = expand(store, max)?;
    let min = min_raw
        .parse::<i64>()
        .map_err(|_| ResolverError::Parse(format!("invalid random bound '{}'", min_raw)))?;
    let max = max_raw
        .parse::<i64>()
        .map_err(|_| ResolverError::Parse(format!("invalid random bound '{}'", max_raw)))?;
    if min > max {
        return Err(ResolverError::InvalidBounds(format!(
            "min {} > max {}",
            min, max
        )));
    }
    let value = rand::thread_rng().gen_range(min..=max);
    Ok(Some(value.to_string()))
}

// MARK: --- UNIT TESTS ---
