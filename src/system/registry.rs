// src/system/registry.rs

use std::collections::HashMap;

/// Lookup contract for the host system's registry.
///
/// The core treats the registry as an opaque capability: it consumes string
/// values by key path and does not define the underlying wire format. Hosts
/// plug in a platform implementation; tests use [`MapRegistry`].
pub trait RegistryLookup: Send + Sync {
    /// Returns the value at `path`, or `None` if the key/value is not found.
    fn get_key_as_string(&self, path: &str) -> Option<String>;
}

/// Null object for hosts without a registry. Every lookup misses.
#[derive(Debug, Default)]
pub struct NoRegistry;

impl RegistryLookup for NoRegistry {
    fn get_key_as_string(&self, _path: &str) -> Option<String> {
        None
    }
}

/// In-memory registry backed by a map.
#[derive(Debug, Default)]
pub struct MapRegistry {
    entries: HashMap<String, String>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, value: &str) {
        self.entries.insert(path.to_string(), value.to_string());
    }
}

impl RegistryLookup for MapRegistry {
    fn get_key_as_string(&self, path: &str) -> Option<String> {
        self.entries.get(path).cloned()
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_registry_always_misses() {
        assert!(NoRegistry.get_key_as_string("HKCU\\Software\\Test").is_none());
    }

    #[test]
    fn test_map_registry_round_trip() {
        let mut registry = MapRegistry::new();
        registry.insert("HKCU\\Software\\Test\\Value", "42");
        assert_eq!(
            registry.get_key_as_string("HKCU\\Software\\Test\\Value"),
            Some("42".to_string())
        );
        assert!(registry.get_key_as_string("HKCU\\Software\\Other").is_none());
    }
}
