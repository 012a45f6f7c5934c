// src/core/selection.rs

use crate::constants::{DEFAULT_MULTI_SEPARATOR, MULTI_SEPARATOR_PROPERTY};
use crate::core::properties::PropertyStore;
use std::path::{Path, PathBuf};

/// Property names derived from a selection.
const DERIVED_PROPERTIES: &[&str] = &[
    "selection.path",
    "selection.parent.path",
    "selection.filename",
    "selection.filename.noext",
    "selection.extension",
    "selection.count",
];

/// The ordered set of filesystem items one menu resolution operates on.
/// Immutable once captured.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    elements: Vec<PathBuf>,
}

impl SelectionContext {
    pub fn new(elements: Vec<PathBuf>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[PathBuf] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Derives the `selection.*` properties into `store`.
    ///
    /// Multi-selections represent each property as all per-item values
    /// joined with the configurable multi-value separator (itself a
    /// property, expanded before use).
    pub fn register_properties(&self, store: &PropertyStore) {
        let separator = self.multi_separator(store);

        let join = |parts: Vec<String>| parts.join(&separator);

        store.set("selection.path", &join(self.map_paths(path_display)));
        store.set(
            "selection.parent.path",
            &join(self.map_paths(parent_display)),
        );
        store.set("selection.filename", &join(self.map_paths(file_name)));
        store.set(
            "selection.filename.noext",
            &join(self.map_paths(file_stem)),
        );
        store.set("selection.extension", &join(self.map_paths(extension)));
        store.set("selection.count", &self.elements.len().to_string());
    }

    /// Removes the derived properties, for reuse of the store between
    /// independent resolutions.
    pub fn clear_properties(store: &PropertyStore) {
        for name in DERIVED_PROPERTIES {
            store.clear(name);
        }
    }

    fn multi_separator(&self, store: &PropertyStore) -> String {
        if !store.has(MULTI_SEPARATOR_PROPERTY) {
            return DEFAULT_MULTI_SEPARATOR.to_string();
        }
        let raw = store.get(MULTI_SEPARATOR_PROPERTY);
        store.expand(&raw).unwrap_or(raw)
    }

    fn map_paths(&self, f: fn(&Path) -> String) -> Vec<String> {
        self.elements.iter().map(|p| f(p)).collect()
    }
}

fn path_display(path: &Path) -> String {
    dunce::simplified(path).to_string_lossy().into_owned()
}

fn parent_display(path: &Path) -> String {
    path.parent().map(path_display).unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// MARK: --- UNIT TESTS ---
