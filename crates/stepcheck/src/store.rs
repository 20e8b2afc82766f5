//! Variable store seam.
//!
//! Earlier test steps capture values (API responses, element text, computed
//! strings) under sigil-prefixed keys such as `$donut`. Assertions only read
//! from the store.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Marker that turns an operand into a store lookup
pub const REFERENCE_SIGIL: char = '$';

/// A value held in the variable store
pub type StoredValue = Value;

/// Read access to the runtime variable store
pub trait VariableStore: Send + Sync {
    /// Look up a key. Keys carry the reference sigil (`$name`).
    fn get(&self, key: &str) -> Option<StoredValue>;
}

impl VariableStore for HashMap<String, StoredValue> {
    fn get(&self, key: &str) -> Option<StoredValue> {
        HashMap::get(self, key).cloned()
    }
}

/// Add the sigil to a bare key
fn normalize_key(key: &str) -> String {
    if key.starts_with(REFERENCE_SIGIL) {
        key.to_string()
    } else {
        format!("{REFERENCE_SIGIL}{key}")
    }
}

/// In-memory variable store.
///
/// Keys are normalized to carry the reference sigil, so `set("x", ..)` and
/// `set("$x", ..)` address the same entry and both are found by `get("$x")`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value
    pub fn set(&self, key: &str, value: impl Into<StoredValue>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_key(key), value.into());
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(self, key: &str, value: impl Into<StoredValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Number of stored variables
    #[must_use]
    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VariableStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_key(key))
            .cloned()
    }
}

impl FromIterator<(String, StoredValue)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (String, StoredValue)>>(iter: I) -> Self {
        let store = Self::new();
        for (key, value) in iter {
            store.set(&key, value);
        }
        store
    }
}
