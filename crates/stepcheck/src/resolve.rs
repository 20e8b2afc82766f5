//! Operand resolution.
//!
//! An operand is the raw string a test step supplies for one side of an
//! assertion. Operands that start with the reference sigil are looked up in
//! the [`VariableStore`] and walked with their [`AccessPath`]; everything else
//! is a literal and resolves to itself.
//!
//! Resolution is total: a missing variable or a missing link in the path
//! resolves to `None` (the "undefined" value), never to an error.

use crate::path::AccessPath;
use crate::store::{StoredValue, VariableStore, REFERENCE_SIGIL};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Outcome of resolving an operand. `None` is "undefined".
pub type Resolved = Option<StoredValue>;

/// A store lookup plus an optional access path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    base: String,
    path: AccessPath,
}

impl Reference {
    /// Create a reference from its parts. `base` keeps its sigil.
    #[must_use]
    pub fn new(base: impl Into<String>, path: AccessPath) -> Self {
        Self {
            base: base.into(),
            path,
        }
    }

    /// Store key, including the sigil
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Access path applied to the stored value
    #[must_use]
    pub fn path(&self) -> &AccessPath {
        &self.path
    }

    /// Look up the base and walk the path. Queries the store exactly once.
    #[must_use]
    pub fn resolve(&self, store: &dyn VariableStore) -> Resolved {
        let Some(root) = store.get(&self.base) else {
            debug!(variable = %self.base, "reference not found in store");
            return None;
        };

        if self.path.is_empty() {
            return Some(root);
        }

        let leaf = self.path.walk(&root).cloned();
        if leaf.is_none() {
            debug!(variable = %self.base, path = %self.path, "access path did not resolve");
        }
        leaf
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.path)
    }
}

/// A classified operand
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Used as-is
    Literal(String),
    /// Looked up in the variable store
    Reference(Reference),
}

impl Operand {
    /// Classify a raw operand.
    ///
    /// The base variable name runs up to the first `[`; the rest is parsed as
    /// an access path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if !raw.starts_with(REFERENCE_SIGIL) {
            return Self::Literal(raw.to_string());
        }

        let split = raw.find('[').unwrap_or(raw.len());
        let (base, rest) = raw.split_at(split);
        Self::Reference(Reference::new(base, AccessPath::parse(rest)))
    }

    /// Check if this operand reads from the store
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// Resolve against a store. Literals never touch the store.
    #[must_use]
    pub fn resolve(&self, store: &dyn VariableStore) -> Resolved {
        match self {
            Self::Literal(text) => Some(Value::String(text.clone())),
            Self::Reference(reference) => reference.resolve(store),
        }
    }
}

impl From<&str> for Operand {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Reference(reference) => write!(f, "{reference}"),
        }
    }
}

/// Resolve a raw operand string against a store
#[must_use]
pub fn resolve(raw: &str, store: &dyn VariableStore) -> Resolved {
    Operand::parse(raw).resolve(store)
}
