//! Access paths into stored values.
//!
//! An access path is the bracket chain that follows a variable reference:
//!
//! ```text
//! $donut['batters']['batter'][1]['type']
//!       └────────────── access path ──────┘
//! ```
//!
//! Parsing is best-effort and never fails. Quoted segments become keys, bare
//! decimal segments become indices, and an unterminated quote (`['type]`) is
//! accepted as if it were closed. The path ends at the first text that is not
//! a complete `[...]` group; anything after it is ignored.

use serde_json::Value;
use std::fmt;

/// A single step of an access path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// Keyed lookup, e.g. `['batters']`
    Key(String),
    /// Positional lookup, e.g. `[1]`
    Index(usize),
}

impl Accessor {
    /// Apply this accessor to a value.
    ///
    /// Returns `None` when the value is not indexable by this accessor or the
    /// key/index is absent.
    #[must_use]
    pub fn apply<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match (self, value) {
            (Self::Key(key), Value::Object(map)) => map.get(key),
            (Self::Key(key), Value::Array(items)) => {
                canonical_index(key).and_then(|index| items.get(index))
            }
            (Self::Index(index), Value::Array(items)) => items.get(*index),
            (Self::Index(index), Value::Object(map)) => map.get(&index.to_string()),
            _ => None,
        }
    }

    /// Parse the text between a pair of brackets
    fn from_segment(segment: &str) -> Self {
        let segment = segment.trim();
        for quote in ['\'', '"'] {
            if let Some(inner) = segment.strip_prefix(quote) {
                let inner = inner.strip_suffix(quote).unwrap_or(inner);
                return Self::Key(inner.to_string());
            }
        }

        match segment.parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Key(segment.to_string()),
        }
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "['{key}']"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// `"3"` is an array position, `"03"` and `"+3"` are not
fn canonical_index(key: &str) -> Option<usize> {
    key.parse::<usize>()
        .ok()
        .filter(|index| index.to_string() == key)
}

/// Position of the `]` closing the group whose text starts at `body`.
///
/// A quoted key closes at its matching quote followed by `]`. Without one,
/// or when another `[` opens first, the first `]` closes the group.
fn group_end(body: &str) -> Option<usize> {
    let first = body.find(']')?;
    let trimmed = body.trim_start();
    let Some(quote) = trimmed.chars().next().filter(|c| matches!(c, '\'' | '"')) else {
        return Some(first);
    };
    let opened = body.len() - trimmed.len() + quote.len_utf8();
    let inner = &body[opened..];

    inner
        .match_indices(quote)
        .take_while(|(at, _)| !inner[..*at].contains('['))
        .find_map(|(at, _)| {
            let after = &inner[at + quote.len_utf8()..];
            let gap = after.len() - after.trim_start().len();
            after[gap..]
                .starts_with(']')
                .then_some(opened + at + quote.len_utf8() + gap)
        })
        .or(Some(first))
}

/// Ordered list of accessors applied to a stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AccessPath {
    accessors: Vec<Accessor>,
}

impl AccessPath {
    /// Create an empty path (the whole stored value)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a bracket chain such as `['batters']['batter'][1]`.
    ///
    /// A quoted key runs to its closing quote, so `['a]b']` is the single
    /// key `a]b`. Parsing stops at the first character that does not open a
    /// complete bracket group.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut accessors = Vec::new();
        let mut rest = input;

        while let Some(body) = rest.strip_prefix('[') {
            let Some(end) = group_end(body) else {
                break;
            };
            accessors.push(Accessor::from_segment(&body[..end]));
            rest = &body[end + 1..];
        }

        Self { accessors }
    }

    /// Append an accessor
    #[must_use]
    pub fn push(mut self, accessor: Accessor) -> Self {
        self.accessors.push(accessor);
        self
    }

    /// Get the accessors in order
    #[must_use]
    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    /// Number of accessors
    #[must_use]
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Check if the path addresses the whole value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    /// Walk the path from `root`, stopping at the first missing link
    #[must_use]
    pub fn walk<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.accessors
            .iter()
            .try_fold(root, |current, accessor| accessor.apply(current))
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for accessor in &self.accessors {
            write!(f, "{accessor}")?;
        }
        Ok(())
    }
}

impl FromIterator<Accessor> for AccessPath {
    fn from_iter<I: IntoIterator<Item = Accessor>>(iter: I) -> Self {
        Self {
            accessors: iter.into_iter().collect(),
        }
    }
}
