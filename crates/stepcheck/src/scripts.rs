//! Page scripts run through [`BrowserControl::execute`](crate::BrowserControl).
//!
//! The JavaScript lives in `scripts/*.js` and is embedded at compile time.
//! Scripts are WebDriver-style function bodies: positional arguments arrive in
//! `arguments`, the result is `return`ed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Name of the highlight eraser script
pub const ERASE_HIGHLIGHTS_NAME: &str = "eraseHighlights";

/// Name of the element finder script
pub const FIND_ELEMENTS_NAME: &str = "findElements";

/// Clears highlight overlays left by earlier assertions
pub const ERASE_HIGHLIGHTS: PageScript = PageScript::new_static(
    ERASE_HIGHLIGHTS_NAME,
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/erase_highlights.js")),
);

/// Locates elements matching a pattern, optionally near a marker
pub const FIND_ELEMENTS: PageScript = PageScript::new_static(
    FIND_ELEMENTS_NAME,
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/find_elements.js")),
);

/// A named script executed in the page context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageScript {
    name: Cow<'static, str>,
    source: Cow<'static, str>,
}

impl PageScript {
    /// Create a script from owned or borrowed source
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a script from static strings
    #[must_use]
    pub const fn new_static(name: &'static str, source: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            source: Cow::Borrowed(source),
        }
    }

    /// Script name, used for diagnostics and by test doubles
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// JavaScript source
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for PageScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Positional arguments of the element finder
#[derive(Debug, Clone, PartialEq)]
pub struct FinderArgs {
    /// Match pattern built from the selector, `null` when unresolved
    pub pattern: Value,
    /// Resolved marker, `null` when absent or unresolved
    pub marker: Value,
    /// Return every match
    pub return_multiple: bool,
    /// Outline matches in the page
    pub highlight_match: bool,
    /// Match against innerHTML only
    pub inner_html_only: bool,
}

impl FinderArgs {
    /// Arguments used by availability checks: all matches, no highlight,
    /// visible text
    #[must_use]
    pub fn availability(pattern: Value, marker: Value) -> Self {
        Self {
            pattern,
            marker,
            return_multiple: true,
            highlight_match: false,
            inner_html_only: false,
        }
    }

    /// The five positional arguments in script order
    #[must_use]
    pub fn into_args(self) -> Vec<Value> {
        vec![
            self.pattern,
            self.marker,
            Value::Bool(self.return_multiple),
            Value::Bool(self.highlight_match),
            Value::Bool(self.inner_html_only),
        ]
    }
}

/// Result record of the element finder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinderResult {
    /// Whether the finder located anything
    pub success: bool,
    /// Opaque target identifiers, in document order
    pub target_results: Vec<Value>,
}

impl FinderResult {
    /// First located target, if the search succeeded
    #[must_use]
    pub fn first_target(&self) -> Option<&Value> {
        if self.success {
            self.target_results.first()
        } else {
            None
        }
    }
}
