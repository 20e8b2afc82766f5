//! Selector text to match pattern.

/// Turns selector text into the pattern source handed to the element finder
pub trait PatternBuilder: Send + Sync {
    /// Build a pattern for `selector`
    fn build(&self, selector: &str) -> String;
}

/// Builds a regular expression that matches the selector text literally.
///
/// Regex metacharacters are escaped and any run of whitespace matches any run
/// of whitespace. Case is folded by the finder, which compiles the pattern
/// with the `i` flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexPatternBuilder;

impl PatternBuilder for RegexPatternBuilder {
    fn build(&self, selector: &str) -> String {
        selector
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+")
    }
}
