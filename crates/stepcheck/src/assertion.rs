//! Value assertions: equals / not-equals.
//!
//! Both operands go through [`resolve`](crate::resolve::resolve) and are
//! compared with [`deep_equals`]. The evaluator never returns an error; the
//! outcome is always reported as exactly one informational log message.

use crate::equality::deep_equals;
use crate::report::{AssertionOutcome, Reporter};
use crate::resolve::{Operand, Resolved};
use crate::store::VariableStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Comparison mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssertionMode {
    /// Pass when the values are deep-equal
    Equals,
    /// Pass when the values differ
    NotEquals,
}

impl AssertionMode {
    /// Turn an equality verdict into an outcome
    #[must_use]
    pub const fn judge(self, equal: bool) -> AssertionOutcome {
        match self {
            Self::Equals => AssertionOutcome::from_bool(equal),
            Self::NotEquals => AssertionOutcome::from_bool(!equal),
        }
    }
}

impl fmt::Display for AssertionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equals => "equals",
            Self::NotEquals => "not-equals",
        })
    }
}

/// The expectation side of a comparison, carrying its mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expectation {
    /// `expectedVal`
    Equals(String),
    /// `notExpectedVal`
    NotEquals(String),
}

impl Expectation {
    /// Raw operand
    #[must_use]
    pub fn operand(&self) -> &str {
        match self {
            Self::Equals(raw) | Self::NotEquals(raw) => raw,
        }
    }

    /// Comparison mode selected by this expectation
    #[must_use]
    pub const fn mode(&self) -> AssertionMode {
        match self {
            Self::Equals(_) => AssertionMode::Equals,
            Self::NotEquals(_) => AssertionMode::NotEquals,
        }
    }
}

/// Arguments of a value assertion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComparisonArgs {
    /// Raw `actualVal` operand
    pub actual: String,
    /// Expected or not-expected operand
    pub expectation: Expectation,
}

impl ComparisonArgs {
    /// `actual` must deep-equal `expected`
    #[must_use]
    pub fn equals(actual: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            actual: actual.into(),
            expectation: Expectation::Equals(expected.into()),
        }
    }

    /// `actual` must not deep-equal `not_expected`
    #[must_use]
    pub fn not_equals(actual: impl Into<String>, not_expected: impl Into<String>) -> Self {
        Self {
            actual: actual.into(),
            expectation: Expectation::NotEquals(not_expected.into()),
        }
    }
}

/// Evaluates value assertions against a store and reports to a reporter
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    store: &'a dyn VariableStore,
    reporter: &'a dyn Reporter,
}

impl fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator").finish_non_exhaustive()
    }
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator
    #[must_use]
    pub fn new(store: &'a dyn VariableStore, reporter: &'a dyn Reporter) -> Self {
        Self { store, reporter }
    }

    /// Resolve both operands, compare them and report the outcome
    pub fn evaluate(&self, args: &ComparisonArgs) -> AssertionOutcome {
        let actual = Operand::parse(&args.actual).resolve(self.store);
        let expected = Operand::parse(args.expectation.operand()).resolve(self.store);
        let mode = args.expectation.mode();

        let outcome = Self::judge(&actual, &expected, mode);
        debug!(
            actual = %args.actual,
            expectation = %args.expectation.operand(),
            %mode,
            resolved_actual = %describe(&actual),
            resolved_expected = %describe(&expected),
            %outcome,
            "value assertion evaluated"
        );

        self.reporter.emit(outcome.to_message());
        outcome
    }

    /// Pure comparison of already resolved values, no reporting
    #[must_use]
    pub fn judge(actual: &Resolved, expected: &Resolved, mode: AssertionMode) -> AssertionOutcome {
        mode.judge(deep_equals(actual, expected))
    }
}

/// Render a resolved value for diagnostics
#[must_use]
pub fn describe(value: &Resolved) -> String {
    value
        .as_ref()
        .map_or_else(|| "undefined".to_string(), ToString::to_string)
}

/// Evaluate one value assertion
pub fn evaluate(
    args: &ComparisonArgs,
    store: &dyn VariableStore,
    reporter: &dyn Reporter,
) -> AssertionOutcome {
    Evaluator::new(store, reporter).evaluate(args)
}
