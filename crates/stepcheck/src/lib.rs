//! Stepcheck: assertion steps for browser-driven test runners
//!
//! A test step says "this value equals that one", "this value differs from
//! that one" or "this element is (not) available". Operands are literals or
//! `$`-references into a runtime variable store, optionally followed by a
//! bracketed access path such as `$donut['batters']['batter'][0]['type']`.
//! Every assertion reports exactly one `True`/`False` message.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐  Check::try_from  ┌───────────┐
//! │ StepArgs  │ ─────────────────►│ Stepcheck │
//! └───────────┘                   └─────┬─────┘
//!                       ┌───────────────┴───────────────┐
//!                       ▼                               ▼
//!                ┌────────────┐                ┌─────────────────────┐
//!                │ Evaluator  │                │ AvailabilityChecker │
//!                └─────┬──────┘                └──────────┬──────────┘
//!                      │ resolve + deep_equals            │ scripts + Poller
//!                      ▼                                  ▼
//!               VariableStore ◄───────────────── BrowserControl
//!                      │                                  │
//!                      └──────────────► Reporter ◄────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use stepcheck::prelude::*;
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new().with("$x", "foo");
//! let reporter = Arc::new(RecordingReporter::new());
//! let runner = Stepcheck::new(Arc::new(store)).with_reporter(reporter.clone());
//!
//! assert_eq!(runner.evaluate(&ComparisonArgs::equals("$x", "foo")), AssertionOutcome::Pass);
//! assert_eq!(reporter.last().map(|m| m.message), Some("True".to_string()));
//! ```

#![warn(missing_docs)]

mod assertion;
mod availability;
mod browser;
mod config;
mod equality;
mod path;
mod pattern;
mod report;
mod resolve;
mod result;
mod scripts;
mod step;
mod store;
mod wait;

/// Diagnostic tracing setup
pub mod logging;

pub use assertion::{describe, evaluate, AssertionMode, ComparisonArgs, Evaluator, Expectation};
pub use availability::{check_availability, AvailabilityChecker, AvailabilityRequest, CheckState};
pub use browser::{BrowserControl, ElementHandle, MockBrowser, MockCall, MockElement};
pub use config::{PollSettings, StepcheckConfig};
pub use equality::{deep_equals, values_equal};
pub use path::{AccessPath, Accessor};
pub use pattern::{PatternBuilder, RegexPatternBuilder};
pub use report::{
    AssertionOutcome, LogMessage, RecordingReporter, Reporter, Severity, TracingReporter,
    FAIL_TOKEN, PASS_TOKEN,
};
pub use resolve::{resolve, Operand, Reference, Resolved};
pub use result::{StepcheckError, StepcheckResult};
pub use scripts::{
    FinderArgs, FinderResult, PageScript, ERASE_HIGHLIGHTS, ERASE_HIGHLIGHTS_NAME, FIND_ELEMENTS,
    FIND_ELEMENTS_NAME,
};
pub use step::{Check, StepArgs, Stepcheck};
pub use store::{MemoryStore, StoredValue, VariableStore, REFERENCE_SIGIL};
pub use wait::{
    Deadline, PollConfig, PollOutcome, Poller, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::*;
    pub use super::availability::*;
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::equality::*;
    pub use super::path::*;
    pub use super::pattern::*;
    pub use super::report::*;
    pub use super::resolve::*;
    pub use super::result::*;
    pub use super::scripts::*;
    pub use super::step::*;
    pub use super::store::*;
    pub use super::wait::*;
}
