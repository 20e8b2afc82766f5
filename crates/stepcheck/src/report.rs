//! Pass/fail reporting.
//!
//! Every assertion ends with exactly one [`LogMessage`] handed to a
//! [`Reporter`]. The reporter is injected rather than global so evaluators
//! carry no hidden state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Token emitted for a passing assertion
pub const PASS_TOKEN: &str = "True";

/// Token emitted for a failing assertion
pub const FAIL_TOKEN: &str = "False";

/// Outcome of one assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssertionOutcome {
    /// Assertion held
    Pass,
    /// Assertion did not hold
    Fail,
}

impl AssertionOutcome {
    /// Map a boolean verdict
    #[must_use]
    pub const fn from_bool(passed: bool) -> Self {
        if passed {
            Self::Pass
        } else {
            Self::Fail
        }
    }

    /// Check if the outcome is a pass
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Token written to the log
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Pass => PASS_TOKEN,
            Self::Fail => FAIL_TOKEN,
        }
    }

    /// The log message reporting this outcome
    #[must_use]
    pub fn to_message(self) -> LogMessage {
        LogMessage::info(self.token())
    }
}

impl fmt::Display for AssertionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Debug details
    Debug,
    /// Informational (assertion outcomes)
    #[default]
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

impl Severity {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message for the test log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Message text
    pub message: String,
    /// Severity
    #[serde(rename = "type")]
    pub severity: Severity,
}

impl LogMessage {
    /// Create a message
    #[must_use]
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    /// Create an informational message
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }
}

/// Sink for test log messages. Emission must not fail.
pub trait Reporter: Send + Sync {
    /// Emit one message
    fn emit(&self, message: LogMessage);
}

/// Reporter that forwards messages to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn emit(&self, message: LogMessage) {
        let text = message.message.as_str();
        match message.severity {
            Severity::Debug => tracing::debug!(target: "stepcheck::report", "{text}"),
            Severity::Info => tracing::info!(target: "stepcheck::report", "{text}"),
            Severity::Warn => tracing::warn!(target: "stepcheck::report", "{text}"),
            Severity::Error => tracing::error!(target: "stepcheck::report", "{text}"),
        }
    }
}

/// Reporter that keeps every message, for inspection in tests
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<LogMessage>>,
}

impl RecordingReporter {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages emitted so far
    #[must_use]
    pub fn messages(&self) -> Vec<LogMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent message
    #[must_use]
    pub fn last(&self) -> Option<LogMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Number of messages emitted
    #[must_use]
    pub fn count(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forget recorded messages
    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Reporter for RecordingReporter {
    fn emit(&self, message: LogMessage) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}
