//! Test-step dispatch.
//!
//! A test step arrives as a loose argument map. [`Check::try_from`] decides
//! up front which assertion it describes and rejects anything ambiguous, so
//! evaluation itself never fails.

use crate::assertion::{ComparisonArgs, Evaluator};
use crate::availability::{AvailabilityChecker, AvailabilityRequest};
use crate::browser::BrowserControl;
use crate::config::StepcheckConfig;
use crate::report::{AssertionOutcome, Reporter, TracingReporter};
use crate::result::{StepcheckError, StepcheckResult};
use crate::store::VariableStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{info_span, Instrument};

/// Raw arguments of an assertion step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepArgs {
    /// Actual operand of a value assertion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_val: Option<String>,
    /// Operand the actual value must equal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_val: Option<String>,
    /// Operand the actual value must differ from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_expected_val: Option<String>,
    /// Text of the element to look for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Text scoping the element search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// Expected displayed state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

impl StepArgs {
    /// Parse step arguments from a JSON object.
    ///
    /// # Errors
    /// Returns error if a field has the wrong type.
    pub fn from_value(value: Value) -> StepcheckResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    fn has_comparison_fields(&self) -> bool {
        self.actual_val.is_some() || self.expected_val.is_some() || self.not_expected_val.is_some()
    }

    fn has_availability_fields(&self) -> bool {
        self.is_available.is_some() || self.selector.is_some() || self.marker.is_some()
    }
}

/// One assertion, fully classified
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Check {
    /// `actual` must deep-equal `expected`
    Equals {
        /// Actual operand
        actual: String,
        /// Expected operand
        expected: String,
    },
    /// `actual` must not deep-equal `not_expected`
    NotEquals {
        /// Actual operand
        actual: String,
        /// Not-expected operand
        not_expected: String,
    },
    /// An element's displayed state must match
    Availability(AvailabilityRequest),
}

impl Check {
    /// Comparison arguments for value assertions
    #[must_use]
    pub fn comparison(&self) -> Option<ComparisonArgs> {
        match self {
            Self::Equals { actual, expected } => {
                Some(ComparisonArgs::equals(actual.as_str(), expected.as_str()))
            }
            Self::NotEquals {
                actual,
                not_expected,
            } => Some(ComparisonArgs::not_equals(
                actual.as_str(),
                not_expected.as_str(),
            )),
            Self::Availability(_) => None,
        }
    }

    /// Short kind name for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Equals { .. } => "equals",
            Self::NotEquals { .. } => "not-equals",
            Self::Availability(_) => "availability",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { actual, expected } => write!(f, "{actual} == {expected}"),
            Self::NotEquals {
                actual,
                not_expected,
            } => write!(f, "{actual} != {not_expected}"),
            Self::Availability(request) => {
                let verb = if request.expected_available {
                    "available"
                } else {
                    "unavailable"
                };
                match &request.marker {
                    Some(marker) => write!(f, "{} {verb} near {marker}", request.selector),
                    None => write!(f, "{} {verb}", request.selector),
                }
            }
        }
    }
}

impl TryFrom<StepArgs> for Check {
    type Error = StepcheckError;

    fn try_from(args: StepArgs) -> StepcheckResult<Self> {
        if args.has_comparison_fields() && args.has_availability_fields() {
            return Err(StepcheckError::invalid_step(
                "step mixes value and availability arguments",
            ));
        }

        if let Some(expected_available) = args.is_available {
            let selector = args
                .selector
                .ok_or_else(|| StepcheckError::invalid_step("isAvailable requires a selector"))?;
            return Ok(Self::Availability(AvailabilityRequest {
                selector,
                marker: args.marker,
                expected_available,
            }));
        }

        if args.has_availability_fields() {
            return Err(StepcheckError::invalid_step(
                "selector or marker given without isAvailable",
            ));
        }

        let Some(actual) = args.actual_val else {
            return Err(StepcheckError::invalid_step(
                "step has neither actualVal nor isAvailable",
            ));
        };

        match (args.expected_val, args.not_expected_val) {
            (Some(expected), None) => Ok(Self::Equals { actual, expected }),
            (None, Some(not_expected)) => Ok(Self::NotEquals {
                actual,
                not_expected,
            }),
            (Some(_), Some(_)) => Err(StepcheckError::invalid_step(
                "expectedVal and notExpectedVal are mutually exclusive",
            )),
            (None, None) => Err(StepcheckError::invalid_step(
                "actualVal requires expectedVal or notExpectedVal",
            )),
        }
    }
}

/// Assertion runner bound to a variable store and a reporter
#[derive(Clone)]
pub struct Stepcheck {
    store: Arc<dyn VariableStore>,
    reporter: Arc<dyn Reporter>,
    config: StepcheckConfig,
}

impl fmt::Debug for Stepcheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stepcheck")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Stepcheck {
    /// Create a runner reporting through `tracing`
    #[must_use]
    pub fn new(store: Arc<dyn VariableStore>) -> Self {
        Self {
            store,
            reporter: Arc::new(TracingReporter),
            config: StepcheckConfig::default(),
        }
    }

    /// Set the reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: StepcheckConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &StepcheckConfig {
        &self.config
    }

    /// Evaluate a value assertion
    pub fn evaluate(&self, args: &ComparisonArgs) -> AssertionOutcome {
        Evaluator::new(self.store.as_ref(), self.reporter.as_ref()).evaluate(args)
    }

    /// Run an availability assertion
    pub async fn check_availability(
        &self,
        browser: &dyn BrowserControl,
        request: &AvailabilityRequest,
    ) -> AssertionOutcome {
        AvailabilityChecker::new(self.store.as_ref(), self.reporter.as_ref())
            .with_poll_config(self.config.poll_config())
            .check(browser, request)
            .await
    }

    /// Run one classified check
    pub async fn run(&self, check: &Check, browser: &dyn BrowserControl) -> AssertionOutcome {
        let span = info_span!("assert", kind = check.kind(), check = %check);
        async {
            match check {
                Check::Availability(request) => self.check_availability(browser, request).await,
                Check::Equals { .. } | Check::NotEquals { .. } => check
                    .comparison()
                    .map_or(AssertionOutcome::Fail, |args| self.evaluate(&args)),
            }
        }
        .instrument(span)
        .await
    }

    /// Classify raw step arguments and run them.
    ///
    /// # Errors
    /// Returns [`StepcheckError::InvalidStep`] if the arguments do not describe
    /// exactly one check. Nothing is evaluated or reported in that case.
    pub async fn run_step(
        &self,
        args: StepArgs,
        browser: &dyn BrowserControl,
    ) -> StepcheckResult<AssertionOutcome> {
        let check = Check::try_from(args)?;
        Ok(self.run(&check, browser).await)
    }
}
