//! Element availability checks.
//!
//! ```text
//! Start ─► EraseHighlights ─► Locate ─┬─► PollVisibility ─┬─► Pass
//!                                     │        ▲   │      │
//!                                     │        └───┘      │
//!                                     └──────────────────►└─► Fail
//! ```
//!
//! A locate miss (script failure, `success: false`, no targets) fails the
//! check whatever availability was expected. Browser-control errors never
//! escape: they are traced at debug level and turn into `Fail`.
//!
//! The poll timeout is one budget for the whole check. Eraser, finder and
//! visibility calls all run against it, so a browser call that never answers
//! still ends in `Fail`.

use crate::browser::BrowserControl;
use crate::pattern::{PatternBuilder, RegexPatternBuilder};
use crate::report::{AssertionOutcome, Reporter};
use crate::resolve::{Operand, Resolved};
use crate::scripts::{FinderArgs, FinderResult, ERASE_HIGHLIGHTS, FIND_ELEMENTS};
use crate::store::VariableStore;
use crate::wait::{Deadline, PollConfig, Poller};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, trace};

/// Arguments of an availability assertion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    /// Raw selector operand (text to search for)
    pub selector: String,
    /// Raw marker operand scoping the search
    pub marker: Option<String>,
    /// Whether the element is expected to be displayed
    pub expected_available: bool,
}

impl AvailabilityRequest {
    /// Expect `selector` to be displayed
    #[must_use]
    pub fn available(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            marker: None,
            expected_available: true,
        }
    }

    /// Expect `selector` to be hidden
    #[must_use]
    pub fn unavailable(selector: impl Into<String>) -> Self {
        Self {
            expected_available: false,
            ..Self::available(selector)
        }
    }

    /// Scope the search around `marker`
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }
}

/// Checker states, traced on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckState {
    /// Operands resolved
    Start,
    /// Clearing leftover highlights
    EraseHighlights,
    /// Running the element finder
    Locate,
    /// Waiting for the displayed state to match
    PollVisibility,
    /// Terminal: state matched
    Pass,
    /// Terminal: locate miss or budget spent
    Fail,
}

impl CheckState {
    /// Check if the state ends the check
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Pass | Self::Fail)
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::EraseHighlights => "erase-highlights",
            Self::Locate => "locate",
            Self::PollVisibility => "poll-visibility",
            Self::Pass => "pass",
            Self::Fail => "fail",
        })
    }
}

/// Runs availability assertions against a browser
#[derive(Clone, Copy)]
pub struct AvailabilityChecker<'a> {
    store: &'a dyn VariableStore,
    reporter: &'a dyn Reporter,
    patterns: &'a dyn PatternBuilder,
    poller: Poller,
}

impl fmt::Debug for AvailabilityChecker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvailabilityChecker")
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

impl<'a> AvailabilityChecker<'a> {
    /// Create a checker with the default poll budget and pattern builder
    #[must_use]
    pub fn new(store: &'a dyn VariableStore, reporter: &'a dyn Reporter) -> Self {
        Self {
            store,
            reporter,
            patterns: &RegexPatternBuilder,
            poller: Poller::default(),
        }
    }

    /// Set the poll budget
    #[must_use]
    pub const fn with_poll_config(mut self, config: PollConfig) -> Self {
        self.poller = Poller::new(config);
        self
    }

    /// Set the pattern builder
    #[must_use]
    pub fn with_pattern_builder(mut self, patterns: &'a dyn PatternBuilder) -> Self {
        self.patterns = patterns;
        self
    }

    /// Get the poll budget
    #[must_use]
    pub const fn poll_config(&self) -> &PollConfig {
        self.poller.config()
    }

    /// Run the check and report its outcome
    pub async fn check(
        &self,
        browser: &dyn BrowserControl,
        request: &AvailabilityRequest,
    ) -> AssertionOutcome {
        let state = self.run(browser, request).await;
        let outcome = AssertionOutcome::from_bool(state == CheckState::Pass);
        debug!(
            selector = %request.selector,
            expected_available = request.expected_available,
            %outcome,
            "availability assertion evaluated"
        );
        self.reporter.emit(outcome.to_message());
        outcome
    }

    async fn run(&self, browser: &dyn BrowserControl, request: &AvailabilityRequest) -> CheckState {
        let mut state = CheckState::Start;
        let deadline = self.poller.deadline();
        let selector = Operand::parse(&request.selector).resolve(self.store);
        let marker = request
            .marker
            .as_deref()
            .and_then(|raw| Operand::parse(raw).resolve(self.store));

        state = transition(state, CheckState::EraseHighlights);
        match deadline.run(browser.execute(&ERASE_HIGHLIGHTS, Vec::new())).await {
            Some(Ok(_)) => {}
            Some(Err(err)) => debug!(error = %err, "highlight eraser failed, continuing"),
            None => {
                debug!("highlight eraser did not finish in time");
                return transition(state, CheckState::Fail);
            }
        }

        state = transition(state, CheckState::Locate);
        let pattern = self.pattern_for(&selector);
        let args = FinderArgs::availability(pattern, marker.unwrap_or(Value::Null));
        let Some(target) = locate(browser, args, &deadline).await else {
            return transition(state, CheckState::Fail);
        };

        state = transition(state, CheckState::PollVisibility);
        let expected = request.expected_available;
        let outcome = self
            .poller
            .until_deadline(deadline, || displayed_as(browser, &target, expected))
            .await;
        debug!(
            attempts = outcome.attempts,
            elapsed_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
            satisfied = outcome.satisfied,
            "visibility poll finished"
        );

        if outcome.satisfied {
            transition(state, CheckState::Pass)
        } else {
            transition(state, CheckState::Fail)
        }
    }

    /// Pattern sent to the finder. An undefined selector is sent as `null`.
    fn pattern_for(&self, selector: &Resolved) -> Value {
        match selector {
            None => Value::Null,
            Some(Value::String(text)) => Value::String(self.patterns.build(text)),
            Some(other) => Value::String(self.patterns.build(&other.to_string())),
        }
    }
}

fn transition(from: CheckState, to: CheckState) -> CheckState {
    trace!(%from, %to, "availability check transition");
    to
}

/// Run the finder and pick the first target
async fn locate(
    browser: &dyn BrowserControl,
    args: FinderArgs,
    deadline: &Deadline,
) -> Option<Value> {
    let raw = match deadline.run(browser.execute(&FIND_ELEMENTS, args.into_args())).await {
        Some(Ok(raw)) => raw,
        Some(Err(err)) => {
            debug!(error = %err, "element finder failed");
            return None;
        }
        None => {
            debug!("element finder did not finish in time");
            return None;
        }
    };

    let result: FinderResult = match serde_json::from_value(raw) {
        Ok(result) => result,
        Err(err) => {
            debug!(error = %err, "element finder returned an unexpected shape");
            return None;
        }
    };

    let target = result.first_target().cloned();
    if target.is_none() {
        debug!(success = result.success, "element finder located nothing");
    }
    target
}

/// One poll attempt. Errors count as a mismatch.
async fn displayed_as(browser: &dyn BrowserControl, target: &Value, expected: bool) -> bool {
    let element = match browser.element(target).await {
        Ok(element) => element,
        Err(err) => {
            debug!(%target, error = %err, "could not obtain element handle");
            return false;
        }
    };

    match element.is_displayed().await {
        Ok(displayed) => displayed == expected,
        Err(err) => {
            debug!(%target, error = %err, "visibility check failed");
            false
        }
    }
}

/// Run one availability assertion with the default pattern builder
pub async fn check_availability(
    browser: &dyn BrowserControl,
    request: &AvailabilityRequest,
    store: &dyn VariableStore,
    reporter: &dyn Reporter,
    poll: PollConfig,
) -> AssertionOutcome {
    AvailabilityChecker::new(store, reporter)
        .with_poll_config(poll)
        .check(browser, request)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockBrowser, MockCall};
    use crate::report::{LogMessage, RecordingReporter, FAIL_TOKEN, PASS_TOKEN};
    use crate::scripts::{ERASE_HIGHLIGHTS_NAME, FIND_ELEMENTS_NAME};
    use crate::store::MemoryStore;
    use serde_json::json;

    async fn run(
        browser: &MockBrowser,
        store: &MemoryStore,
        request: &AvailabilityRequest,
        poll: PollConfig,
    ) -> (AssertionOutcome, RecordingReporter) {
        let reporter = RecordingReporter::new();
        let outcome = check_availability(browser, request, store, &reporter, poll).await;
        (outcome, reporter)
    }

    fn found() -> MockBrowser {
        MockBrowser::new().with_found_targets(vec![json!("[data-stepcheck-target=\"0\"]")])
    }

    mod request_tests {
        use super::*;

        #[test]
        fn test_builders() {
            let request = AvailabilityRequest::unavailable("Save").with_marker("Toolbar");
            assert_eq!(request.selector, "Save");
            assert_eq!(request.marker.as_deref(), Some("Toolbar"));
            assert!(!request.expected_available);
            assert!(AvailabilityRequest::available("x").expected_available);
        }

        #[test]
        fn test_terminal_states() {
            assert!(CheckState::Pass.is_terminal());
            assert!(CheckState::Fail.is_terminal());
            assert!(!CheckState::PollVisibility.is_terminal());
            assert_eq!(CheckState::EraseHighlights.to_string(), "erase-highlights");
        }
    }

    mod pass_tests {
        use super::*;

        #[tokio::test]
        async fn test_visible_passes_without_extra_polling() {
            let browser = found().with_visibility([true]);
            let (outcome, reporter) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Checkout"),
                PollConfig::attempts(10),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Pass);
            assert_eq!(browser.visibility_checks(), 1);
            assert_eq!(reporter.messages(), vec![LogMessage::info(PASS_TOKEN)]);
        }

        #[tokio::test]
        async fn test_hidden_element_expected_unavailable() {
            let browser = found().with_visibility([false]);
            let (outcome, _) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::unavailable("Spinner"),
                PollConfig::attempts(10),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Pass);
            assert_eq!(browser.visibility_checks(), 1);
        }

        #[tokio::test]
        async fn test_becomes_visible_while_polling() {
            let browser = found().with_visibility([false, false, true]);
            let (outcome, _) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Done"),
                PollConfig::attempts(10),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Pass);
            assert_eq!(browser.visibility_checks(), 3);
        }
    }

    mod fail_tests {
        use super::*;

        #[tokio::test]
        async fn test_never_visible_fails_after_budget() {
            let browser = found().with_visibility([false]);
            let (outcome, reporter) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Ghost"),
                PollConfig::attempts(4),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            assert_eq!(browser.visibility_checks(), 4);
            assert_eq!(reporter.messages(), vec![LogMessage::info(FAIL_TOKEN)]);
        }

        #[tokio::test]
        async fn test_timeout_fails() {
            let browser = found().with_visibility([false]);
            let poll = PollConfig::new(std::time::Duration::from_millis(20))
                .with_poll_interval(std::time::Duration::from_millis(5));
            let (outcome, _) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Ghost"),
                poll,
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            assert!(browser.visibility_checks() >= 2);
        }

        #[tokio::test]
        async fn test_finder_error_fails() {
            let browser = MockBrowser::new().with_script_error(FIND_ELEMENTS_NAME, "no session");
            let (outcome, reporter) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::unavailable("Anything"),
                PollConfig::attempts(3),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            assert_eq!(browser.visibility_checks(), 0);
            assert_eq!(reporter.count(), 1);
        }

        #[tokio::test]
        async fn test_unsuccessful_finder_fails_even_when_unavailable_expected() {
            let browser = MockBrowser::new()
                .with_script_result(FIND_ELEMENTS_NAME, json!({"success": false, "targetResults": []}));
            let (outcome, _) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::unavailable("Gone"),
                PollConfig::attempts(3),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
        }

        #[tokio::test]
        async fn test_empty_targets_fail() {
            let browser = MockBrowser::new().with_found_targets(vec![]);
            let (outcome, _) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Nothing"),
                PollConfig::attempts(3),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            assert!(browser.calls().iter().all(|c| !matches!(c, MockCall::Element { .. })));
        }

        #[tokio::test]
        async fn test_unexpected_finder_shape_fails() {
            let browser = MockBrowser::new().with_script_result(FIND_ELEMENTS_NAME, json!("oops"));
            let (outcome, _) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("x"),
                PollConfig::attempts(3),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
        }

        #[tokio::test]
        async fn test_missing_element_counts_as_mismatch() {
            let browser = found().with_missing_element();
            let (outcome, _) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("x"),
                PollConfig::attempts(3),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            let lookups = browser
                .calls()
                .iter()
                .filter(|c| matches!(c, MockCall::Element { .. }))
                .count();
            assert_eq!(lookups, 3);
        }
    }

    #[tokio::test]
    async fn test_visibility_error_counts_as_mismatch() {
        let browser = found().with_visibility_timeout(100);
        let (outcome, _) = run(
            &browser,
            &MemoryStore::new(),
            &AvailabilityRequest::unavailable("Toast"),
            PollConfig::attempts(2),
        )
        .await;
        assert_eq!(outcome, AssertionOutcome::Fail);
        assert_eq!(browser.visibility_checks(), 2);
    }

    mod unresponsive_tests {
        use super::*;
        use std::time::Duration;

        fn budget() -> PollConfig {
            PollConfig::new(Duration::from_millis(50)).with_poll_interval(Duration::from_millis(10))
        }

        #[tokio::test(start_paused = true)]
        async fn test_unresponsive_visibility_fails_within_budget() {
            let browser = found().with_hanging_visibility();
            let started = tokio::time::Instant::now();
            let (outcome, reporter) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Checkout"),
                budget(),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            assert_eq!(browser.visibility_checks(), 1);
            assert!(started.elapsed() < Duration::from_secs(1));
            assert_eq!(reporter.messages(), vec![LogMessage::info(FAIL_TOKEN)]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_unresponsive_element_lookup_fails() {
            let browser = found().with_hanging_element();
            let (outcome, reporter) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::unavailable("Toast"),
                budget(),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            assert_eq!(browser.visibility_checks(), 0);
            assert_eq!(reporter.count(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_unresponsive_finder_fails() {
            let browser = MockBrowser::new().with_hanging_script(FIND_ELEMENTS_NAME);
            let (outcome, reporter) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Checkout"),
                budget(),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            assert_eq!(browser.visibility_checks(), 0);
            assert_eq!(reporter.messages(), vec![LogMessage::info(FAIL_TOKEN)]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_unresponsive_eraser_fails_before_locating() {
            let browser = found().with_hanging_script(ERASE_HIGHLIGHTS_NAME);
            let (outcome, reporter) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Checkout"),
                budget(),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            assert!(!browser.was_executed(FIND_ELEMENTS_NAME));
            assert_eq!(reporter.count(), 1);
        }
    }

    mod script_tests {
        use super::*;

        #[tokio::test]
        async fn test_eraser_runs_once_before_finder() {
            let browser = found().with_visibility([false, false, true]);
            run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Item"),
                PollConfig::attempts(5),
            )
            .await;
            assert_eq!(
                browser.executed_scripts(),
                vec![ERASE_HIGHLIGHTS_NAME.to_string(), FIND_ELEMENTS_NAME.to_string()]
            );
        }

        #[tokio::test]
        async fn test_eraser_failure_is_ignored() {
            let browser = found()
                .with_script_error(ERASE_HIGHLIGHTS_NAME, "stale")
                .with_visibility([true]);
            let (outcome, _) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Item"),
                PollConfig::attempts(2),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Pass);
        }

        #[tokio::test]
        async fn test_finder_arguments() {
            let browser = found().with_visibility([true]);
            run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Add to cart"),
                PollConfig::attempts(1),
            )
            .await;
            assert_eq!(
                browser.script_calls(FIND_ELEMENTS_NAME),
                vec![vec![
                    json!(r"Add\s+to\s+cart"),
                    Value::Null,
                    json!(true),
                    json!(false),
                    json!(false)
                ]]
            );
        }

        #[tokio::test]
        async fn test_resolved_marker_is_forwarded() {
            let store = MemoryStore::new().with("$section", "Shipping address");
            let browser = found().with_visibility([true]);
            run(
                &browser,
                &store,
                &AvailabilityRequest::available("Edit").with_marker("$section"),
                PollConfig::attempts(1),
            )
            .await;
            let args = &browser.script_calls(FIND_ELEMENTS_NAME)[0];
            assert_eq!(args[1], json!("Shipping address"));
        }

        #[tokio::test]
        async fn test_literal_marker_is_forwarded() {
            let browser = found().with_visibility([true]);
            run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Edit").with_marker("Billing"),
                PollConfig::attempts(1),
            )
            .await;
            assert_eq!(browser.script_calls(FIND_ELEMENTS_NAME)[0][1], json!("Billing"));
        }

        #[tokio::test]
        async fn test_unresolved_marker_is_null() {
            let browser = found().with_visibility([true]);
            run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Edit").with_marker("$nowhere"),
                PollConfig::attempts(1),
            )
            .await;
            assert_eq!(browser.script_calls(FIND_ELEMENTS_NAME)[0][1], Value::Null);
        }

        #[tokio::test]
        async fn test_selector_reference_is_resolved() {
            let store = MemoryStore::new().with("$order", json!({"id": 1042}));
            let browser = found().with_visibility([true]);
            run(
                &browser,
                &store,
                &AvailabilityRequest::available("$order['id']"),
                PollConfig::attempts(1),
            )
            .await;
            assert_eq!(browser.script_calls(FIND_ELEMENTS_NAME)[0][0], json!("1042"));
        }

        #[tokio::test]
        async fn test_unresolved_selector_sends_null_pattern() {
            let browser = MockBrowser::new();
            let (outcome, _) = run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("$missing"),
                PollConfig::attempts(1),
            )
            .await;
            assert_eq!(outcome, AssertionOutcome::Fail);
            assert_eq!(browser.script_calls(FIND_ELEMENTS_NAME)[0][0], Value::Null);
        }

        #[tokio::test]
        async fn test_polls_first_target() {
            let browser = MockBrowser::new()
                .with_found_targets(vec![json!("first"), json!("second")])
                .with_visibility([true]);
            run(
                &browser,
                &MemoryStore::new(),
                &AvailabilityRequest::available("Row"),
                PollConfig::attempts(1),
            )
            .await;
            assert!(browser.calls().contains(&MockCall::Element { target: json!("first") }));
        }
    }

    mod pattern_builder_tests {
        use super::*;

        struct Verbatim;

        impl PatternBuilder for Verbatim {
            fn build(&self, selector: &str) -> String {
                selector.to_string()
            }
        }

        #[tokio::test]
        async fn test_custom_pattern_builder() {
            let store = MemoryStore::new();
            let reporter = RecordingReporter::new();
            let browser = found().with_visibility([true]);
            let checker = AvailabilityChecker::new(&store, &reporter)
                .with_pattern_builder(&Verbatim)
                .with_poll_config(PollConfig::immediate());
            let outcome = checker
                .check(&browser, &AvailabilityRequest::available("a.b"))
                .await;
            assert_eq!(outcome, AssertionOutcome::Pass);
            assert_eq!(browser.script_calls(FIND_ELEMENTS_NAME)[0][0], json!("a.b"));
            assert_eq!(checker.poll_config().max_attempts, 1);
        }
    }
}
