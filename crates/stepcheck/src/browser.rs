//! Browser-control seam.
//!
//! The remote browser channel (WebDriver, CDP, ...) is owned by the embedding
//! runner. This module defines the two capabilities the availability checker
//! needs from it, running a page script and obtaining an element handle, and
//! ships [`MockBrowser`] for tests.
//!
//! ```text
//! ┌────────────────────┐   execute(script, args)   ┌──────────────────┐
//! │ AvailabilityChecker│ ─────────────────────────► │  BrowserControl  │
//! │                    │   element(target)          │  (runner-owned)  │
//! │                    │ ─────────────────────────► │                  │
//! └────────────────────┘                            └──────────────────┘
//!                                                          │
//!                                                   ElementHandle::is_displayed
//! ```

use crate::result::{StepcheckError, StepcheckResult};
use crate::scripts::{PageScript, FIND_ELEMENTS_NAME};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Handle to a DOM element in the page under test
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Whether the element is currently displayed
    async fn is_displayed(&self) -> StepcheckResult<bool>;
}

/// Remote browser control
#[async_trait]
pub trait BrowserControl: Send + Sync {
    /// Run a script in the page context with positional arguments
    async fn execute(&self, script: &PageScript, args: Vec<Value>) -> StepcheckResult<Value>;

    /// Get a handle for a target identifier returned by a page script
    async fn element(&self, target: &Value) -> StepcheckResult<Box<dyn ElementHandle>>;
}

// =============================================================================
// MOCK BROWSER
// =============================================================================

/// A call observed by [`MockBrowser`]
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `execute(script, args)`
    Execute {
        /// Script name
        script: String,
        /// Positional arguments
        args: Vec<Value>,
    },
    /// `element(target)`
    Element {
        /// Requested target
        target: Value,
    },
    /// `is_displayed()` on an element obtained for `target`
    IsDisplayed {
        /// Target the element was obtained for
        target: Value,
    },
}

/// Scripted reply for a page script
#[derive(Debug, Clone)]
enum MockReply {
    Value(Value),
    Fail(String),
    Hang,
}

#[derive(Debug, Default)]
struct MockState {
    replies: Mutex<HashMap<String, MockReply>>,
    visibility: Mutex<VecDeque<bool>>,
    missing_element: AtomicBool,
    hang_element: AtomicBool,
    hang_visibility: AtomicBool,
    visibility_timeout_ms: Mutex<Option<u64>>,
    history: Mutex<Vec<MockCall>>,
}

impl MockState {
    fn record(&self, call: MockCall) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn reply(&self, script: &str) -> Option<MockReply> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(script)
            .cloned()
    }

    fn set_reply(&self, script: &str, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(script.to_string(), reply);
    }

    /// Pop the next scripted visibility; the last entry repeats
    fn next_visibility(&self) -> bool {
        let mut queue = self
            .visibility
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if queue.len() > 1 {
            queue.pop_front().unwrap_or(false)
        } else {
            queue.front().copied().unwrap_or(false)
        }
    }
}

/// Browser double with scripted replies and call history.
///
/// Scripts without a configured reply return `null`. Elements report the
/// scripted visibility sequence; once it is down to one entry that entry
/// repeats forever, and an empty sequence means "not displayed". Clones share
/// replies and history.
#[derive(Debug, Default, Clone)]
pub struct MockBrowser {
    state: Arc<MockState>,
}

impl MockBrowser {
    /// Create a mock with no scripted replies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `script` with `value`
    #[must_use]
    pub fn with_script_result(self, script: &str, value: Value) -> Self {
        self.state.set_reply(script, MockReply::Value(value));
        self
    }

    /// Make `script` fail
    #[must_use]
    pub fn with_script_error(self, script: &str, message: &str) -> Self {
        self.state
            .set_reply(script, MockReply::Fail(message.to_string()));
        self
    }

    /// Make the element finder report these targets
    #[must_use]
    pub fn with_found_targets(self, targets: Vec<Value>) -> Self {
        let reply = serde_json::json!({ "success": true, "targetResults": targets });
        self.with_script_result(FIND_ELEMENTS_NAME, reply)
    }

    /// Successive `is_displayed` answers
    #[must_use]
    pub fn with_visibility(self, sequence: impl IntoIterator<Item = bool>) -> Self {
        *self
            .state
            .visibility
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = sequence.into_iter().collect();
        self
    }

    /// Make `element()` fail for every target
    #[must_use]
    pub fn with_missing_element(self) -> Self {
        self.state.missing_element.store(true, Ordering::SeqCst);
        self
    }

    /// Make `script` never answer
    #[must_use]
    pub fn with_hanging_script(self, script: &str) -> Self {
        self.state.set_reply(script, MockReply::Hang);
        self
    }

    /// Make `element()` never answer
    #[must_use]
    pub fn with_hanging_element(self) -> Self {
        self.state.hang_element.store(true, Ordering::SeqCst);
        self
    }

    /// Make `is_displayed()` never answer
    #[must_use]
    pub fn with_hanging_visibility(self) -> Self {
        self.state.hang_visibility.store(true, Ordering::SeqCst);
        self
    }

    /// Make `is_displayed()` time out after `ms` on every element
    #[must_use]
    pub fn with_visibility_timeout(self, ms: u64) -> Self {
        *self
            .state
            .visibility_timeout_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(ms);
        self
    }

    /// Every call observed so far
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.state
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of executed scripts, in order
    #[must_use]
    pub fn executed_scripts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Execute { script, .. } => Some(script),
                _ => None,
            })
            .collect()
    }

    /// Argument lists passed to `script`
    #[must_use]
    pub fn script_calls(&self, script: &str) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Execute { script: name, args } if name == script => Some(args),
                _ => None,
            })
            .collect()
    }

    /// Number of `is_displayed` checks
    #[must_use]
    pub fn visibility_checks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, MockCall::IsDisplayed { .. }))
            .count()
    }

    /// Check if a script was executed
    #[must_use]
    pub fn was_executed(&self, script: &str) -> bool {
        self.executed_scripts().iter().any(|name| name == script)
    }
}

/// Element produced by [`MockBrowser`]
#[derive(Debug)]
pub struct MockElement {
    target: Value,
    state: Arc<MockState>,
}

#[async_trait]
impl ElementHandle for MockElement {
    async fn is_displayed(&self) -> StepcheckResult<bool> {
        self.state.record(MockCall::IsDisplayed {
            target: self.target.clone(),
        });
        if self.state.hang_visibility.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        let timeout = *self
            .state
            .visibility_timeout_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match timeout {
            Some(ms) => Err(StepcheckError::Timeout { ms }),
            None => Ok(self.state.next_visibility()),
        }
    }
}

#[async_trait]
impl BrowserControl for MockBrowser {
    async fn execute(&self, script: &PageScript, args: Vec<Value>) -> StepcheckResult<Value> {
        self.state.record(MockCall::Execute {
            script: script.name().to_string(),
            args,
        });
        match self.state.reply(script.name()) {
            Some(MockReply::Value(value)) => Ok(value),
            Some(MockReply::Fail(message)) => Err(StepcheckError::script_failed(script.name(), message)),
            Some(MockReply::Hang) => std::future::pending().await,
            None => Ok(Value::Null),
        }
    }

    async fn element(&self, target: &Value) -> StepcheckResult<Box<dyn ElementHandle>> {
        self.state.record(MockCall::Element {
            target: target.clone(),
        });
        if self.state.hang_element.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        if self.state.missing_element.load(Ordering::SeqCst) {
            return Err(StepcheckError::ElementNotFound {
                target: target.to_string(),
            });
        }
        Ok(Box::new(MockElement {
            target: target.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}
