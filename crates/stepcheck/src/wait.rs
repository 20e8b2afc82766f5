//! Bounded polling.
//!
//! A [`Poller`] re-evaluates an async predicate until it returns `true`, the
//! attempt budget is spent, or the timeout has elapsed. The first attempt runs
//! immediately; later attempts are spaced by the poll interval. Each attempt is
//! itself cut off at the timeout, so a predicate that never resolves still
//! ends the poll. Running out of time is reported in the [`PollOutcome`], not
//! as an error.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default poll timeout (5 seconds)
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 5_000;

/// Default interval between attempts (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Retry budget for a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Stop once this much time has passed after an attempt
    pub timeout: Duration,
    /// Delay between attempts
    pub poll_interval: Duration,
    /// Maximum number of attempts (0 = unlimited within timeout)
    pub max_attempts: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: 0,
        }
    }
}

impl PollConfig {
    /// Create a config with a timeout and the default interval
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: 0,
        }
    }

    /// A single attempt, no waiting
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
            max_attempts: 1,
        }
    }

    /// Exactly `attempts` attempts with no delay between them
    #[must_use]
    pub const fn attempts(attempts: usize) -> Self {
        Self {
            timeout: Duration::MAX,
            poll_interval: Duration::ZERO,
            max_attempts: attempts,
        }
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the maximum number of attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = max;
        self
    }

    fn attempts_exhausted(&self, attempts: usize) -> bool {
        self.max_attempts > 0 && attempts >= self.max_attempts
    }
}

/// Result of a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Whether the predicate returned `true`
    pub satisfied: bool,
    /// Number of predicate evaluations
    pub attempts: usize,
    /// Time spent polling
    pub elapsed: Duration,
}

impl PollOutcome {
    /// Predicate held on attempt `attempts`
    #[must_use]
    pub const fn satisfied(attempts: usize, elapsed: Duration) -> Self {
        Self {
            satisfied: true,
            attempts,
            elapsed,
        }
    }

    /// Budget spent without the predicate holding
    #[must_use]
    pub const fn exhausted(attempts: usize, elapsed: Duration) -> Self {
        Self {
            satisfied: false,
            attempts,
            elapsed,
        }
    }
}

/// Wall-clock budget shared by the steps of one check
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    timeout: Duration,
}

impl Deadline {
    /// Start a budget of `timeout` now
    #[must_use]
    pub fn start(timeout: Duration) -> Self {
        Self {
            start: Instant::now(),
            timeout,
        }
    }

    /// Time spent since the budget started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left, zero once expired
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.elapsed())
    }

    /// Check if the budget is spent
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.timeout
    }

    /// Drive `future` until it completes or the budget runs out.
    ///
    /// Returns `None` if the budget ran out first. A future that is ready on
    /// its first poll completes even with no time left.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::time::timeout(self.remaining(), future).await.ok()
    }
}

/// Sequential retry loop over an async predicate
#[derive(Debug, Clone, Copy, Default)]
pub struct Poller {
    config: PollConfig,
}

impl Poller {
    /// Create a poller
    #[must_use]
    pub const fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Get the config
    #[must_use]
    pub const fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Start a deadline for this poller's timeout
    #[must_use]
    pub fn deadline(&self) -> Deadline {
        Deadline::start(self.config.timeout)
    }

    /// Evaluate `check` until it returns `true` or the budget is spent
    pub async fn until<F, Fut>(&self, check: F) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.until_deadline(self.deadline(), check).await
    }

    /// Like [`until`](Self::until), against a deadline started earlier.
    ///
    /// An attempt still pending when the deadline passes counts as `false`.
    pub async fn until_deadline<F, Fut>(&self, deadline: Deadline, mut check: F) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match deadline.run(check()).await {
                Some(true) => return PollOutcome::satisfied(attempts, deadline.elapsed()),
                Some(false) => {}
                None => debug!(attempt = attempts, "poll attempt did not finish in time"),
            }

            if self.config.attempts_exhausted(attempts) || deadline.is_expired() {
                return PollOutcome::exhausted(attempts, deadline.elapsed());
            }

            if self.config.poll_interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
    }
}
