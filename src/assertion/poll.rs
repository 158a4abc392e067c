//! Polling state machine that decides when to retry an assertion.
//!
//! ```text
//! Attempting -> Evaluating -> Satisfied
//!                          -> RetryScheduled -> Attempting
//!                          -> Failed
//! ```
//!
//! The poller owns timeout bookkeeping. It never runs an attempt itself;
//! callers perform the attempt, hand over the verdict, and wait when told.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{AssertionError, Verdict};
use crate::ports::Clock;

/// Where a polling loop currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// An attempt is being made.
    Attempting,
    /// The attempt's subject is being evaluated.
    Evaluating,
    /// Expectations hold; stop polling.
    Satisfied,
    /// Wait this long, then attempt again.
    RetryScheduled(Duration),
    /// Give up with this error.
    Failed(AssertionError),
}

/// Tracks attempts and the retry budget for one command invocation.
pub struct Poller<'a> {
    clock: &'a dyn Clock,
    started: DateTime<Utc>,
    timeout: Duration,
    interval: Duration,
    attempts: u32,
    state: PollState,
}

impl<'a> Poller<'a> {
    /// Starts a new polling loop with the given budget and retry interval.
    #[must_use]
    pub fn start(clock: &'a dyn Clock, timeout: Duration, interval: Duration) -> Self {
        Self {
            clock,
            started: clock.now(),
            timeout,
            interval,
            attempts: 0,
            state: PollState::Attempting,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Number of attempts begun so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Marks the start of an attempt.
    pub fn begin_attempt(&mut self) {
        debug_assert_eq!(self.state, PollState::Attempting);
        self.attempts += 1;
        self.state = PollState::Attempting;
    }

    /// Marks the attempt's subject as ready for evaluation.
    pub fn begin_evaluation(&mut self) {
        self.state = PollState::Evaluating;
    }

    /// Applies a verdict and returns the resulting state.
    pub fn evaluated(&mut self, verdict: Verdict) -> &PollState {
        self.state = match verdict {
            Verdict::Satisfied => PollState::Satisfied,
            Verdict::Failed(err) => PollState::Failed(err),
            Verdict::Retryable(err) => {
                let elapsed = self.elapsed();
                if elapsed >= self.timeout {
                    PollState::Failed(self.timed_out(err))
                } else {
                    PollState::RetryScheduled(self.interval.min(self.timeout - elapsed))
                }
            }
        };
        &self.state
    }

    /// Waits out a scheduled retry and moves back to [`PollState::Attempting`].
    pub async fn wait(&mut self) {
        if let PollState::RetryScheduled(delay) = self.state {
            tracing::trace!(attempt = self.attempts, delay_ms = delay.as_millis(), "Retrying");
            self.clock.sleep(delay).await;
            self.state = PollState::Attempting;
        }
    }

    /// Time spent since the loop started, according to the clock.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        (self.clock.now() - self.started).to_std().unwrap_or(Duration::ZERO)
    }

    fn timed_out(&self, err: AssertionError) -> AssertionError {
        AssertionError {
            message: format!(
                "Timed out retrying after {}ms: {}",
                self.timeout.as_millis(),
                err.message
            ),
            ..err
        }
    }
}
