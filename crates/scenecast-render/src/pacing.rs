//! Submission pacing: rate-limit backoff and inter-job spacing.
//!
//! The provider's quota window is fixed, so the cooldown is a constant per
//! attempt rather than exponential. Exhausting the attempt budget is not an
//! error; it is the signal that triggers the fallback substituter.

use std::time::Duration;

/// What to do after a rate-limited submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffDecision {
    /// Wait this long, then resubmit exactly once.
    RetryAfter(Duration),
    /// Attempt budget spent; degrade to the fallback result.
    GiveUp,
}

/// Bounded constant-cooldown retry policy for rate-limited submissions.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub cooldown: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// Decide after the `attempt`-th submission (1-based) was rate limited.
    pub fn on_rate_limit(&self, attempt: u32) -> BackoffDecision {
        if attempt < self.max_attempts {
            BackoffDecision::RetryAfter(self.cooldown)
        } else {
            BackoffDecision::GiveUp
        }
    }
}

/// Minimum spacing between successive job submissions, keeping the run
/// under the provider's requests-per-minute ceiling.
#[derive(Debug, Clone)]
pub struct RateGovernor {
    pub inter_job_delay: Duration,
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self {
            inter_job_delay: Duration::from_secs(30),
        }
    }
}

impl RateGovernor {
    /// Delay applied after a genuinely successful job, never after a
    /// fallback or a failure.
    pub fn pause(&self) -> Duration {
        self.inter_job_delay
    }
}
