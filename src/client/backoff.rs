//! Retry/backoff state machine
//!
//! Retry handling is modeled as an explicit little machine (attempt counter
//! plus next-delay computation) instead of loop-local state, so it can be
//! tested in isolation from any network I/O.

use std::time::Duration;

/// Retry budget shared by all calls of an [`super::ApiClient`]
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt. `3` means up to 4 attempts.
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,

    /// Ceiling for any single delay, including server-provided hints.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }
}

/// Per-call backoff state. Created fresh for every logical fetch, so retry
/// counters never leak between calls.
#[derive(Debug)]
pub struct Backoff {
    policy: RetryPolicy,
    retries_used: u32,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            retries_used: 0,
        }
    }

    /// Total attempts made so far, counting the initial one.
    pub fn attempts(&self) -> u32 {
        self.retries_used + 1
    }

    /// Consumes one retry and returns the delay to sleep before it.
    ///
    /// A server-provided `Retry-After` hint overrides the exponential
    /// schedule but is still clamped to the policy ceiling. Returns `None`
    /// when the retry budget is exhausted.
    pub fn next_delay(&mut self, hint: Option<Duration>) -> Option<Duration> {
        if self.retries_used >= self.policy.max_retries {
            return None;
        }
        // Exponent capped so the shift cannot overflow on absurd budgets.
        let exponential = self
            .policy
            .base_delay
            .saturating_mul(1u32 << self.retries_used.min(16));
        self.retries_used += 1;
        Some(hint.unwrap_or(exponential).min(self.policy.max_delay))
    }
}
