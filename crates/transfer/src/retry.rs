use std::ops::Range;
use std::time::Duration;

use rand::Rng;

/// Jitter added to every backoff delay, in milliseconds. Independent of
/// the attempt number.
pub const JITTER_WINDOW_MS: Range<u64> = 25..125;

/// Attempts beyond this number stop growing the exponential term.
pub const MAX_BACKOFF_EXPONENT: u32 = 10;

/// Whether (and after how long) a failed attempt should be repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub should_retry: bool,
    pub delay: Duration,
}

/// Exponential backoff with jitter and a fixed retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry (before jitter).
    pub base_delay: Duration,
    /// Upper bound for any single delay, jitter included.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// 429 and every 5xx are transient; anything else is permanent.
    pub fn should_retry(status: u16) -> bool {
        status == 429 || (500..600).contains(&status)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        compute_backoff(attempt, self.base_delay, self.max_delay, rng)
    }

    /// Whether retry number `attempt` (1-based) is still within budget.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    /// Full decision for a failed response with `status` before retry
    /// number `attempt`.
    pub fn decide<R: Rng + ?Sized>(&self, status: u16, attempt: u32, rng: &mut R) -> RetryDecision {
        if Self::should_retry(status) && self.allows(attempt) {
            RetryDecision {
                should_retry: true,
                delay: self.backoff(attempt, rng),
            }
        } else {
            RetryDecision {
                should_retry: false,
                delay: Duration::ZERO,
            }
        }
    }
}

/// `base * 2^(min(attempt, 10) - 1)` plus jitter, capped at `max`.
///
/// Attempt numbering starts at 1; an attempt of 0 is treated as 1.
pub fn compute_backoff<R: Rng + ?Sized>(
    attempt: u32,
    base: Duration,
    max: Option<Duration>,
    rng: &mut R,
) -> Duration {
    let exp = attempt.clamp(1, MAX_BACKOFF_EXPONENT);
    let delay = base.saturating_mul(1u32 << (exp - 1));
    let jitter = Duration::from_millis(rng.gen_range(JITTER_WINDOW_MS));
    let total = delay.saturating_add(jitter);
    match max {
        Some(max) if total > max => max,
        _ => total,
    }
}
