//! Retry policy for transient inference failures.

use std::time::Duration;

use serde::Serialize;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed(#[serde(with = "secs_f64")] Duration),
    /// `initial * factor^(retry - 1)`, capped at `max`.
    Exponential {
        #[serde(with = "secs_f64")]
        initial: Duration,
        factor: f64,
        #[serde(with = "secs_f64")]
        max: Duration,
    },
}

impl Backoff {
    /// Doubling backoff starting at `initial`, capped at one minute.
    pub fn exponential(initial: Duration) -> Self {
        Self::Exponential {
            initial,
            factor: 2.0,
            max: Duration::from_secs(60),
        }
    }
}

/// How many attempts the gateway makes and how long it waits between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never zero.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_secs(5)),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Returns the delay to wait after `failed_attempt` (1-based) before
    /// starting the next one.
    pub fn delay_before(&self, failed_attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential {
                initial,
                factor,
                max,
            } => {
                let exponent = failed_attempt.saturating_sub(1) as i32;
                let scaled = initial.as_secs_f64() * factor.powi(exponent);
                if !scaled.is_finite() || scaled >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(scaled.max(0.0))
                }
            }
        }
    }

    pub fn has_attempts_left(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

mod secs_f64 {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}
