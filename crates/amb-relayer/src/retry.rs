//! Bounded exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry budget for one saga step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Fraction of the delay randomized in either direction (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Fixed-delay policy without jitter.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            max_attempts,
            initial_delay_ms: ms,
            max_delay_ms: ms,
            multiplier: 1.0,
            jitter: 0.0,
        }
    }

    /// Attempts allowed, at least one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let base = self.initial_delay_ms as f64 * self.multiplier.max(1.0).powi(exponent);
        let capped = base.min(self.max_delay_ms as f64);

        let jitter = self.jitter.clamp(0.0, 1.0);
        let delayed = if jitter > 0.0 && capped > 0.0 {
            let spread = capped * jitter;
            let offset = rand::thread_rng().gen_range(-spread..=spread);
            (capped + offset).max(0.0)
        } else {
            capped
        };
        Duration::from_millis(delayed as u64)
    }
}
