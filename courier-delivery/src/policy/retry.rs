//! Retry policy for delivery operations.
//!
//! Connection verification and message transmission retry independently,
//! each with its own attempt budget, per-attempt timeout and backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay applied between two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backoff {
    /// Wait `step_ms * attempt` after the given (1-indexed) attempt.
    Linear { step_ms: u64 },

    /// Wait the same delay after every attempt.
    Fixed { delay_ms: u64 },

    /// Retry immediately.
    None,
}

/// Retry policy for one kind of delivery operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,

    /// Upper bound on a single attempt, in milliseconds.
    pub timeout_ms: u64,

    /// Delay between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Policy for verifying a freshly opened connection.
    ///
    /// Three attempts, ten seconds each, with a linear backoff of one second
    /// times the attempt number.
    #[must_use]
    pub const fn verification() -> Self {
        Self {
            max_attempts: defaults::verify_max_attempts(),
            timeout_ms: defaults::verify_timeout_ms(),
            backoff: Backoff::Linear {
                step_ms: defaults::verify_backoff_step_ms(),
            },
        }
    }

    /// Policy for transmitting a message over a verified connection.
    ///
    /// Two attempts, fifteen seconds each, one second apart.
    #[must_use]
    pub const fn send() -> Self {
        Self {
            max_attempts: defaults::send_max_attempts(),
            timeout_ms: defaults::send_timeout_ms(),
            backoff: Backoff::Fixed {
                delay_ms: defaults::send_retry_delay_ms(),
            },
        }
    }

    /// Get the number of remaining attempts.
    ///
    /// Returns `0` if max attempts has been reached.
    #[must_use]
    pub const fn remaining_attempts(&self, attempt_count: u32) -> u32 {
        self.max_attempts.saturating_sub(attempt_count)
    }

    /// Check if the 1-indexed `attempt` is the last one allowed.
    #[must_use]
    pub const fn is_final_attempt(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Per-attempt time limit.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay to wait after the 1-indexed `attempt` failed.
    #[must_use]
    pub const fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Linear { step_ms } => {
                Duration::from_millis(step_ms.saturating_mul(attempt as u64))
            }
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::None => Duration::ZERO,
        }
    }
}

pub(crate) mod defaults {
    use super::RetryPolicy;

    pub const fn verify_max_attempts() -> u32 {
        3
    }

    pub const fn verify_timeout_ms() -> u64 {
        10_000
    }

    pub const fn verify_backoff_step_ms() -> u64 {
        1_000
    }

    pub const fn send_max_attempts() -> u32 {
        2
    }

    pub const fn send_timeout_ms() -> u64 {
        15_000
    }

    pub const fn send_retry_delay_ms() -> u64 {
        1_000
    }

    pub const fn verification() -> RetryPolicy {
        RetryPolicy::verification()
    }

    pub const fn send() -> RetryPolicy {
        RetryPolicy::send()
    }
}
