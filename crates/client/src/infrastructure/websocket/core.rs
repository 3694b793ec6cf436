//! Runtime-agnostic pieces of the connection engine.
//!
//! Reconnection backoff math and small synchronisation helpers. Nothing in
//! here touches tokio or the socket, so it can be tested in isolation.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::ClientConfig;

/// Exponential backoff policy: `min(base * 2^(attempt - 1), cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    max_attempts: u32,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            cap,
            max_attempts,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.reconnect_base_delay,
            config.reconnect_max_delay,
            config.max_reconnect_attempts,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait before the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

/// Reconnect attempt counter for one connection.
///
/// Persists across a whole reconnection sequence and is reset whenever a
/// connection opens.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackoffState {
    attempts: u32,
}

impl BackoffState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self, policy: &Backoff) -> bool {
        self.attempts >= policy.max_attempts
    }

    /// Advance to the next attempt.
    ///
    /// Returns the attempt number and the delay to wait *before* performing it,
    /// or `None` once the policy's attempts are used up.
    pub fn next_delay_and_advance(&mut self, policy: &Backoff) -> Option<(u32, Duration)> {
        if self.is_exhausted(policy) {
            return None;
        }

        self.attempts += 1;
        Some((self.attempts, policy.delay_for(self.attempts)))
    }
}

/// Lock a std mutex, recovering the data if a listener panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
