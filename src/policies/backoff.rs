//! # Delay sources.
//!
//! Leaf policies that compute a delay from their own attempt counter:
//! - [`Constant`]: always `delay`, stateless, no capabilities;
//! - [`Linear`]: `delay × multiplier × n`, continuable and resettable;
//! - [`Power`]: `delay × base^n`, continuable and resettable;
//! - [`Exponential`]: `max_delay / e^(attempts_to_reach_max − n)`, resettable only.
//!
//! `n` is the 1-based attempt number, clamped to the source's attempt limit, so
//! a source keeps returning its largest delay after the limit is reached. Any
//! computation that overflows saturates to [`Duration::MAX`].
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use tinybackoff::{Backoff, Continuable, Linear};
//!
//! let linear = Linear::new(Duration::from_millis(100), 3, 2);
//!
//! assert_eq!(linear.next_delay(), Duration::from_millis(200));
//! assert_eq!(linear.next_delay(), Duration::from_millis(400));
//! assert_eq!(linear.next_delay(), Duration::from_millis(600));
//! assert!(!linear.can_continue());
//! ```

use std::time::Duration;

use parking_lot::RwLock;

use crate::policies::capability::{Backoff, Continuable, Resettable};

/// Constant delay source.
#[derive(Clone, Copy, Debug)]
pub struct Constant {
    delay: Duration,
}

impl Constant {
    /// Creates a source that always returns `delay`.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Backoff for Constant {
    fn next_delay(&self) -> Duration {
        self.delay
    }
}

/// Linearly growing delay source.
///
/// Delay for attempt `n` is `delay × multiplier × n`, `n` clamped to `max_attempts`.
#[derive(Debug)]
pub struct Linear {
    delay: Duration,
    max_attempts: u32,
    multiplier: u32,
    attempts: RwLock<u32>,
}

impl Linear {
    /// Creates a linear source exhausted after `max_attempts` delays.
    pub fn new(delay: Duration, max_attempts: u32, multiplier: u32) -> Self {
        Self {
            delay,
            max_attempts,
            multiplier,
            attempts: RwLock::new(0),
        }
    }
}

impl Backoff for Linear {
    fn next_delay(&self) -> Duration {
        let mut attempts = self.attempts.write();
        *attempts = attempts.saturating_add(1);

        let n = (*attempts).min(self.max_attempts);
        self.delay
            .checked_mul(self.multiplier)
            .and_then(|d| d.checked_mul(n))
            .unwrap_or(Duration::MAX)
    }

    fn continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }

    fn resettable(&self) -> Option<&dyn Resettable> {
        Some(self)
    }
}

impl Continuable for Linear {
    fn can_continue(&self) -> bool {
        *self.attempts.read() < self.max_attempts
    }
}

impl Resettable for Linear {
    fn reset(&self) {
        *self.attempts.write() = 0;
    }
}

/// Delay source growing by powers of `base`.
///
/// Delay for attempt `n` is `delay × base^n`, `n` clamped to `max_attempts`.
#[derive(Debug)]
pub struct Power {
    delay: Duration,
    max_attempts: u32,
    base: u32,
    attempts: RwLock<u32>,
}

impl Power {
    /// Creates a power source exhausted after `max_attempts` delays.
    pub fn new(delay: Duration, max_attempts: u32, base: u32) -> Self {
        Self {
            delay,
            max_attempts,
            base,
            attempts: RwLock::new(0),
        }
    }
}

impl Backoff for Power {
    fn next_delay(&self) -> Duration {
        let mut attempts = self.attempts.write();
        *attempts = attempts.saturating_add(1);

        let n = (*attempts).min(self.max_attempts);
        self.base
            .checked_pow(n)
            .and_then(|factor| self.delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    fn continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }

    fn resettable(&self) -> Option<&dyn Resettable> {
        Some(self)
    }
}

impl Continuable for Power {
    fn can_continue(&self) -> bool {
        *self.attempts.read() < self.max_attempts
    }
}

impl Resettable for Power {
    fn reset(&self) {
        *self.attempts.write() = 0;
    }
}

/// Delay source approaching `max_delay` exponentially.
///
/// Delay for attempt `n` is `max_delay / e^(attempts_to_reach_max − n)`, `n`
/// clamped to `attempts_to_reach_max`. It never reports exhaustion on its own;
/// wrap it in [`WithMaxAttempts`](crate::WithMaxAttempts) to bound it.
#[derive(Debug)]
pub struct Exponential {
    max_delay: Duration,
    attempts_to_reach_max: u32,
    attempts: RwLock<u32>,
}

impl Exponential {
    /// Creates an exponential source reaching `max_delay` on attempt `attempts_to_reach_max`.
    pub fn new(max_delay: Duration, attempts_to_reach_max: u32) -> Self {
        Self {
            max_delay,
            attempts_to_reach_max,
            attempts: RwLock::new(0),
        }
    }
}

impl Backoff for Exponential {
    fn next_delay(&self) -> Duration {
        let mut attempts = self.attempts.write();
        *attempts = attempts.saturating_add(1);

        let n = (*attempts).min(self.attempts_to_reach_max);
        let exp = f64::from(self.attempts_to_reach_max - n).exp();
        let nanos = self.max_delay.as_nanos() as f64 / exp;

        if !nanos.is_finite() || nanos >= u64::MAX as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(nanos as u64)
    }

    fn resettable(&self) -> Option<&dyn Resettable> {
        Some(self)
    }
}

impl Resettable for Exponential {
    fn reset(&self) {
        *self.attempts.write() = 0;
    }
}
