//! # Attempt ceiling decorator.
//!
//! [`WithMaxAttempts`] bounds any [`Backoff`] to a fixed number of delays.
//! The ceiling can only narrow continuation: if the base (or anything it wraps)
//! is [`Continuable`] and exhausted, the decorator is exhausted too.
//!
//! The counter moves on every [`Backoff::next_delay`] call whether or not the
//! caller checked [`Continuable::can_continue`] first.

use std::time::Duration;

use parking_lot::RwLock;

use crate::policies::capability::{
    Backoff, Continuable, Resettable, as_resettable, chain_continues,
};

/// Adds an attempt ceiling on top of a base policy.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tinybackoff::{Backoff, Constant, Continuable, Resettable, WithMaxAttempts};
///
/// let policy = WithMaxAttempts::new(Constant::new(Duration::from_millis(100)), 2);
///
/// assert_eq!(policy.next_delay(), Duration::from_millis(100));
/// assert_eq!(policy.next_delay(), Duration::from_millis(100));
/// assert!(!policy.can_continue());
///
/// policy.reset();
/// assert!(policy.can_continue());
/// ```
#[derive(Debug)]
pub struct WithMaxAttempts<B> {
    base: B,
    max_attempts: u32,
    attempts: RwLock<u32>,
}

impl<B: Backoff> WithMaxAttempts<B> {
    /// Wraps `base`, allowing at most `max_attempts` delays.
    pub fn new(base: B, max_attempts: u32) -> Self {
        Self {
            base,
            max_attempts,
            attempts: RwLock::new(0),
        }
    }

    /// Returns the configured ceiling.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns how many delays were handed out since construction or the last reset.
    pub fn attempts(&self) -> u32 {
        *self.attempts.read()
    }
}

impl<B: Backoff> Backoff for WithMaxAttempts<B> {
    fn next_delay(&self) -> Duration {
        let mut attempts = self.attempts.write();
        *attempts = attempts.saturating_add(1);
        self.base.next_delay()
    }

    fn inner(&self) -> Option<&dyn Backoff> {
        Some(&self.base)
    }

    fn continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }

    fn resettable(&self) -> Option<&dyn Resettable> {
        Some(self)
    }
}

impl<B: Backoff> Continuable for WithMaxAttempts<B> {
    fn can_continue(&self) -> bool {
        let attempts = self.attempts.read();
        *attempts < self.max_attempts && chain_continues(&self.base)
    }
}

impl<B: Backoff> Resettable for WithMaxAttempts<B> {
    fn reset(&self) {
        let mut attempts = self.attempts.write();
        *attempts = 0;

        if let Some(base) = as_resettable(&self.base) {
            base.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{Constant, Exponential, Linear};

    const DELAY: Duration = Duration::from_millis(100);

    #[test]
    fn test_exactly_n_delays_before_exhaustion() {
        for n in [0u32, 1, 4, 9] {
            let policy = WithMaxAttempts::new(Constant::new(DELAY), n);
            let mut taken = 0;
            while policy.can_continue() {
                assert_eq!(policy.next_delay(), DELAY);
                taken += 1;
            }
            assert_eq!(taken, n);
            assert_eq!(policy.attempts(), n);
        }
    }

    #[test]
    fn test_ceiling_only_narrows_base_exhaustion() {
        let policy = WithMaxAttempts::new(Linear::new(DELAY, 2, 1), 5);
        let mut taken = 0;
        while policy.can_continue() {
            policy.next_delay();
            taken += 1;
        }
        assert_eq!(taken, 2);
    }

    #[test]
    fn test_counter_moves_without_continue_check() {
        let policy = WithMaxAttempts::new(Constant::new(DELAY), 1);
        policy.next_delay();
        policy.next_delay();
        assert_eq!(policy.attempts(), 2);
        assert!(!policy.can_continue());
    }

    #[test]
    fn test_reset_cascades_to_base() {
        let policy = WithMaxAttempts::new(Linear::new(DELAY, 2, 1), 5);
        assert_eq!(policy.next_delay(), DELAY);
        assert_eq!(policy.next_delay(), DELAY * 2);
        assert!(!policy.can_continue());

        policy.reset();
        assert!(policy.can_continue());
        assert_eq!(policy.attempts(), 0);
        assert_eq!(policy.next_delay(), DELAY);
    }

    #[test]
    fn test_reset_replays_same_sequence() {
        let build = || WithMaxAttempts::new(Exponential::new(Duration::from_secs(10), 3), 4);
        let fresh = build();
        let reused = build();

        while reused.can_continue() {
            reused.next_delay();
        }
        reused.reset();

        let mut expected = Vec::new();
        while fresh.can_continue() {
            expected.push(fresh.next_delay());
        }
        let mut replayed = Vec::new();
        while reused.can_continue() {
            replayed.push(reused.next_delay());
        }
        assert_eq!(replayed, expected);
        assert_eq!(replayed.len(), 4);
    }
}
