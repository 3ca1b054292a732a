//! # Stop / carry-on decorator.
//!
//! [`WithStopAndCarryOn`] adds external pause and resume to any [`Backoff`].
//!
//! ```text
//!        stop()               restart() / carry_on(delay)
//! running ─────► stopped ───────────────────────────────► running
//! ```
//!
//! While stopped, [`Backoff::next_delay`] returns the last computed delay and
//! leaves the base untouched, so no attempt is consumed.

use std::time::Duration;

use parking_lot::RwLock;
use tokio::time;

use crate::policies::capability::{Backoff, Continuable, Stoppable, chain_continues};

#[derive(Debug)]
struct State {
    running: bool,
    last_delay: Duration,
}

/// Adds pause/resume to a base policy.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tinybackoff::{Backoff, Constant, Continuable, Stoppable, WithStopAndCarryOn};
///
/// let policy = WithStopAndCarryOn::new(Constant::new(Duration::from_millis(20)));
/// assert!(policy.can_continue());
///
/// policy.stop();
/// assert!(!policy.can_continue());
///
/// policy.restart();
/// assert!(policy.can_continue());
/// ```
#[derive(Debug)]
pub struct WithStopAndCarryOn<B> {
    base: B,
    state: RwLock<State>,
}

impl<B: Backoff> WithStopAndCarryOn<B> {
    /// Wraps `base` in the running state.
    pub fn new(base: B) -> Self {
        Self {
            base,
            state: RwLock::new(State {
                running: true,
                last_delay: Duration::ZERO,
            }),
        }
    }

    /// Waits `delay`, then restarts.
    pub async fn carry_on(&self, delay: Duration) {
        time::sleep(delay).await;
        self.restart();
    }

    /// Returns `true` unless stopped.
    pub fn is_running(&self) -> bool {
        self.state.read().running
    }
}

impl<B: Backoff> Backoff for WithStopAndCarryOn<B> {
    fn next_delay(&self) -> Duration {
        let mut state = self.state.write();
        if !state.running || !chain_continues(&self.base) {
            return state.last_delay;
        }

        state.last_delay = self.base.next_delay();
        state.last_delay
    }

    fn inner(&self) -> Option<&dyn Backoff> {
        Some(&self.base)
    }

    fn continuable(&self) -> Option<&dyn Continuable> {
        Some(self)
    }

    fn stoppable(&self) -> Option<&dyn Stoppable> {
        Some(self)
    }
}

impl<B: Backoff> Continuable for WithStopAndCarryOn<B> {
    fn can_continue(&self) -> bool {
        self.state.read().running && chain_continues(&self.base)
    }
}

impl<B: Backoff> Stoppable for WithStopAndCarryOn<B> {
    fn stop(&self) {
        self.state.write().running = false;
    }

    fn restart(&self) {
        self.state.write().running = true;
    }
}
