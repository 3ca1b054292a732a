//! # Backoff capabilities and wrap-chain discovery.
//!
//! Every policy implements [`Backoff`], which only promises a next delay.
//! Three optional capabilities sit on top of it:
//! - [`Continuable`] reports whether attempts remain;
//! - [`Resettable`] returns attempt counters to zero;
//! - [`Stoppable`] lets a caller force exhaustion and release it again.
//!
//! A policy advertises a capability through the narrowing hooks on [`Backoff`]
//! ([`Backoff::continuable`], [`Backoff::resettable`], [`Backoff::stoppable`]).
//! Decorators also expose the policy they own through [`Backoff::inner`], which
//! links policies into a chain:
//!
//! ```text
//! WithStopAndCarryOn ──inner──► WithMaxAttempts ──inner──► Linear (leaf)
//!   stoppable()                   continuable()              continuable()
//!   continuable()                 resettable()               resettable()
//! ```
//!
//! [`as_continuable`], [`as_resettable`] and [`as_stoppable`] walk that chain
//! outside-in and return the first policy offering the capability. The walk is
//! capped at [`MAX_UNWRAP_DEPTH`] hops.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tinybackoff::{as_resettable, Constant, WithMaxAttempts, WithStopAndCarryOn};
//!
//! let stoppable = WithStopAndCarryOn::new(Constant::new(Duration::from_millis(10)));
//! assert!(as_resettable(&stoppable).is_none());
//!
//! let bounded = WithMaxAttempts::new(Constant::new(Duration::from_millis(10)), 3);
//! assert!(as_resettable(&bounded).is_some());
//! ```

use std::sync::Arc;
use std::time::Duration;

/// Maximum number of [`Backoff::inner`] hops followed during discovery.
pub const MAX_UNWRAP_DEPTH: usize = 32;

/// # Source of successive delays.
///
/// The only required method is [`Backoff::next_delay`]. The remaining methods
/// have defaults that advertise no capability and no inner policy; implementors
/// override the hooks matching the capability traits they implement.
pub trait Backoff: Send + Sync {
    /// Returns the delay to wait before the next attempt.
    fn next_delay(&self) -> Duration;

    /// Returns the policy this one decorates, if any.
    fn inner(&self) -> Option<&dyn Backoff> {
        None
    }

    /// Narrows `self` to [`Continuable`] when supported.
    fn continuable(&self) -> Option<&dyn Continuable> {
        None
    }

    /// Narrows `self` to [`Resettable`] when supported.
    fn resettable(&self) -> Option<&dyn Resettable> {
        None
    }

    /// Narrows `self` to [`Stoppable`] when supported.
    fn stoppable(&self) -> Option<&dyn Stoppable> {
        None
    }
}

/// Capability: reports whether attempts remain.
pub trait Continuable: Backoff {
    /// Returns `false` once the policy is exhausted.
    fn can_continue(&self) -> bool;
}

/// Capability: returns attempt counters to zero.
///
/// Decorators cascade the reset to any resettable policy in their chain.
pub trait Resettable: Backoff {
    /// Resets attempt counters.
    fn reset(&self);
}

/// Capability: external pause/resume on top of [`Continuable`].
pub trait Stoppable: Continuable {
    /// Forces [`Continuable::can_continue`] to `false` until [`Stoppable::restart`].
    fn stop(&self);

    /// Restores normal evaluation of [`Continuable::can_continue`].
    fn restart(&self);
}

/// Returns the immediate base of `backoff`, or `None` for a leaf.
pub fn unwrap_backoff(backoff: &dyn Backoff) -> Option<&dyn Backoff> {
    backoff.inner()
}

/// Finds the first [`Continuable`] in the wrap chain of `backoff`.
pub fn as_continuable(backoff: &dyn Backoff) -> Option<&dyn Continuable> {
    let mut current = backoff;
    for _ in 0..=MAX_UNWRAP_DEPTH {
        if let Some(found) = current.continuable() {
            return Some(found);
        }
        current = current.inner()?;
    }
    None
}

/// Finds the first [`Resettable`] in the wrap chain of `backoff`.
pub fn as_resettable(backoff: &dyn Backoff) -> Option<&dyn Resettable> {
    let mut current = backoff;
    for _ in 0..=MAX_UNWRAP_DEPTH {
        if let Some(found) = current.resettable() {
            return Some(found);
        }
        current = current.inner()?;
    }
    None
}

/// Finds the first [`Stoppable`] in the wrap chain of `backoff`.
pub fn as_stoppable(backoff: &dyn Backoff) -> Option<&dyn Stoppable> {
    let mut current = backoff;
    for _ in 0..=MAX_UNWRAP_DEPTH {
        if let Some(found) = current.stoppable() {
            return Some(found);
        }
        current = current.inner()?;
    }
    None
}

/// `true` unless something in the chain is [`Continuable`] and exhausted.
pub(crate) fn chain_continues(backoff: &dyn Backoff) -> bool {
    as_continuable(backoff).is_none_or(|c| c.can_continue())
}

macro_rules! forward_backoff {
    ($($ptr:ident),*) => {$(
        impl<B: Backoff + ?Sized> Backoff for $ptr<B> {
            fn next_delay(&self) -> Duration {
                (**self).next_delay()
            }

            fn inner(&self) -> Option<&dyn Backoff> {
                (**self).inner()
            }

            fn continuable(&self) -> Option<&dyn Continuable> {
                (**self).continuable()
            }

            fn resettable(&self) -> Option<&dyn Resettable> {
                (**self).resettable()
            }

            fn stoppable(&self) -> Option<&dyn Stoppable> {
                (**self).stoppable()
            }
        }

        impl<B: Continuable + ?Sized> Continuable for $ptr<B> {
            fn can_continue(&self) -> bool {
                (**self).can_continue()
            }
        }

        impl<B: Resettable + ?Sized> Resettable for $ptr<B> {
            fn reset(&self) {
                (**self).reset()
            }
        }

        impl<B: Stoppable + ?Sized> Stoppable for $ptr<B> {
            fn stop(&self) {
                (**self).stop()
            }

            fn restart(&self) {
                (**self).restart()
            }
        }
    )*};
}

forward_backoff!(Box, Arc);
