//! # Jitter for backoff delays.
//!
//! [`Jittered`] decorates any [`Backoff`] and randomizes the delays it returns
//! according to a [`JitterPolicy`], to keep many clients from retrying in lockstep.
//!
//! - [`JitterPolicy::None`] no randomization, predictable delays
//! - [`JitterPolicy::Full`] random delay in [0, delay]
//! - [`JitterPolicy::Equal`] delay/2 + random[0, delay/2]
//! - [`JitterPolicy::Decorrelated`] random[delay, prev × 3], capped
//! - [`JitterPolicy::Deviation`] delay + random[0, deviation)
//!
//! Randomization works in nanoseconds; durations past `u64::MAX` ns are
//! clamped to that.
//!
//! The random source is injected. [`Jittered::new`] seeds a [`StdRng`] from
//! the thread RNG; [`Jittered::with_rng`] takes a caller-built one, e.g.
//! `StdRng::seed_from_u64(..)` for reproducible sequences.

use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::policies::capability::Backoff;

/// Policy controlling randomization of backoff delays.
///
/// ## Trade-offs
/// - **None**: Predictable, but risks thundering herd
/// - **Full**: Maximum randomness, can cut delays to zero
/// - **Equal**: Balanced, keeps at least half of each delay
/// - **Decorrelated**: Stateful, grows from the previous jittered delay
/// - **Deviation**: Never shortens a delay, only adds bounded noise
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// No jitter: use exact backoff delay.
    #[default]
    None,

    /// Full jitter: random delay in [0, delay].
    Full,

    /// Equal jitter: delay = delay/2 + random[0, delay/2].
    Equal,

    /// Decorrelated jitter: delay = random[delay, prev × 3], capped at `cap`.
    ///
    /// The base delay acts as the floor; `prev` is the previous jittered output.
    Decorrelated {
        /// Upper bound for any produced delay.
        cap: Duration,
    },

    /// Additive noise: delay + random[0, deviation).
    Deviation(Duration),
}

impl JitterPolicy {
    /// Applies jitter to `delay`, `prev` being the previous jittered delay (if any).
    pub fn apply<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        delay: Duration,
        prev: Option<Duration>,
    ) -> Duration {
        match *self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => full_jitter(rng, delay),
            JitterPolicy::Equal => equal_jitter(rng, delay),
            JitterPolicy::Decorrelated { cap } => {
                decorrelated_jitter(rng, delay, prev.unwrap_or(delay), cap)
            }
            JitterPolicy::Deviation(deviation) => deviation_jitter(rng, delay, deviation),
        }
    }
}

/// Whole nanoseconds of `d`, saturating at `u64::MAX`.
fn nanos(d: Duration) -> u64 {
    d.as_nanos().min(u128::from(u64::MAX)) as u64
}

/// Full jitter: random[0, delay]
fn full_jitter<R: Rng + ?Sized>(rng: &mut R, delay: Duration) -> Duration {
    let total = nanos(delay);
    if total == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rng.random_range(0..=total))
}

/// Equal jitter: delay/2 + random[0, delay/2]
fn equal_jitter<R: Rng + ?Sized>(rng: &mut R, delay: Duration) -> Duration {
    let total = nanos(delay);
    if total == 0 {
        return Duration::ZERO;
    }
    let half = total / 2;
    Duration::from_nanos(half + rng.random_range(0..=total - half))
}

fn decorrelated_jitter<R: Rng + ?Sized>(
    rng: &mut R,
    base: Duration,
    prev: Duration,
    cap: Duration,
) -> Duration {
    let floor = nanos(base);
    let upper = nanos(prev).saturating_mul(3).min(nanos(cap)).max(floor);

    if floor >= upper {
        return base;
    }
    Duration::from_nanos(rng.random_range(floor..=upper))
}

fn deviation_jitter<R: Rng + ?Sized>(
    rng: &mut R,
    delay: Duration,
    deviation: Duration,
) -> Duration {
    let spread = nanos(deviation);
    if spread == 0 {
        return delay;
    }
    delay.saturating_add(Duration::from_nanos(rng.random_range(0..spread)))
}

#[derive(Debug)]
struct State {
    rng: StdRng,
    prev: Option<Duration>,
}

/// Randomizes the delays of a base policy.
///
/// Capabilities of the base (continuation, reset, stop) stay reachable
/// through discovery, since the decorator exposes its base as
/// [`Backoff::inner`].
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use rand::{SeedableRng, rngs::StdRng};
/// use tinybackoff::{Backoff, Constant, JitterPolicy, Jittered};
///
/// let policy = Jittered::with_rng(
///     Constant::new(Duration::from_millis(100)),
///     JitterPolicy::Deviation(Duration::from_millis(50)),
///     StdRng::seed_from_u64(7),
/// );
///
/// let delay = policy.next_delay();
/// assert!(delay >= Duration::from_millis(100));
/// assert!(delay < Duration::from_millis(150));
/// ```
#[derive(Debug)]
pub struct Jittered<B> {
    base: B,
    policy: JitterPolicy,
    state: Mutex<State>,
}

impl<B: Backoff> Jittered<B> {
    /// Wraps `base` with an RNG seeded from the thread RNG.
    pub fn new(base: B, policy: JitterPolicy) -> Self {
        Self::with_rng(base, policy, StdRng::from_rng(&mut rand::rng()))
    }

    /// Wraps `base` with the given RNG.
    pub fn with_rng(base: B, policy: JitterPolicy, rng: StdRng) -> Self {
        Self {
            base,
            policy,
            state: Mutex::new(State { rng, prev: None }),
        }
    }

    /// Returns the jitter policy in use.
    pub fn policy(&self) -> JitterPolicy {
        self.policy
    }
}

impl<B: Backoff> Backoff for Jittered<B> {
    fn next_delay(&self) -> Duration {
        let delay = self.base.next_delay();

        let mut state = self.state.lock();
        let prev = state.prev;
        let jittered = self.policy.apply(&mut state.rng, delay, prev);
        state.prev = Some(jittered);
        jittered
    }

    fn inner(&self) -> Option<&dyn Backoff> {
        Some(&self.base)
    }
}
