//! # Engine configuration.
//!
//! - [`UntilCancelledConfig`] settings for the cancellable loops
//!   ([`repeat_until_cancelled`](crate::repeat_until_cancelled),
//!   [`retry_until_succeeded`](crate::retry_until_succeeded)).
//! - [`Attempts`] per-segment retry budgets for the segment front ends
//!   ([`repeat_segments`](crate::repeat_segments),
//!   [`retry_segments`](crate::retry_segments)).

/// What a cancellable loop does when its policy is exhausted before cancellation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExhaustionPolicy {
    /// Terminate and report the last outcome (default).
    #[default]
    Stop,
    /// Reset the policy through its chain and keep going until cancelled.
    ///
    /// A policy with nothing resettable in its chain ends the loop with
    /// [`RetryError::CannotReset`](crate::RetryError::CannotReset).
    Reset,
}

/// Settings for the cancellable loops.
///
/// ## Field semantics
/// - `on_exhausted`: reaction to policy exhaustion while the token is still live
#[derive(Clone, Debug, Default)]
pub struct UntilCancelledConfig {
    /// Reaction to policy exhaustion. Defaults to [`ExhaustionPolicy::Stop`].
    pub on_exhausted: ExhaustionPolicy,
}

impl UntilCancelledConfig {
    /// Config that keeps resetting the policy until cancellation.
    pub fn resetting() -> Self {
        Self {
            on_exhausted: ExhaustionPolicy::Reset,
        }
    }
}

/// Retry budgets for a sequence of segments.
///
/// - `Same(n)`: every segment gets `n` further attempts
/// - `Different(v)`: segment `i` gets `v[i]`; segments past the end reuse the
///   last entry; an empty list means `0`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attempts {
    /// One budget for every segment.
    Same(u32),
    /// A budget per segment.
    Different(Vec<u32>),
}

impl Attempts {
    /// Returns the budget of segment `index`.
    ///
    /// # Example
    /// ```
    /// use tinybackoff::Attempts;
    ///
    /// let attempts = Attempts::Different(vec![1, 3]);
    /// assert_eq!(attempts.budget(0), 1);
    /// assert_eq!(attempts.budget(1), 3);
    /// assert_eq!(attempts.budget(7), 3);
    /// ```
    pub fn budget(&self, index: usize) -> u32 {
        match self {
            Attempts::Same(n) => *n,
            Attempts::Different(budgets) => budgets
                .get(index)
                .or_else(|| budgets.last())
                .copied()
                .unwrap_or(0),
        }
    }
}

impl Default for Attempts {
    /// Returns `Attempts::Same(3)`.
    fn default() -> Self {
        Attempts::Same(3)
    }
}

impl From<u32> for Attempts {
    fn from(n: u32) -> Self {
        Attempts::Same(n)
    }
}

impl From<Vec<u32>> for Attempts {
    fn from(budgets: Vec<u32>) -> Self {
        Attempts::Different(budgets)
    }
}

impl<const N: usize> From<[u32; N]> for Attempts {
    fn from(budgets: [u32; N]) -> Self {
        Attempts::Different(budgets.to_vec())
    }
}
