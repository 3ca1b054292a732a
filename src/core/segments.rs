//! # Multi-segment front ends.
//!
//! [`repeat_segments`] and [`retry_segments`] take a list of delay sources
//! instead of a single policy. Each [`Segment`] gets its own attempt budget
//! (from [`Attempts`] or its own override) and runs to exhaustion before the
//! next one starts. The outcome of the last call is carried across segment
//! boundaries.
//!
//! ```text
//! result = operation()                         // no delay
//! for (i, segment) in segments {
//!     policy = WithMaxAttempts(segment, budget(i))
//!     while result wants another call && policy.can_continue() {
//!         sleep(policy.next_delay())
//!         result = operation()
//!     }
//! }
//! return result
//! ```
//!
//! Budgets count calls after the first one: `n` segments with budget `b`
//! make at most `1 + n * b` calls.

use std::future::Future;

use tokio::time;
use tracing::{debug, trace};

use crate::config::Attempts;
use crate::policies::{Backoff, Continuable, WithMaxAttempts};

type BuildBackoff = Box<dyn FnOnce(u32) -> Box<dyn Backoff> + Send>;

enum Source {
    Built(Box<dyn Backoff>),
    PerBudget(BuildBackoff),
}

/// One delay source in a multi-segment run.
pub struct Segment {
    source: Source,
    attempts: Option<u32>,
}

impl Segment {
    /// Segment using the run-wide budget.
    pub fn new(backoff: impl Backoff + 'static) -> Self {
        Self {
            source: Source::Built(Box::new(backoff)),
            attempts: None,
        }
    }

    /// Segment whose delay source is built from the segment's own budget.
    ///
    /// `build` runs when the segment starts and receives the budget the
    /// segment ends up with (run-wide or overridden), so a source can scale
    /// to it, e.g. an [`Exponential`](crate::Exponential) reaching its
    /// maximum on the segment's last attempt.
    ///
    /// # Example
    /// ```rust
    /// use std::time::Duration;
    /// use tinybackoff::{Exponential, Segment};
    ///
    /// let segment = Segment::per_budget(|budget| {
    ///     Exponential::new(Duration::from_secs(1), budget)
    /// });
    /// ```
    pub fn per_budget<B, F>(build: F) -> Self
    where
        B: Backoff + 'static,
        F: FnOnce(u32) -> B + Send + 'static,
    {
        Self {
            source: Source::PerBudget(Box::new(move |budget| -> Box<dyn Backoff> { Box::new(build(budget)) })),
            attempts: None,
        }
    }

    /// Overrides the run-wide budget for this segment.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    fn into_policy(self, budget: u32) -> WithMaxAttempts<Box<dyn Backoff>> {
        let budget = self.attempts.unwrap_or(budget);
        let backoff = match self.source {
            Source::Built(backoff) => backoff,
            Source::PerBudget(build) => build(budget),
        };
        WithMaxAttempts::new(backoff, budget)
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match self.source {
            Source::Built(_) => "built",
            Source::PerBudget(_) => "per_budget",
        };
        f.debug_struct("Segment")
            .field("source", &source)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

/// Repeats `operation` through `segments` while it keeps succeeding.
///
/// Returns the first error, or `Ok(())` once every segment is exhausted.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tinybackoff::{Constant, Segment, repeat_segments};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut calls = 0;
/// let res: Result<(), std::io::Error> = repeat_segments(
///     2u32,
///     vec![
///         Segment::new(Constant::new(Duration::from_millis(1))),
///         Segment::new(Constant::new(Duration::from_millis(2))).with_attempts(1),
///     ],
///     || {
///         calls += 1;
///         async { Ok(()) }
///     },
/// )
/// .await;
///
/// assert!(res.is_ok());
/// assert_eq!(calls, 4);
/// # }
/// ```
pub async fn repeat_segments<F, Fut, E>(
    attempts: impl Into<Attempts>,
    segments: Vec<Segment>,
    mut operation: F,
) -> Result<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let attempts = attempts.into();
    let mut result = operation().await;

    for (index, segment) in segments.into_iter().enumerate() {
        let policy = segment.into_policy(attempts.budget(index));
        trace!(segment = index, budget = policy.max_attempts(), "repeat segment started");

        while result.is_ok() && policy.can_continue() {
            time::sleep(policy.next_delay()).await;
            result = operation().await;
        }
        if result.is_err() {
            debug!(segment = index, attempt = policy.attempts(), "operation failed, repeat stopped");
            return result;
        }
    }

    result
}

/// Retries `operation` through `segments` until it succeeds.
///
/// Returns the first success, or the last error once every segment is
/// exhausted.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tinybackoff::{Attempts, Linear, Segment, retry_segments};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut calls = 0;
/// let res = retry_segments(
///     Attempts::Different(vec![1, 2]),
///     vec![
///         Segment::new(Linear::new(Duration::from_millis(1), 1, 1)),
///         Segment::new(Linear::new(Duration::from_millis(2), 2, 1)),
///     ],
///     || {
///         calls += 1;
///         let n = calls;
///         async move { if n < 4 { Err(std::io::Error::other("down")) } else { Ok(n) } }
///     },
/// )
/// .await;
///
/// assert_eq!(res.unwrap(), 4);
/// # }
/// ```
pub async fn retry_segments<F, Fut, T, E>(
    attempts: impl Into<Attempts>,
    segments: Vec<Segment>,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.into();
    let mut result = operation().await;

    for (index, segment) in segments.into_iter().enumerate() {
        let policy = segment.into_policy(attempts.budget(index));
        trace!(segment = index, budget = policy.max_attempts(), "retry segment started");

        while result.is_err() && policy.can_continue() {
            time::sleep(policy.next_delay()).await;
            result = operation().await;
        }
        if result.is_ok() {
            debug!(segment = index, attempt = policy.attempts(), "operation succeeded");
            return result;
        }
    }

    if result.is_err() {
        debug!("all segments exhausted, returning last error");
    }
    result
}
