//! # Repeat: run an operation while it keeps succeeding.
//!
//! ```text
//! loop {
//!   ├─► operation()            ── Err(e) ─► return Err(e)
//!   ├─► policy exhausted?      ── yes    ─► return Ok(())
//!   └─► sleep(policy.next_delay())
//! }
//! ```
//!
//! The first call runs before any delay is taken from the policy, so a policy
//! allowing `n` delays yields `n + 1` calls when every call succeeds.
//!
//! [`repeat_until_cancelled`] runs the same loop on its own task, checks the
//! token before every call and races it against every sleep.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::{ExhaustionPolicy, UntilCancelledConfig};
use crate::core::runner::{AfterExhaustion, Wake, after_exhaustion, sleep_or_cancel, spawn_once};
use crate::error::RetryError;
use crate::policies::{Backoff, chain_continues};

/// Repeats `operation` while it succeeds and `policy` allows it.
///
/// Returns the first error, or `Ok(())` once the policy is exhausted.
/// Exhaustion is not an error.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tinybackoff::{Constant, WithMaxAttempts, repeat};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = WithMaxAttempts::new(Constant::new(Duration::from_millis(1)), 2);
/// let mut calls = 0;
///
/// let res: Result<(), std::io::Error> = repeat(&policy, || {
///     calls += 1;
///     async { Ok(()) }
/// })
/// .await;
///
/// assert!(res.is_ok());
/// assert_eq!(calls, 3);
/// # }
/// ```
pub async fn repeat<F, Fut, E>(policy: &dyn Backoff, mut operation: F) -> Result<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        if let Err(e) = operation().await {
            debug!(attempt, "operation failed, repeat stopped");
            return Err(e);
        }

        if !chain_continues(policy) {
            debug!(attempts = attempt, "backoff exhausted, repeat finished");
            return Ok(());
        }

        let delay = policy.next_delay();
        trace!(attempt, ?delay, "next repetition scheduled");
        time::sleep(delay).await;
    }
}

/// Spawns [`repeat`] semantics until `token` is cancelled.
///
/// The receiver yields exactly one value:
/// - `Ok(())` on cancellation, or on exhaustion with [`ExhaustionPolicy::Stop`]
/// - `Err(RetryError::Operation(e))` on the first failure
/// - `Err(RetryError::CannotReset)` on exhaustion with [`ExhaustionPolicy::Reset`]
///   when nothing in the chain can be reset
/// - `Err(RetryError::Panicked { .. })` if the operation panics
///
/// Uses [`UntilCancelledConfig::default`]; see [`repeat_until_cancelled_with`].
///
/// # Panics
/// Panics if called outside a tokio runtime, since the loop is spawned with
/// [`tokio::spawn`].
pub fn repeat_until_cancelled<F, Fut, E>(
    token: CancellationToken,
    policy: Arc<dyn Backoff>,
    operation: F,
) -> oneshot::Receiver<Result<(), RetryError<E>>>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Debug + fmt::Display + Send + 'static,
{
    repeat_until_cancelled_with(UntilCancelledConfig::default(), token, policy, operation)
}

/// [`repeat_until_cancelled`] with explicit configuration.
///
/// # Panics
/// Panics if called outside a tokio runtime, since the loop is spawned with
/// [`tokio::spawn`].
pub fn repeat_until_cancelled_with<F, Fut, E>(
    config: UntilCancelledConfig,
    token: CancellationToken,
    policy: Arc<dyn Backoff>,
    operation: F,
) -> oneshot::Receiver<Result<(), RetryError<E>>>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Debug + fmt::Display + Send + 'static,
{
    spawn_once(repeat_cancellable(
        config.on_exhausted,
        token,
        policy,
        operation,
    ))
}

async fn repeat_cancellable<F, Fut, E>(
    on_exhausted: ExhaustionPolicy,
    token: CancellationToken,
    policy: Arc<dyn Backoff>,
    mut operation: F,
) -> Result<(), RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: fmt::Debug + fmt::Display + Send + 'static,
{
    let mut attempt: u64 = 0;

    loop {
        if token.is_cancelled() {
            debug!(attempts = attempt, "repeat cancelled");
            return Ok(());
        }

        attempt += 1;
        if let Err(e) = operation().await {
            debug!(attempt, error = %e, "operation failed, repeat stopped");
            return Err(RetryError::Operation(e));
        }

        if !chain_continues(&*policy) {
            match after_exhaustion(&*policy, on_exhausted) {
                AfterExhaustion::Proceed => {}
                AfterExhaustion::Stop => {
                    debug!(attempts = attempt, "backoff exhausted, repeat finished");
                    return Ok(());
                }
                AfterExhaustion::CannotReset => return Err(RetryError::CannotReset),
            }
        }

        let delay = policy.next_delay();
        trace!(attempt, ?delay, "next repetition scheduled");
        if sleep_or_cancel(delay, &token).await == Wake::Cancelled {
            debug!(attempts = attempt, "repeat cancelled during backoff");
            return Ok(());
        }
    }
}
