//! # Retry: run an operation until it succeeds.
//!
//! ```text
//! loop {
//!   ├─► operation()            ── Ok(v) ─► return Ok(v)
//!   ├─► policy exhausted?      ── yes   ─► return Err(last error)
//!   └─► sleep(policy.next_delay())
//! }
//! ```
//!
//! The first call runs before any delay is taken from the policy, so a policy
//! allowing `n` delays yields at most `n + 1` calls.
//!
//! [`retry_until_succeeded`] runs the same loop on its own task, checks the
//! token before every call and races it against every sleep.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::{ExhaustionPolicy, UntilCancelledConfig};
use crate::core::runner::{AfterExhaustion, Wake, after_exhaustion, sleep_or_cancel, spawn_once};
use crate::error::RetryError;
use crate::policies::{Backoff, chain_continues};

/// Boxed future produced by a [`lift`]ed operation.
pub type BoxOperationFuture<T, E> = BoxFuture<'static, Result<T, E>>;

/// Retries `operation` until it succeeds or `policy` is exhausted.
///
/// Returns the first success, or the last error once the policy is exhausted.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tinybackoff::{Constant, WithMaxAttempts, retry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = WithMaxAttempts::new(Constant::new(Duration::from_millis(1)), 4);
/// let mut calls = 0;
///
/// let value = retry(&policy, || {
///     calls += 1;
///     let n = calls;
///     async move {
///         if n < 3 {
///             Err(std::io::Error::other("not yet"))
///         } else {
///             Ok(n)
///         }
///     }
/// })
/// .await;
///
/// assert_eq!(value.unwrap(), 3);
/// # }
/// ```
pub async fn retry<F, Fut, T, E>(policy: &dyn Backoff, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempts = attempt, "operation succeeded after retries");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !chain_continues(policy) {
            debug!(attempts = attempt, "backoff exhausted, returning last error");
            return Err(err);
        }

        let delay = policy.next_delay();
        trace!(attempt, ?delay, "retry scheduled");
        time::sleep(delay).await;
    }
}

/// Spawns [`retry`] semantics until success or until `token` is cancelled.
///
/// The receiver yields exactly one value:
/// - `Ok(v)` on the first success
/// - `Err(RetryError::Cancelled)` on cancellation
/// - `Err(RetryError::Operation(e))` on exhaustion with [`ExhaustionPolicy::Stop`]
/// - `Err(RetryError::CannotReset)` on exhaustion with [`ExhaustionPolicy::Reset`]
///   when nothing in the chain can be reset
/// - `Err(RetryError::Panicked { .. })` if the operation panics
///
/// Uses [`UntilCancelledConfig::default`]; see [`retry_until_succeeded_with`].
///
/// # Panics
/// Panics if called outside a tokio runtime, since the loop is spawned with
/// [`tokio::spawn`].
pub fn retry_until_succeeded<F, Fut, T, E>(
    token: CancellationToken,
    policy: Arc<dyn Backoff>,
    operation: F,
) -> oneshot::Receiver<Result<T, RetryError<E>>>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: fmt::Debug + fmt::Display + Send + 'static,
{
    retry_until_succeeded_with(UntilCancelledConfig::default(), token, policy, operation)
}

/// [`retry_until_succeeded`] with explicit configuration.
///
/// # Panics
/// Panics if called outside a tokio runtime, since the loop is spawned with
/// [`tokio::spawn`].
pub fn retry_until_succeeded_with<F, Fut, T, E>(
    config: UntilCancelledConfig,
    token: CancellationToken,
    policy: Arc<dyn Backoff>,
    operation: F,
) -> oneshot::Receiver<Result<T, RetryError<E>>>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: fmt::Debug + fmt::Display + Send + 'static,
{
    spawn_once(retry_cancellable(
        config.on_exhausted,
        token,
        policy,
        operation,
    ))
}

async fn retry_cancellable<F, Fut, T, E>(
    on_exhausted: ExhaustionPolicy,
    token: CancellationToken,
    policy: Arc<dyn Backoff>,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Debug + fmt::Display + Send + 'static,
{
    let mut attempt: u64 = 0;

    loop {
        if token.is_cancelled() {
            debug!(attempts = attempt, "retry cancelled");
            return Err(RetryError::Cancelled);
        }

        attempt += 1;
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        debug!(attempt, error = %err, "operation failed");

        if !chain_continues(&*policy) {
            match after_exhaustion(&*policy, on_exhausted) {
                AfterExhaustion::Proceed => {}
                AfterExhaustion::Stop => {
                    debug!(attempts = attempt, "backoff exhausted, returning last error");
                    return Err(RetryError::Operation(err));
                }
                AfterExhaustion::CannotReset => return Err(RetryError::CannotReset),
            }
        }

        let delay = policy.next_delay();
        trace!(attempt, ?delay, "retry scheduled");
        if sleep_or_cancel(delay, &token).await == Wake::Cancelled {
            debug!(attempts = attempt, "retry cancelled during backoff");
            return Err(RetryError::Cancelled);
        }
    }
}

/// Adapts an operation returning `Result<(), E>` to one returning `Result<T, E>`.
///
/// `T::default()` stands in for the missing value.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tinybackoff::{Constant, WithMaxAttempts, lift, retry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = WithMaxAttempts::new(Constant::new(Duration::ZERO), 1);
/// let res: Result<Option<u8>, std::io::Error> =
///     retry(&policy, lift(|| async { Ok(()) })).await;
///
/// assert_eq!(res.unwrap(), None);
/// # }
/// ```
pub fn lift<F, Fut, T, E>(mut operation: F) -> impl FnMut() -> BoxOperationFuture<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    T: Default + Send + 'static,
    E: Send + 'static,
{
    move || {
        let fut = operation();
        async move { fut.await.map(|()| T::default()) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use crate::policies::{
        Combine, Constant, Continuable, Linear, Stoppable, WithMaxAttempts, WithStopAndCarryOn,
    };

    #[derive(Debug, thiserror::Error)]
    #[error("boom #{0}")]
    struct Boom(u32);

    const DELAY: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn test_first_success_never_sleeps() {
        let policy = WithMaxAttempts::new(Constant::new(DELAY), 4);
        let mut calls = 0;
        let started = time::Instant::now();

        let res = retry(&policy, || {
            calls += 1;
            async { Ok::<_, Boom>("done") }
        })
        .await;

        assert_eq!(res.ok(), Some("done"));
        assert_eq!(calls, 1);
        assert_eq!(policy.attempts(), 0);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(policy.can_continue());
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_then_success() {
        let policy = WithMaxAttempts::new(Constant::new(DELAY), 4);
        let mut calls = 0;
        let started = time::Instant::now();

        let res = retry(&policy, || {
            calls += 1;
            let n = calls;
            async move { if n <= 3 { Err(Boom(n)) } else { Ok(n) } }
        })
        .await;

        assert_eq!(res.ok(), Some(4));
        assert_eq!(calls, 4);
        assert_eq!(policy.attempts(), 3);

        let elapsed = started.elapsed();
        assert!(elapsed >= DELAY * 3, "slept {elapsed:?}");
        assert!(elapsed < DELAY * 4, "slept {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let policy = WithMaxAttempts::new(Constant::new(DELAY), 4);
        let mut calls = 0;

        let res = retry(&policy, || {
            calls += 1;
            let n = calls;
            async move { Err::<(), _>(Boom(n)) }
        })
        .await;

        assert!(matches!(res, Err(Boom(5))));
        assert!(!policy.can_continue());
    }

    #[tokio::test(start_paused = true)]
    async fn test_combine_segments_drive_delays() {
        let policy = Combine::new(
            Duration::ZERO,
            vec![
                Box::new(WithMaxAttempts::new(Constant::new(DELAY), 2)),
                Box::new(Linear::new(DELAY, 2, 2)),
            ],
        );
        let started = time::Instant::now();

        let res = retry(&policy, || async { Err::<(), _>(Boom(0)) }).await;

        assert!(res.is_err());
        // 0 + 100 + 100 + 200 + 400
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(800), "slept {elapsed:?}");
        assert!(elapsed < Duration::from_millis(810), "slept {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_succeeded_delivers_value() {
        let rx = retry_until_succeeded(
            CancellationToken::new(),
            Arc::new(Constant::new(DELAY)),
            || async { Ok::<_, Boom>(42u32) },
        );
        assert_eq!(rx.await.expect("loop sends its outcome").ok(), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_succeeded_cancel_beats_long_delay() {
        let token = CancellationToken::new();
        let rx = retry_until_succeeded(
            token.clone(),
            Arc::new(Constant::new(Duration::from_secs(24 * 60 * 60))),
            || async { Err::<(), _>(Boom(1)) },
        );

        let started = time::Instant::now();
        time::sleep(Duration::from_secs(2)).await;
        token.cancel();

        let res = rx.await.expect("loop sends its outcome");
        assert!(matches!(res, Err(RetryError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_succeeded_stops_with_last_error() {
        let policy = Arc::new(WithMaxAttempts::new(Constant::new(DELAY), 2));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let rx = retry_until_succeeded(CancellationToken::new(), policy, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err::<(), _>(Boom(n)) }
        });

        let res = rx.await.expect("loop sends its outcome");
        assert!(matches!(res, Err(RetryError::Operation(Boom(3)))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_succeeded_resets_until_cancelled() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let rx = retry_until_succeeded_with(
            UntilCancelledConfig::resetting(),
            token.clone(),
            Arc::new(WithMaxAttempts::new(Constant::new(DELAY), 2)),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Boom(0)) }
            },
        );

        time::sleep(Duration::from_millis(1050)).await;
        token.cancel();

        let res = rx.await.expect("loop sends its outcome");
        assert!(res.as_ref().is_err_and(RetryError::is_cancelled));
        assert!(calls.load(Ordering::SeqCst) > 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_succeeded_cannot_reset_non_resettable() {
        let policy = Arc::new(crate::policies::WithStopAndCarryOn::new(Constant::new(DELAY)));
        crate::policies::Stoppable::stop(&*policy);

        let rx = retry_until_succeeded_with(
            UntilCancelledConfig::resetting(),
            CancellationToken::new(),
            policy,
            || async { Err::<(), _>(Boom(0)) },
        );

        let res = rx.await.expect("loop sends its outcome");
        assert!(matches!(res, Err(RetryError::CannotReset)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_succeeded_reports_panic() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let rx = retry_until_succeeded(
            CancellationToken::new(),
            Arc::new(Constant::new(DELAY)),
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 2 {
                        panic!("second call panics");
                    }
                    Err::<(), _>(Boom(n))
                }
            },
        );

        let res = rx.await.expect("panic is reported as a value");
        assert_eq!(res.map_err(|e| e.as_label()), Err("retry_operation_panicked"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_succeeded_accepts_boxed_errors() {
        type DynError = Box<dyn std::error::Error + Send + Sync>;
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let rx = retry_until_succeeded(
            CancellationToken::new(),
            Arc::new(WithMaxAttempts::new(Constant::new(DELAY), 1)),
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err::<u8, DynError>(format!("refused #{n}").into()) }
            },
        );

        match rx.await.expect("loop sends its outcome") {
            Err(RetryError::Operation(e)) => assert_eq!(e.to_string(), "refused #2"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let rx = retry_until_succeeded(
            CancellationToken::new(),
            Arc::new(Constant::new(DELAY)),
            || async { Ok::<u8, DynError>(1) },
        );
        assert_eq!(rx.await.expect("loop sends its outcome").ok(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_from_another_task_ends_running_loop() {
        let policy = Arc::new(WithStopAndCarryOn::new(Constant::new(DELAY)));
        let stopper = policy.clone();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let rx = retry_until_succeeded(CancellationToken::new(), policy, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err::<(), _>(Boom(n)) }
        });
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(250)).await;
            stopper.stop();
        });

        // Calls at 0, 100, 200 and 300ms; the last one sees the stopped policy.
        let res = rx.await.expect("loop sends its outcome");
        assert!(matches!(res, Err(RetryError::Operation(Boom(4)))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lift_fills_placeholder() {
        let policy = WithMaxAttempts::new(Constant::new(DELAY), 2);
        let mut calls = 0;

        let res: Result<u32, Boom> = retry(
            &policy,
            lift(|| {
                calls += 1;
                let n = calls;
                async move { if n < 2 { Err(Boom(n)) } else { Ok(()) } }
            }),
        )
        .await;

        assert_eq!(res.ok(), Some(0));
        assert_eq!(calls, 2);
    }
}
