//! # Pieces shared by the engine loops.
//!
//! - [`sleep_or_cancel`] the inter-attempt sleep, raced against a [`CancellationToken`]
//! - [`after_exhaustion`] applies [`ExhaustionPolicy`] when a cancellable loop runs out of attempts
//! - [`spawn_once`] runs a loop on its own task and hands back a single-value channel
//!
//! ## Rules
//! - The sleep is the only suspension point besides the operation itself
//! - Cancellation wins over an elapsed sleep when both are ready
//! - Exactly one value is sent per spawned loop; the sender is consumed by the send
//! - A panic in the loop is caught and sent as [`RetryError::Panicked`]

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::ExhaustionPolicy;
use crate::error::RetryError;
use crate::policies::{Backoff, as_resettable, chain_continues};

/// How an interruptible sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    Elapsed,
    Cancelled,
}

/// Sleeps for `delay` unless `token` is cancelled first.
pub(crate) async fn sleep_or_cancel(delay: Duration, token: &CancellationToken) -> Wake {
    let sleep = time::sleep(delay);
    tokio::pin!(sleep);

    select! {
        biased;
        _ = token.cancelled() => Wake::Cancelled,
        _ = &mut sleep => Wake::Elapsed,
    }
}

/// Next step of a cancellable loop whose policy is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AfterExhaustion {
    /// The policy was reset and can continue.
    Proceed,
    /// The loop ends with its last outcome.
    Stop,
    /// Reset was requested but nothing in the chain could make the policy continue.
    CannotReset,
}

pub(crate) fn after_exhaustion(
    policy: &dyn Backoff,
    on_exhausted: ExhaustionPolicy,
) -> AfterExhaustion {
    match on_exhausted {
        ExhaustionPolicy::Stop => AfterExhaustion::Stop,
        ExhaustionPolicy::Reset => {
            let Some(resettable) = as_resettable(policy) else {
                debug!("backoff exhausted, no resettable policy in chain");
                return AfterExhaustion::CannotReset;
            };

            resettable.reset();
            if chain_continues(policy) {
                debug!("backoff exhausted, policy reset");
                AfterExhaustion::Proceed
            } else {
                debug!("backoff still exhausted after reset");
                AfterExhaustion::CannotReset
            }
        }
    }
}

/// Spawns `fut` and returns a receiver for its single output.
pub(crate) fn spawn_once<Fut, T, E>(fut: Fut) -> oneshot::Receiver<Result<T, RetryError<E>>>
where
    Fut: Future<Output = Result<T, RetryError<E>>> + Send + 'static,
    T: Send + 'static,
    E: fmt::Debug + fmt::Display + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic_err) => {
                let info = {
                    let any = &*panic_err;
                    if let Some(msg) = any.downcast_ref::<&'static str>() {
                        (*msg).to_string()
                    } else if let Some(msg) = any.downcast_ref::<String>() {
                        msg.clone()
                    } else {
                        "unknown panic".to_string()
                    }
                };
                debug!(%info, "operation panicked");
                Err(RetryError::Panicked { info })
            }
        };
        if tx.send(outcome).is_err() {
            trace!("result receiver dropped before completion");
        }
    });
    rx
}
