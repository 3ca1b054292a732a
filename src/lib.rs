//! # tinybackoff
//!
//! **tinybackoff** is a small library of composable backoff policies and the
//! loops that drive a fallible async operation through them.
//!
//! A policy decides how long to wait before the next attempt and, optionally,
//! whether another attempt is allowed at all. Policies are built by wrapping
//! a delay source in decorators; the engine discovers what the whole chain
//! can do by walking it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌──────────────────────────────────────────────────────────────────┐
//!  │  Policy graph (built by the caller)                              │
//!  │                                                                  │
//!  │   Jittered ─► WithStopAndCarryOn ─► WithMaxAttempts ─► Linear    │
//!  │      │               │                    │               │      │
//!  │   inner()         inner()              inner()          leaf     │
//!  │                                                                  │
//!  │   Combine[Once(initial), policy #1, policy #2, ...]              │
//!  │      └─ inner() = active element                                 │
//!  └──────┬───────────────────────────────────────────────────────────┘
//!         │ as_continuable / as_resettable / as_stoppable
//!         │ (walk inner() until a policy exposes the capability)
//!         ▼
//!  ┌──────────────────────────────────────────────────────────────────┐
//!  │  Engine                                                          │
//!  │  - repeat / retry                 (awaited on the caller's task) │
//!  │  - repeat_until_cancelled /       (spawned, one result on a      │
//!  │    retry_until_succeeded           oneshot channel)              │
//!  │  - repeat_segments / retry_segments (one budget per segment)     │
//!  └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! loop {
//!   ├─► token cancelled?  ─► finish            (cancellable variants only)
//!   ├─► operation()
//!   │       ├─ repeat: Err ─► finish with the error
//!   │       └─ retry:  Ok  ─► finish with the value
//!   ├─► chain exhausted?
//!   │       ├─ ExhaustionPolicy::Stop  ─► finish with the last outcome
//!   │       └─ ExhaustionPolicy::Reset ─► reset chain, or CannotReset
//!   └─► sleep(policy.next_delay())       (raced against the token)
//! }
//! ```
//!
//! The first call always runs without a delay: a policy allowing `n` delays
//! yields at most `n + 1` calls.
//!
//! ## Features
//! | Area              | Description                                              | Key types / functions                                     |
//! |-------------------|----------------------------------------------------------|-----------------------------------------------------------|
//! | **Capabilities**  | Optional abilities a policy may expose.                  | [`Backoff`], [`Continuable`], [`Resettable`], [`Stoppable`] |
//! | **Discovery**     | Find a capability anywhere in the wrap chain.            | [`as_continuable`], [`as_resettable`], [`as_stoppable`]   |
//! | **Delay sources** | Constant, linear, power and exponential growth.          | [`Constant`], [`Linear`], [`Power`], [`Exponential`]      |
//! | **Decorators**    | Attempt ceilings, pause/resume, sequencing, jitter.      | [`WithMaxAttempts`], [`WithStopAndCarryOn`], [`Combine`], [`Jittered`] |
//! | **Engine**        | Repeat/retry loops, blocking and cancellable.            | [`repeat`], [`retry`], [`repeat_until_cancelled`], [`retry_until_succeeded`] |
//! | **Segments**      | Several delay sources with per-segment budgets.          | [`repeat_segments`], [`retry_segments`], [`Segment`], [`Attempts`] |
//! | **Errors**        | Terminal errors of the cancellable loops.                | [`RetryError`]                                            |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tinybackoff::{Exponential, RetryError, WithMaxAttempts, retry_until_succeeded};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let policy = Arc::new(WithMaxAttempts::new(
//!         Exponential::new(Duration::from_millis(50), 3),
//!         5,
//!     ));
//!     let token = CancellationToken::new();
//!
//!     let mut calls = 0;
//!     let rx = retry_until_succeeded(token.clone(), policy, move || {
//!         calls += 1;
//!         let n = calls;
//!         async move {
//!             if n < 3 {
//!                 Err(std::io::Error::other("service unavailable"))
//!             } else {
//!                 Ok(n)
//!             }
//!         }
//!     });
//!
//!     match rx.await {
//!         Ok(Ok(n)) => assert_eq!(n, 3),
//!         Ok(Err(RetryError::Cancelled)) => println!("cancelled"),
//!         Ok(Err(e)) => println!("gave up: {e}"),
//!         Err(_) => println!("loop task dropped"),
//!     }
//! }
//! ```
mod config;
mod core;
mod error;
mod policies;

// ---- Public re-exports ----

pub use config::{Attempts, ExhaustionPolicy, UntilCancelledConfig};
pub use core::{
    BoxOperationFuture, Segment, lift, repeat, repeat_segments, repeat_until_cancelled,
    repeat_until_cancelled_with, retry, retry_segments, retry_until_succeeded,
    retry_until_succeeded_with,
};
pub use error::RetryError;
pub use policies::{
    Backoff, Combine, Constant, Continuable, Exponential, JitterPolicy, Jittered, Linear,
    MAX_UNWRAP_DEPTH, Power, Resettable, Stoppable, WithMaxAttempts, WithStopAndCarryOn,
    as_continuable, as_resettable, as_stoppable, unwrap_backoff,
};
