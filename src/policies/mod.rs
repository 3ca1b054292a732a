//! Backoff policies and the capability model they share.
//!
//! This module groups everything that decides **how long** to wait between
//! attempts and **whether** another attempt is allowed.
//!
//! ## Contents
//! - [`Backoff`] and the optional capabilities [`Continuable`], [`Resettable`], [`Stoppable`]
//! - discovery through the wrap chain: [`as_continuable`], [`as_resettable`], [`as_stoppable`]
//! - delay sources: [`Constant`], [`Linear`], [`Power`], [`Exponential`]
//! - decorators: [`WithMaxAttempts`], [`WithStopAndCarryOn`], [`Combine`], [`Jittered`]
//!
//! ## Quick wiring
//! ```text
//! Jittered ─► WithMaxAttempts ─► Exponential
//!     └─► core::{retry, repeat, ...} ask:
//!          - as_continuable(policy) after each attempt
//!          - policy.next_delay() before each sleep
//! ```
//!
//! ## Capabilities
//! | Policy               | Continuable | Resettable | Stoppable |
//! |----------------------|-------------|------------|-----------|
//! | `Constant`           |             |            |           |
//! | `Linear`, `Power`    | yes         | yes        |           |
//! | `Exponential`        |             | yes        |           |
//! | `WithMaxAttempts`    | yes         | yes        |           |
//! | `WithStopAndCarryOn` | yes         |            | yes       |
//! | `Combine`            | yes         | yes        |           |
//! | `Jittered`           |             |            |           |
//!
//! Decorators expose their base, so a capability missing on the outer policy
//! may still be found further down the chain.

mod backoff;
mod capability;
mod combine;
mod jitter;
mod max_attempts;
mod stop;

pub use backoff::{Constant, Exponential, Linear, Power};
pub use capability::{
    Backoff, Continuable, MAX_UNWRAP_DEPTH, Resettable, Stoppable, as_continuable, as_resettable,
    as_stoppable, unwrap_backoff,
};
pub use combine::Combine;
pub use jitter::{JitterPolicy, Jittered};
pub use max_attempts::WithMaxAttempts;
pub use stop::WithStopAndCarryOn;

pub(crate) use capability::chain_continues;
