//! Execution engine: the loops that drive an operation through a policy.
//!
//! The public API from this module is re-exported at the crate root.
//!
//! Internal modules:
//! - [`runner`]: interruptible sleep, exhaustion handling and the single-value task handoff;
//! - [`repeat`]: run while the operation succeeds;
//! - [`retry`]: run until the operation succeeds;
//! - [`segments`]: multi-segment front ends over both loops.

mod repeat;
mod retry;
mod runner;
mod segments;

pub use repeat::{repeat, repeat_until_cancelled, repeat_until_cancelled_with};
pub use retry::{BoxOperationFuture, lift, retry, retry_until_succeeded, retry_until_succeeded_with};
pub use segments::{Segment, repeat_segments, retry_segments};
