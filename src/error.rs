//! Error types returned by the cancellable engine loops.
//!
//! [`repeat`](crate::repeat) and [`retry`](crate::retry) hand back the
//! operation's own error unchanged. The cancellable variants
//! ([`repeat_until_cancelled`](crate::repeat_until_cancelled),
//! [`retry_until_succeeded`](crate::retry_until_succeeded)) can also end for
//! reasons that are not the operation's fault, so they report a
//! [`RetryError`] wrapping the operation error.

use std::fmt;

use thiserror::Error;

/// # Terminal errors of a cancellable loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RetryError<E>
where
    E: fmt::Debug + fmt::Display + Send + 'static,
{
    /// The cancellation token fired before the operation succeeded.
    #[error("retry cancelled")]
    Cancelled,

    /// The policy was exhausted and nothing in its chain can be reset.
    #[error("backoff exhausted and cannot be reset")]
    CannotReset,

    /// The operation failed and the loop stopped on that failure.
    ///
    /// The operation error only needs `Debug + Display`, so boxed and
    /// dynamic error types work. It appears in the message, not in `source()`.
    #[error("operation failed: {0}")]
    Operation(E),

    /// The operation panicked inside a spawned loop.
    #[error("operation panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },
}

impl<E> RetryError<E>
where
    E: fmt::Debug + fmt::Display + Send + 'static,
{
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tinybackoff::RetryError;
    ///
    /// let err: RetryError<std::io::Error> = RetryError::CannotReset;
    /// assert_eq!(err.as_label(), "retry_cannot_reset");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RetryError::Cancelled => "retry_cancelled",
            RetryError::CannotReset => "retry_cannot_reset",
            RetryError::Operation(_) => "retry_operation_failed",
            RetryError::Panicked { .. } => "retry_operation_panicked",
        }
    }

    /// Returns `true` for [`RetryError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled)
    }

    /// Returns the operation error, if this is [`RetryError::Operation`].
    pub fn into_operation(self) -> Option<E> {
        match self {
            RetryError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_labels_are_stable() {
        let cases: [(RetryError<io::Error>, &str); 4] = [
            (RetryError::Cancelled, "retry_cancelled"),
            (RetryError::CannotReset, "retry_cannot_reset"),
            (
                RetryError::Operation(io::Error::other("boom")),
                "retry_operation_failed",
            ),
            (
                RetryError::Panicked {
                    info: "oops".into(),
                },
                "retry_operation_panicked",
            ),
        ];
        for (err, label) in cases {
            assert_eq!(err.as_label(), label);
        }
    }

    #[test]
    fn test_operation_error_is_in_message() {
        let err = RetryError::Operation(io::Error::other("boom"));
        assert_eq!(err.to_string(), "operation failed: boom");
        assert!(err.source().is_none());
        assert_eq!(err.into_operation().map(|e| e.to_string()).as_deref(), Some("boom"));
    }

    #[test]
    fn test_dynamic_operation_error_is_an_error() {
        let inner: Box<dyn std::error::Error + Send + Sync> = "disk full".into();
        let err: Box<dyn std::error::Error> = Box::new(RetryError::Operation(inner));
        assert_eq!(err.to_string(), "operation failed: disk full");
    }

    #[test]
    fn test_cancelled_has_no_operation_error() {
        let err: RetryError<io::Error> = RetryError::Cancelled;
        assert!(err.is_cancelled());
        assert!(err.into_operation().is_none());
    }
}
