use std::fmt;

use thiserror::Error;

use crate::receiver::ConsumerState;

/// Error types for SQS consumer operations.
///
/// Everything that can stop a consumer from starting, or that a consumer
/// reports back to its caller, is expressed through this enum.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The consumer configuration was rejected before start.
    #[error("invalid consumer configuration: {0}")]
    InvalidConfiguration(String),

    /// The configured queue provider could not resolve the queue.
    #[error("failed to resolve queue: {0}")]
    QueueResolution(#[source] GenericError),

    /// `start` was called on a consumer that is not in the `Created` state.
    #[error("consumer cannot be started from state {0:?}")]
    InvalidState(ConsumerState),

    /// The delete worker has closed its input queue.
    #[error("delete queue is closed")]
    DeleteQueueClosed,

    #[error(transparent)]
    Client(#[from] QueueClientError),
}

/// Broad classification attached to every queue client failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The request was rejected by the service as invalid.
    Client,
    /// The service failed while handling a valid request.
    Fault,
    /// The service refused the request because of rate limits.
    Throttling,
    /// No usable response was received: timeouts, dispatch and connection failures.
    Transport,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Client => "client",
            ErrorCategory::Fault => "fault",
            ErrorCategory::Throttling => "throttling",
            ErrorCategory::Transport => "transport",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call against the queue service.
///
/// Carries the category tag used by retry classification, the service error
/// code when one was returned, and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category} error: {message}")]
pub struct QueueClientError {
    pub category: ErrorCategory,
    pub code: Option<String>,
    pub message: String,
}

impl QueueClientError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        QueueClientError {
            category,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Generic retriable predicate: throttling and transport failures are transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.category,
            ErrorCategory::Throttling | ErrorCategory::Transport
        )
    }
}

/// Generic error type for failures reported by external collaborators.
#[derive(Debug, Error)]
pub struct GenericError(String);

impl GenericError {
    /// Creates a new `GenericError` with the provided message.
    pub fn new(message: String) -> Self {
        GenericError(message)
    }
}

impl fmt::Display for GenericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GenericError {
    fn from(s: &str) -> Self {
        GenericError::new(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_and_transport_errors_are_transient() {
        assert!(QueueClientError::new(ErrorCategory::Throttling, "slow down").is_transient());
        assert!(QueueClientError::new(ErrorCategory::Transport, "timed out").is_transient());
    }

    #[test]
    fn client_fault_and_unknown_errors_are_not_transient() {
        for category in [
            ErrorCategory::Client,
            ErrorCategory::Fault,
            ErrorCategory::Unknown,
        ] {
            assert!(
                !QueueClientError::new(category, "boom").is_transient(),
                "{category} should not be transient"
            );
        }
    }

    #[test]
    fn queue_client_error_display_includes_category() {
        let error = QueueClientError::new(ErrorCategory::Fault, "internal failure")
            .with_code("InternalError");
        assert_eq!(error.to_string(), "fault error: internal failure");
        assert_eq!(error.code.as_deref(), Some("InternalError"));
    }

    #[test]
    fn consumer_error_wraps_client_error_transparently() {
        let error: ConsumerError = QueueClientError::new(ErrorCategory::Client, "bad queue").into();
        assert_eq!(error.to_string(), "client error: bad queue");
    }

    #[test]
    fn consumer_error_variants_all_carry_their_own_context() {
        let errors = [
            ConsumerError::InvalidConfiguration("wait_time_seconds out of range".to_string()),
            ConsumerError::QueueResolution(GenericError::from("queue does not exist")),
            ConsumerError::InvalidState(ConsumerState::Stopped),
            ConsumerError::DeleteQueueClosed,
            QueueClientError::new(ErrorCategory::Throttling, "slow down").into(),
        ];
        for error in errors {
            // Exhaustive: a catch-all variant must not creep back in.
            let expected = match &error {
                ConsumerError::InvalidConfiguration(_) => {
                    "invalid consumer configuration: wait_time_seconds out of range"
                }
                ConsumerError::QueueResolution(_) => "failed to resolve queue: queue does not exist",
                ConsumerError::InvalidState(_) => "consumer cannot be started from state Stopped",
                ConsumerError::DeleteQueueClosed => "delete queue is closed",
                ConsumerError::Client(_) => "throttling error: slow down",
            };
            assert_eq!(error.to_string(), expected);
        }
    }
}
