use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

/// Cause tag reported when the receive call fails fatally.
pub const RECEIVE_FAILURE_CAUSE: &str = "sqs-consumer-receive";

/// Cause tag reported when a delete call fails fatally.
pub const DELETE_FAILURE_CAUSE: &str = "sqs-consumer-delete";

/// One-way signal used to mark the process unhealthy for external supervision.
///
/// Implementations must not block; the consumer calls this from inside its
/// worker tasks right before unwinding.
pub trait HealthSink: Send + Sync {
    fn trip_unhealthy(&self, cause: &str);
}

impl<T: HealthSink + ?Sized> HealthSink for Arc<T> {
    fn trip_unhealthy(&self, cause: &str) {
        (**self).trip_unhealthy(cause)
    }
}

/// A health sink backed by an atomic flag, suitable for a liveness endpoint.
///
/// Once tripped it stays unhealthy. The first cause is kept.
#[derive(Debug)]
pub struct HealthFlag {
    healthy: AtomicBool,
    cause: Mutex<Option<String>>,
}

impl HealthFlag {
    pub fn new() -> Self {
        HealthFlag {
            healthy: AtomicBool::new(true),
            cause: Mutex::new(None),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// The cause tag of the first trip, if any.
    pub fn cause(&self) -> Option<String> {
        match self.cause.lock() {
            Ok(cause) => cause.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for HealthFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthSink for HealthFlag {
    fn trip_unhealthy(&self, cause: &str) {
        let mut recorded = match self.cause.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if recorded.is_none() {
            *recorded = Some(cause.to_string());
        }
        self.healthy.store(false, Ordering::Release);
        tracing::warn!(cause, "health check tripped");
    }
}
