use std::time::Duration;

use thiserror::Error;

/// Failure reported by the coordination service, as opposed to a clean
/// "not acquired within the timeout" answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinationError {
    /// The service could not be reached.
    #[error("coordination service unavailable: {0}")]
    Unavailable(String),
    /// The session or connection was lost mid-operation.
    #[error("coordination session lost: {0}")]
    ConnectionLoss(String),
    /// Release of a mutex this client does not hold.
    #[error("mutex not held: {0}")]
    NotHeld(String),
    #[error("coordination error: {0}")]
    Other(String),
}

/// A mutex whose exclusivity is enforced across processes.
///
/// One instance represents one participant (one process) contending for one
/// path. Callers in this crate only acquire it while holding the matching
/// process-local lock, so implementations don't need per-thread reentrancy.
pub trait DistributedMutex: Send + Sync {
    /// Acquire, blocking until the mutex is held.
    fn acquire(&self) -> Result<(), CoordinationError>;

    /// Acquire within `timeout`. `Ok(false)` is a clean timeout.
    fn try_acquire(&self, timeout: Duration) -> Result<bool, CoordinationError>;

    fn release(&self) -> Result<(), CoordinationError>;
}

/// A live coordination-service client: builds the mutex for a
/// hierarchical path such as `/synchronizer/orders/b3JkZXItNDI`.
pub trait CoordinationClient: Send + Sync {
    fn new_mutex(&self, path: &str) -> Box<dyn DistributedMutex>;
}
