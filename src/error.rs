use std::time::Duration;

use thiserror::Error;

use crate::distributed::CoordinationError;

/// Error type for lock registry and lock operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The raw key (or a key factory's output) is not a valid lock key.
    #[error("invalid lock key: {0}")]
    InvalidKey(String),
    /// Setup-time misconfiguration. Not recoverable by retrying.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// No registry is registered under the requested name.
    #[error("no lock registry named {0}")]
    UnknownRegistry(String),
    /// The effective timeout elapsed before the lock was held.
    #[error("timed out after {timeout:?} getting lock for registry {registry}, for key {key}")]
    Timeout {
        registry: String,
        key: String,
        timeout: Duration,
    },
    /// The coordination service failed while acquiring (strict policy).
    #[error("can't get interprocess lock at {path}")]
    Acquisition {
        path: String,
        #[source]
        source: CoordinationError,
    },
    /// The coordination service failed while releasing (strict policy).
    #[error("can't release interprocess lock at {path}")]
    Release {
        path: String,
        #[source]
        source: CoordinationError,
    },
    /// An `Interrupt` fired while waiting for the lock.
    #[error("interrupted while waiting for lock")]
    Interrupted,
    /// `unlock` was called by a thread that does not hold the lock.
    #[error("lock is not held by the current thread")]
    NotOwner,
    /// An internal primitive was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

impl LockError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LockError::Timeout { .. })
    }
}
