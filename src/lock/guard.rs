use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{trace, warn};

use super::Lock;
use crate::key::LockKey;
use crate::LockError;

/// A held lock that is released when dropped.
///
/// Release failures during `drop` can only be logged; call `release` to see
/// them (a strict interprocess lock reports a failed cluster release there).
/// The guard is `!Send`: the lock is owned by the thread that acquired it.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    lock: Arc<dyn Lock>,
    registry: String,
    key: LockKey,
    released: bool,
    _not_send: PhantomData<*const ()>,
}

impl LockGuard {
    /// Wrap a lock that the current thread has just acquired.
    pub(crate) fn new(lock: Arc<dyn Lock>, registry: impl Into<String>, key: LockKey) -> Self {
        LockGuard {
            lock,
            registry: registry.into(),
            key,
            released: false,
            _not_send: PhantomData,
        }
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// The underlying shared lock handle.
    pub fn lock(&self) -> &Arc<dyn Lock> {
        &self.lock
    }

    /// Release the lock now, surfacing any release error.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        trace!(registry = %self.registry, key = %self.key, "Unlocking");
        self.lock.unlock()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        trace!(registry = %self.registry, key = %self.key, "Unlocking");
        if let Err(err) = self.lock.unlock() {
            warn!(
                registry = %self.registry,
                key = %self.key,
                error = %err,
                "Failed to release lock on drop"
            );
        }
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("registry", &self.registry)
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}
