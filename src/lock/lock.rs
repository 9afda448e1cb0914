use std::time::Duration;

use super::Interrupt;
use crate::LockError;

/// A reentrant mutex handle.
///
/// Implementations track the owning thread and a hold count: the owner may
/// acquire again without blocking and must call `unlock` once per successful
/// acquisition. The process-local `ReentrantMutex` and the cluster-aware
/// `InterProcessLock` both sit behind this trait, so callers can swap one
/// for the other without changing their code.
pub trait Lock: Send + Sync {
    /// Acquire the lock, blocking until it becomes available.
    fn lock(&self) -> Result<(), LockError>;

    /// Acquire the lock, blocking until it becomes available or `interrupt`
    /// fires. An interrupted call leaves nothing held.
    fn lock_interruptibly(&self, interrupt: &Interrupt) -> Result<(), LockError>;

    /// Try to acquire the lock without waiting.
    /// Returns `Ok(true)` if acquired, `Ok(false)` if held elsewhere.
    fn try_lock(&self) -> Result<bool, LockError>;

    /// Try to acquire the lock, waiting at most `timeout`.
    fn try_lock_for(&self, timeout: Duration) -> Result<bool, LockError>;

    /// Release one hold of the lock.
    fn unlock(&self) -> Result<(), LockError>;

    /// Whether any thread currently holds the lock.
    fn is_locked(&self) -> bool;

    fn is_held_by_current_thread(&self) -> bool;

    /// Number of holds by the current thread (zero if it isn't the owner).
    fn hold_count(&self) -> usize;
}
