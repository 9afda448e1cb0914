use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::trace;

use super::{FailObserver, LockFailure, LockOperation, LogFailObserver};
use crate::config::LockingPolicy;
use crate::distributed::{CoordinationError, DistributedMutex};
use crate::lock::{Interrupt, Lock, ReentrantMutex};
use crate::LockError;

/// Reentrant lock that pairs a process-local mutex with a distributed one.
///
/// The local half is always acquired first and guarantees that only one
/// thread in this process is inside the critical section. The distributed
/// half is taken when the local hold count goes from zero to one, and given
/// back when it returns to zero, so reentrant acquisitions never touch the
/// coordination service.
///
/// When the distributed half fails:
/// - a clean timeout releases the local half and reports "not acquired",
///   under either policy;
/// - a coordination error under `Strict` releases the local half and
///   returns `LockError::Acquisition`;
/// - a coordination error under `BestEffort` keeps the local half, reports
///   the failure to the observer and succeeds.
///
/// Without a distributed mutex the lock is purely local.
pub struct InterProcessLock {
    local: ReentrantMutex,
    mutex: Option<Box<dyn DistributedMutex>>,
    path: String,
    policy: LockingPolicy,
    observer: Arc<dyn FailObserver>,
    cluster_held: AtomicBool,
}

impl InterProcessLock {
    pub fn new(
        path: impl Into<String>,
        mutex: Option<Box<dyn DistributedMutex>>,
        policy: LockingPolicy,
    ) -> Self {
        InterProcessLock {
            local: ReentrantMutex::new(),
            mutex,
            path: path.into(),
            policy,
            observer: Arc::new(LogFailObserver),
            cluster_held: AtomicBool::new(false),
        }
    }

    pub fn strict(path: impl Into<String>, mutex: Box<dyn DistributedMutex>) -> Self {
        Self::new(path, Some(mutex), LockingPolicy::Strict)
    }

    pub fn best_effort(
        path: impl Into<String>,
        mutex: Option<Box<dyn DistributedMutex>>,
        observer: Arc<dyn FailObserver>,
    ) -> Self {
        Self::new(path, mutex, LockingPolicy::BestEffort).with_observer(observer)
    }

    pub fn with_observer(mut self, observer: Arc<dyn FailObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Coordination-service path of the distributed half.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn policy(&self) -> LockingPolicy {
        self.policy
    }

    /// Whether a distributed mutex backs this lock at all.
    pub fn is_distributed(&self) -> bool {
        self.mutex.is_some()
    }

    /// Whether the distributed half is currently held. A best-effort lock
    /// can be locked without it.
    pub fn holds_cluster_lock(&self) -> bool {
        self.cluster_held.load(Ordering::SeqCst)
    }

    /// Number of threads waiting on the local half.
    pub fn queued_threads(&self) -> usize {
        self.local.queued_threads()
    }

    fn report(&self, operation: LockOperation, error: CoordinationError) {
        self.observer.on_inter_process_lock_fail(&LockFailure {
            path: self.path.clone(),
            operation,
            error,
        });
    }

    /// Second phase. Runs with one fresh local hold owned by this thread.
    fn acquire_cluster(
        &self,
        acquire: impl FnOnce(&dyn DistributedMutex) -> Result<bool, CoordinationError>,
    ) -> Result<bool, LockError> {
        let Some(mutex) = self.mutex.as_deref() else {
            return Ok(true);
        };
        if self.local.hold_count() > 1 {
            return Ok(true);
        }

        match acquire(mutex) {
            Ok(true) => {
                self.cluster_held.store(true, Ordering::SeqCst);
                trace!(path = %self.path, "Interprocess lock acquired");
                Ok(true)
            }
            Ok(false) => {
                self.local.unlock()?;
                Ok(false)
            }
            Err(error) => match self.policy {
                LockingPolicy::Strict => {
                    self.local.unlock()?;
                    Err(LockError::Acquisition {
                        path: self.path.clone(),
                        source: error,
                    })
                }
                LockingPolicy::BestEffort => {
                    self.report(LockOperation::Acquire, error);
                    Ok(true)
                }
            },
        }
    }
}

impl Lock for InterProcessLock {
    fn lock(&self) -> Result<(), LockError> {
        self.local.lock()?;
        self.acquire_cluster(|m| m.acquire().map(|_| true))
            .map(|_| ())
    }

    fn lock_interruptibly(&self, interrupt: &Interrupt) -> Result<(), LockError> {
        self.local.lock_interruptibly(interrupt)?;
        if interrupt.is_interrupted() {
            self.local.unlock()?;
            return Err(LockError::Interrupted);
        }
        self.acquire_cluster(|m| m.acquire().map(|_| true))
            .map(|_| ())
    }

    fn try_lock(&self) -> Result<bool, LockError> {
        if !self.local.try_lock()? {
            return Ok(false);
        }
        self.acquire_cluster(|m| m.try_acquire(Duration::ZERO))
    }

    fn try_lock_for(&self, timeout: Duration) -> Result<bool, LockError> {
        let start = Instant::now();
        if !self.local.try_lock_for(timeout)? {
            return Ok(false);
        }
        let remaining = timeout.saturating_sub(start.elapsed());
        self.acquire_cluster(|m| m.try_acquire(remaining))
    }

    fn unlock(&self) -> Result<(), LockError> {
        if !self.local.is_held_by_current_thread() {
            return Err(LockError::NotOwner);
        }

        let mut result = Ok(());
        if self.local.hold_count() == 1 && self.cluster_held.swap(false, Ordering::SeqCst) {
            if let Some(mutex) = self.mutex.as_deref() {
                if let Err(error) = mutex.release() {
                    match self.policy {
                        LockingPolicy::Strict => {
                            result = Err(LockError::Release {
                                path: self.path.clone(),
                                source: error,
                            })
                        }
                        LockingPolicy::BestEffort => self.report(LockOperation::Release, error),
                    }
                }
            }
        }

        self.local.unlock()?;
        result
    }

    fn is_locked(&self) -> bool {
        self.local.is_locked()
    }

    fn is_held_by_current_thread(&self) -> bool {
        self.local.is_held_by_current_thread()
    }

    fn hold_count(&self) -> usize {
        self.local.hold_count()
    }
}
