//! In-process coordination service for testing and single-node scenarios.
//!
//! Every mutex handed out by one `InMemoryCoordinator` (or any of its clones)
//! contends on a shared table keyed by path, so two `Synchronizer`s built
//! over the same coordinator behave like two processes in a cluster.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::{CoordinationClient, CoordinationError, DistributedMutex};

#[derive(Default)]
struct PathState {
    holder: Mutex<Option<u64>>,
    released: Condvar,
}

fn poisoned<T>(err: PoisonError<T>) -> CoordinationError {
    CoordinationError::Other(err.to_string())
}

/// In-memory coordination service.
///
/// Features:
/// - Thread-safe (can be shared across threads via `Clone`)
/// - One holder per path at a time, across every mutex it created
/// - Counts created mutexes so tests can prove whether it was used
///
/// ## Example
///
/// ```
/// use synchronizer::distributed::{CoordinationClient, InMemoryCoordinator};
///
/// let coordinator = InMemoryCoordinator::new();
/// let a = coordinator.new_mutex("/locks/orders/42");
/// let b = coordinator.new_mutex("/locks/orders/42");
///
/// a.acquire().unwrap();
/// assert!(!b.try_acquire(std::time::Duration::from_millis(10)).unwrap());
/// a.release().unwrap();
/// assert!(b.try_acquire(std::time::Duration::from_millis(10)).unwrap());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryCoordinator {
    paths: Arc<Mutex<HashMap<String, Arc<PathState>>>>,
    next_participant: Arc<AtomicU64>,
    created: Arc<AtomicUsize>,
}

impl InMemoryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutexes created through `new_mutex`.
    pub fn mutexes_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of paths some live mutex still refers to.
    pub fn tracked_paths(&self) -> usize {
        self.paths.lock().map(|paths| paths.len()).unwrap_or(0)
    }

    /// Whether any participant currently holds `path`.
    pub fn is_held(&self, path: &str) -> bool {
        let state = match self.paths.lock() {
            Ok(paths) => paths.get(path).cloned(),
            Err(_) => None,
        };
        state
            .and_then(|s| s.holder.lock().ok().map(|h| h.is_some()))
            .unwrap_or(false)
    }

    fn path_state(&self, path: &str) -> Arc<PathState> {
        let mut paths = self
            .paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        paths.entry(path.to_string()).or_default().clone()
    }
}

impl CoordinationClient for InMemoryCoordinator {
    fn new_mutex(&self, path: &str) -> Box<dyn DistributedMutex> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(InMemoryDistributedMutex {
            participant: self.next_participant.fetch_add(1, Ordering::SeqCst),
            path: path.to_string(),
            state: self.path_state(path),
            paths: self.paths.clone(),
        })
    }
}

/// One participant's handle on an in-memory path.
///
/// Dropping the last handle on a path forgets the path, releasing it if the
/// handle still held it.
pub struct InMemoryDistributedMutex {
    participant: u64,
    path: String,
    state: Arc<PathState>,
    paths: Arc<Mutex<HashMap<String, Arc<PathState>>>>,
}

impl InMemoryDistributedMutex {
    pub fn path(&self) -> &str {
        &self.path
    }

    fn holder(&self) -> Result<MutexGuard<'_, Option<u64>>, CoordinationError> {
        self.state.holder.lock().map_err(poisoned)
    }
}

impl Drop for InMemoryDistributedMutex {
    fn drop(&mut self) {
        let mut paths = self
            .paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // handles are only cloned out of the table under this lock, so two
        // references mean the table's and ours
        if Arc::strong_count(&self.state) == 2 {
            paths.remove(&self.path);
        }
    }
}

impl DistributedMutex for InMemoryDistributedMutex {
    fn acquire(&self) -> Result<(), CoordinationError> {
        let mut holder = self.holder()?;
        while holder.is_some_and(|h| h != self.participant) {
            holder = self.state.released.wait(holder).map_err(poisoned)?;
        }
        *holder = Some(self.participant);
        Ok(())
    }

    fn try_acquire(&self, timeout: Duration) -> Result<bool, CoordinationError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.acquire().map(|_| true);
        };
        let mut holder = self.holder()?;
        while holder.is_some_and(|h| h != self.participant) {
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            holder = self
                .state
                .released
                .wait_timeout(holder, deadline - now)
                .map_err(poisoned)?
                .0;
        }
        *holder = Some(self.participant);
        Ok(true)
    }

    fn release(&self) -> Result<(), CoordinationError> {
        let mut holder = self.holder()?;
        if *holder != Some(self.participant) {
            return Err(CoordinationError::NotHeld(self.path.clone()));
        }
        *holder = None;
        self.state.released.notify_all();
        Ok(())
    }
}
