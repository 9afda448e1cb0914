//! Coordination-service doubles and helpers shared by the suite.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use synchronizer::distributed::{
    CoordinationClient, CoordinationError, DistributedMutex, InMemoryCoordinator,
};
use synchronizer::{FailObserver, KeyValue, LockError, LockFailure, Synchronizer};

/// How the scripted coordination service answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behavior {
    #[default]
    Healthy,
    /// Every call fails with `CoordinationError::Unavailable`.
    Outage,
    /// Timed acquisitions cleanly answer "not acquired".
    Deny,
}

/// Coordination client that records every call and misbehaves on demand.
///
/// Healthy calls are served by an `InMemoryCoordinator`, so exclusivity is
/// real across every mutex it created.
#[derive(Clone, Default)]
pub struct ScriptedCoordinator {
    inner: InMemoryCoordinator,
    behavior: Arc<Mutex<Behavior>>,
    calls: Arc<Mutex<Vec<(&'static str, String)>>>,
    budgets: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: Behavior) -> Self {
        let coordinator = Self::default();
        coordinator.set_behavior(behavior);
        coordinator
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|(op, _)| op).collect()
    }

    /// Timeouts handed to `try_acquire`, in call order.
    pub fn budgets(&self) -> Vec<Duration> {
        self.budgets.lock().unwrap().clone()
    }

    pub fn is_held(&self, path: &str) -> bool {
        self.inner.is_held(path)
    }
}

impl CoordinationClient for ScriptedCoordinator {
    fn new_mutex(&self, path: &str) -> Box<dyn DistributedMutex> {
        self.calls
            .lock()
            .unwrap()
            .push(("new_mutex", path.to_string()));
        Box::new(ScriptedMutex {
            inner: self.inner.new_mutex(path),
            path: path.to_string(),
            behavior: self.behavior.clone(),
            calls: self.calls.clone(),
            budgets: self.budgets.clone(),
        })
    }
}

struct ScriptedMutex {
    inner: Box<dyn DistributedMutex>,
    path: String,
    behavior: Arc<Mutex<Behavior>>,
    calls: Arc<Mutex<Vec<(&'static str, String)>>>,
    budgets: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedMutex {
    fn record(&self, op: &'static str) -> Behavior {
        self.calls.lock().unwrap().push((op, self.path.clone()));
        *self.behavior.lock().unwrap()
    }
}

fn outage() -> CoordinationError {
    CoordinationError::Unavailable("scripted outage".into())
}

impl DistributedMutex for ScriptedMutex {
    fn acquire(&self) -> Result<(), CoordinationError> {
        match self.record("acquire") {
            Behavior::Outage => Err(outage()),
            _ => self.inner.acquire(),
        }
    }

    fn try_acquire(&self, timeout: Duration) -> Result<bool, CoordinationError> {
        self.budgets.lock().unwrap().push(timeout);
        match self.record("try_acquire") {
            Behavior::Outage => Err(outage()),
            Behavior::Deny => Ok(false),
            Behavior::Healthy => self.inner.try_acquire(timeout),
        }
    }

    fn release(&self) -> Result<(), CoordinationError> {
        match self.record("release") {
            Behavior::Outage => Err(outage()),
            _ => self.inner.release(),
        }
    }
}

/// Observer that keeps every failure it is told about.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    failures: Arc<Mutex<Vec<LockFailure>>>,
}

impl RecordingObserver {
    pub fn failures(&self) -> Vec<LockFailure> {
        self.failures.lock().unwrap().clone()
    }
}

impl FailObserver for RecordingObserver {
    fn on_inter_process_lock_fail(&self, failure: &LockFailure) {
        self.failures.lock().unwrap().push(failure.clone());
    }
}

/// Try the lock from a fresh thread with a short timeout.
pub fn try_from_other_thread(
    synchronizer: &Arc<Synchronizer>,
    registry: &'static str,
    key: impl Into<KeyValue>,
) -> Result<(), LockError> {
    let synchronizer = synchronizer.clone();
    let key = key.into();
    thread::spawn(move || {
        synchronizer
            .acquire(registry, key, Some(Duration::from_millis(20)))
            .map(drop)
    })
    .join()
    .unwrap()
}

/// Whether another thread is currently locked out of `key`.
pub fn blocked_elsewhere(
    synchronizer: &Arc<Synchronizer>,
    registry: &'static str,
    key: impl Into<KeyValue>,
) -> bool {
    matches!(
        try_from_other_thread(synchronizer, registry, key),
        Err(LockError::Timeout { .. })
    )
}
