use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{FailObserver, InterProcessLock, LogFailObserver};
use crate::config::{validate_base_path, LockingPolicy, DEFAULT_IDLE_EVICTION};
use crate::distributed::CoordinationClient;
use crate::key::{KeyValue, LockKey, Word};
use crate::lock::Lock;
use crate::registry::{HandleCache, LockRegistry, LockRegistryConfig};
use crate::{LockError, PositiveDuration};

/// Registry of `InterProcessLock`s living under `{base_path}/{name}/`.
///
/// Every lock's distributed half sits at `{base_path}/{name}/{key}` on the
/// coordination service. Without a client the registry still works, but
/// its locks are process-local only.
pub struct InterProcessLockRegistry {
    config: LockRegistryConfig,
    dir_path: String,
    policy: LockingPolicy,
    client: Option<Arc<dyn CoordinationClient>>,
    observer: Arc<dyn FailObserver>,
    cache: HandleCache<InterProcessLock>,
}

impl InterProcessLockRegistry {
    pub fn new(
        base_path: &str,
        config: &LockRegistryConfig,
        policy: LockingPolicy,
        client: Option<Arc<dyn CoordinationClient>>,
    ) -> Result<Self, LockError> {
        validate_base_path(base_path)?;
        let dir_path = format!("{}/{}/", base_path.trim_end_matches('/'), config.name());
        if client.is_none() {
            warn!(
                registry = %config.name(),
                path = %dir_path,
                "No coordination client, interprocess locks are process-local only"
            );
        }
        Ok(InterProcessLockRegistry {
            config: config.clone(),
            dir_path,
            policy,
            client,
            observer: Arc::new(LogFailObserver),
            cache: HandleCache::new(DEFAULT_IDLE_EVICTION),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn FailObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_idle_eviction(mut self, idle: Duration) -> Self {
        self.cache = HandleCache::new(idle);
        self
    }

    pub fn config(&self) -> &LockRegistryConfig {
        &self.config
    }

    /// Path of this registry's directory node, ending in `/`.
    pub fn dir_path(&self) -> &str {
        &self.dir_path
    }

    pub fn policy(&self) -> LockingPolicy {
        self.policy
    }

    pub fn path_for(&self, key: &LockKey) -> String {
        format!("{}{}", self.dir_path, key)
    }

    /// The concrete interprocess lock for `key`.
    pub fn handle(&self, key: &KeyValue) -> Result<Arc<InterProcessLock>, LockError> {
        let key = self.to_key(key)?;
        self.handle_for(&key)
    }

    fn handle_for(&self, key: &LockKey) -> Result<Arc<InterProcessLock>, LockError> {
        self.cache.get_or_try_insert_with(key, || {
            let path = self.path_for(key);
            debug!(registry = %self.config.name(), path = %path, "Creating interprocess lock");
            let mutex = self.client.as_ref().map(|client| client.new_mutex(&path));
            Ok(InterProcessLock::new(path, mutex, self.policy).with_observer(self.observer.clone()))
        })
    }
}

impl LockRegistry for InterProcessLockRegistry {
    fn name(&self) -> &Word {
        self.config.name()
    }

    fn timeout(&self) -> Option<PositiveDuration> {
        self.config.timeout_override()
    }

    fn to_key(&self, key: &KeyValue) -> Result<LockKey, LockError> {
        self.config.key_factory().to_key(key)
    }

    fn lock_for(&self, key: &LockKey) -> Result<Arc<dyn Lock>, LockError> {
        let handle = self.handle_for(key)?;
        Ok(handle)
    }

    fn purge_idle(&self) -> usize {
        self.cache.purge_idle()
    }

    fn len(&self) -> usize {
        self.cache.len()
    }
}
