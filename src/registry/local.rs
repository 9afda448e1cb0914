use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::cache::HandleCache;
use super::{LockRegistry, LockRegistryConfig};
use crate::config::DEFAULT_IDLE_EVICTION;
use crate::key::{KeyValue, LockKey, Word};
use crate::lock::{Lock, ReentrantMutex};
use crate::{LockError, PositiveDuration};

/// Process-local registry: one `ReentrantMutex` per lock key.
pub struct LocalLockRegistry {
    config: LockRegistryConfig,
    cache: HandleCache<ReentrantMutex>,
}

impl LocalLockRegistry {
    pub fn new(config: LockRegistryConfig) -> Self {
        LocalLockRegistry {
            config,
            cache: HandleCache::new(DEFAULT_IDLE_EVICTION),
        }
    }

    pub fn with_idle_eviction(mut self, idle: Duration) -> Self {
        self.cache = HandleCache::new(idle);
        self
    }

    pub fn config(&self) -> &LockRegistryConfig {
        &self.config
    }

    /// The concrete mutex for `key`.
    pub fn handle(&self, key: &KeyValue) -> Result<Arc<ReentrantMutex>, LockError> {
        let key = self.to_key(key)?;
        self.handle_for(&key)
    }

    fn handle_for(&self, key: &LockKey) -> Result<Arc<ReentrantMutex>, LockError> {
        self.cache.get_or_try_insert_with(key, || {
            debug!(registry = %self.config.name(), key = %key, "Creating local lock");
            Ok(ReentrantMutex::new())
        })
    }
}

impl LockRegistry for LocalLockRegistry {
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
