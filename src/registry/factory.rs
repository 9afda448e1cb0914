use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::{LocalLockRegistry, LockRegistry, LockRegistryConfig};
use crate::config::{
    validate_base_path, LockingPolicy, Scope, SynchronizerConfig, DEFAULT_BASE_PATH,
    DEFAULT_IDLE_EVICTION,
};
use crate::distributed::CoordinationClient;
use crate::interprocess::{FailObserver, InterProcessLockRegistry, LogFailObserver};
use crate::LockError;

/// Builds a registry from its configuration. Chosen once, by scope.
pub trait LockRegistryFactory: Send + Sync {
    fn new_lock_registry(
        &self,
        config: &LockRegistryConfig,
    ) -> Result<Arc<dyn LockRegistry>, LockError>;
}

#[derive(Debug, Clone, Copy)]
pub struct LocalLockRegistryFactory {
    idle: Duration,
}

impl LocalLockRegistryFactory {
    pub fn new() -> Self {
        LocalLockRegistryFactory {
            idle: DEFAULT_IDLE_EVICTION,
        }
    }

    pub fn with_idle_eviction(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }
}

impl Default for LocalLockRegistryFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl LockRegistryFactory for LocalLockRegistryFactory {
    fn new_lock_registry(
        &self,
        config: &LockRegistryConfig,
    ) -> Result<Arc<dyn LockRegistry>, LockError> {
        Ok(Arc::new(
            LocalLockRegistry::new(config.clone()).with_idle_eviction(self.idle),
        ))
    }
}

/// Builds `InterProcessLockRegistry`s rooted at one base path.
///
/// Without a client every registry it builds is process-local only.
pub struct InterProcessLockRegistryFactory {
    base_path: String,
    client: Option<Arc<dyn CoordinationClient>>,
    default_policy: LockingPolicy,
    observer: Arc<dyn FailObserver>,
    idle: Duration,
}

impl InterProcessLockRegistryFactory {
    pub fn new(
        base_path: impl Into<String>,
        client: Option<Arc<dyn CoordinationClient>>,
    ) -> Result<Self, LockError> {
        let base_path = base_path.into();
        validate_base_path(&base_path)?;
        Ok(InterProcessLockRegistryFactory {
            base_path,
            client,
            default_policy: LockingPolicy::default(),
            observer: Arc::new(LogFailObserver),
            idle: DEFAULT_IDLE_EVICTION,
        })
    }

    pub fn with_default_policy(mut self, policy: LockingPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn FailObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_idle_eviction(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }
}

impl Default for InterProcessLockRegistryFactory {
    fn default() -> Self {
        InterProcessLockRegistryFactory {
            base_path: DEFAULT_BASE_PATH.to_string(),
            client: None,
            default_policy: LockingPolicy::default(),
            observer: Arc::new(LogFailObserver),
            idle: DEFAULT_IDLE_EVICTION,
        }
    }
}

impl LockRegistryFactory for InterProcessLockRegistryFactory {
    fn new_lock_registry(
        &self,
        config: &LockRegistryConfig,
    ) -> Result<Arc<dyn LockRegistry>, LockError> {
        let policy = config.policy_override().unwrap_or(self.default_policy);
        let registry =
            InterProcessLockRegistry::new(&self.base_path, config, policy, self.client.clone())?
                .with_observer(self.observer.clone())
                .with_idle_eviction(self.idle);
        Ok(Arc::new(registry))
    }
}

/// Pick the registry factory for the configured scope.
///
/// Under `Distributed` scope a missing client is fatal unless the config
/// explicitly allows degrading to process-local locks.
pub fn registry_factory(
    config: &SynchronizerConfig,
    client: Option<Arc<dyn CoordinationClient>>,
    observer: Option<Arc<dyn FailObserver>>,
) -> Result<Box<dyn LockRegistryFactory>, LockError> {
    config.validate()?;
    match config.scope {
        Scope::Local => {
            let unused = unused_wiring(client.is_some(), observer.is_some());
            if !unused.is_empty() {
                warn!(ignored = ?unused, "Local synchronizer scope ignores coordination wiring");
            }
            Ok(Box::new(
            LocalLockRegistryFactory::new().with_idle_eviction(config.idle_eviction()),
        ))
        }
        Scope::Distributed => {
            if client.is_none() && config.require_coordination_client {
                return Err(LockError::Configuration(
                    "distributed synchronizer scope requires a coordination client".into(),
                ));
            }
            let mut factory = InterProcessLockRegistryFactory::new(&config.base_path, client)?
                .with_default_policy(config.default_policy)
                .with_idle_eviction(config.idle_eviction());
            if let Some(observer) = observer {
                factory = factory.with_observer(observer);
            }
            Ok(Box::new(factory))
        }
    }
}

/// Names of the coordination pieces that were supplied but will not be used.
pub(crate) fn unused_wiring(client: bool, observer: bool) -> Vec<&'static str> {
    let mut unused = Vec::new();
    if client {
        unused.push("coordination client");
    }
    if observer {
        unused.push("fail observer");
    }
    unused
}
