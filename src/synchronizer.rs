use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, trace, warn};

use crate::config::{Scope, SynchronizerConfig};
use crate::distributed::CoordinationClient;
use crate::interprocess::FailObserver;
use crate::key::{KeyValue, StringLockKeyFactory};
use crate::lock::LockGuard;
use crate::registry::{
    registry_factory, unused_wiring, LockRegistry, LockRegistryConfig, LockRegistryFactory,
};
use crate::timeout::TimeoutResolver;
use crate::LockError;

/// Name of the registry behind `acquire_keyless`. Reserved.
pub const KEYLESS_REGISTRY_NAME: &str = "SYNCHRONIZER_KEYLESS_LOCKS";

/// Entry point: owns every lock registry of the application, by name.
///
/// The name to registry map is fixed when the synchronizer is built; there
/// is no process-wide instance. Share it with `Arc` if several components
/// need it.
///
/// ## Example
///
/// ```
/// use synchronizer::{LockRegistryConfig, StringLockKeyFactory, Synchronizer};
///
/// let synchronizer = Synchronizer::builder()
///     .with_registry(LockRegistryConfig::new("orders", StringLockKeyFactory).unwrap())
///     .build()
///     .unwrap();
///
/// let total = synchronizer
///     .synchronized("orders", "order-42", None, || 40 + 2)
///     .unwrap();
/// assert_eq!(total, 42);
/// ```
pub struct Synchronizer {
    registries: HashMap<String, Arc<dyn LockRegistry>>,
    timeouts: TimeoutResolver,
    scope: Scope,
}

impl Synchronizer {
    pub fn builder() -> SynchronizerBuilder {
        SynchronizerBuilder::default()
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn timeouts(&self) -> &TimeoutResolver {
        &self.timeouts
    }

    pub fn registry(&self, name: &str) -> Option<&Arc<dyn LockRegistry>> {
        self.registries.get(name)
    }

    /// Registered names, sorted. Includes the keyless registry.
    pub fn registry_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.registries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn lookup(&self, name: &str) -> Result<&Arc<dyn LockRegistry>, LockError> {
        self.registries
            .get(name)
            .ok_or_else(|| LockError::UnknownRegistry(name.to_string()))
    }

    /// Lock `key` in `registry`, waiting at most the effective timeout.
    ///
    /// The timeout is `timeout` if given and non-zero, else the registry's,
    /// else the global default. Running out of time is `LockError::Timeout`.
    pub fn acquire(
        &self,
        registry: &str,
        key: impl Into<KeyValue>,
        timeout: Option<Duration>,
    ) -> Result<LockGuard, LockError> {
        let registry = self.lookup(registry)?;
        let raw = key.into();
        let key = registry.to_key(&raw)?;
        let timeout = self.timeouts.resolve(timeout, registry.timeout());
        let lock = registry.lock_for(&key)?;

        trace!(
            registry = %registry.name(),
            key = %key,
            timeout_ms = timeout.as_millis() as u64,
            "Locking"
        );
        if !lock.try_lock_for(timeout)? {
            return Err(LockError::Timeout {
                registry: registry.name().to_string(),
                key: raw.to_string(),
                timeout,
            });
        }
        Ok(LockGuard::new(lock, registry.name().as_str(), key))
    }

    /// Release a guard, surfacing release errors that `Drop` would only log.
    pub fn release(&self, guard: LockGuard) -> Result<(), LockError> {
        guard.release()
    }

    /// Run `work` while holding the lock for `key`.
    ///
    /// The lock is released however `work` exits, panics included.
    pub fn synchronized<T>(
        &self,
        registry: &str,
        key: impl Into<KeyValue>,
        timeout: Option<Duration>,
        work: impl FnOnce() -> T,
    ) -> Result<T, LockError> {
        let guard = self.acquire(registry, key, timeout)?;
        let result = work();
        guard.release()?;
        Ok(result)
    }

    /// Lock a named critical section that has no key of its own.
    pub fn acquire_keyless(
        &self,
        lock_name: &str,
        timeout: Option<Duration>,
    ) -> Result<LockGuard, LockError> {
        self.acquire(KEYLESS_REGISTRY_NAME, lock_name, timeout)
    }

    pub fn synchronized_keyless<T>(
        &self,
        lock_name: &str,
        timeout: Option<Duration>,
        work: impl FnOnce() -> T,
    ) -> Result<T, LockError> {
        self.synchronized(KEYLESS_REGISTRY_NAME, lock_name, timeout, work)
    }

    /// Sweep idle locks out of every registry. Returns how many were dropped.
    pub fn purge_idle(&self) -> usize {
        self.registries.values().map(|r| r.purge_idle()).sum()
    }
}

impl fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("scope", &self.scope)
            .field("registries", &self.registry_names())
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

/// Collects configuration, registries and the coordination client for a
/// `Synchronizer`.
#[derive(Default)]
pub struct SynchronizerBuilder {
    config: SynchronizerConfig,
    registries: Vec<LockRegistryConfig>,
    client: Option<Arc<dyn CoordinationClient>>,
    observer: Option<Arc<dyn FailObserver>>,
    registry_factory: Option<Box<dyn LockRegistryFactory>>,
}

impl SynchronizerBuilder {
    pub fn with_config(mut self, config: SynchronizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: LockRegistryConfig) -> Self {
        self.registries.push(registry);
        self
    }

    pub fn with_registries(mut self, registries: impl IntoIterator<Item = LockRegistryConfig>) -> Self {
        self.registries.extend(registries);
        self
    }

    pub fn with_client(mut self, client: Arc<dyn CoordinationClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Receives the failures best-effort locks absorb.
    pub fn with_observer(mut self, observer: Arc<dyn FailObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace the scope-selected registry factory.
    pub fn with_registry_factory(mut self, factory: Box<dyn LockRegistryFactory>) -> Self {
        self.registry_factory = Some(factory);
        self
    }

    /// Build every registry. Registries from the config document come
    /// after the keyless one and before those added with `with_registry`;
    /// any repeated name is a configuration error.
    pub fn build(self) -> Result<Synchronizer, LockError> {
        self.config.validate()?;
        let factory = match self.registry_factory {
            Some(factory) => {
                let unused = unused_wiring(self.client.is_some(), self.observer.is_some());
                if !unused.is_empty() {
                    warn!(ignored = ?unused, "Custom registry factory ignores coordination wiring");
                }
                factory
            }
            None => registry_factory(&self.config, self.client, self.observer)?,
        };

        let mut configs = Vec::with_capacity(1 + self.config.registries.len() + self.registries.len());
        configs.push(LockRegistryConfig::new(KEYLESS_REGISTRY_NAME, StringLockKeyFactory)?);
        for definition in &self.config.registries {
            configs.push(LockRegistryConfig::try_from(definition)?);
        }
        configs.extend(self.registries);

        let mut registries: HashMap<String, Arc<dyn LockRegistry>> =
            HashMap::with_capacity(configs.len());
        for config in &configs {
            let name = config.name().to_string();
            if registries.contains_key(&name) {
                return Err(LockError::Configuration(format!(
                    "duplicate lock registry name: {}",
                    name
                )));
            }
            registries.insert(name, factory.new_lock_registry(config)?);
        }

        info!(
            scope = %self.config.scope,
            registries = registries.len(),
            "new Synchronizer"
        );
        Ok(Synchronizer {
            registries,
            timeouts: TimeoutResolver::new(self.config.default_timeout),
            scope: self.config.scope,
        })
    }
}
