//! Explicit call interception.
//!
//! Units of work (request handlers, jobs, commands) are bound once, at
//! startup, to the lock they need. At call time the interceptor looks the
//! unit up in a flat table and runs it under that lock:
//!
//! ```
//! use std::sync::Arc;
//! use synchronizer::{Interceptor, LockRegistryConfig, LongLockKeyFactory, SyncBinding, Synchronizer};
//!
//! let synchronizer = Synchronizer::builder()
//!     .with_registry(LockRegistryConfig::new("accounts", LongLockKeyFactory).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let mut interceptor = Interceptor::new(Arc::new(synchronizer));
//! interceptor.bind("debit", SyncBinding::keyed("accounts")).unwrap();
//! interceptor.bind("month_end", SyncBinding::keyless("month_end")).unwrap();
//!
//! let balance = interceptor.intercept("debit", 42i64, || 100 - 30).unwrap();
//! assert_eq!(balance, 70);
//! interceptor.intercept_keyless("month_end", || ()).unwrap();
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::key::KeyValue;
use crate::{LockError, PositiveDuration, Synchronizer};

/// The lock a unit of work runs under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncTarget {
    /// A registry; the key is supplied on every call.
    Registry(String),
    /// A fixed lock in the keyless registry.
    Keyless(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncBinding {
    target: SyncTarget,
    timeout: Option<PositiveDuration>,
}

impl SyncBinding {
    pub fn keyed(registry: impl Into<String>) -> Self {
        SyncBinding {
            target: SyncTarget::Registry(registry.into()),
            timeout: None,
        }
    }

    pub fn keyless(lock_name: impl Into<String>) -> Self {
        SyncBinding {
            target: SyncTarget::Keyless(lock_name.into()),
            timeout: None,
        }
    }

    /// Per-call timeout override, ahead of registry and global timeouts.
    pub fn with_timeout(mut self, timeout: PositiveDuration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn target(&self) -> &SyncTarget {
        &self.target
    }

    pub fn timeout(&self) -> Option<PositiveDuration> {
        self.timeout
    }
}

/// Runs bound units of work under their locks.
pub struct Interceptor {
    synchronizer: Arc<Synchronizer>,
    bindings: HashMap<String, SyncBinding>,
}

impl Interceptor {
    pub fn new(synchronizer: Arc<Synchronizer>) -> Self {
        Interceptor {
            synchronizer,
            bindings: HashMap::new(),
        }
    }

    pub fn synchronizer(&self) -> &Arc<Synchronizer> {
        &self.synchronizer
    }

    /// Bind `unit` to a lock.
    ///
    /// Binding a unit again with the same binding is a no-op; with a
    /// different one it is a configuration error.
    pub fn bind(&mut self, unit: impl Into<String>, binding: SyncBinding) -> Result<(), LockError> {
        match &binding.target {
            SyncTarget::Registry(name) => {
                if self.synchronizer.registry(name).is_none() {
                    return Err(LockError::UnknownRegistry(name.clone()));
                }
            }
            SyncTarget::Keyless(name) => {
                if name.is_empty() {
                    return Err(LockError::Configuration("blank keyless lock name".into()));
                }
            }
        }

        let unit = unit.into();
        match self.bindings.get(&unit) {
            Some(existing) if *existing == binding => Ok(()),
            Some(existing) => Err(LockError::Configuration(format!(
                "conflicting synchronization for {}: {:?} and {:?}",
                unit, existing, binding
            ))),
            None => {
                self.bindings.insert(unit, binding);
                Ok(())
            }
        }
    }

    pub fn with_binding(
        mut self,
        unit: impl Into<String>,
        binding: SyncBinding,
    ) -> Result<Self, LockError> {
        self.bind(unit, binding)?;
        Ok(self)
    }

    pub fn binding(&self, unit: &str) -> Option<&SyncBinding> {
        self.bindings.get(unit)
    }

    fn lookup(&self, unit: &str) -> Result<&SyncBinding, LockError> {
        self.bindings.get(unit).ok_or_else(|| {
            LockError::Configuration(format!("no synchronization bound for {}", unit))
        })
    }

    /// Run a keyed unit of work under the lock for `key`.
    pub fn intercept<T>(
        &self,
        unit: &str,
        key: impl Into<KeyValue>,
        work: impl FnOnce() -> T,
    ) -> Result<T, LockError> {
        let binding = self.lookup(unit)?;
        match &binding.target {
            SyncTarget::Registry(registry) => self.synchronizer.synchronized(
                registry,
                key,
                binding.timeout.map(PositiveDuration::get),
                work,
            ),
            SyncTarget::Keyless(_) => Err(LockError::Configuration(format!(
                "{} is bound to a keyless lock",
                unit
            ))),
        }
    }

    pub fn intercept_keyless<T>(&self, unit: &str, work: impl FnOnce() -> T) -> Result<T, LockError> {
        let binding = self.lookup(unit)?;
        match &binding.target {
            SyncTarget::Keyless(name) => self.synchronizer.synchronized_keyless(
                name,
                binding.timeout.map(PositiveDuration::get),
                work,
            ),
            SyncTarget::Registry(registry) => Err(LockError::Configuration(format!(
                "{} needs a key for registry {}",
                unit, registry
            ))),
        }
    }
}
