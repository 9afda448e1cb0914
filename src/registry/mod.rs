//! Named, cached collections of locks.
//!
//! A registry turns a caller's raw key into a `LockKey` with its key factory
//! and hands back the one shared lock for that key. The same registry always
//! returns the same `Arc` for equal keys while anybody still references it,
//! which is what makes the reentrant, thread-owned locks meaningful.

mod cache;
mod config;
mod factory;
mod local;

pub(crate) use cache::HandleCache;
pub use config::{LockRegistryConfig, RegistryDefinition};
pub use factory::{
    registry_factory, InterProcessLockRegistryFactory, LocalLockRegistryFactory,
    LockRegistryFactory,
};
pub use local::LocalLockRegistry;
pub(crate) use factory::unused_wiring;

use std::sync::Arc;

use crate::key::{KeyValue, LockKey, Word};
use crate::lock::Lock;
use crate::{LockError, PositiveDuration};

pub trait LockRegistry: Send + Sync {
    fn name(&self) -> &Word;

    /// Registry-level acquisition timeout, if configured.
    fn timeout(&self) -> Option<PositiveDuration>;

    /// Normalize a raw key with this registry's key factory.
    fn to_key(&self, key: &KeyValue) -> Result<LockKey, LockError>;

    /// The shared lock for an already normalized key.
    fn lock_for(&self, key: &LockKey) -> Result<Arc<dyn Lock>, LockError>;

    fn get_lock(&self, key: &KeyValue) -> Result<Arc<dyn Lock>, LockError> {
        let key = self.to_key(key)?;
        self.lock_for(&key)
    }

    /// Drop idle, unreferenced, unlocked locks. Returns how many were dropped.
    fn purge_idle(&self) -> usize;

    /// Number of cached locks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
