mod config;
pub mod distributed;
mod duration;
mod error;
mod intercept;
mod interprocess;
mod key;
mod lock;
mod registry;
mod synchronizer;
mod timeout;

pub use config::{LockingPolicy, Scope, SynchronizerConfig, DEFAULT_BASE_PATH, DEFAULT_IDLE_EVICTION};
pub use duration::PositiveDuration;
pub use error::LockError;
pub use intercept::{Interceptor, SyncBinding, SyncTarget};
#[cfg(feature = "emitter")]
pub use interprocess::{EmitterFailObserver, LOCK_FAILED_EVENT};
pub use interprocess::{
    FailObserver, InterProcessLock, InterProcessLockRegistry, LockFailure, LockOperation,
    LogFailObserver,
};
pub use key::{
    BuiltinKeyFactory, IntegerLockKeyFactory, KeyValue, LockKey, LockKeyFactory,
    LongLockKeyFactory, StringLockKeyFactory, ToStringLockKeyFactory, Word, WordLockKeyFactory,
};
pub use lock::{Interrupt, Lock, LockGuard, ReentrantMutex};
pub use registry::{
    registry_factory, InterProcessLockRegistryFactory, LocalLockRegistry,
    LocalLockRegistryFactory, LockRegistry, LockRegistryConfig, LockRegistryFactory,
    RegistryDefinition,
};
pub use synchronizer::{Synchronizer, SynchronizerBuilder, KEYLESS_REGISTRY_NAME};
pub use timeout::{TimeoutResolver, DEFAULT_TIMEOUT};

// Re-export the EventEmitter so observers can be wired without a direct dependency
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
