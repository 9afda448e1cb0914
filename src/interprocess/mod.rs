//! Locks that are exclusive across a cluster, not just a process.
//!
//! ```text
//!   thread ──► ReentrantMutex ──► DistributedMutex ──► critical section
//!              (this process)     (coordination service,
//!                                  {base}/{registry}/{key})
//! ```
//!
//! The local half is taken first so threads of one process queue locally
//! instead of each hitting the coordination service. What happens when the
//! distributed half fails is decided by the `LockingPolicy`; failures a
//! best-effort lock absorbs go to a `FailObserver`.

mod lock;
mod observer;
mod registry;

pub use lock::InterProcessLock;
#[cfg(feature = "emitter")]
pub use observer::{EmitterFailObserver, LOCK_FAILED_EVENT};
pub use observer::{FailObserver, LockFailure, LockOperation, LogFailObserver};
pub use registry::InterProcessLockRegistry;
