//! The boundary with the coordination service.
//!
//! This crate never speaks a coordination protocol itself. A deployment
//! hands it a `CoordinationClient` (for example a ZooKeeper or etcd session
//! wrapper) which builds one `DistributedMutex` per lock path. The
//! `InMemoryCoordinator` plays that role inside a single process, for tests
//! and single-node setups that still want the interprocess code path.

mod in_memory;
mod mutex;

pub use in_memory::{InMemoryCoordinator, InMemoryDistributedMutex};
pub use mutex::{CoordinationClient, CoordinationError, DistributedMutex};
