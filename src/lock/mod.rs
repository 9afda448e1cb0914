mod guard;
mod interrupt;
#[allow(clippy::module_inception)]
mod lock;
mod reentrant;

pub use guard::LockGuard;
pub use interrupt::Interrupt;
pub use lock::Lock;
pub use reentrant::ReentrantMutex;
