use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation flag for `Lock::lock_interruptibly`.
///
/// Setting the flag wakes no one directly; waiters notice it within
/// `INTERRUPT_POLL` of it being set.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Reset the flag so the handle can be reused.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
