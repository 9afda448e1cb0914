use std::fmt;

use serde::Serialize;
use tracing::error;

use crate::distributed::CoordinationError;

/// Which half of the protocol hit the coordination failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockOperation {
    Acquire,
    Release,
}

impl fmt::Display for LockOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockOperation::Acquire => f.write_str("acquire"),
            LockOperation::Release => f.write_str("release"),
        }
    }
}

/// A coordination failure absorbed by a best-effort lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockFailure {
    pub path: String,
    pub operation: LockOperation,
    pub error: CoordinationError,
}

impl fmt::Display for LockFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "can't {} interprocess lock at {}: {}",
            self.operation, self.path, self.error
        )
    }
}

/// Receives the failures a best-effort lock does not surface to its caller.
///
/// Observers must not panic; the lock has already decided to proceed with
/// process-local exclusivity.
pub trait FailObserver: Send + Sync {
    fn on_inter_process_lock_fail(&self, failure: &LockFailure);
}

impl<F> FailObserver for F
where
    F: Fn(&LockFailure) + Send + Sync,
{
    fn on_inter_process_lock_fail(&self, failure: &LockFailure) {
        self(failure)
    }
}

/// Logs failures at error level. The default observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailObserver;

impl FailObserver for LogFailObserver {
    fn on_inter_process_lock_fail(&self, failure: &LockFailure) {
        error!(
            path = %failure.path,
            operation = %failure.operation,
            error = %failure.error,
            "Inter process locking failed"
        );
    }
}

#[cfg(feature = "emitter")]
pub use emitter::{EmitterFailObserver, LOCK_FAILED_EVENT};

#[cfg(feature = "emitter")]
mod emitter {
    use std::sync::Mutex;

    use event_emitter_rs::EventEmitter;
    use serde::Serialize;
    use tracing::warn;

    use super::{FailObserver, LockFailure, LockOperation};

    /// Event name used by `EmitterFailObserver`.
    pub const LOCK_FAILED_EVENT: &str = "InterProcessLockFailed";

    #[derive(Serialize)]
    struct Payload<'a> {
        path: &'a str,
        operation: LockOperation,
        error: String,
    }

    /// Forwards failures to in-process subscribers through an `EventEmitter`.
    ///
    /// Each failure is emitted as a JSON string under `LOCK_FAILED_EVENT`.
    /// Listeners run on the emitter's own threads.
    pub struct EmitterFailObserver {
        emitter: Mutex<EventEmitter>,
    }

    impl EmitterFailObserver {
        pub fn new(emitter: EventEmitter) -> Self {
            EmitterFailObserver {
                emitter: Mutex::new(emitter),
            }
        }
    }

    impl FailObserver for EmitterFailObserver {
        fn on_inter_process_lock_fail(&self, failure: &LockFailure) {
            let payload = Payload {
                path: &failure.path,
                operation: failure.operation,
                error: failure.error.to_string(),
            };
            let json = match serde_json::to_string(&payload) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Can't encode lock failure event");
                    return;
                }
            };
            match self.emitter.lock() {
                Ok(mut emitter) => {
                    emitter.emit(LOCK_FAILED_EVENT, json);
                }
                Err(_) => warn!("Lock failure emitter poisoned"),
            }
        }
    }
}
