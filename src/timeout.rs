use std::time::Duration;

use crate::PositiveDuration;

/// Process-wide default used when neither the call nor the registry sets a
/// timeout.
pub const DEFAULT_TIMEOUT: PositiveDuration = PositiveDuration(Duration::from_secs(5));

/// Resolves the effective acquisition timeout.
///
/// Precedence, highest first: a positive per-call override, the registry's
/// configured timeout, the global default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutResolver {
    global: PositiveDuration,
}

impl TimeoutResolver {
    pub fn new(global: PositiveDuration) -> Self {
        TimeoutResolver { global }
    }

    pub fn global(&self) -> PositiveDuration {
        self.global
    }

    pub fn resolve(&self, call: Option<Duration>, registry: Option<PositiveDuration>) -> Duration {
        call.filter(|d| !d.is_zero())
            .or(registry.map(PositiveDuration::get))
            .unwrap_or(self.global.get())
    }
}

impl Default for TimeoutResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}
