use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::LockError;

/// A `Duration` that is guaranteed to be non-zero.
///
/// Serialized as whole milliseconds, so configuration files read
/// `"default_timeout_ms": 5000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PositiveDuration(pub(crate) Duration);

impl PositiveDuration {
    pub fn new(duration: Duration) -> Result<Self, LockError> {
        if duration.is_zero() {
            return Err(LockError::Configuration(
                "expected positive non zero duration, but was 0ms".into(),
            ));
        }
        Ok(PositiveDuration(duration))
    }

    pub fn from_millis(millis: u64) -> Result<Self, LockError> {
        Self::new(Duration::from_millis(millis))
    }

    pub fn from_secs(secs: u64) -> Result<Self, LockError> {
        Self::new(Duration::from_secs(secs))
    }

    pub fn get(self) -> Duration {
        self.0
    }

    /// Whole milliseconds, rounded up so a sub-millisecond duration never
    /// reads back as zero.
    pub fn as_millis(&self) -> u64 {
        let mut millis = self.0.as_millis();
        if self.0.subsec_nanos() % 1_000_000 != 0 {
            millis += 1;
        }
        u64::try_from(millis).unwrap_or(u64::MAX)
    }
}

impl From<PositiveDuration> for Duration {
    fn from(value: PositiveDuration) -> Self {
        value.0
    }
}

impl TryFrom<Duration> for PositiveDuration {
    type Error = LockError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<u64> for PositiveDuration {
    type Error = LockError;

    fn try_from(millis: u64) -> Result<Self, Self::Error> {
        Self::from_millis(millis)
    }
}

impl From<PositiveDuration> for u64 {
    fn from(value: PositiveDuration) -> Self {
        value.as_millis()
    }
}

impl fmt::Display for PositiveDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_millis())
    }
}
