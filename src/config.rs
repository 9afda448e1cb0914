//! Global synchronizer configuration.
//!
//! Usually deserialized from the application's own configuration file:
//!
//! ```json
//! {
//!   "scope": "distributed",
//!   "default_policy": "best_effort",
//!   "base_path": "/myapp/locks",
//!   "default_timeout_ms": 5000,
//!   "registries": [
//!     { "name": "orders", "key_factory": "string", "policy": "strict" },
//!     { "name": "accounts", "key_factory": "long", "timeout_ms": 250 }
//!   ]
//! }
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registry::RegistryDefinition;
use crate::timeout::DEFAULT_TIMEOUT;
use crate::{LockError, PositiveDuration};

pub const DEFAULT_BASE_PATH: &str = "/synchronizer";

/// How long an unreferenced, unlocked handle stays cached.
pub const DEFAULT_IDLE_EVICTION: Duration = Duration::from_secs(60);

/// What to do when cluster-wide exclusivity can't be confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockingPolicy {
    /// Deny access to the critical section if the cluster lock can't be
    /// obtained.
    #[default]
    Strict,
    /// Fall back to a process-scoped lock if the coordination service
    /// malfunctions.
    BestEffort,
}

/// Where mutual exclusion is enforced. Chosen once, at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Single process, or tests.
    Local,
    /// Cluster-wide, through a coordination service.
    Distributed,
}

impl FromStr for Scope {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Scope::Local),
            "distributed" => Ok(Scope::Distributed),
            other => Err(LockError::Configuration(format!(
                "unexpected synchronizer scope: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => f.write_str("local"),
            Scope::Distributed => f.write_str("distributed"),
        }
    }
}

impl FromStr for LockingPolicy {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(LockingPolicy::Strict),
            "best_effort" => Ok(LockingPolicy::BestEffort),
            other => Err(LockError::Configuration(format!(
                "unexpected locking policy: {}",
                other
            ))),
        }
    }
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_timeout() -> PositiveDuration {
    DEFAULT_TIMEOUT
}

fn default_idle_eviction_ms() -> u64 {
    DEFAULT_IDLE_EVICTION.as_millis() as u64
}

fn default_require_client() -> bool {
    true
}

/// Process-wide synchronizer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynchronizerConfig {
    pub scope: Scope,
    /// Used by registries without a policy override.
    #[serde(default)]
    pub default_policy: LockingPolicy,
    /// Root of every coordination-service path.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Lowest-precedence timeout.
    #[serde(rename = "default_timeout_ms", default = "default_timeout")]
    pub default_timeout: PositiveDuration,
    #[serde(default = "default_idle_eviction_ms")]
    pub idle_eviction_ms: u64,
    /// Under `Distributed` scope, fail startup without a client instead of
    /// degrading every registry to local-only locks.
    #[serde(default = "default_require_client")]
    pub require_coordination_client: bool,
    #[serde(default)]
    pub registries: Vec<RegistryDefinition>,
}

impl SynchronizerConfig {
    pub fn local() -> Self {
        SynchronizerConfig {
            scope: Scope::Local,
            default_policy: LockingPolicy::default(),
            base_path: default_base_path(),
            default_timeout: DEFAULT_TIMEOUT,
            idle_eviction_ms: default_idle_eviction_ms(),
            require_coordination_client: true,
            registries: Vec::new(),
        }
    }

    pub fn distributed(base_path: impl Into<String>) -> Self {
        SynchronizerConfig {
            scope: Scope::Distributed,
            base_path: base_path.into(),
            ..Self::local()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, LockError> {
        let config: SynchronizerConfig = serde_json::from_str(json)
            .map_err(|e| LockError::Configuration(format!("invalid synchronizer config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_default_policy(mut self, policy: LockingPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn with_default_timeout(mut self, timeout: PositiveDuration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_idle_eviction(mut self, idle: Duration) -> Self {
        self.idle_eviction_ms = idle.as_millis() as u64;
        self
    }

    pub fn with_require_coordination_client(mut self, required: bool) -> Self {
        self.require_coordination_client = required;
        self
    }

    pub fn with_registry(mut self, definition: RegistryDefinition) -> Self {
        self.registries.push(definition);
        self
    }

    pub fn idle_eviction(&self) -> Duration {
        Duration::from_millis(self.idle_eviction_ms)
    }

    pub fn validate(&self) -> Result<(), LockError> {
        if self.scope == Scope::Distributed {
            validate_base_path(&self.base_path)?;
        }
        Ok(())
    }
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self::local()
    }
}

/// Coordination-service paths are absolute and contain no whitespace.
pub(crate) fn validate_base_path(path: &str) -> Result<(), LockError> {
    if path.trim().is_empty() {
        return Err(LockError::Configuration(
            "blank base path for distributed mutexes".into(),
        ));
    }
    if !path.starts_with('/') || path.chars().any(char::is_whitespace) {
        return Err(LockError::Configuration(format!(
            "invalid base path for distributed mutexes: '{}'",
            path
        )));
    }
    Ok(())
}
