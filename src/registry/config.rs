use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LockingPolicy;
use crate::key::{BuiltinKeyFactory, LockKeyFactory, Word};
use crate::{LockError, PositiveDuration};

/// Everything needed to build one lock registry.
///
/// Two configs are equal when their names, overrides and key-factory kinds
/// match; factories carry no state, so comparing `name()` is enough.
#[derive(Clone)]
pub struct LockRegistryConfig {
    name: Word,
    key_factory: Arc<dyn LockKeyFactory>,
    policy: Option<LockingPolicy>,
    timeout: Option<PositiveDuration>,
}

impl LockRegistryConfig {
    pub fn new(
        name: impl Into<String>,
        key_factory: impl LockKeyFactory + 'static,
    ) -> Result<Self, LockError> {
        let name = Word::new(name)
            .map_err(|e| LockError::Configuration(format!("invalid lock registry name: {}", e)))?;
        Ok(Self::with_shared_factory(name, Arc::new(key_factory)))
    }

    pub fn with_shared_factory(name: Word, key_factory: Arc<dyn LockKeyFactory>) -> Self {
        LockRegistryConfig {
            name,
            key_factory,
            policy: None,
            timeout: None,
        }
    }

    /// Override the synchronizer's default policy for this registry.
    pub fn with_policy(mut self, policy: LockingPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_timeout(mut self, timeout: PositiveDuration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &Word {
        &self.name
    }

    pub fn key_factory(&self) -> &Arc<dyn LockKeyFactory> {
        &self.key_factory
    }

    pub fn policy_override(&self) -> Option<LockingPolicy> {
        self.policy
    }

    pub fn timeout_override(&self) -> Option<PositiveDuration> {
        self.timeout
    }
}

impl PartialEq for LockRegistryConfig {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.key_factory.name() == other.key_factory.name()
            && self.policy == other.policy
            && self.timeout == other.timeout
    }
}

impl Eq for LockRegistryConfig {}

impl fmt::Debug for LockRegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockRegistryConfig")
            .field("name", &self.name)
            .field("key_factory", &self.key_factory.name())
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A registry as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDefinition {
    pub name: String,
    pub key_factory: BuiltinKeyFactory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<LockingPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl RegistryDefinition {
    pub fn new(name: impl Into<String>, key_factory: BuiltinKeyFactory) -> Self {
        RegistryDefinition {
            name: name.into(),
            key_factory,
            policy: None,
            timeout_ms: None,
        }
    }
}

impl TryFrom<&RegistryDefinition> for LockRegistryConfig {
    type Error = LockError;

    fn try_from(def: &RegistryDefinition) -> Result<Self, Self::Error> {
        let name = Word::new(def.name.as_str())
            .map_err(|e| LockError::Configuration(format!("invalid lock registry name: {}", e)))?;
        let mut config = LockRegistryConfig::with_shared_factory(name, def.key_factory.factory());
        if let Some(policy) = def.policy {
            config = config.with_policy(policy);
        }
        if let Some(millis) = def.timeout_ms {
            config = config.with_timeout(PositiveDuration::from_millis(millis)?);
        }
        Ok(config)
    }
}
