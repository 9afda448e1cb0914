use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{KeyValue, LockKey};
use crate::LockError;

/// Converts a caller's raw key into a normalized `LockKey`.
///
/// Implementations must be deterministic and stateless: the same input
/// always yields an equal key, and an input that can't be represented is an
/// `InvalidKey` error rather than a different valid key.
pub trait LockKeyFactory: Send + Sync + fmt::Debug {
    /// Identifies the kind of factory. Factories with the same name are
    /// interchangeable.
    fn name(&self) -> &'static str;

    fn to_key(&self, key: &KeyValue) -> Result<LockKey, LockError>;
}

fn unsupported(factory: &dyn LockKeyFactory, key: &KeyValue) -> LockError {
    LockError::InvalidKey(format!(
        "{} lock key factory can't convert a {} key",
        factory.name(),
        key.kind()
    ))
}

/// Base64url (unpadded) keeps arbitrary text inside the word alphabet.
fn encode(value: &str) -> Result<LockKey, LockError> {
    LockKey::new(URL_SAFE_NO_PAD.encode(value.as_bytes()))
}

/// Strings as lock keys. Keys are base64url-encoded, because not every
/// string is a valid coordination-service path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringLockKeyFactory;

impl LockKeyFactory for StringLockKeyFactory {
    fn name(&self) -> &'static str {
        "string"
    }

    fn to_key(&self, key: &KeyValue) -> Result<LockKey, LockError> {
        match key {
            KeyValue::Str(s) if s.is_empty() => {
                Err(LockError::InvalidKey("empty interprocess lock key".into()))
            }
            KeyValue::Str(s) => encode(s),
            other => Err(unsupported(self, other)),
        }
    }
}

/// 32-bit integers as lock keys, kept human readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerLockKeyFactory;

impl LockKeyFactory for IntegerLockKeyFactory {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn to_key(&self, key: &KeyValue) -> Result<LockKey, LockError> {
        match key {
            KeyValue::Int(i) => LockKey::new(i.to_string()),
            other => Err(unsupported(self, other)),
        }
    }
}

/// 64-bit integers as lock keys, kept human readable. Also accepts 32-bit
/// values, which render identically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LongLockKeyFactory;

impl LockKeyFactory for LongLockKeyFactory {
    fn name(&self) -> &'static str {
        "long"
    }

    fn to_key(&self, key: &KeyValue) -> Result<LockKey, LockError> {
        match key {
            KeyValue::Long(l) => LockKey::new(l.to_string()),
            KeyValue::Int(i) => LockKey::new(i64::from(*i).to_string()),
            other => Err(unsupported(self, other)),
        }
    }
}

/// Words are already path safe, so they are used as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordLockKeyFactory;

impl LockKeyFactory for WordLockKeyFactory {
    fn name(&self) -> &'static str {
        "word"
    }

    fn to_key(&self, key: &KeyValue) -> Result<LockKey, LockError> {
        match key {
            KeyValue::Word(w) => Ok(LockKey::from(w)),
            other => Err(unsupported(self, other)),
        }
    }
}

/// Any value as a lock key, derived from the base64url of its rendered form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToStringLockKeyFactory;

impl LockKeyFactory for ToStringLockKeyFactory {
    fn name(&self) -> &'static str {
        "to_string"
    }

    fn to_key(&self, key: &KeyValue) -> Result<LockKey, LockError> {
        encode(&key.to_string())
    }
}

/// The built-in factories, by configuration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinKeyFactory {
    String,
    Integer,
    Long,
    Word,
    ToString,
}

impl BuiltinKeyFactory {
    pub fn factory(self) -> Arc<dyn LockKeyFactory> {
        match self {
            BuiltinKeyFactory::String => Arc::new(StringLockKeyFactory),
            BuiltinKeyFactory::Integer => Arc::new(IntegerLockKeyFactory),
            BuiltinKeyFactory::Long => Arc::new(LongLockKeyFactory),
            BuiltinKeyFactory::Word => Arc::new(WordLockKeyFactory),
            BuiltinKeyFactory::ToString => Arc::new(ToStringLockKeyFactory),
        }
    }
}
