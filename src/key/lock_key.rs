use std::fmt;

use super::word::{is_word, Word};
use crate::LockError;

/// A normalized lock key.
///
/// The value is used verbatim as a cache key and as the last segment of a
/// coordination-service path, so it is restricted to the word alphabet.
/// Two keys are equal iff their normalized values are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockKey(String);

impl LockKey {
    pub fn new(value: impl Into<String>) -> Result<Self, LockError> {
        let value = value.into();
        if value.is_empty() {
            return Err(LockError::InvalidKey("undefined lock key".into()));
        }
        if !is_word(&value) {
            return Err(LockError::InvalidKey(format!(
                "lock key can't contain a non-word character: '{}'",
                value
            )));
        }
        Ok(LockKey(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Word> for LockKey {
    fn from(word: Word) -> Self {
        LockKey(word.into_string())
    }
}

impl From<&Word> for LockKey {
    fn from(word: &Word) -> Self {
        LockKey(word.as_str().to_string())
    }
}

impl AsRef<str> for LockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
