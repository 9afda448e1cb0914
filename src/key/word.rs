use std::fmt;

use serde::{Deserialize, Serialize};

use crate::LockError;

/// A non-blank string made only of ASCII letters, digits, `_` and `-`.
///
/// Words are safe as URL segments, file names and coordination-service node
/// names, which is why registry names and lock keys are built from them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word(String);

impl Word {
    pub fn new(value: impl Into<String>) -> Result<Self, LockError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(LockError::InvalidKey("blank word value".into()));
        }
        if !is_word(&value) {
            return Err(LockError::InvalidKey(format!(
                "not a valid word: '{}'",
                value
            )));
        }
        Ok(Word(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Whether `value` is non-empty and drawn entirely from the word alphabet.
pub(crate) fn is_word(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

impl TryFrom<String> for Word {
    type Error = LockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Word::new(value)
    }
}

impl TryFrom<&str> for Word {
    type Error = LockError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Word::new(value)
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
