use std::fmt;

use super::Word;

/// A raw, caller-supplied lock key before normalization.
///
/// Registries are looked up by name at runtime, so the manager accepts keys
/// of any supported shape and lets the registry's key factory decide whether
/// it understands the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Str(String),
    Int(i32),
    Long(i64),
    Word(Word),
    /// The rendered `Display` form of an arbitrary object.
    Object(String),
}

impl KeyValue {
    /// Wrap any displayable value as an object key.
    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        KeyValue::Object(value.to_string())
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            KeyValue::Str(_) => "string",
            KeyValue::Int(_) => "integer",
            KeyValue::Long(_) => "long",
            KeyValue::Word(_) => "word",
            KeyValue::Object(_) => "object",
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Str(s) | KeyValue::Object(s) => f.write_str(s),
            KeyValue::Int(i) => write!(f, "{}", i),
            KeyValue::Long(l) => write!(f, "{}", l),
            KeyValue::Word(w) => write!(f, "{}", w),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Str(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Str(value)
    }
}

impl From<&String> for KeyValue {
    fn from(value: &String) -> Self {
        KeyValue::Str(value.clone())
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Int(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Long(value)
    }
}

impl From<Word> for KeyValue {
    fn from(value: Word) -> Self {
        KeyValue::Word(value)
    }
}

impl From<&Word> for KeyValue {
    fn from(value: &Word) -> Self {
        KeyValue::Word(value.clone())
    }
}
