use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Key
///
/// Entity identifier. Numeric ids sort before text ids; within a variant
/// the natural order applies. This is the pagination tie-break order.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl Key {
    /// Interpret a field value as a key, if it has a key-compatible shape.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(Self::Int(*v)),
            Value::Uint(v) => i64::try_from(*v).ok().map(Self::Int),
            Value::Text(v) => Some(Self::Text(v.clone())),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(v) => Value::Int(*v),
            Self::Text(v) => Value::Text(v.clone()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(v) => Self::Int(v),
            Key::Text(v) => Self::Text(v),
        }
    }
}

///
/// TESTS
///
