//! Field values and their data types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The data types a field may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Bool,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => write!(f, "string"),
            DataType::Bool => write!(f, "bool"),
        }
    }
}

/// A single field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    String(String),
}

impl Value {
    /// The data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Bool(_) => DataType::Bool,
            Value::String(_) => DataType::String,
        }
    }

    /// Borrow the string contents, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Bool(_) => None,
        }
    }

    /// The boolean contents, if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(_) => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json_shape() {
        let json = serde_json::to_string(&Value::from(true)).unwrap();
        assert_eq!(json, "true");

        let json = serde_json::to_string(&Value::from("print(1)")).unwrap();
        assert_eq!(json, "\"print(1)\"");

        let parsed: Value = serde_json::from_str("false").unwrap();
        assert_eq!(parsed, Value::Bool(false));
    }

    #[test]
    fn test_accessors() {
        let s = Value::from("x");
        assert_eq!(s.as_str(), Some("x"));
        assert_eq!(s.as_bool(), None);
        assert_eq!(s.data_type(), DataType::String);

        let b = Value::from(true);
        assert_eq!(b.as_bool(), Some(true));
        assert_eq!(b.as_str(), None);
        assert_eq!(b.data_type(), DataType::Bool);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(false).to_string(), "false");
        assert_eq!(Value::from("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(DataType::Bool.to_string(), "bool");
    }
}
