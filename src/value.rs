//! Dynamic value type
//!
//! Methods and replicated state carry loosely-typed arguments. This enum
//! is the unified representation used on both sides of a channel-pair.

use std::collections::HashMap;

use bytes::Bytes;

/// Unified argument and replication value
///
/// Designed to be cheap to clone through a broadcast channel: the `Bytes`
/// variant is reference-counted, not copied.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Nil,

    /// Boolean value
    Bool(bool),

    /// IEEE 754 double-precision floating point
    Number(f64),

    /// UTF-8 string
    String(String),

    /// Raw byte payload (zero-copy via reference counting)
    Bytes(Bytes),

    /// Ordered array
    Array(Vec<Value>),

    /// Key-value map; keys are always strings
    Map(HashMap<String, Value>),
}

impl Value {
    /// Try to get this value as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as a byte payload
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get this value as an array reference
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Try to get this value as a map reference
    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Check if this value is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::String("hi".into()).as_str(), Some("hi"));
        assert_eq!(Value::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert!(Value::Nil.is_nil());

        // Mismatched accessors return None
        assert_eq!(Value::Number(1.0).as_str(), None);
        assert_eq!(Value::String("1".into()).as_number(), None);
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(10), Value::Number(10.0));
        assert_eq!(Value::from("score"), Value::String("score".into()));
        assert_eq!(Value::from(false), Value::Bool(false));

        let bytes = Bytes::from_static(b"blob");
        assert_eq!(Value::from(bytes.clone()).as_bytes(), Some(&bytes));
    }

    #[test]
    fn test_array_and_map() {
        let arr = Value::Array(vec![Value::from(1), Value::from(2)]);
        assert_eq!(arr.as_array().map(|a| a.len()), Some(2));

        let mut m = HashMap::new();
        m.insert("hp".to_string(), Value::from(100));
        let map = Value::Map(m);
        assert_eq!(
            map.as_map().and_then(|m| m.get("hp")),
            Some(&Value::Number(100.0))
        );
    }
}
