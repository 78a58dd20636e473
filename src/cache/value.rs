//! Scalar payloads and their byte encodings.

use std::fmt;

use crate::error::{CacheError, Result};
use crate::instrument::{float_repr, Repr};

// == Value ==
/// A scalar the typed cache can store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bytes(Vec<u8>),
    Integer(i64),
    Float(f64),
}

impl Value {
    /// Encodes the value the way it is written to the store.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Text(text) => text.as_bytes().to_vec(),
            Value::Bytes(bytes) => bytes.clone(),
            Value::Integer(n) => n.to_string().into_bytes(),
            Value::Float(f) => float_repr(*f).into_bytes(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => f.write_str(&float_repr(*x)),
        }
    }
}

impl Repr for Value {
    fn repr(&self) -> String {
        match self {
            Value::Text(text) => text.repr(),
            Value::Bytes(bytes) => bytes.repr(),
            Value::Integer(n) => n.repr(),
            Value::Float(x) => x.repr(),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

// == Decoders ==
/// Decodes stored bytes as UTF-8 text.
pub fn decode_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| CacheError::Decode(format!("not valid UTF-8: {}", e)))
}

/// Decodes stored bytes as a base-10 integer.
pub fn decode_integer(bytes: Vec<u8>) -> Result<i64> {
    let text = decode_text(bytes)?;
    text.trim()
        .parse()
        .map_err(|e| CacheError::Decode(format!("{:?} is not an integer: {}", text, e)))
}

/// Decodes stored bytes as a floating-point number.
pub fn decode_float(bytes: Vec<u8>) -> Result<f64> {
    let text = decode_text(bytes)?;
    text.trim()
        .parse()
        .map_err(|e| CacheError::Decode(format!("{:?} is not a number: {}", text, e)))
}
