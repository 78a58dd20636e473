//! Request DTOs for the HTTP API
//!
//! Defines incoming bodies and query strings.

use serde::Deserialize;

use crate::cache::Value;

/// A scalar accepted by `PUT /store`.
///
/// JSON integers become `Integer`, numbers with a fraction or exponent
/// `Float`, strings `Text`. Integers outside the `i64` range are rejected
/// rather than stored as a lossy float.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum ScalarInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<serde_json::Value> for ScalarInput {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(text) => Ok(ScalarInput::Text(text)),
            serde_json::Value::Number(number) => {
                if let Some(n) = number.as_i64() {
                    Ok(ScalarInput::Integer(n))
                } else if number.is_u64() {
                    Err(format!("integer {} is out of range", number))
                } else {
                    number
                        .as_f64()
                        .map(ScalarInput::Float)
                        .ok_or_else(|| format!("unsupported number {}", number))
                }
            }
            other => Err(format!("expected a string or a number, got {}", other)),
        }
    }
}

impl From<ScalarInput> for Value {
    fn from(input: ScalarInput) -> Self {
        match input {
            ScalarInput::Integer(n) => Value::Integer(n),
            ScalarInput::Float(x) => Value::Float(x),
            ScalarInput::Text(s) => Value::Text(s),
        }
    }
}

/// Request body for `PUT /store`
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequest {
    pub value: ScalarInput,
}

/// How `GET /retrieve/:key` decodes the stored bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeAs {
    #[default]
    Text,
    Integer,
    Float,
}

/// Query string for `GET /retrieve/:key`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveParams {
    #[serde(rename = "as", default)]
    pub decode: Option<DecodeAs>,
}

/// Query string for `GET /fetch`
#[derive(Debug, Clone, Deserialize)]
pub struct FetchParams {
    pub url: String,
}
