//! The value tree that documents travel through the HTTP layer as.
//!
//! The server never looks inside a document; it only needs a faithful,
//! language-neutral shape to move between wire text and a backend.

use std::fmt;

use indexmap::IndexMap;

use super::error::JsonError;
use super::lexer::{Lexer, TokenKind};

/// Object storage. Keys are unique; inserting an existing key replaces its
/// value in place, which gives "last key wins" for duplicate keys on decode.
pub type Map = IndexMap<String, JsonValue>;

/// A JSON number.
///
/// Integral literals that fit in an `i64` stay exact. Fractions, exponents
/// and out-of-range integers are held as `f64`, unless the literal's
/// magnitude overflows `f64`; those keep their wire text as a [`Decimal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
    Decimal(Decimal),
}

impl Number {
    /// `Decimal`s beyond `f64` range come back as an infinity.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Decimal(d) => d.as_f64(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(*i),
            Number::Float(_) | Number::Decimal(_) => None,
        }
    }

    /// False for NaN and the infinities, which JSON cannot represent.
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Int(_) | Number::Decimal(_) => true,
            Number::Float(f) => f.is_finite(),
        }
    }
}

/// The exact text of a JSON number literal, e.g. `1e400`.
///
/// Only constructible from text that matches the JSON number grammar, so
/// the encoder can write it back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(pub(super) String);

impl Decimal {
    /// `None` unless `literal` is exactly one JSON number.
    pub fn parse(literal: &str) -> Option<Self> {
        if literal.is_empty()
            || !literal
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E'))
        {
            return None;
        }
        let mut lexer = Lexer::new(literal);
        match lexer.next_token() {
            Ok(token) if matches!(token.kind, TokenKind::Number(_)) => {}
            _ => return None,
        }
        match lexer.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => Some(Decimal(literal.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0.parse().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

/// A decoded JSON document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsonValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<JsonValue>),
    Object(Map),
}

impl JsonValue {
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            JsonValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<JsonValue>> {
        match self {
            JsonValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            JsonValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Look up a key on an object; `None` for missing keys and non-objects.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Number(_) => "number",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }
}

impl From<bool> for JsonValue {
    fn from(value: bool) -> Self {
        JsonValue::Bool(value)
    }
}

impl From<i64> for JsonValue {
    fn from(value: i64) -> Self {
        JsonValue::Number(Number::Int(value))
    }
}

impl From<f64> for JsonValue {
    fn from(value: f64) -> Self {
        JsonValue::Number(Number::Float(value))
    }
}

impl From<&str> for JsonValue {
    fn from(value: &str) -> Self {
        JsonValue::String(value.to_string())
    }
}

impl From<String> for JsonValue {
    fn from(value: String) -> Self {
        JsonValue::String(value)
    }
}

impl From<Vec<JsonValue>> for JsonValue {
    fn from(value: Vec<JsonValue>) -> Self {
        JsonValue::Array(value)
    }
}

impl From<Map> for JsonValue {
    fn from(value: Map) -> Self {
        JsonValue::Object(value)
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => JsonValue::Null,
            serde_json::Value::Bool(b) => JsonValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => JsonValue::Number(Number::Int(i)),
                None if n.is_u64() => JsonValue::Number(Number::Decimal(Decimal(n.to_string()))),
                None => JsonValue::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => JsonValue::String(s),
            serde_json::Value::Array(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
            serde_json::Value::Object(map) => JsonValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<JsonValue> for serde_json::Value {
    type Error = JsonError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Ok(match value {
            JsonValue::Null => serde_json::Value::Null,
            JsonValue::Bool(b) => serde_json::Value::Bool(b),
            JsonValue::Number(Number::Int(i)) => serde_json::Value::from(i),
            JsonValue::Number(Number::Float(f)) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .ok_or(JsonError::NonFiniteNumber)?,
            JsonValue::Number(Number::Decimal(d)) => match d.as_str().parse::<u64>() {
                Ok(u) => serde_json::Value::from(u),
                Err(_) => serde_json::Number::from_f64(d.as_f64())
                    .map(serde_json::Value::Number)
                    .ok_or(JsonError::NonFiniteNumber)?,
            },
            JsonValue::String(s) => serde_json::Value::String(s),
            JsonValue::Array(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(serde_json::Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            JsonValue::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k, serde_json::Value::try_from(v)?);
                }
                serde_json::Value::Object(out)
            }
        })
    }
}
