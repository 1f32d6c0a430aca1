//! Caller-side values offered to the store.
//!
//! A [`Value`] is the plain, owned tree an embedder hands to `set` and
//! `merge`. The store never holds a `Value` directly: writes pass through the
//! freeze engine, which turns the tree into shared immutable [`Frozen`]
//! handles. [`Value::Frozen`] feeds an already-immutable subtree back in and
//! is stored without copying.

use crate::node::Frozen;
use regex::Regex;
use std::collections::BTreeMap;

/// A numeric leaf, integer or floating point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
}

impl Number {
    /// Convert to f64.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    /// Get the integer value, if this is an integer.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(*i),
            Number::Float(_) => None,
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Int(v as i64)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

/// A plain value tree, as built by callers.
///
/// `Value` covers the storable universe (null, booleans, numbers, strings,
/// patterns, sequences, keyed mappings) plus three kinds with special
/// handling:
///
/// - [`Value::Frozen`] — an immutable subtree obtained from a store; reused
///   by reference instead of being copied.
/// - [`Value::Bytes`] — representable so embedders can offer it, but refused
///   by the store with [`UnsupportedValueKind`](crate::StrataError).
/// - [`Value::Absent`] — the "no value here" marker: skipped over in sequence
///   merges, omitted from mapping freezes, and removing when written.
#[derive(Clone, Debug)]
pub enum Value {
    /// No value. See the type-level docs for how writes treat it.
    Absent,
    /// The null value.
    Null,
    /// A boolean leaf.
    Bool(bool),
    /// A numeric leaf.
    Number(Number),
    /// A text leaf.
    Text(String),
    /// A regular-expression leaf.
    Pattern(Regex),
    /// Raw binary data. Not storable.
    Bytes(Vec<u8>),
    /// An ordered list of values.
    Sequence(Vec<Value>),
    /// A keyed mapping of values.
    Mapping(BTreeMap<String, Value>),
    /// An already-immutable subtree, stored by reference.
    Frozen(Frozen),
}

impl Value {
    /// A short name for this value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Absent => "absent value",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "string",
            Value::Pattern(_) => "pattern",
            Value::Bytes(_) => "binary buffer",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Frozen(h) => h.kind_name(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(Number::Int(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(Number::Int(v as i64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(Number::Float(v))
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Regex> for Value {
    fn from(v: Regex) -> Self {
        Value::Pattern(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Sequence(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Mapping(v)
    }
}

impl From<Frozen> for Value {
    fn from(v: Frozen) -> Self {
        Value::Frozen(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Int(i)),
                None => Value::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Mapping(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
