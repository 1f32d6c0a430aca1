//! The frozen value tree and the freeze engine.
//!
//! A [`Frozen`] handle is a reference-counted, deeply immutable subtree.
//! Handles are only produced by [`freeze`], so holding one is proof that the
//! whole subtree below it was validated: the engine never re-descends into a
//! handle it is given back.

use crate::error::{StrataError, StrataResult};
use crate::path::{Path, Seg};
use crate::value::{Number, Value};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A shared handle to an immutable subtree.
///
/// Two handles can be compared for identity with [`Arc::ptr_eq`]; structural
/// sharing guarantees that nodes untouched by a write keep their identity
/// across store roots.
pub type Frozen = Arc<Node>;

/// One node of the immutable value tree.
///
/// Immutability is by construction: no variant carries interior mutability,
/// and children are [`Frozen`] handles.
#[derive(Debug)]
pub enum Node {
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
    /// An ordered list of subtrees.
    Sequence(Vec<Frozen>),
    /// A keyed mapping of subtrees.
    Mapping(BTreeMap<String, Frozen>),
}

impl Node {
    /// A short name for this node's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::Text(_) => "string",
            Node::Pattern(_) => "pattern",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }

    /// Whether this node is a sequence or a mapping.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Node::Sequence(_) | Node::Mapping(_))
    }

    /// Export this subtree as JSON.
    ///
    /// Patterns export as their pattern string; JSON has no pattern kind, so
    /// the conversion is lossy there.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Null => serde_json::Value::Null,
            Node::Bool(b) => serde_json::Value::Bool(*b),
            Node::Number(Number::Int(i)) => serde_json::Value::from(*i),
            Node::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Node::Text(s) => serde_json::Value::String(s.clone()),
            Node::Pattern(r) => serde_json::Value::String(r.as_str().to_owned()),
            Node::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(|i| i.to_json()).collect())
            }
            Node::Mapping(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(a), Node::Bool(b)) => a == b,
            (Node::Number(a), Node::Number(b)) => a == b,
            (Node::Text(a), Node::Text(b)) => a == b,
            (Node::Pattern(a), Node::Pattern(b)) => a.as_str() == b.as_str(),
            (Node::Sequence(a), Node::Sequence(b)) => a == b,
            (Node::Mapping(a), Node::Mapping(b)) => a == b,
            _ => false,
        }
    }
}

/// Deep-freeze a value into an immutable shared subtree.
///
/// Primitives become fresh leaves; sequences and mappings are frozen
/// recursively; an already-frozen subtree is returned unchanged. Binary
/// buffers (and a bare [`Value::Absent`]) are refused with
/// [`StrataError::UnsupportedValueKind`].
///
/// # Examples
///
/// ```
/// use strata::{freeze, Value};
/// use serde_json::json;
///
/// let frozen = freeze(Value::from(json!({"a": [1, 2]}))).unwrap();
/// assert_eq!(frozen.to_json(), json!({"a": [1, 2]}));
///
/// // Re-freezing a frozen subtree reuses it.
/// let again = freeze(Value::Frozen(frozen.clone())).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&frozen, &again));
/// ```
pub fn freeze(value: Value) -> StrataResult<Frozen> {
    match value {
        Value::Absent => Err(StrataError::unsupported_value_kind("absent value")),
        Value::Null => Ok(Arc::new(Node::Null)),
        Value::Bool(b) => Ok(Arc::new(Node::Bool(b))),
        Value::Number(n) => Ok(Arc::new(Node::Number(n))),
        Value::Text(s) => Ok(Arc::new(Node::Text(s))),
        // A pattern is copy-constructed into a fresh node; pattern identity is
        // never shared with the caller's handle.
        Value::Pattern(r) => Ok(Arc::new(Node::Pattern(r))),
        Value::Bytes(_) => Err(StrataError::unsupported_value_kind("binary buffer")),
        Value::Sequence(items) => Ok(Arc::new(Node::Sequence(freeze_sequence(items)?))),
        Value::Mapping(fields) => {
            let mut out = BTreeMap::new();
            for (key, field) in fields {
                if matches!(field, Value::Absent) {
                    continue;
                }
                out.insert(key, freeze(field)?);
            }
            Ok(Arc::new(Node::Mapping(out)))
        }
        Value::Frozen(h) => Ok(h),
    }
}

// Sequences dispatch on the first element's kind. Flat primitive sequences
// (large geometry buffers, string tables) take a monomorphic copy loop per
// kind; anything else gets the full recursive freeze per element.
fn freeze_sequence(items: Vec<Value>) -> StrataResult<Vec<Frozen>> {
    match items.first() {
        None => Ok(Vec::new()),
        Some(Value::Bool(_)) => freeze_bool_sequence(items),
        Some(Value::Number(_)) => freeze_number_sequence(items),
        Some(Value::Text(_)) => freeze_text_sequence(items),
        Some(_) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(freeze_element(item)?);
            }
            Ok(out)
        }
    }
}

fn freeze_bool_sequence(items: Vec<Value>) -> StrataResult<Vec<Frozen>> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Bool(b) => out.push(Arc::new(Node::Bool(b))),
            other => out.push(freeze_element(other)?),
        }
    }
    Ok(out)
}

fn freeze_number_sequence(items: Vec<Value>) -> StrataResult<Vec<Frozen>> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Number(n) => out.push(Arc::new(Node::Number(n))),
            other => out.push(freeze_element(other)?),
        }
    }
    Ok(out)
}

fn freeze_text_sequence(items: Vec<Value>) -> StrataResult<Vec<Frozen>> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Text(s) => out.push(Arc::new(Node::Text(s))),
            other => out.push(freeze_element(other)?),
        }
    }
    Ok(out)
}

// A sequence slot with no value freezes to null, the way sparse data
// serializes to JSON.
pub(crate) fn freeze_element(value: Value) -> StrataResult<Frozen> {
    match value {
        Value::Absent => Ok(Arc::new(Node::Null)),
        other => freeze(other),
    }
}

/// Walk a frozen tree by path.
///
/// Returns `None` as soon as a segment finds nothing: a missing field, an
/// out-of-range index, or a segment applied to a leaf. Never an error.
pub fn lookup<'a>(root: &'a Frozen, path: &Path) -> Option<&'a Frozen> {
    let mut current = root;
    for seg in path.segments() {
        current = child_of(current, seg)?;
    }
    Some(current)
}

/// Resolve one segment against one node, duck-typed by the node's shape.
pub(crate) fn child_of<'a>(node: &'a Node, seg: &Seg) -> Option<&'a Frozen> {
    match (node, seg) {
        (Node::Mapping(fields), Seg::Key(k)) => fields.get(k),
        (Node::Mapping(fields), Seg::Index(i)) => fields.get(&i.to_string()),
        (Node::Sequence(items), Seg::Index(i)) => items.get(*i),
        (Node::Sequence(items), Seg::Key(k)) => {
            k.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_freeze_primitives() {
        assert_eq!(*freeze(Value::Null).unwrap(), Node::Null);
        assert_eq!(*freeze(Value::from(true)).unwrap(), Node::Bool(true));
        assert_eq!(
            *freeze(Value::from("hi")).unwrap(),
            Node::Text("hi".into())
        );
    }

    #[test]
    fn test_freeze_rejects_bytes() {
        let err = freeze(Value::Bytes(vec![1, 2])).unwrap_err();
        assert!(matches!(err, StrataError::UnsupportedValueKind { .. }));
    }

    #[test]
    fn test_freeze_rejects_nested_bytes() {
        let value = Value::Mapping(
            [("blob".to_owned(), Value::Bytes(vec![0]))].into_iter().collect(),
        );
        assert!(freeze(value).is_err());
    }

    #[test]
    fn test_freeze_rejects_bytes_in_mixed_sequence() {
        // The primitive fast path still falls back to validation for
        // non-primitive tail elements.
        let value = Value::Sequence(vec![Value::from(1i64), Value::Bytes(vec![0])]);
        assert!(freeze(value).is_err());
    }

    #[test]
    fn test_freeze_empty_sequence() {
        let frozen = freeze(Value::Sequence(vec![])).unwrap();
        assert_eq!(frozen.to_json(), json!([]));
    }

    #[test]
    fn test_freeze_primitive_sequences() {
        let bools = freeze(Value::from(json!([true, false]))).unwrap();
        assert_eq!(bools.to_json(), json!([true, false]));

        let numbers = freeze(Value::from(json!([0, 1]))).unwrap();
        assert_eq!(numbers.to_json(), json!([0, 1]));

        let texts = freeze(Value::from(json!(["hello", "world"]))).unwrap();
        assert_eq!(texts.to_json(), json!(["hello", "world"]));
    }

    #[test]
    fn test_freeze_mixed_sequence_recurses() {
        let frozen = freeze(Value::from(json!([{"a": 1, "b": [3, 4]}, "foo", 3]))).unwrap();
        assert_eq!(frozen.to_json(), json!([{"a": 1, "b": [3, 4]}, "foo", 3]));
    }

    #[test]
    fn test_freeze_reuses_frozen_subtrees() {
        let inner = freeze(Value::from(json!({"x": 1}))).unwrap();
        let outer = freeze(Value::Mapping(
            [("a".to_owned(), Value::Frozen(inner.clone()))]
                .into_iter()
                .collect(),
        ))
        .unwrap();
        let Node::Mapping(fields) = &*outer else {
            panic!("expected mapping");
        };
        assert!(Arc::ptr_eq(fields.get("a").unwrap(), &inner));
    }

    #[test]
    fn test_freeze_omits_absent_fields() {
        let value = Value::Mapping(
            [
                ("keep".to_owned(), Value::from(1i64)),
                ("drop".to_owned(), Value::Absent),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(freeze(value).unwrap().to_json(), json!({"keep": 1}));
    }

    #[test]
    fn test_freeze_pattern() {
        let frozen = freeze(Value::Pattern(Regex::new("a+").unwrap())).unwrap();
        let Node::Pattern(r) = &*frozen else {
            panic!("expected pattern");
        };
        assert!(r.is_match("aaa"));
        assert_eq!(frozen.to_json(), json!("a+"));
    }

    #[test]
    fn test_lookup() {
        let root = freeze(Value::from(json!({"a": {"b": [10, 20]}}))).unwrap();
        let hit = lookup(&root, &Path::parse("a.b.1")).unwrap();
        assert_eq!(hit.to_json(), json!(20));

        assert!(lookup(&root, &Path::parse("a.x")).is_none());
        assert!(lookup(&root, &Path::parse("a.b.5")).is_none());
        assert!(lookup(&root, &Path::parse("a.b.1.deeper")).is_none());
    }

    #[test]
    fn test_lookup_digit_key_against_mapping() {
        let root = freeze(Value::from(json!({"0": "zero"}))).unwrap();
        let hit = lookup(&root, &Path::parse("0")).unwrap();
        assert_eq!(hit.to_json(), json!("zero"));
    }
}
