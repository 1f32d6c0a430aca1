//! Recursive, right-biased reconciliation of an existing subtree with an
//! incoming value.
//!
//! The result is frozen except where an already-frozen subtree from either
//! side can be reused by reference: a frozen right-hand side landing where the
//! left side has no container is adopted wholesale, and a right-hand side that
//! *is* the left-hand side short-circuits to itself. Repeated merges of an
//! unchanged subtree therefore cost no allocation and preserve identity.

use crate::error::{StrataError, StrataResult};
use crate::node::{freeze, Frozen, Node};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Merge `right` onto `left`, producing the replacement subtree.
///
/// `Ok(None)` means the merge resolved to no value at all (an absent right);
/// the caller removes the entry it was about to fill.
pub(crate) fn merge_values(
    left: Option<&Frozen>,
    right: Value,
) -> StrataResult<Option<Frozen>> {
    match right {
        // Primitives overwrite whatever was there.
        Value::Absent => Ok(None),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Text(_) => {
            Ok(Some(freeze(right)?))
        }
        Value::Pattern(r) => Ok(Some(Arc::new(Node::Pattern(r)))),
        Value::Bytes(_) => Err(StrataError::unsupported_value_kind("binary buffer")),
        Value::Frozen(h) => merge_frozen(left, h),
        Value::Sequence(items) => {
            let mut out = seed_sequence(left);
            for (i, item) in items.into_iter().enumerate() {
                if matches!(item, Value::Absent) {
                    continue;
                }
                place(&mut out, i, freeze(item)?);
            }
            Ok(Some(Arc::new(Node::Sequence(out))))
        }
        Value::Mapping(fields) => {
            let mut out = seed_mapping(left);
            for (key, field) in fields {
                let existing = out.get(&key).cloned();
                match merge_values(existing.as_ref(), field)? {
                    Some(merged) => {
                        out.insert(key, merged);
                    }
                    None => {
                        out.remove(&key);
                    }
                }
            }
            Ok(Some(Arc::new(Node::Mapping(out))))
        }
    }
}

// A frozen right-hand side is adopted as-is unless the left side is a
// container it has to reconcile with; then the recursion runs over the
// handle's children so untouched subtrees keep their identity.
fn merge_frozen(left: Option<&Frozen>, right: Frozen) -> StrataResult<Option<Frozen>> {
    let left_container = match left {
        Some(l) => l.is_container() || matches!(&**l, Node::Pattern(_)),
        None => false,
    };
    if !left_container {
        return Ok(Some(right));
    }
    if let Some(l) = left {
        if Arc::ptr_eq(l, &right) {
            return Ok(Some(right));
        }
    }
    match &*right {
        Node::Pattern(r) => Ok(Some(Arc::new(Node::Pattern(r.clone())))),
        Node::Sequence(items) => {
            let mut out = seed_sequence(left);
            for (i, item) in items.iter().enumerate() {
                place(&mut out, i, item.clone());
            }
            Ok(Some(Arc::new(Node::Sequence(out))))
        }
        Node::Mapping(fields) => {
            let mut out = seed_mapping(left);
            for (key, field) in fields {
                let existing = out.get(key).cloned();
                match merge_values(existing.as_ref(), Value::Frozen(field.clone()))? {
                    Some(merged) => {
                        out.insert(key.clone(), merged);
                    }
                    None => {
                        out.remove(key);
                    }
                }
            }
            Ok(Some(Arc::new(Node::Mapping(out))))
        }
        // A frozen primitive overwrites, like any primitive.
        _ => Ok(Some(right)),
    }
}

// Sequences merge index-wise into a copy of the left side, so left elements
// past the right side's length survive. A left side of any other shape
// contributes nothing.
fn seed_sequence(left: Option<&Frozen>) -> Vec<Frozen> {
    match left.map(|l| &**l) {
        Some(Node::Sequence(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn seed_mapping(left: Option<&Frozen>) -> BTreeMap<String, Frozen> {
    match left.map(|l| &**l) {
        Some(Node::Mapping(fields)) => fields.clone(),
        _ => BTreeMap::new(),
    }
}

// Overwrite index `i`, growing the sequence if needed; skipped-over new slots
// read as null.
pub(crate) fn place(out: &mut Vec<Frozen>, i: usize, value: Frozen) {
    if i < out.len() {
        out[i] = value;
    } else {
        while out.len() < i {
            out.push(Arc::new(Node::Null));
        }
        out.push(value);
    }
}
