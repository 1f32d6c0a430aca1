//! Integration tests for merge semantics.
//!
//! Merge is right-biased and recursive: right-hand primitives overwrite,
//! right-hand containers reconcile field-by-field, and frozen subtrees are
//! adopted by reference wherever the left side has nothing to reconcile with.

use serde_json::json;
use std::sync::Arc;
use strata::{Store, StrataError, Value};

// ============================================================================
// Root-level merges
// ============================================================================

#[test]
fn test_root_merge_requires_container() {
    let store = Store::new();
    assert!(matches!(
        store.merge("", Value::Null),
        Err(StrataError::InvalidMergeTarget { .. })
    ));
    assert!(matches!(
        store.merge("", 3i64),
        Err(StrataError::InvalidMergeTarget { .. })
    ));
    assert_eq!(store.get("").unwrap().to_json(), json!({}));
}

#[test]
fn test_root_merge_replaces_and_extends() {
    let store = Store::new();
    let before = store.snapshot();
    store.merge("", json!({"foo": "bar"})).unwrap();
    let after = store.snapshot();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.to_json(), json!({"foo": "bar"}));
}

#[test]
fn test_root_merge_accepts_frozen_mapping() {
    let store = Store::with_value(json!({"a": 1})).unwrap();
    let other = Store::with_value(json!({"b": 2})).unwrap();
    store.merge("", other.snapshot()).unwrap();
    assert_eq!(store.get("").unwrap().to_json(), json!({"a": 1, "b": 2}));
}

// ============================================================================
// Mapping merges
// ============================================================================

#[test]
fn test_merge_preserves_untouched_keys() {
    let store = Store::new();
    store.set("test.foo.value", "bar").unwrap();
    store.set("test.foo.valueAlt", "barAlt").unwrap();
    store.merge("test.foo", json!({"value2": "bar2"})).unwrap();

    assert_eq!(
        store.get("").unwrap().to_json(),
        json!({"test": {"foo": {"value": "bar", "valueAlt": "barAlt", "value2": "bar2"}}})
    );
}

#[test]
fn test_merge_at_path_rebuilds_only_the_spine() {
    let store = Store::new();
    store.set("test.foo", json!({"value": "bar"})).unwrap();
    store.set("test.other", json!({"keep": true})).unwrap();
    let before = store.snapshot();
    let test_before = store.get("test").unwrap();
    let other_before = store.get("test.other").unwrap();

    store.merge("test.foo", json!({"value2": "bar2"})).unwrap();

    assert!(!Arc::ptr_eq(&before, &store.snapshot()));
    assert!(!Arc::ptr_eq(&test_before, &store.get("test").unwrap()));
    assert!(Arc::ptr_eq(&other_before, &store.get("test.other").unwrap()));
}

#[test]
fn test_merge_null_sets_null() {
    let store = Store::new();
    store.merge("foo", Value::Null).unwrap();
    assert_eq!(store.get("").unwrap().to_json(), json!({"foo": null}));
}

#[test]
fn test_merge_over_primitive_starts_fresh() {
    let store = Store::new();
    store.set("foo", 3i64).unwrap();
    store.merge("foo", json!({"value": "bar"})).unwrap();
    assert_eq!(store.get("foo").unwrap().to_json(), json!({"value": "bar"}));
}

#[test]
fn test_merge_primitive_replaces_mapping() {
    let store = Store::new();
    store.set("foo", json!({"value": "bar"})).unwrap();
    store.merge("foo", 3i64).unwrap();
    assert_eq!(store.get("foo").unwrap().to_json(), json!(3));
}

#[test]
fn test_merge_deep_value_tree() {
    let store = Store::new();
    let right = json!({
        "boolean": true,
        "string": "hello",
        "number": 1.2,
        "array": [1, 2, 3],
        "deepArray": [{"a": 1, "b": [3, 4]}, "foo", 3],
        "nullObj": null,
    });
    store.merge("test.foo", right.clone()).unwrap();
    assert_eq!(store.get("test.foo").unwrap().to_json(), right);
}

#[test]
fn test_merge_creates_intermediate_mappings() {
    let store = Store::new();
    store.merge("a.b.c", json!({"x": 1})).unwrap();
    assert_eq!(store.get("").unwrap().to_json(), json!({"a": {"b": {"c": {"x": 1}}}}));
}

// ============================================================================
// Sequence merges
// ============================================================================

#[test]
fn test_merge_extends_sequence_and_preserves_left() {
    let store = Store::with_value(json!([{"id": 1, "sub": [{"id": "1-1"}]}])).unwrap();
    store.set("0.sub.1", json!({"id": "1-2"})).unwrap();
    assert_eq!(
        store.get("").unwrap().to_json(),
        json!([{"id": 1, "sub": [{"id": "1-1"}, {"id": "1-2"}]}])
    );

    let first_before = store.get("0").unwrap();
    store
        .merge(
            "",
            Value::Sequence(vec![Value::Absent, Value::from(json!({"id": 2}))]),
        )
        .unwrap();

    assert_eq!(
        store.get("").unwrap().to_json(),
        json!([
            {"id": 1, "sub": [{"id": "1-1"}, {"id": "1-2"}]},
            {"id": 2},
        ])
    );
    // The skipped index keeps its identity.
    assert!(Arc::ptr_eq(&first_before, &store.get("0").unwrap()));
}

#[test]
fn test_merge_sequence_over_mapping_starts_empty() {
    let store = Store::new();
    store.set("foo", json!({"value": "bar"})).unwrap();
    store.merge("foo", json!([1, 2, 3, 4, {"a": "b"}])).unwrap();
    assert_eq!(
        store.get("foo").unwrap().to_json(),
        json!([1, 2, 3, 4, {"a": "b"}])
    );
}

#[test]
fn test_merge_shorter_sequence_keeps_tail() {
    let store = Store::with_value(json!({"items": [1, 2, 3]})).unwrap();
    store.merge("items", json!(["x"])).unwrap();
    assert_eq!(store.get("items").unwrap().to_json(), json!(["x", 2, 3]));
}

// ============================================================================
// Frozen reuse
// ============================================================================

#[test]
fn test_merge_adopts_frozen_subtree_over_missing_key() {
    let store = Store::new();
    store.set("a.b.foo", json!({"value": "bar"})).unwrap();
    let a = store.get("a").unwrap();

    store.merge("j", a.clone()).unwrap();
    assert!(Arc::ptr_eq(&a, &store.get("j").unwrap()));
}

#[test]
fn test_merge_adopts_frozen_subtree_over_primitive() {
    let store = Store::new();
    store.set("a.b.foo", json!({"value": "bar"})).unwrap();
    store.set("j", "test").unwrap();
    let a = store.get("a").unwrap();

    store.merge("j", a.clone()).unwrap();
    assert!(Arc::ptr_eq(&a, &store.get("j").unwrap()));
}

#[test]
fn test_merge_reconciles_frozen_subtree_with_mapping() {
    let store = Store::new();
    store.set("a.b.foo", json!({"value": "bar"})).unwrap();
    store.set("j.k", json!({"value": "test"})).unwrap();
    let a = store.get("a").unwrap();
    let a_b = store.get("a.b").unwrap();

    store.merge("j", a.clone()).unwrap();

    // The target was a mapping, so a fresh node reconciles the two...
    assert!(!Arc::ptr_eq(&a, &store.get("j").unwrap()));
    assert_eq!(
        store.get("j").unwrap().to_json(),
        json!({"k": {"value": "test"}, "b": {"foo": {"value": "bar"}}})
    );
    // ...while the subtree below the reconciled key is still shared.
    assert!(Arc::ptr_eq(&a_b, &store.get("j.b").unwrap()));
}

#[test]
fn test_remerging_a_subtree_is_identity() {
    let store = Store::new();
    store.set("a.b.foo", json!({"value": "bar"})).unwrap();
    let foo = store.get("a.b.foo").unwrap();

    store.merge("a.b.foo", foo.clone()).unwrap();
    assert!(Arc::ptr_eq(&foo, &store.get("a.b.foo").unwrap()));
}

// ============================================================================
// Rejected values
// ============================================================================

#[test]
fn test_merge_rejects_bytes() {
    let store = Store::with_value(json!({"a": 1})).unwrap();
    let before = store.snapshot();
    let err = store
        .merge("a", Value::Mapping(
            [("blob".to_owned(), Value::Bytes(vec![0]))].into_iter().collect(),
        ))
        .unwrap_err();
    assert!(matches!(err, StrataError::UnsupportedValueKind { .. }));
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}
