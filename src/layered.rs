//! Layered stores: default layers that resurface when data is deleted.
//!
//! A layered store composes a base [`Store`] with default layers merged in
//! before any real data flows. The pre-mutation value is captured lazily, at
//! most once, on the first `set`/`merge`; from then on the layer set is
//! sealed, and a `del` that uncovers a captured default writes it back
//! instead of leaving a hole.

use crate::error::{StrataError, StrataResult};
use crate::node::{lookup, Frozen};
use crate::path::Path;
use crate::store::{Model, Store};
use crate::value::Value;
use std::sync::Mutex;

/// A [`Store`] with one-time default layers and delete-reveals-default
/// semantics.
///
/// # Examples
///
/// ```
/// use strata::LayeredStore;
/// use serde_json::json;
///
/// let store = LayeredStore::with_value(json!({"foo": "bar"})).unwrap();
/// store.add_layer("", json!({"foo": {"value": "bar"}})).unwrap();
///
/// store.set("foo.value", "new").unwrap();
/// assert_eq!(store.get("foo.value").unwrap().to_json(), json!("new"));
///
/// // Deleting reveals the default instead of removing the field.
/// store.del("foo.value");
/// assert_eq!(store.get("foo.value").unwrap().to_json(), json!("bar"));
/// ```
pub struct LayeredStore {
    store: Store,
    defaults: Mutex<Option<Frozen>>,
}

impl LayeredStore {
    /// Create a layered store holding an empty mapping.
    pub fn new() -> Self {
        Self {
            store: Store::new(),
            defaults: Mutex::new(None),
        }
    }

    /// Create a layered store seeded with a value (root-write semantics).
    pub fn with_value(value: impl Into<Value>) -> StrataResult<Self> {
        Ok(Self {
            store: Store::with_value(value)?,
            defaults: Mutex::new(None),
        })
    }

    /// Merge a default layer into the store at `path`.
    ///
    /// Layers can only be added while the store is pristine: the first
    /// `set`/`merge` seals the layer set, and later calls fail with
    /// [`StrataError::LayerSealed`] without touching the store.
    pub fn add_layer(&self, path: &str, data: impl Into<Value>) -> StrataResult<()> {
        if self.defaults.lock().unwrap().is_some() {
            return Err(StrataError::layer_sealed());
        }
        self.store.merge(path, data)
    }

    /// Read the value at `path`.
    pub fn get(&self, path: &str) -> Option<Frozen> {
        self.store.get(path)
    }

    /// Write a value at `path`, sealing the layer set first.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> StrataResult<()> {
        self.seal();
        self.store.set(path, value)
    }

    /// Merge a value at `path`, sealing the layer set first.
    pub fn merge(&self, path: &str, right: impl Into<Value>) -> StrataResult<()> {
        self.seal();
        self.store.merge(path, right)
    }

    /// Delete the value at `path`; a captured default at that path resurfaces
    /// instead of disappearing.
    pub fn del(&self, path: &str) {
        let parsed = Path::parse(path);
        if parsed.is_empty() {
            return;
        }
        self.store.del(path);
        let defaults = self.defaults.lock().unwrap().clone();
        if let Some(snapshot) = defaults {
            if let Some(default) = lookup(&snapshot, &parsed) {
                let _ = self.store.set(path, Value::Frozen(default.clone()));
            }
        }
    }

    // Capture the whole pre-mutation value the first time real data flows in.
    // The snapshot is a frozen handle, so this is one reference count, not a
    // copy, and it is never updated again.
    fn seal(&self) {
        let mut defaults = self.defaults.lock().unwrap();
        if defaults.is_none() {
            *defaults = Some(self.store.snapshot());
        }
    }
}

impl Default for LayeredStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for LayeredStore {
    fn get(&self, path: &str) -> Option<Frozen> {
        LayeredStore::get(self, path)
    }

    fn set(&self, path: &str, value: Value) -> StrataResult<()> {
        LayeredStore::set(self, path, value)
    }

    fn del(&self, path: &str) {
        LayeredStore::del(self, path)
    }

    fn merge(&self, path: &str, right: Value) -> StrataResult<()> {
        LayeredStore::merge(self, path, right)
    }
}
