//! Scoped views: prefix-rebasing facades over a store.
//!
//! A view owns no data. Every operation is forwarded to the target with the
//! view's prefix spliced in front of the path, so views nest: each layer only
//! knows its own prefix and the next target down, and the prefixes compose by
//! plain concatenation.

use crate::error::StrataResult;
use crate::node::Frozen;
use crate::store::Model;
use crate::value::Value;

/// A scoped view binding a fixed path prefix onto a [`Model`].
///
/// The target is anything implementing [`Model`] — a [`Store`](crate::Store)
/// (usually behind `&` or `Arc`), a [`LayeredStore`](crate::LayeredStore), or
/// another `View`.
///
/// # Examples
///
/// ```
/// use strata::{Store, View};
/// use serde_json::json;
///
/// let store = Store::new();
/// let settings = View::new(&store, "settings");
/// settings.set("theme", "dark").unwrap();
///
/// assert_eq!(store.get("settings.theme").unwrap().to_json(), json!("dark"));
/// assert_eq!(settings.get("theme").unwrap().to_json(), json!("dark"));
/// ```
pub struct View<M> {
    target: M,
    prefix: String,
}

impl<M: Model> View<M> {
    /// Bind `prefix` onto `target`.
    pub fn new(target: M, prefix: impl Into<String>) -> Self {
        Self {
            target,
            prefix: prefix.into(),
        }
    }

    /// The prefix this view rebases onto.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Read the value at `path` within this view's scope.
    pub fn get(&self, path: &str) -> Option<Frozen> {
        self.target.get(&self.rebase(path))
    }

    /// Write a value at `path` within this view's scope.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> StrataResult<()> {
        self.target.set(&self.rebase(path), value.into())
    }

    /// Delete the value at `path` within this view's scope.
    pub fn del(&self, path: &str) {
        self.target.del(&self.rebase(path))
    }

    /// Merge a value onto the subtree at `path` within this view's scope.
    pub fn merge(&self, path: &str, right: impl Into<Value>) -> StrataResult<()> {
        self.target.merge(&self.rebase(path), right.into())
    }

    fn rebase(&self, sub: &str) -> String {
        if sub.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}.{}", self.prefix, sub)
        }
    }
}

impl<M: Model> Model for View<M> {
    fn get(&self, path: &str) -> Option<Frozen> {
        View::get(self, path)
    }

    fn set(&self, path: &str, value: Value) -> StrataResult<()> {
        View::set(self, path, value)
    }

    fn del(&self, path: &str) {
        View::del(self, path)
    }

    fn merge(&self, path: &str, right: Value) -> StrataResult<()> {
        View::merge(self, path, right)
    }
}
