//! In-process, path-addressed persistent data store with structural sharing.
//!
//! A [`Store`] owns one deeply immutable root value. Callers read and write
//! nested values by dotted path; every write produces a new logical root that
//! reuses every untouched subtree by reference, so snapshots taken at
//! different times can be held indefinitely and compared by identity.
//!
//! # Core Concepts
//!
//! - **[`Value`]**: the plain tree callers build and hand to writes
//! - **[`Frozen`] / [`Node`]**: the immutable, reference-counted stored tree
//! - **[`freeze`]**: deep-clones and validates a `Value` into a `Frozen`
//! - **[`Store`]**: `get`/`set`/`del`/`merge` plus change subscription
//! - **[`View`]**: a prefix-rebasing scoped view over any [`Model`]
//! - **[`LayeredStore`]**: default layers that resurface on delete
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use strata::Store;
//! use serde_json::json;
//!
//! let store = Store::with_value(json!({"profile": {"name": "Ada", "tags": ["ops"]}})).unwrap();
//!
//! let before = store.snapshot();
//! store.set("profile.name", "Grace").unwrap();
//! let after = store.snapshot();
//!
//! // Every write makes a new root...
//! assert!(!Arc::ptr_eq(&before, &after));
//! assert_eq!(store.get("profile.name").unwrap().to_json(), json!("Grace"));
//!
//! // ...but untouched branches keep their identity across roots.
//! let tags_before = store.get("profile.tags").unwrap();
//! store.set("profile.name", "Hopper").unwrap();
//! assert!(Arc::ptr_eq(&tags_before, &store.get("profile.tags").unwrap()));
//! ```
//!
//! # Change Notification
//!
//! ```
//! use strata::Store;
//! use std::sync::{Arc, Mutex};
//!
//! let store = Store::new();
//! let seen = Arc::new(Mutex::new(0));
//! let counter = seen.clone();
//! store.subscribe(move || *counter.lock().unwrap() += 1);
//!
//! store.set("a", 1i64).unwrap();
//! store.del("a");
//! assert_eq!(*seen.lock().unwrap(), 2);
//! ```

mod error;
mod layered;
mod merge;
mod node;
mod path;
mod store;
mod value;
mod view;

pub use error::{StrataError, StrataResult};
pub use layered::LayeredStore;
pub use node::{freeze, lookup, Frozen, Node};
pub use path::{Path, Seg};
pub use store::{Model, Store, Subscription};
pub use value::{Number, Value};
pub use view::View;
