//! The persistent store: one immutable root, copy-on-write writes, change
//! notification.
//!
//! Every mutation computes its replacement root completely before swapping it
//! in, so a failed call leaves the store untouched and observers never see a
//! partial write. Only the nodes along the written path (the spine) are fresh
//! allocations; every sibling branch is carried over by reference.

use crate::error::{StrataError, StrataResult};
use crate::merge::{merge_values, place};
use crate::node::{freeze, lookup, Frozen, Node};
use crate::path::{Path, Seg};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// The operation surface shared by stores, scoped views, and layered stores.
///
/// All receivers are `&self`; implementations provide their own interior
/// synchronization around root replacement.
pub trait Model {
    /// Read the value at `path`; empty path reads the root.
    fn get(&self, path: &str) -> Option<Frozen>;

    /// Write a value at `path`.
    fn set(&self, path: &str, value: Value) -> StrataResult<()>;

    /// Delete the value at `path`.
    fn del(&self, path: &str);

    /// Merge a value onto the subtree at `path`.
    fn merge(&self, path: &str, right: Value) -> StrataResult<()>;
}

impl<M: Model + ?Sized> Model for &M {
    fn get(&self, path: &str) -> Option<Frozen> {
        (**self).get(path)
    }

    fn set(&self, path: &str, value: Value) -> StrataResult<()> {
        (**self).set(path, value)
    }

    fn del(&self, path: &str) {
        (**self).del(path)
    }

    fn merge(&self, path: &str, right: Value) -> StrataResult<()> {
        (**self).merge(path, right)
    }
}

impl<M: Model + ?Sized> Model for Arc<M> {
    fn get(&self, path: &str) -> Option<Frozen> {
        (**self).get(path)
    }

    fn set(&self, path: &str, value: Value) -> StrataResult<()> {
        (**self).set(path, value)
    }

    fn del(&self, path: &str) {
        (**self).del(path)
    }

    fn merge(&self, path: &str, right: Value) -> StrataResult<()> {
        (**self).merge(path, right)
    }
}

/// Handle for removing a change subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription(u64);

type ChangeHandler = Box<dyn FnMut() + Send>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    handlers: Vec<(u64, ChangeHandler)>,
}

/// A path-addressed persistent store over one immutable root.
///
/// Reads hand out [`Frozen`] handles into the current root; because every
/// reachable node is immutable, a handle stays valid and unchanged no matter
/// how the store mutates afterwards, and snapshots can be compared by
/// identity with [`Arc::ptr_eq`].
///
/// The root swap is guarded by a mutex, which is the external synchronization
/// a multi-threaded embedding needs; the store itself assumes one logical
/// writer.
pub struct Store {
    root: Mutex<Frozen>,
    subscribers: Mutex<Subscribers>,
}

impl Store {
    /// Create a store holding an empty mapping.
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Arc::new(Node::Mapping(BTreeMap::new()))),
            subscribers: Mutex::new(Subscribers::default()),
        }
    }

    /// Create a store seeded with a value.
    ///
    /// Seeding follows root-write semantics: a sequence or mapping becomes
    /// the root, anything else leaves the root an empty mapping.
    pub fn with_value(value: impl Into<Value>) -> StrataResult<Self> {
        let store = Self::new();
        store.set("", value)?;
        Ok(store)
    }

    /// The current root handle.
    pub fn snapshot(&self) -> Frozen {
        self.root.lock().unwrap().clone()
    }

    /// Read the value at `path`.
    ///
    /// An empty path reads the root. A path that runs off the tree resolves
    /// to `None`; reads never fail.
    pub fn get(&self, path: &str) -> Option<Frozen> {
        let path = Path::parse(path);
        let root = self.snapshot();
        if path.is_empty() {
            return Some(root);
        }
        lookup(&root, &path).cloned()
    }

    /// Write a value at `path`, rebuilding only the spine above it.
    ///
    /// With an empty path the root itself is replaced, but only by a sequence
    /// or mapping; other values are ignored (the guard against nuking the
    /// root with a stray primitive). Intermediate segments that are missing,
    /// or that land on a leaf, restart as empty mappings. Writing
    /// [`Value::Absent`] removes a mapping entry or nulls a sequence slot.
    ///
    /// Notifies subscribers once per call, including root writes the guard
    /// ignored.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> StrataResult<()> {
        let path = Path::parse(path);
        let value = value.into();
        if path.is_empty() {
            if !matches!(value, Value::Absent) {
                let frozen = freeze(value)?;
                if frozen.is_container() {
                    *self.root.lock().unwrap() = frozen;
                }
            }
            self.notify();
            return Ok(());
        }
        let slot = match value {
            Value::Absent => None,
            other => Some(freeze(other)?),
        };
        {
            let mut root = self.root.lock().unwrap();
            let new_root = rebuild_set(Some(&*root), path.segments(), slot);
            *root = new_root;
        }
        self.notify();
        Ok(())
    }

    /// Delete the value at `path`.
    ///
    /// A path that does not resolve — including the empty path — is a
    /// complete no-op: no new root, no notification. A successful deletion
    /// removes a mapping entry or a sequence element (shifting the tail) and
    /// notifies once.
    pub fn del(&self, path: &str) {
        let path = Path::parse(path);
        if path.is_empty() {
            return;
        }
        let deleted = {
            let mut root = self.root.lock().unwrap();
            if lookup(&root, &path).is_none() {
                false
            } else {
                let new_root = rebuild_del(&root, path.segments());
                *root = new_root;
                true
            }
        };
        if deleted {
            self.notify();
        }
    }

    /// Merge a value onto the subtree at `path`.
    ///
    /// An empty path merges onto the root and requires a sequence or mapping;
    /// anything else fails with [`StrataError::InvalidMergeTarget`] before
    /// any copy-on-write work. Notifies subscribers once on success.
    pub fn merge(&self, path: &str, right: impl Into<Value>) -> StrataResult<()> {
        let path = Path::parse(path);
        let right = right.into();
        if path.is_empty() {
            let container = match &right {
                Value::Sequence(_) | Value::Mapping(_) => true,
                Value::Frozen(h) => h.is_container(),
                _ => false,
            };
            if !container {
                return Err(StrataError::invalid_merge_target(right.kind_name()));
            }
            {
                let mut root = self.root.lock().unwrap();
                let current = root.clone();
                if let Some(merged) = merge_values(Some(&current), right)? {
                    *root = merged;
                }
            }
            self.notify();
            return Ok(());
        }
        {
            let mut root = self.root.lock().unwrap();
            let new_root = rebuild_merge(Some(&*root), path.segments(), right)?;
            *root = new_root;
        }
        self.notify();
        Ok(())
    }

    /// Register a change subscriber.
    ///
    /// Subscribers run synchronously on the mutating call, in registration
    /// order, once per successful `set`/`merge` and once per deleting `del`,
    /// with no payload. A subscriber must not call back into the same store:
    /// the subscriber list is locked during dispatch.
    pub fn subscribe(&self, handler: impl FnMut() + Send + 'static) -> Subscription {
        let mut subs = self.subscribers.lock().unwrap();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.handlers.push((id, Box::new(handler)));
        Subscription(id)
    }

    /// Remove a change subscriber. Returns whether it was still registered.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut subs = self.subscribers.lock().unwrap();
        let before = subs.handlers.len();
        subs.handlers.retain(|(id, _)| *id != subscription.0);
        subs.handlers.len() != before
    }

    fn notify(&self) {
        let mut subs = self.subscribers.lock().unwrap();
        for (_, handler) in subs.handlers.iter_mut() {
            handler();
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for Store {
    fn get(&self, path: &str) -> Option<Frozen> {
        Store::get(self, path)
    }

    fn set(&self, path: &str, value: Value) -> StrataResult<()> {
        Store::set(self, path, value)
    }

    fn del(&self, path: &str) {
        Store::del(self, path)
    }

    fn merge(&self, path: &str, right: Value) -> StrataResult<()> {
        Store::merge(self, path, right)
    }
}

// A spine node being rebuilt: the shallow working copy of one node on the
// path from the root to the write target. Children are carried over as
// frozen handles; only the touched child is replaced.
enum SpineNode {
    Seq(Vec<Frozen>),
    Map(BTreeMap<String, Frozen>),
}

impl SpineNode {
    // Shallow-duplicate a node; missing nodes and leaves restart as empty
    // mappings.
    fn duplicate(node: Option<&Frozen>) -> SpineNode {
        match node.map(|n| &**n) {
            Some(Node::Sequence(items)) => SpineNode::Seq(items.clone()),
            Some(Node::Mapping(fields)) => SpineNode::Map(fields.clone()),
            _ => SpineNode::Map(BTreeMap::new()),
        }
    }

    fn child(&self, seg: &Seg) -> Option<&Frozen> {
        match (self, seg) {
            (SpineNode::Map(fields), Seg::Key(k)) => fields.get(k),
            (SpineNode::Map(fields), Seg::Index(i)) => fields.get(&i.to_string()),
            (SpineNode::Seq(items), Seg::Index(i)) => items.get(*i),
            (SpineNode::Seq(items), Seg::Key(k)) => {
                k.parse::<usize>().ok().and_then(|i| items.get(i))
            }
        }
    }

    // Assign a child. A sequence faced with a non-index key restarts as a
    // mapping holding just that key.
    fn put(&mut self, seg: &Seg, value: Frozen) {
        match self {
            SpineNode::Map(fields) => {
                fields.insert(seg_key(seg), value);
            }
            SpineNode::Seq(items) => match seg_index(seg) {
                Some(i) => place(items, i, value),
                None => {
                    let mut fields = BTreeMap::new();
                    fields.insert(seg_key(seg), value);
                    *self = SpineNode::Map(fields);
                }
            },
        }
    }

    // An absent write: drop a mapping entry, null a sequence slot in place.
    fn clear(&mut self, seg: &Seg) {
        match self {
            SpineNode::Map(fields) => {
                fields.remove(&seg_key(seg));
            }
            SpineNode::Seq(items) => {
                if let Some(i) = seg_index(seg) {
                    if i < items.len() {
                        items[i] = Arc::new(Node::Null);
                    }
                }
            }
        }
    }

    // A deletion: drop a mapping entry, remove a sequence element.
    fn remove(&mut self, seg: &Seg) {
        match self {
            SpineNode::Map(fields) => {
                fields.remove(&seg_key(seg));
            }
            SpineNode::Seq(items) => {
                if let Some(i) = seg_index(seg) {
                    if i < items.len() {
                        items.remove(i);
                    }
                }
            }
        }
    }

    fn into_frozen(self) -> Frozen {
        match self {
            SpineNode::Seq(items) => Arc::new(Node::Sequence(items)),
            SpineNode::Map(fields) => Arc::new(Node::Mapping(fields)),
        }
    }
}

fn seg_key(seg: &Seg) -> String {
    match seg {
        Seg::Key(k) => k.clone(),
        Seg::Index(i) => i.to_string(),
    }
}

fn seg_index(seg: &Seg) -> Option<usize> {
    match seg {
        Seg::Index(i) => Some(*i),
        Seg::Key(k) => k.parse::<usize>().ok(),
    }
}

fn rebuild_set(node: Option<&Frozen>, segs: &[Seg], slot: Option<Frozen>) -> Frozen {
    let mut dup = SpineNode::duplicate(node);
    match segs {
        [] => {}
        [last] => match slot {
            Some(value) => dup.put(last, value),
            None => dup.clear(last),
        },
        [seg, rest @ ..] => {
            let child = dup.child(seg).cloned();
            let new_child = rebuild_set(child.as_ref(), rest, slot);
            dup.put(seg, new_child);
        }
    }
    dup.into_frozen()
}

// Callers verify the full path resolves before rebuilding, so the walk never
// misses; the if-let keeps a stale check from turning into a panic.
fn rebuild_del(node: &Frozen, segs: &[Seg]) -> Frozen {
    let mut dup = SpineNode::duplicate(Some(node));
    match segs {
        [] => {}
        [last] => dup.remove(last),
        [seg, rest @ ..] => {
            if let Some(child) = dup.child(seg).cloned() {
                let new_child = rebuild_del(&child, rest);
                dup.put(seg, new_child);
            }
        }
    }
    dup.into_frozen()
}

fn rebuild_merge(node: Option<&Frozen>, segs: &[Seg], right: Value) -> StrataResult<Frozen> {
    let mut dup = SpineNode::duplicate(node);
    match segs {
        [] => {}
        [last] => {
            let existing = dup.child(last).cloned();
            match merge_values(existing.as_ref(), right)? {
                Some(merged) => dup.put(last, merged),
                None => dup.clear(last),
            }
        }
        [seg, rest @ ..] => {
            let child = dup.child(seg).cloned();
            let new_child = rebuild_merge(child.as_ref(), rest, right)?;
            dup.put(seg, new_child);
        }
    }
    Ok(dup.into_frozen())
}
