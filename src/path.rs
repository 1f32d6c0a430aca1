//! Dotted-path addressing for navigating the value tree.
//!
//! A path is an ordered sequence of segments derived by splitting an ASCII
//! string on `.`. Each segment addresses either a mapping field or a sequence
//! index. There is no escaping mechanism for literal dots in keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single segment of a path.
///
/// Segments written as decimal digits parse as [`Seg::Index`]; everything else
/// parses as [`Seg::Key`]. Which one a segment *means* is decided during
/// descent by the shape of the node it lands on: an `Index` falls back to its
/// decimal string when it meets a mapping, and a digit-only `Key` falls back
/// to an index when it meets a sequence.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Mapping field access.
    Key(String),
    /// Sequence index access.
    Index(usize),
}

impl Seg {
    /// Create a key segment.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    /// Create an index segment.
    #[inline]
    pub fn index(i: usize) -> Self {
        Seg::Index(i)
    }

    /// Get the key if this is a key segment.
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            Seg::Index(_) => None,
        }
    }

    /// Get the index if this is an index segment.
    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Key(_) => None,
            Seg::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, "{}", k),
            Seg::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A complete path into the value tree.
///
/// The empty path denotes the root. Empty segments produced by leading,
/// trailing, or doubled dots are skipped, so `"a..b."` parses the same as
/// `"a.b"`.
///
/// # Examples
///
/// ```
/// use strata::{Path, Seg};
///
/// let path = Path::parse("users.0.name");
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.segments()[1], Seg::Index(0));
/// assert_eq!(path.to_string(), "users.0.name");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path(Vec<Seg>);

impl Path {
    /// Create an empty path (the root).
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted string into a path.
    pub fn parse(raw: &str) -> Self {
        let mut segs = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                continue;
            }
            if part.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(i) = part.parse::<usize>() {
                    segs.push(Seg::Index(i));
                    continue;
                }
            }
            segs.push(Seg::Key(part.to_owned()));
        }
        Self(segs)
    }

    /// Create a path from a vector of segments.
    #[inline]
    pub fn from_segments(segs: Vec<Seg>) -> Self {
        Self(segs)
    }

    /// Append a key segment (builder pattern).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment (builder pattern).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// The segments of this path.
    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    /// Check if this path is empty (the root).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of segments in this path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The last segment, if any.
    #[inline]
    pub fn last(&self) -> Option<&Seg> {
        self.0.last()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Path::parse(raw)
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}
