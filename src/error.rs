//! Error types for store operations.

use thiserror::Error;

/// Result type alias for store operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Errors that can occur while mutating a store.
///
/// Every failure is synchronous and local to the triggering call: either the
/// whole rebuild-swap-notify sequence completes, or the store is left exactly
/// as it was.
#[derive(Debug, Error)]
pub enum StrataError {
    /// The value (or one of its descendants) cannot be held by a store.
    #[error("cannot store value of kind {kind}")]
    UnsupportedValueKind {
        /// The offending value kind.
        kind: &'static str,
    },

    /// A root-level merge was attempted with a non-container value.
    #[error("cannot merge {found} at the document root")]
    InvalidMergeTarget {
        /// The kind of value that was offered.
        found: &'static str,
    },

    /// A default layer was added after the layered store was mutated.
    #[error("cannot add a layer once data has been written")]
    LayerSealed,
}

impl StrataError {
    /// Create an unsupported value kind error.
    #[inline]
    pub fn unsupported_value_kind(kind: &'static str) -> Self {
        StrataError::UnsupportedValueKind { kind }
    }

    /// Create an invalid merge target error.
    #[inline]
    pub fn invalid_merge_target(found: &'static str) -> Self {
        StrataError::InvalidMergeTarget { found }
    }

    /// Create a layer sealed error.
    #[inline]
    pub fn layer_sealed() -> Self {
        StrataError::LayerSealed
    }
}
