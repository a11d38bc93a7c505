use strata_types::ObjectId;

use crate::object::ObjectKind;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Fatal integrity violation: the digest resolves to different bytes
    /// than it was computed from. Either the stored payload no longer
    /// hashes to its key (bit rot) or two distinct payloads produced one
    /// digest (collision). Never downgraded, never overwritten.
    #[error("corrupt object {id}: {reason}")]
    Corruption { id: ObjectId, reason: String },

    /// An object payload cannot be decoded as its claimed kind.
    #[error("malformed {kind} object: {reason}")]
    Malformed { kind: ObjectKind, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
