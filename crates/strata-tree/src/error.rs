use strata_store::StoreError;
use strata_types::ObjectId;

/// Errors from tree construction and traversal.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Two same-named siblings at one directory level. This covers both
    /// literal duplicates and a name used as file and directory at once.
    #[error("duplicate entry at one directory level: {name}")]
    DuplicateEntry { name: String },

    /// An entry path is empty, contains an empty segment, or has a
    /// segment too long for the tree encoding's name-length field.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A digest expected to reference a tree resolves to something else.
    #[error("object {id} is not a tree")]
    NotATree { id: ObjectId },

    /// Underlying object store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
