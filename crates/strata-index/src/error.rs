use strata_store::StoreError;
use strata_types::ObjectId;

/// Errors from staging index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Unstage of a path that was never staged.
    #[error("path not staged: {0}")]
    NotStaged(String),

    /// A path is empty, non-normalized, or otherwise unusable.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// `load_from_tree` was given a digest that is not a tree object.
    #[error("object {id} is not a tree")]
    NotATree { id: ObjectId },

    /// Underlying object store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
