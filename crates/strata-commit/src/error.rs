use strata_store::StoreError;
use strata_types::ObjectId;

/// Errors from commit creation and history traversal.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// The referenced tree digest does not resolve to a stored tree.
    #[error("tree {id} does not exist or is not a tree object")]
    InvalidTree { id: ObjectId },

    /// A referenced parent digest does not resolve to a stored commit.
    #[error("parent {id} does not exist or is not a commit object")]
    InvalidParent { id: ObjectId },

    /// Underlying object store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for commit operations.
pub type CommitResult<T> = Result<T, CommitError>;
