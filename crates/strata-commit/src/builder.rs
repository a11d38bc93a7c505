use std::sync::Arc;

use strata_store::{Commit, ObjectKind, ObjectStore, StoreError};
use strata_types::{ObjectId, Signature};
use tracing::debug;

use crate::error::{CommitError, CommitResult};

/// Creates commit objects and walks recorded history.
///
/// Every reference a commit carries is checked against the store before
/// the commit is written, so a stored commit never dangles at creation
/// time.
pub struct CommitBuilder {
    store: Arc<dyn ObjectStore>,
}

impl CommitBuilder {
    /// Create a builder writing through the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Record a commit for `tree` with the given ancestry and authorship,
    /// returning its digest.
    ///
    /// `tree` must resolve to a stored tree object and every parent to a
    /// stored commit object. An empty parent list records a root commit;
    /// two or more parents record a merge.
    pub fn commit(
        &self,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: impl Into<String>,
    ) -> CommitResult<ObjectId> {
        if self.resolve_kind(&tree)? != Some(ObjectKind::Tree) {
            return Err(CommitError::InvalidTree { id: tree });
        }
        for parent in &parents {
            if self.resolve_kind(parent)? != Some(ObjectKind::Commit) {
                return Err(CommitError::InvalidParent { id: *parent });
            }
        }

        let commit = Commit {
            tree,
            parents,
            author,
            committer,
            message: message.into(),
        };
        let id = self.store.put_object(&commit.to_stored_object())?;
        debug!(
            id = %id.short_hex(),
            tree = %tree.short_hex(),
            parents = commit.parents.len(),
            "recorded commit"
        );
        Ok(id)
    }

    /// Load and decode the commit stored under `id`.
    pub fn read_commit(&self, id: &ObjectId) -> CommitResult<Commit> {
        Ok(Commit::from_stored_object(&self.store.get(id)?)?)
    }

    /// Walk first-parent ancestry from `head` back to the root commit,
    /// returning digests newest first (head included).
    ///
    /// Merge commits contribute only their first parent to the walk.
    pub fn history(&self, head: &ObjectId) -> CommitResult<Vec<ObjectId>> {
        let mut out = Vec::new();
        let mut cursor = Some(*head);
        while let Some(id) = cursor {
            let commit = self.read_commit(&id)?;
            out.push(id);
            cursor = commit.parents.first().copied();
        }
        Ok(out)
    }

    /// `kind_of` with absence folded into `None` so callers can map a
    /// missing object to the right reference error.
    fn resolve_kind(&self, id: &ObjectId) -> CommitResult<Option<ObjectKind>> {
        match self.store.kind_of(id) {
            Ok(kind) => Ok(Some(kind)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
