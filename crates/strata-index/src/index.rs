//! The core Index structure managing staged entries in memory.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_store::{Blob, EntryKind, EntryMode, ObjectStore, Tree};
use strata_types::ObjectId;
use tracing::trace;

use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};

/// The staging index: tracks which paths go into the next tree build.
///
/// All operations are in-memory; the `store` handle is used only to write
/// blobs on [`stage_blob`](Index::stage_blob) and to walk existing trees
/// on [`load_from_tree`](Index::load_from_tree). The store is passed in
/// explicitly -- there is no process-global "current repository", so any
/// number of independent indexes and stores can coexist.
pub struct Index {
    entries: BTreeMap<String, IndexEntry>,
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Index {
    /// Create a new empty index backed by the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            entries: BTreeMap::new(),
            store,
        }
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by path.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// All entries, ordered by path.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.entries.values().cloned().collect()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Stage a path, inserting or replacing its entry.
    ///
    /// The referenced blob is assumed to already be in the store (use
    /// [`stage_blob`](Index::stage_blob) to write and stage in one step).
    /// Staged entries always reference blobs; directories exist only
    /// implicitly through path separators, so `Directory` mode is
    /// rejected.
    pub fn stage(&mut self, path: &str, mode: EntryMode, object_id: ObjectId) -> IndexResult<()> {
        validate_path(path)?;
        if mode == EntryMode::Directory {
            return Err(IndexError::InvalidPath(format!(
                "cannot stage a directory mode entry: {path}"
            )));
        }
        trace!(path, %mode, id = %object_id.short_hex(), "staged");
        self.entries
            .insert(path.to_string(), IndexEntry::new(path, mode, object_id));
        Ok(())
    }

    /// Store `content` as a blob, then stage it under `path`.
    pub fn stage_blob(
        &mut self,
        path: &str,
        content: &[u8],
        mode: EntryMode,
    ) -> IndexResult<ObjectId> {
        validate_path(path)?;
        let blob = Blob::new(content.to_vec());
        let object_id = self.store.put_object(&blob.to_stored_object())?;
        self.stage(path, mode, object_id)?;
        Ok(object_id)
    }

    /// Remove the entry for `path`. Fails with
    /// [`NotStaged`](IndexError::NotStaged) if the path was never staged.
    pub fn unstage(&mut self, path: &str) -> IndexResult<IndexEntry> {
        self.entries
            .remove(path)
            .ok_or_else(|| IndexError::NotStaged(path.to_string()))
    }

    // ---------------------------------------------------------------
    // Tree grafting
    // ---------------------------------------------------------------

    /// Populate (or merge into) the index by recursively walking an
    /// existing tree object, rooting its entries under `prefix`.
    ///
    /// An empty prefix grafts at the index root. Existing entries at
    /// colliding paths are replaced; entries elsewhere are untouched, so
    /// a previously committed tree can be grafted into an index that
    /// already has staged work.
    pub fn load_from_tree(&mut self, tree_id: &ObjectId, prefix: &str) -> IndexResult<()> {
        if !prefix.is_empty() {
            validate_path(prefix)?;
        }
        let kind = self.store.kind_of(tree_id)?;
        if kind != strata_store::ObjectKind::Tree {
            return Err(IndexError::NotATree { id: *tree_id });
        }
        self.graft(tree_id, prefix)
    }

    fn graft(&mut self, tree_id: &ObjectId, prefix: &str) -> IndexResult<()> {
        let obj = self.store.get(tree_id)?;
        let tree = Tree::from_stored_object(&obj)?;
        for entry in &tree.entries {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{prefix}/{}", entry.name)
            };
            match entry.kind {
                EntryKind::Tree => self.graft(&entry.object_id, &path)?,
                EntryKind::Blob => {
                    self.entries.insert(
                        path.clone(),
                        IndexEntry::new(path, entry.mode, entry.object_id),
                    );
                }
            }
        }
        Ok(())
    }
}

/// Reject empty, absolute, and non-normalized paths, and segments too
/// long for the tree encoding's name-length field.
fn validate_path(path: &str) -> IndexResult<()> {
    if path.is_empty() {
        return Err(IndexError::InvalidPath("empty path".to_string()));
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(IndexError::InvalidPath(format!(
                "empty segment in: {path}"
            )));
        }
        if segment == "." || segment == ".." {
            return Err(IndexError::InvalidPath(format!(
                "relative segment in: {path}"
            )));
        }
        if segment.len() > strata_store::MAX_ENTRY_NAME_LEN {
            return Err(IndexError::InvalidPath(format!(
                "segment of {} bytes exceeds the {} byte limit",
                segment.len(),
                strata_store::MAX_ENTRY_NAME_LEN
            )));
        }
    }
    Ok(())
}
