use strata_store::{EntryKind, EntryMode, ObjectKind, ObjectStore, Tree};
use strata_types::ObjectId;

use crate::error::{TreeError, TreeResult};

/// One entry yielded during a depth-first tree walk, with its full path
/// from the walk root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkedEntry {
    /// `/`-joined path from the walk root.
    pub path: String,
    /// Recorded file mode.
    pub mode: EntryMode,
    /// Whether the entry references a blob or a subtree.
    pub kind: EntryKind,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

/// Walk a stored tree graph depth-first, invoking `visit` for every
/// entry. Directory entries are visited before their contents.
///
/// This is the read-side companion to the builder: checkout-style
/// consumers resolve a snapshot to concrete paths with it without
/// knowing the tree encoding.
pub fn walk<F>(store: &dyn ObjectStore, tree_id: &ObjectId, mut visit: F) -> TreeResult<()>
where
    F: FnMut(&WalkedEntry),
{
    if store.kind_of(tree_id)? != ObjectKind::Tree {
        return Err(TreeError::NotATree { id: *tree_id });
    }
    walk_inner(store, tree_id, "", &mut visit)
}

fn walk_inner<F>(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    prefix: &str,
    visit: &mut F,
) -> TreeResult<()>
where
    F: FnMut(&WalkedEntry),
{
    let tree = Tree::from_stored_object(&store.get(tree_id)?)?;
    for entry in &tree.entries {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{prefix}/{}", entry.name)
        };
        let walked = WalkedEntry {
            path: path.clone(),
            mode: entry.mode,
            kind: entry.kind,
            object_id: entry.object_id,
        };
        visit(&walked);
        if entry.kind == EntryKind::Tree {
            walk_inner(store, &entry.object_id, &path, visit)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strata_index::IndexEntry;
    use strata_store::InMemoryObjectStore;

    use super::*;
    use crate::builder::TreeBuilder;

    fn entry(path: &str, byte: u8) -> IndexEntry {
        IndexEntry::new(path, EntryMode::Regular, ObjectId::from_hash([byte; 32]))
    }

    #[test]
    fn walk_yields_full_paths_depth_first() {
        let store = Arc::new(InMemoryObjectStore::new());
        let builder = TreeBuilder::new(store.clone());
        let root = builder
            .build(&[
                entry("a.txt", 1),
                entry("src/lib.rs", 2),
                entry("src/util/mod.rs", 3),
            ])
            .unwrap();

        let mut paths = Vec::new();
        walk(store.as_ref(), &root, |e| paths.push(e.path.clone())).unwrap();
        assert_eq!(
            paths,
            vec![
                "a.txt".to_string(),
                "src".to_string(),
                "src/lib.rs".to_string(),
                "src/util".to_string(),
                "src/util/mod.rs".to_string(),
            ]
        );
    }

    #[test]
    fn walk_reports_kinds_and_ids() {
        let store = Arc::new(InMemoryObjectStore::new());
        let builder = TreeBuilder::new(store.clone());
        let blob_id = ObjectId::from_hash([9; 32]);
        let root = builder
            .build(&[IndexEntry::new("dir/file", EntryMode::Regular, blob_id)])
            .unwrap();

        let mut entries = Vec::new();
        walk(store.as_ref(), &root, |e| entries.push(e.clone())).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Tree);
        assert_eq!(entries[1].kind, EntryKind::Blob);
        assert_eq!(entries[1].object_id, blob_id);
    }

    #[test]
    fn walk_rejects_non_tree_root() {
        let store = Arc::new(InMemoryObjectStore::new());
        let blob = store.put(ObjectKind::Blob, b"data").unwrap();
        let result = walk(store.as_ref(), &blob, |_| {});
        assert!(matches!(result, Err(TreeError::NotATree { .. })));
    }

    #[test]
    fn walk_missing_root_propagates_not_found() {
        let store = Arc::new(InMemoryObjectStore::new());
        let missing = ObjectId::from_hash([5; 32]);
        let result = walk(store.as_ref(), &missing, |_| {});
        assert!(matches!(
            result,
            Err(TreeError::Store(strata_store::StoreError::NotFound(_)))
        ));
    }
}
