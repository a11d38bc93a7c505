use std::collections::BTreeMap;
use std::sync::Arc;

use strata_index::{Index, IndexEntry};
use strata_store::{ObjectStore, Tree, TreeEntry, MAX_ENTRY_NAME_LEN};
use strata_types::ObjectId;
use tracing::trace;

use crate::error::{TreeError, TreeResult};

/// Builds immutable tree objects from staged index entries.
///
/// The builder holds no state beyond its store handle and performs no
/// locking of its own: it only calls the (internally synchronized)
/// object store, and sibling subtrees never share mutable state.
pub struct TreeBuilder {
    store: Arc<dyn ObjectStore>,
}

/// What one name at the current level resolves to.
enum Group<'a> {
    File(&'a IndexEntry),
    Dir(Vec<(&'a str, &'a IndexEntry)>),
}

impl TreeBuilder {
    /// Create a builder writing through the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Materialize the given entries into a tree graph and return the
    /// root tree's digest.
    ///
    /// Entries may arrive in any order; the canonical encoding sorts
    /// every level by raw name bytes, so digests are independent of
    /// insertion order. An empty entry set produces the (stable) empty
    /// tree object.
    pub fn build(&self, entries: &[IndexEntry]) -> TreeResult<ObjectId> {
        let scoped: Vec<(&str, &IndexEntry)> = entries
            .iter()
            .map(|e| (e.path.as_str(), e))
            .collect();
        self.build_level(&scoped)
    }

    /// Materialize everything currently staged in `index`.
    pub fn build_index(&self, index: &Index) -> TreeResult<ObjectId> {
        self.build(&index.entries())
    }

    /// Build one directory level. `entries` pairs each entry with its
    /// path remainder relative to this level.
    fn build_level(&self, entries: &[(&str, &IndexEntry)]) -> TreeResult<ObjectId> {
        // Partition by first path segment. BTreeMap keys give us the
        // canonical byte order for free.
        let mut groups: BTreeMap<&str, Group<'_>> = BTreeMap::new();
        for (rest, entry) in entries {
            match rest.split_once('/') {
                None => {
                    let name = *rest;
                    if name.is_empty() || name.len() > MAX_ENTRY_NAME_LEN {
                        return Err(TreeError::InvalidPath(entry.path.clone()));
                    }
                    if groups.insert(name, Group::File(entry)).is_some() {
                        return Err(TreeError::DuplicateEntry {
                            name: name.to_string(),
                        });
                    }
                }
                Some((head, tail)) => {
                    if head.is_empty() || tail.is_empty() || head.len() > MAX_ENTRY_NAME_LEN {
                        return Err(TreeError::InvalidPath(entry.path.clone()));
                    }
                    match groups.entry(head) {
                        std::collections::btree_map::Entry::Vacant(slot) => {
                            slot.insert(Group::Dir(vec![(tail, entry)]));
                        }
                        std::collections::btree_map::Entry::Occupied(mut slot) => {
                            match slot.get_mut() {
                                Group::Dir(children) => children.push((tail, entry)),
                                Group::File(_) => {
                                    return Err(TreeError::DuplicateEntry {
                                        name: head.to_string(),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        // Post-order: children are fully materialized before this level
        // is framed and hashed.
        let mut tree_entries = Vec::with_capacity(groups.len());
        for (name, group) in groups {
            match group {
                Group::File(entry) => {
                    tree_entries.push(TreeEntry::blob(entry.mode, name, entry.object_id));
                }
                Group::Dir(children) => {
                    let child_id = self.build_level(&children)?;
                    tree_entries.push(TreeEntry::tree(name, child_id));
                }
            }
        }

        let tree = Tree::new(tree_entries);
        let id = self.store.put_object(&tree.to_stored_object()?)?;
        trace!(id = %id.short_hex(), entries = tree.len(), "built tree level");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::{EntryKind, EntryMode, InMemoryObjectStore, ObjectKind};

    fn make_store() -> Arc<InMemoryObjectStore> {
        Arc::new(InMemoryObjectStore::new())
    }

    fn entry(path: &str, byte: u8) -> IndexEntry {
        IndexEntry::new(path, EntryMode::Regular, ObjectId::from_hash([byte; 32]))
    }

    fn read_tree(store: &dyn ObjectStore, id: &ObjectId) -> Tree {
        Tree::from_stored_object(&store.get(id).unwrap()).unwrap()
    }

    #[test]
    fn flat_tree() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());
        let root = builder
            .build(&[entry("a.txt", 1), entry("b.txt", 2)])
            .unwrap();

        let tree = read_tree(store.as_ref(), &root);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.entries[0].name, "a.txt");
        assert_eq!(tree.entries[1].name, "b.txt");
        assert_eq!(tree.entries[0].kind, EntryKind::Blob);
    }

    #[test]
    fn digest_is_insertion_order_independent() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());
        let forward = builder
            .build(&[entry("a", 1), entry("dir/b", 2), entry("dir/c", 3)])
            .unwrap();
        let backward = builder
            .build(&[entry("dir/c", 3), entry("dir/b", 2), entry("a", 1)])
            .unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn nested_directories_build_recursively() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());
        let root = builder
            .build(&[
                entry("src/lib.rs", 1),
                entry("src/util/mod.rs", 2),
                entry("readme", 3),
            ])
            .unwrap();

        let root_tree = read_tree(store.as_ref(), &root);
        assert_eq!(root_tree.len(), 2);
        let src = root_tree.get("src").unwrap();
        assert_eq!(src.kind, EntryKind::Tree);

        let src_tree = read_tree(store.as_ref(), &src.object_id);
        assert!(src_tree.get("lib.rs").is_some());
        let util = src_tree.get("util").unwrap();
        assert_eq!(util.kind, EntryKind::Tree);

        // Post-order guarantee: every referenced child is present.
        assert!(store.has(&util.object_id).unwrap());
    }

    #[test]
    fn empty_build_yields_stable_empty_tree() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());
        let a = builder.build(&[]).unwrap();
        let b = builder.build(&[]).unwrap();
        assert_eq!(a, b);
        assert!(read_tree(store.as_ref(), &a).is_empty());
    }

    #[test]
    fn rebuilding_identical_entries_writes_nothing_new() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());
        let entries = [entry("a/x", 1), entry("a/y", 2), entry("b", 3)];

        let first = builder.build(&entries).unwrap();
        let writes_after_first = store.write_count();
        let second = builder.build(&entries).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.write_count(), writes_after_first);
    }

    #[test]
    fn change_is_local_to_its_subtree() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());

        let before = builder
            .build(&[entry("a/x", 1), entry("a/y", 2), entry("b/z", 3)])
            .unwrap();
        let after = builder
            .build(&[entry("a/x", 1), entry("a/y", 2), entry("b/z", 4)])
            .unwrap();

        // Root changed, and so did the subtree containing the change.
        assert_ne!(before, after);
        let tree_before = read_tree(store.as_ref(), &before);
        let tree_after = read_tree(store.as_ref(), &after);
        assert_ne!(
            tree_before.get("b").unwrap().object_id,
            tree_after.get("b").unwrap().object_id
        );
        // The untouched sibling subtree kept its digest.
        assert_eq!(
            tree_before.get("a").unwrap().object_id,
            tree_after.get("a").unwrap().object_id
        );
    }

    #[test]
    fn duplicate_path_is_rejected() {
        let builder = TreeBuilder::new(make_store());
        let result = builder.build(&[
            IndexEntry::new("f.txt", EntryMode::Regular, ObjectId::from_hash([1; 32])),
            IndexEntry::new("f.txt", EntryMode::Executable, ObjectId::from_hash([2; 32])),
        ]);
        assert!(matches!(
            result,
            Err(TreeError::DuplicateEntry { name }) if name == "f.txt"
        ));
    }

    #[test]
    fn file_and_directory_name_conflict_is_rejected() {
        let builder = TreeBuilder::new(make_store());
        for entries in [
            vec![entry("a", 1), entry("a/b", 2)],
            vec![entry("a/b", 2), entry("a", 1)],
        ] {
            let result = builder.build(&entries);
            assert!(matches!(
                result,
                Err(TreeError::DuplicateEntry { name }) if name == "a"
            ));
        }
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let builder = TreeBuilder::new(make_store());
        for path in ["", "a//b", "a/", "/a"] {
            let result = builder.build(&[entry(path, 1)]);
            assert!(
                matches!(result, Err(TreeError::InvalidPath(_))),
                "accepted: {path:?}"
            );
        }
    }

    #[test]
    fn overlong_entry_name_is_rejected() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());
        let long = "n".repeat(70_000);

        // Leaf position and directory position are both length-checked.
        for path in [long.clone(), format!("{long}/file")] {
            let result = builder.build(&[entry(&path, 1)]);
            assert!(matches!(result, Err(TreeError::InvalidPath(_))));
        }
        // Nothing half-built leaked into the store.
        assert!(store.is_empty());
    }

    #[test]
    fn built_trees_always_decode() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());
        let name = "n".repeat(MAX_ENTRY_NAME_LEN);
        let root = builder
            .build(&[entry(&name, 1), entry("short", 2)])
            .unwrap();

        let tree = read_tree(store.as_ref(), &root);
        assert_eq!(tree.get(&name).unwrap().object_id, ObjectId::from_hash([1; 32]));
    }

    #[test]
    fn modes_are_preserved() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());
        let root = builder
            .build(&[
                IndexEntry::new("run.sh", EntryMode::Executable, ObjectId::from_hash([1; 32])),
                IndexEntry::new("link", EntryMode::Symlink, ObjectId::from_hash([2; 32])),
            ])
            .unwrap();
        let tree = read_tree(store.as_ref(), &root);
        assert_eq!(tree.get("run.sh").unwrap().mode, EntryMode::Executable);
        assert_eq!(tree.get("link").unwrap().mode, EntryMode::Symlink);
    }

    #[test]
    fn build_index_uses_staged_entries() {
        let store = make_store();
        let trait_store: Arc<dyn ObjectStore> = store.clone();
        let mut index = Index::new(Arc::clone(&trait_store));
        index
            .stage_blob("docs/a.md", b"alpha", EntryMode::Regular)
            .unwrap();
        index
            .stage_blob("docs/b.md", b"beta", EntryMode::Regular)
            .unwrap();

        let builder = TreeBuilder::new(trait_store);
        let root = builder.build_index(&index).unwrap();
        let tree = read_tree(store.as_ref(), &root);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.entries[0].name, "docs");
    }

    #[test]
    fn tree_objects_have_tree_kind() {
        let store = make_store();
        let builder = TreeBuilder::new(store.clone());
        let root = builder.build(&[entry("x", 1)]).unwrap();
        assert_eq!(store.kind_of(&root).unwrap(), ObjectKind::Tree);
    }
}
