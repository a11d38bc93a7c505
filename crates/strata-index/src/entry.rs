use serde::{Deserialize, Serialize};
use strata_store::EntryMode;
use strata_types::ObjectId;

/// An entry in the staging index: one path bound to one stored blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Repository-relative path, `/`-separated.
    pub path: String,
    /// File mode recorded for the path.
    pub mode: EntryMode,
    /// Content-addressed ID of the staged blob.
    pub object_id: ObjectId,
}

impl IndexEntry {
    /// Create a new index entry.
    pub fn new(path: impl Into<String>, mode: EntryMode, object_id: ObjectId) -> Self {
        Self {
            path: path.into(),
            mode,
            object_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_fields() {
        let entry = IndexEntry::new("src/main.rs", EntryMode::Regular, ObjectId::null());
        assert_eq!(entry.path, "src/main.rs");
        assert_eq!(entry.mode, EntryMode::Regular);
        assert!(entry.object_id.is_null());
    }
}
