//! The staging index: mutable path-to-object bindings for the next
//! snapshot.
//!
//! The [`Index`] maps repository-relative paths to `(mode, object id)`
//! pairs in a `BTreeMap`, so iteration is always path-ordered. It holds
//! no file content -- staging a large file costs one blob write in the
//! (already deduplicating) object store plus one map entry here.
//!
//! The index is working state, not a content-addressed object: it is
//! mutated freely by the caller, consumed (never owned) by the tree
//! builder, and typically discarded or reset after a successful commit.

pub mod entry;
pub mod error;
pub mod index;

pub use entry::IndexEntry;
pub use error::{IndexError, IndexResult};
pub use index::Index;
