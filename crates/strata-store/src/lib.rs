//! Content-addressed object storage for Strata.
//!
//! This crate implements a hash-keyed object store in the shape of git's
//! `.git/objects/` directory. Every piece of versioned data -- file blobs,
//! directory trees, commits -- is stored as an immutable object identified
//! by the digest of its framed bytes (`kind label SP decimal-len NUL
//! payload`).
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content (file contents, arbitrary data)
//! - [`Tree`] -- ordered directory listing mapping names to object references
//! - [`Commit`] -- a tree snapshot linked to parent commits and provenance
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- loose files under `objects/xx/yyyy...`, written via
//!   temp file plus atomic rename
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. `put` is idempotent: one durable write per previously-unseen digest.
//! 3. A digest that resolves to a different payload is a fatal
//!    [`StoreError::Corruption`], never an overwrite.
//! 4. Concurrent reads are always safe; readers never observe a partially
//!    written object.
//! 5. The digest algorithm is fixed at store creation and never mixed.
//! 6. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{
    Blob, Commit, EntryKind, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry,
    MAX_ENTRY_NAME_LEN,
};
pub use traits::ObjectStore;
