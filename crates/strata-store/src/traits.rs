use strata_digest::DigestEngine;
use strata_types::ObjectId;

use crate::error::StoreResult;
use crate::object::{ObjectKind, StoredObject};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. Content-addressing guarantees
///   this: the same framed bytes always produce the same ID.
/// - `put` is idempotent and performs exactly one durable write per
///   previously-unseen digest.
/// - A digest already present with different bytes is a fatal
///   [`Corruption`](crate::StoreError::Corruption), never an overwrite.
/// - Concurrent reads are always safe; a read concurrent with a `put` of
///   the same digest either blocks or observes nothing, never a partial
///   object.
/// - The store never interprets object payloads -- it is a pure
///   key-value store keyed by content digest.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// The digest engine this store was created with. Fixed for the
    /// store's lifetime; every digest the store produces or checks goes
    /// through it.
    fn engine(&self) -> &DigestEngine;

    /// Frame and hash a payload, write it if absent, and return its ID.
    fn put(&self, kind: ObjectKind, payload: &[u8]) -> StoreResult<ObjectId>;

    /// Read an object by its content-addressed ID.
    ///
    /// Fails with [`NotFound`](crate::StoreError::NotFound) if absent and
    /// with [`Corruption`](crate::StoreError::Corruption) if the stored
    /// bytes no longer hash to the ID.
    fn get(&self, id: &ObjectId) -> StoreResult<StoredObject>;

    /// Check whether an object exists without materializing its payload.
    fn has(&self, id: &ObjectId) -> StoreResult<bool>;

    /// The kind of a stored object, without materializing its payload.
    ///
    /// Fails with [`NotFound`](crate::StoreError::NotFound) if absent.
    fn kind_of(&self, id: &ObjectId) -> StoreResult<ObjectKind>;

    /// Store an already-assembled object. Equivalent to `put` with its
    /// kind and data.
    fn put_object(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        self.put(object.kind, &object.data)
    }
}
