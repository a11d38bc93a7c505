use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use strata_digest::DigestEngine;
use strata_types::ObjectId;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held in memory
/// behind a `RwLock` for safe concurrent access. Objects are cloned on
/// read/write.
pub struct InMemoryObjectStore {
    engine: DigestEngine,
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
    durable_writes: AtomicU64,
}

impl InMemoryObjectStore {
    /// Create an empty store with the default digest engine.
    pub fn new() -> Self {
        Self::with_engine(DigestEngine::default())
    }

    /// Create an empty store with an explicit digest engine.
    pub fn with_engine(engine: DigestEngine) -> Self {
        Self {
            engine,
            objects: RwLock::new(HashMap::new()),
            durable_writes: AtomicU64::new(0),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total payload bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|obj| obj.size)
            .sum()
    }

    /// Number of durable writes performed so far. Repeat `put`s of
    /// already-stored content do not advance this counter.
    pub fn write_count(&self) -> u64 {
        self.durable_writes.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn engine(&self) -> &DigestEngine {
        &self.engine
    }

    fn put(&self, kind: ObjectKind, payload: &[u8]) -> StoreResult<ObjectId> {
        let id = self.engine.digest(kind.label(), payload);
        let mut map = self.objects.write().expect("lock poisoned");
        match map.get(&id) {
            Some(existing) => {
                // Idempotent no-op, unless the digest maps to different
                // bytes, which is a fatal integrity violation.
                if existing.kind != kind || existing.data != payload {
                    return Err(StoreError::Corruption {
                        id,
                        reason: "digest collision: existing object differs".to_string(),
                    });
                }
            }
            None => {
                map.insert(id, StoredObject::new(kind, payload.to_vec()));
                self.durable_writes.fetch_add(1, Ordering::Relaxed);
                trace!(id = %id.short_hex(), %kind, bytes = payload.len(), "stored object");
            }
        }
        Ok(id)
    }

    fn get(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        let map = self.objects.read().expect("lock poisoned");
        let obj = map.get(id).cloned().ok_or(StoreError::NotFound(*id))?;
        if obj.id_with(&self.engine) != *id {
            return Err(StoreError::Corruption {
                id: *id,
                reason: "stored payload rehashes to a different digest".to_string(),
            });
        }
        Ok(obj)
    }

    fn has(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.objects.read().expect("lock poisoned").contains_key(id))
    }

    fn kind_of(&self, id: &ObjectId) -> StoreResult<ObjectKind> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(id).map(|o| o.kind).ok_or(StoreError::NotFound(*id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("algorithm", &self.engine.algorithm())
            .field("object_count", &self.len())
            .finish()
    }
}
