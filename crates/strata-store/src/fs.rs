use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use strata_digest::DigestEngine;
use strata_types::ObjectId;
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};
use crate::object::{parse_frame_header, ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// Filesystem-backed object store using git-style loose files.
///
/// Objects live at `<root>/<first 2 hex chars>/<remaining 62>`, holding
/// the framed bytes (`label SP decimal-len NUL payload`). Writes land in
/// a temp file inside the root and are atomically renamed into place, so
/// a reader never observes a partially written object and concurrent
/// writers of the same digest race harmlessly (first writer wins, the
/// content is identical by construction).
pub struct FsObjectStore {
    root: PathBuf,
    engine: DigestEngine,
    durable_writes: AtomicU64,
}

impl FsObjectStore {
    /// Open (creating if needed) a store rooted at `root`, with the
    /// default digest engine.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_engine(root, DigestEngine::default())
    }

    /// Open (creating if needed) a store with an explicit digest engine.
    ///
    /// The engine is fixed for the store's lifetime; reopening an
    /// existing store with a different algorithm will simply fail to
    /// resolve previously written digests.
    pub fn open_with_engine(root: impl AsRef<Path>, engine: DigestEngine) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), algorithm = %engine.algorithm(), "opened object store");
        Ok(Self {
            root,
            engine,
            durable_writes: AtomicU64::new(0),
        })
    }

    /// The directory objects are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of durable writes performed by this handle. Repeat `put`s
    /// of already-stored content do not advance this counter.
    pub fn write_count(&self) -> u64 {
        self.durable_writes.load(Ordering::Relaxed)
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }
}

impl ObjectStore for FsObjectStore {
    fn engine(&self) -> &DigestEngine {
        &self.engine
    }

    fn put(&self, kind: ObjectKind, payload: &[u8]) -> StoreResult<ObjectId> {
        let id = self.engine.digest(kind.label(), payload);
        let path = self.object_path(&id);

        let mut framed = DigestEngine::frame_header(kind.label(), payload.len());
        framed.extend_from_slice(payload);

        match fs::read(&path) {
            Ok(existing) => {
                if existing != framed {
                    return Err(StoreError::Corruption {
                        id,
                        reason: "digest collision: existing object differs".to_string(),
                    });
                }
                // Dedup hit: content already durable, nothing to write.
                return Ok(id);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&framed)?;
        tmp.flush()?;
        if let Err(persist_err) = tmp.persist(&path) {
            // A concurrent writer may have won the rename race. The
            // object is content-addressed, so an existing identical file
            // is success; anything else propagates.
            match fs::read(&path) {
                Ok(existing) if existing == framed => {}
                _ => return Err(persist_err.error.into()),
            }
        }
        self.durable_writes.fetch_add(1, Ordering::Relaxed);
        trace!(id = %id.short_hex(), %kind, bytes = payload.len(), "stored object");
        Ok(id)
    }

    fn get(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        let bytes = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*id));
            }
            Err(e) => return Err(e.into()),
        };
        if self.engine.digest_framed(&bytes) != *id {
            return Err(StoreError::Corruption {
                id: *id,
                reason: "stored bytes rehash to a different digest".to_string(),
            });
        }
        StoredObject::from_framed_bytes(&bytes)
    }

    fn has(&self, id: &ObjectId) -> StoreResult<bool> {
        match fs::metadata(self.object_path(id)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn kind_of(&self, id: &ObjectId) -> StoreResult<ObjectKind> {
        // Header-only read: the frame header fits in 32 bytes.
        let file = match fs::File::open(self.object_path(id)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*id));
            }
            Err(e) => return Err(e.into()),
        };
        let mut header = Vec::with_capacity(32);
        file.take(32).read_to_end(&mut header)?;
        let (kind, _, _) = parse_frame_header(&header)?;
        Ok(kind)
    }
}

impl std::fmt::Debug for FsObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsObjectStore")
            .field("root", &self.root)
            .field("algorithm", &self.engine.algorithm())
            .finish()
    }
}
