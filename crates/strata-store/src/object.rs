use serde::{Deserialize, Serialize};
use strata_digest::DigestEngine;
use strata_types::{ObjectId, Signature};

use crate::error::{StoreError, StoreResult};

/// Version byte leading every serialized tree payload. Bumping this is a
/// breaking change to the encoding contract: it invalidates every tree
/// digest ever computed.
pub const TREE_FORMAT_VERSION: u8 = 1;

/// Longest entry name the tree layout can carry: its name-length field
/// is a u16.
pub const MAX_ENTRY_NAME_LEN: usize = u16::MAX as usize;

/// The kind of object stored. Always an explicit tag, never inferred
/// from payload bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing: ordered entries mapping names to object references.
    Tree,
    /// Tree snapshot plus parent links and provenance metadata.
    Commit,
}

impl ObjectKind {
    /// Stable ASCII label used in the digest framing.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// Parse a framing label back into a kind.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            "commit" => Some(Self::Commit),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A stored object: kind tag + payload bytes + cached size.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// payload -- it is a pure key-value store keyed by content digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and payload.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content address under the given engine.
    pub fn id_with(&self, engine: &DigestEngine) -> ObjectId {
        engine.digest(self.kind.label(), &self.data)
    }

    /// The object in framed form: `label SP decimal-len NUL payload`.
    ///
    /// This is the byte sequence the digest is computed over and the
    /// on-disk representation used by the filesystem backend.
    pub fn framed_bytes(&self) -> Vec<u8> {
        let mut bytes = DigestEngine::frame_header(self.kind.label(), self.data.len());
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Decode an object from framed bytes, validating the header.
    pub fn from_framed_bytes(bytes: &[u8]) -> StoreResult<Self> {
        let (kind, declared_len, header_len) = parse_frame_header(bytes)?;
        let payload = &bytes[header_len..];
        if payload.len() != declared_len {
            return Err(StoreError::Malformed {
                kind,
                reason: format!(
                    "frame declares {declared_len} payload bytes, found {}",
                    payload.len()
                ),
            });
        }
        Ok(Self::new(kind, payload.to_vec()))
    }
}

/// Parse a frame header, returning (kind, declared payload length,
/// header length including the NUL).
pub(crate) fn parse_frame_header(bytes: &[u8]) -> StoreResult<(ObjectKind, usize, usize)> {
    // Longest valid header: "commit" + space + 20 digits + NUL.
    let scan = &bytes[..bytes.len().min(32)];
    let nul = scan.iter().position(|&b| b == 0).ok_or(StoreError::Malformed {
        kind: ObjectKind::Blob,
        reason: "missing NUL terminator in frame header".to_string(),
    })?;
    let header = std::str::from_utf8(&scan[..nul]).map_err(|_| StoreError::Malformed {
        kind: ObjectKind::Blob,
        reason: "non-ASCII frame header".to_string(),
    })?;
    let (label, len_str) = header.split_once(' ').ok_or(StoreError::Malformed {
        kind: ObjectKind::Blob,
        reason: format!("frame header without separator: {header:?}"),
    })?;
    let kind = ObjectKind::from_label(label).ok_or(StoreError::Malformed {
        kind: ObjectKind::Blob,
        reason: format!("unknown object kind label: {label:?}"),
    })?;
    let declared_len: usize = len_str.parse().map_err(|_| StoreError::Malformed {
        kind,
        reason: format!("bad length field: {len_str:?}"),
    })?;
    Ok((kind, declared_len, nul + 1))
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object. The payload is the file bytes, uninterpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Blob {
            return Err(StoreError::Malformed {
                kind: obj.kind,
                reason: "expected blob".to_string(),
            });
        }
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree / directory (0o040000).
    Directory,
}

impl EntryMode {
    /// Octal mode value (for display/serialization).
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    /// Parse from an octal mode value.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o040000 => Some(Self::Directory),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// What a tree entry points at. Stored explicitly in the encoding rather
/// than inferred from the mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// The entry references a blob object.
    Blob,
    /// The entry references a nested tree object.
    Tree,
}

impl EntryKind {
    fn wire_byte(&self) -> u8 {
        match self {
            Self::Blob => 0,
            Self::Tree => 1,
        }
    }

    fn from_wire_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Blob),
            1 => Some(Self::Tree),
            _ => None,
        }
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// File mode (regular, executable, symlink, directory).
    pub mode: EntryMode,
    /// Whether the referenced object is a blob or a subtree.
    pub kind: EntryKind,
    /// Entry name (filename or directory name, no path separators).
    pub name: String,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Entry referencing a blob.
    pub fn blob(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            kind: EntryKind::Blob,
            name: name.into(),
            object_id,
        }
    }

    /// Entry referencing a nested tree. Mode is always `Directory`.
    pub fn tree(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode: EntryMode::Directory,
            kind: EntryKind::Tree,
            name: name.into(),
            object_id,
        }
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Raw byte order of the name is the canonical tree ordering.
        self.name.as_bytes().cmp(other.name.as_bytes())
    }
}

/// Directory listing object: an ordered sequence of named references.
///
/// The canonical encoding sorts entries by raw name bytes, so two trees
/// with the same entry set serialize identically and share one digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted by raw byte value of their names.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries, sorting them into
    /// canonical order. Name uniqueness is checked by [`Tree::encode`],
    /// not here.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Serialize to the canonical versioned binary layout:
    ///
    /// ```text
    /// version:u8 ( mode:u32be kind:u8 digest:32B name_len:u16be name )*
    /// ```
    ///
    /// Refuses entry sets the layout cannot represent canonically: an
    /// empty name, a name longer than [`MAX_ENTRY_NAME_LEN`] (the length
    /// field is u16), out-of-order or duplicate names, or a kind/mode
    /// mismatch. Anything `encode` accepts, [`Tree::decode`] accepts
    /// back.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let malformed = |reason: String| StoreError::Malformed {
            kind: ObjectKind::Tree,
            reason,
        };

        let mut buf = Vec::with_capacity(1 + self.entries.len() * 48);
        buf.push(TREE_FORMAT_VERSION);
        let mut prev_name: Option<&[u8]> = None;
        for entry in &self.entries {
            let name = entry.name.as_bytes();
            if name.is_empty() {
                return Err(malformed("empty entry name".to_string()));
            }
            if name.len() > MAX_ENTRY_NAME_LEN {
                return Err(malformed(format!(
                    "entry name is {} bytes, limit is {MAX_ENTRY_NAME_LEN}",
                    name.len()
                )));
            }
            if (entry.kind == EntryKind::Tree) != (entry.mode == EntryMode::Directory) {
                return Err(malformed(format!(
                    "entry kind {:?} inconsistent with mode {}",
                    entry.kind, entry.mode
                )));
            }
            if let Some(prev) = prev_name {
                if prev >= name {
                    return Err(malformed(format!(
                        "entries out of canonical order near {:?}",
                        entry.name
                    )));
                }
            }
            prev_name = Some(name);

            buf.extend_from_slice(&entry.mode.mode_bits().to_be_bytes());
            buf.push(entry.kind.wire_byte());
            buf.extend_from_slice(entry.object_id.as_bytes());
            buf.extend_from_slice(&(name.len() as u16).to_be_bytes());
            buf.extend_from_slice(name);
        }
        Ok(buf)
    }

    /// Decode from the canonical binary layout.
    ///
    /// Rejects unknown versions, truncated entries, invalid modes, and
    /// entries that are out of order or duplicated -- a non-canonical
    /// byte sequence must never decode to a valid tree, or two different
    /// payloads could denote the same logical directory.
    pub fn decode(data: &[u8]) -> StoreResult<Self> {
        let malformed = |reason: String| StoreError::Malformed {
            kind: ObjectKind::Tree,
            reason,
        };

        let (&version, mut rest) = data
            .split_first()
            .ok_or_else(|| malformed("empty tree payload".to_string()))?;
        if version != TREE_FORMAT_VERSION {
            return Err(malformed(format!("unknown tree format version {version}")));
        }

        let mut entries = Vec::new();
        let mut prev_name: Option<Vec<u8>> = None;
        while !rest.is_empty() {
            if rest.len() < 4 + 1 + 32 + 2 {
                return Err(malformed("truncated tree entry".to_string()));
            }
            let mode_bits = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
            let mode = EntryMode::from_mode_bits(mode_bits)
                .ok_or_else(|| malformed(format!("invalid mode bits {mode_bits:o}")))?;
            let kind = EntryKind::from_wire_byte(rest[4])
                .ok_or_else(|| malformed(format!("invalid entry kind byte {}", rest[4])))?;
            if (kind == EntryKind::Tree) != (mode == EntryMode::Directory) {
                return Err(malformed(format!(
                    "entry kind {kind:?} inconsistent with mode {mode}"
                )));
            }
            let mut digest = [0u8; 32];
            digest.copy_from_slice(&rest[5..37]);
            let name_len = u16::from_be_bytes([rest[37], rest[38]]) as usize;
            if name_len == 0 {
                return Err(malformed("empty entry name".to_string()));
            }
            rest = &rest[39..];
            if rest.len() < name_len {
                return Err(malformed("truncated entry name".to_string()));
            }
            let name_bytes = &rest[..name_len];
            if let Some(prev) = &prev_name {
                if prev.as_slice() >= name_bytes {
                    return Err(malformed(format!(
                        "entries out of canonical order near {:?}",
                        String::from_utf8_lossy(name_bytes)
                    )));
                }
            }
            prev_name = Some(name_bytes.to_vec());
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| malformed("entry name is not UTF-8".to_string()))?
                .to_string();
            rest = &rest[name_len..];

            entries.push(TreeEntry {
                mode,
                kind,
                name,
                object_id: ObjectId::from_hash(digest),
            });
        }

        Ok(Self { entries })
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        Ok(StoredObject::new(ObjectKind::Tree, self.encode()?))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Tree {
            return Err(StoreError::Malformed {
                kind: obj.kind,
                reason: "expected tree".to_string(),
            });
        }
        Self::decode(&obj.data)
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_bytes().cmp(name.as_bytes()))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A tree snapshot linked to its parent commits and provenance metadata.
///
/// Canonical text record:
///
/// ```text
/// tree <hex>
/// parent <hex>        (one line per parent, in order)
/// author <signature>
/// committer <signature>
///
/// <message>
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// Parent commits, in order. Empty for a root commit, two or more
    /// for a merge.
    pub parents: Vec<ObjectId>,
    /// Who created the content.
    pub author: Signature,
    /// Who recorded the commit.
    pub committer: Signature,
    /// Free-form commit message.
    pub message: String,
}

impl Commit {
    /// Serialize to the canonical text record.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("tree {}\n", self.tree.to_hex()));
        for parent in &self.parents {
            out.push_str(&format!("parent {}\n", parent.to_hex()));
        }
        out.push_str(&format!("author {}\n", self.author.to_line()));
        out.push_str(&format!("committer {}\n", self.committer.to_line()));
        out.push('\n');
        out.push_str(&self.message);
        out.into_bytes()
    }

    /// Parse the canonical text record.
    pub fn decode(data: &[u8]) -> StoreResult<Self> {
        let malformed = |reason: String| StoreError::Malformed {
            kind: ObjectKind::Commit,
            reason,
        };

        let text = std::str::from_utf8(data)
            .map_err(|_| malformed("commit record is not UTF-8".to_string()))?;
        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| malformed("missing blank separator".to_string()))?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            let (field, value) = line
                .split_once(' ')
                .ok_or_else(|| malformed(format!("bad header line: {line:?}")))?;
            match field {
                "tree" if tree.is_none() => {
                    tree = Some(
                        ObjectId::from_hex(value)
                            .map_err(|e| malformed(format!("bad tree id: {e}")))?,
                    );
                }
                "parent" => {
                    parents.push(
                        ObjectId::from_hex(value)
                            .map_err(|e| malformed(format!("bad parent id: {e}")))?,
                    );
                }
                "author" if author.is_none() => {
                    author = Some(
                        Signature::from_line(value)
                            .map_err(|e| malformed(format!("bad author: {e}")))?,
                    );
                }
                "committer" if committer.is_none() => {
                    committer = Some(
                        Signature::from_line(value)
                            .map_err(|e| malformed(format!("bad committer: {e}")))?,
                    );
                }
                _ => return Err(malformed(format!("unexpected header: {field:?}"))),
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| malformed("missing tree header".to_string()))?,
            parents,
            author: author.ok_or_else(|| malformed("missing author header".to_string()))?,
            committer: committer
                .ok_or_else(|| malformed("missing committer header".to_string()))?,
            message: message.to_string(),
        })
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Commit, self.encode())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Commit {
            return Err(StoreError::Malformed {
                kind: obj.kind,
                reason: "expected commit".to_string(),
            });
        }
        Self::decode(&obj.data)
    }

    /// Returns `true` if this commit has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns `true` if this commit has two or more parents.
    pub fn is_merge(&self) -> bool {
        self.parents.len() >= 2
    }
}
