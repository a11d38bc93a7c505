use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use strata_types::ObjectId;

/// The hash function used for content addressing.
///
/// Both variants emit 256-bit digests, which keeps [`ObjectId`] a fixed
/// 32-byte value regardless of the algorithm a store was created with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// BLAKE3, the default.
    #[default]
    Blake3,
    /// SHA-256, for deployments that require a FIPS-approved function.
    Sha256,
}

impl DigestAlgorithm {
    /// Stable name for display and store metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Computes content digests over framed byte buffers.
///
/// The engine is stateless apart from its algorithm choice and is cheap
/// to copy. A store instance holds exactly one engine; every digest that
/// store ever produces or verifies goes through it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigestEngine {
    algorithm: DigestAlgorithm,
}

impl DigestEngine {
    /// Create an engine with the given algorithm.
    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The algorithm this engine was created with.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Build the frame header for a payload: `label SP decimal-len NUL`.
    pub fn frame_header(kind_label: &str, payload_len: usize) -> Vec<u8> {
        let mut header = Vec::with_capacity(kind_label.len() + 24);
        header.extend_from_slice(kind_label.as_bytes());
        header.push(b' ');
        header.extend_from_slice(payload_len.to_string().as_bytes());
        header.push(0);
        header
    }

    /// Digest a payload under the given kind label.
    pub fn digest(&self, kind_label: &str, payload: &[u8]) -> ObjectId {
        let header = Self::frame_header(kind_label, payload.len());
        self.digest_parts(&header, payload)
    }

    /// Digest an already-framed buffer (header followed by payload).
    ///
    /// Used by storage backends that persist objects in framed form and
    /// need to re-verify file contents without splitting them first.
    pub fn digest_framed(&self, framed: &[u8]) -> ObjectId {
        self.digest_parts(framed, &[])
    }

    /// Returns `true` if `payload` under `kind_label` hashes to `expected`.
    pub fn verify(&self, kind_label: &str, payload: &[u8], expected: &ObjectId) -> bool {
        self.digest(kind_label, payload) == *expected
    }

    fn digest_parts(&self, a: &[u8], b: &[u8]) -> ObjectId {
        match self.algorithm {
            DigestAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(a);
                hasher.update(b);
                ObjectId::from_hash(*hasher.finalize().as_bytes())
            }
            DigestAlgorithm::Sha256 => {
                let mut hasher = sha2::Sha256::new();
                hasher.update(a);
                hasher.update(b);
                ObjectId::from_hash(hasher.finalize().into())
            }
        }
    }
}
