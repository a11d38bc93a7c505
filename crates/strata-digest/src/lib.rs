//! Framed content hashing for the Strata object store.
//!
//! Every object is hashed over its *framed* bytes, never the raw payload:
//!
//! ```text
//! ascii(kind label) || " " || ascii(decimal payload length) || NUL || payload
//! ```
//!
//! The frame is what gives a digest its meaning: a blob and a tree with
//! coincidentally identical payload bytes hash differently because their
//! kind labels differ. The framing is a stable bit-exact contract -- any
//! change to it invalidates every previously computed digest and must be
//! introduced as a new kind label, never by mutating this layout.
//!
//! The hash algorithm is pluggable via [`DigestAlgorithm`] but fixed per
//! [`DigestEngine`], and a store holds exactly one engine for its entire
//! lifetime. Mixing algorithms within one store is impossible by
//! construction.

pub mod engine;

pub use engine::{DigestAlgorithm, DigestEngine};
