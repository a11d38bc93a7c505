//! Tree materialization for Strata.
//!
//! The [`TreeBuilder`] converts a flat, path-keyed set of staged entries
//! into a graph of immutable tree objects, one per directory level.
//! Construction is post-order: a subtree is fully written (and its digest
//! known) before its parent is framed and hashed. Because the object
//! store deduplicates by content, an unchanged subtree reproduces its
//! previous digest and costs no new write -- this is what makes
//! successive snapshots cheap.
//!
//! [`walk`] is the read-side counterpart: a depth-first visitor over a
//! stored tree graph, for callers that materialize or inspect snapshots.

pub mod builder;
pub mod error;
pub mod walk;

pub use builder::TreeBuilder;
pub use error::{TreeError, TreeResult};
pub use walk::{walk, WalkedEntry};
