//! Commit recording for Strata.
//!
//! A commit binds a root tree digest to its ancestry and authorship,
//! turning content-addressed trees into a history. The [`CommitBuilder`]
//! validates every reference before writing: the tree must exist as a
//! tree object and every parent as a commit object, so the stored graph
//! never dangles at creation time.

pub mod builder;
pub mod error;

pub use builder::CommitBuilder;
pub use error::{CommitError, CommitResult};
