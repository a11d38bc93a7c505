//! Foundation types shared across the Strata workspace.
//!
//! - [`ObjectId`] -- fixed-width content address for stored objects
//! - [`Signature`] -- provenance identity (who + when + where) for commits
//! - [`TypeError`] -- parse failures for the above

pub mod error;
pub mod object_id;
pub mod signature;

pub use error::TypeError;
pub use object_id::ObjectId;
pub use signature::Signature;
