//! Folding externally produced structure into a pie.
//!
//! - [`merge`] inserts or overwrites children from a flat `name -> {type, value}`
//!   mapping, skipping malformed entries.
//! - [`classifier`] turns a raw classifier response into such a mapping and
//!   rejects whole batches whose shape is wrong.
//!
//! Neither module normalizes; call [`crate::tree::normalize`] afterwards.

pub mod classifier;
pub mod merge;

pub use classifier::{merge_batch, parse_classifier_response, validate_batch};
pub use merge::{merge, MergeReport, SkippedEntry};
