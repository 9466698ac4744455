//! Read-only views of a pie for tables, trees and flow charts.
//!
//! Covers:
//! 1. **Row flattening** -- depth-first rows carrying their name path
//! 2. **Child summary** -- root-level `(name, value, weight %)` rows
//! 3. **Structure links** -- parent to child edges weighted by value
//!
//! None of these mutate the tree. Run [`crate::tree::normalize`] first so
//! container values are current.

pub mod flatten;
pub mod links;

pub use flatten::{flatten, summarize_children, ChildSummary, Row};
pub use links::{structure_links, Link};
