//! Capital allocation over a normalized pie.
//!
//! - [`dca`] spreads a contribution across every leaf by path weight.
//! - [`reallocation`] builds a what-if pie: existing positions scaled up,
//!   new equal-sized positions injected, whole-percent targets attached.
//! - [`target_weights`] converts values to integer percentages summing to 100.
//! - [`review`] compares a pie with its adjusted copy, child by child.

pub mod dca;
pub mod reallocation;
pub mod review;
pub mod target_weights;

pub use dca::{allocate, allocate_cents, Allocations, UNNAMED_LEAF};
pub use reallocation::{
    add_mock_targets, plan_reallocation, recalculate_pie_allocation, scale_existing_positions,
    ReallocationInput, ReallocationPlan,
};
pub use review::{review_allocation, ReviewRow};
pub use target_weights::{apply_target_weights, compute_target_weights, TargetWeight};
