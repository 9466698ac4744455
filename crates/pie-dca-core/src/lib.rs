pub mod error;
pub mod numeric;
pub mod tree;
pub mod types;

#[cfg(feature = "allocation")]
pub mod allocation;

#[cfg(feature = "structure")]
pub mod structure;

#[cfg(feature = "display")]
pub mod display;

#[cfg(feature = "account")]
pub mod account;

pub use error::PieError;
pub use tree::{Children, Node, NodeKind, Pie, Ticker};
pub use types::*;

/// Standard result type for all pie-dca operations
pub type PieResult<T> = Result<T, PieError>;
