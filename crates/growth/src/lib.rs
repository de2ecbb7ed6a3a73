//! Growth data: attraction points inside a tree crown and the
//! space-colonization pass that grows branches toward them.
//!
//! # Invariants
//! - `influence_distance > kill_distance >= 0`, checked at construction.
//! - Proximity predicates never mutate the point set; removal is an
//!   explicit operation.
//! - Sampling is deterministic for a given seed.

mod crown;
mod points;
mod tree;

pub use crown::CrownSphere;
pub use points::{AttractionPoint, AttractionPointManager};
pub use tree::{Branch, FinishReason, GrowthStep, TreeGrower};

/// Errors from growth operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GrowthError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("point index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
}
