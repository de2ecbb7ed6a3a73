//! Input mapping: held keys and mouse motion become high-level actions.
//!
//! # Invariants
//! - Input never touches the camera directly; the frame loop applies the
//!   actions it receives.
//! - Movement scales with frame time, not time since start.

pub mod action;
mod state;

pub use action::Action;
pub use state::{Control, InputState};
