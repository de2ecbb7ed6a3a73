//! Fly camera: orthonormal view basis driven by incremental strafe, walk,
//! pitch and yaw commands, plus an independently configured perspective lens.
//!
//! Conventions are left-handed with depth in `[0, 1]`: `+X` right, `+Y` up,
//! `+Z` forward, which is the clip space wgpu expects.
//!
//! # Invariants
//! - `right`, `up`, `look` are unit length and mutually orthogonal after
//!   every `update_view_matrix`.
//! - The view matrix is derived state; reading it never returns a stale value.
//! - The projection exists only after a successful `set_lens`.

mod camera;
mod lens;

pub use camera::FlyCamera;
pub use lens::Lens;

/// Errors from camera operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("precondition violated: {0}")]
    PreconditionViolated(&'static str),
}
