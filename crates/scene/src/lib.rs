//! Frame-loop state for the tree-crown demo.
//!
//! [`Scene`] owns the camera, the crown, its attraction points and the tree
//! grower. The windowing layer (or a scripted CLI run) feeds it
//! [`treecrown_input::Action`]s and asks it for one
//! [`treecrown_render::FrameSnapshot`] per frame.
//!
//! # Invariants
//! - The camera and the point set never reference each other; only the
//!   scene sees both.
//! - Errors from a single frame or action are logged and the scene carries
//!   on with its last valid state.

mod scene;

pub use scene::Scene;

use treecrown_camera::CameraError;
use treecrown_common::ConfigError;
use treecrown_growth::GrowthError;

/// Errors from building or resizing a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("camera: {0}")]
    Camera(#[from] CameraError),
    #[error("growth: {0}")]
    Growth(#[from] GrowthError),
}
