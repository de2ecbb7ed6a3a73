//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers only read a [`FrameSnapshot`]; they never touch the camera,
//!   the attraction points or the tree.
//! - A snapshot is captured once per frame, after the camera's view matrix
//!   has been updated.
//!
//! The text renderer here backs the CLI and tests. The GPU backend lives in
//! `treecrown-render-wgpu` and consumes the same snapshot.

mod renderer;
mod snapshot;

pub use renderer::{DebugTextRenderer, Renderer};
pub use snapshot::FrameSnapshot;
