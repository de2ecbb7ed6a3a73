//! wgpu render backend for the tree-crown demo.
//!
//! Draws the crown and the attraction-point markers as instanced, lit unit
//! spheres and each grown branch as a lit tube whose radius grows toward the
//! trunk. Input is a [`treecrown_render::FrameSnapshot`]; nothing here reads
//! the camera or the scene directly.
//!
//! # Invariants
//! - The renderer never mutates scene state.
//! - Mesh triangles wind clockwise on screen when front facing; the
//!   left-handed view flips the outward counter-clockwise order.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::WgpuRenderer;
pub use mesh::{Mesh, Vertex};
