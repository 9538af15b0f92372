//! wgpu render backend for the landing scene.
//!
//! Draws loaded models lit by a directional light plus the environment's
//! ambient term, their translucent containment spheres, and the wireframe
//! loading placeholder.
//!
//! # Invariants
//! - Renderer never mutates the scene.
//! - GPU meshes are cached per node and dropped when the node leaves.
//! - After `release`, every frame returns `RenderError::Disposed`.

mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;
