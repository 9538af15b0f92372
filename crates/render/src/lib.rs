//! Rendering Adapter: camera, render surface and a renderer-agnostic backend trait.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - The camera aspect is committed before or together with a surface
//!   resize, so no frame pairs a new viewport with a stale aspect.
//! - A disposed surface never reaches its backend again.
//!
//! # Backends
//! `TextRenderer` is a headless backend that records what each frame saw.
//! The wgpu backend lives in `landing-render-wgpu` and implements the same
//! trait.

mod camera;
mod renderer;
mod surface;

pub use camera::{OrbitControls, PerspectiveCamera};
pub use renderer::{FrameRecord, RenderError, Renderer, TextRenderer};
pub use surface::{MountContainer, RenderSurface, SurfaceSettings};

pub fn crate_info() -> &'static str {
    "landing-render v0.1.0"
}
