//! Scene host: owns the scene, camera and render surface for one mount
//! container, drives the per-frame loop and tears everything down.
//!
//! # Invariants
//! - Single-threaded. Asset loads, resize notifications and frame
//!   callbacks interleave but never run in parallel.
//! - A frame applies the latest resize (camera first, then surface) and
//!   any finished loads before it renders.
//! - Teardown order: stop resize delivery, cancel the pending frame,
//!   dispose the surface. Nothing touches the surface afterwards.

mod config;
mod frame_loop;
mod host;
mod motion;
mod resize;

pub use config::{ConfigError, HostConfig};
pub use frame_loop::{AnimationLoop, FrameRequest, FrameScheduler, LoopState, ManualScheduler};
pub use host::{HostPhase, HostServices, HostSummary, LoadedEntry, SceneHost};
pub use motion::{MotionConfig, MotionState, MotionTable, StepOutcome};
pub use resize::{NoResizeObserver, ResizeError, ResizeFeed, ResizeObserver, ResizeReactor, ResizeSink};

pub fn crate_info() -> &'static str {
    "landing-host v0.1.0"
}
