//! Shared types used across the landing scene crates.

mod types;

pub use types::{NodeId, SurfaceSize, Transform};
