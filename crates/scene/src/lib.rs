//! Scene Graph: a single owned root holding the environment and every
//! attached node.
//!
//! # Invariants
//! - The scene exclusively owns its nodes and environment.
//! - Nodes iterate in `NodeId` order (BTreeMap) on every platform.
//! - A model node and its containment visual share one transform and move
//!   as a rigid unit.

mod environment;
mod geometry;
pub mod scene;

pub use environment::{DEFAULT_CLEAR_COLOR, Environment, EnvironmentSource};
pub use geometry::{Aabb, Mesh};
pub use scene::{ContainmentSphere, Decoration, NodeContent, Scene, SceneNode, SceneSummary};

pub fn crate_info() -> &'static str {
    "landing-scene v0.1.0"
}
