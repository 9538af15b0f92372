//! Asset Loader Pipeline: loads named models concurrently, normalizes each
//! to a canonical size, lays them out by load order and optionally wraps
//! each in a translucent containment sphere.
//!
//! # Layout
//! Models resolve to `assets/models/<name>/scene.gltf` under a root
//! directory. The environment image lives at
//! `assets/textures/environment.hdr`.
//!
//! # Invariants
//! - One slow or failing load never blocks or aborts the others.
//! - Every name resolves to exactly one `LoadEvent`, and the completion
//!   future resolves only after all of them.
//! - A zero-extent model is a load failure, never a divide by zero.
//! - Disk reads and glTF decoding happen on worker threads; load futures
//!   only wait for their results.

mod environment;
mod error;
mod gltf_import;
mod normalize;
mod pipeline;
mod source;

pub use environment::{ENVIRONMENT_PATH, load_environment};
pub use error::AssetError;
pub use gltf_import::{decode_gltf, decode_gltf_file, decode_gltf_slice};
pub use normalize::{Normalized, containment_sphere, normalize};
pub use pipeline::{
    LoadEvent, LoadFailure, LoadJob, LoadPipeline, LoadReport, LoadedAsset, LoaderConfig,
};
pub use source::{AssetSource, FileSource, ManualSource, MemorySource, model_path};

pub fn crate_info() -> &'static str {
    "landing-assets v0.1.0"
}
