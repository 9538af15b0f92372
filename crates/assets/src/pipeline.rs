use crate::error::AssetError;
use crate::normalize::{containment_sphere, normalize};
use crate::source::AssetSource;
use futures::FutureExt;
use futures::channel::mpsc;
use futures::future::{LocalBoxFuture, join_all};
use glam::Vec3;
use landing_common::Transform;
use landing_scene::{Aabb, Decoration, Mesh, NodeContent, SceneNode};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::Arc;
use tracing::Instrument;

/// Post-processing applied to every loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Largest bounding-box dimension after normalization.
    pub target_size: f32,
    /// Horizontal distance between consecutive load slots.
    pub spacing: f32,
    /// Containment sphere radius multiplier.
    pub padding: f32,
    /// Wrap each model in a containment sphere.
    pub containment: bool,
    /// Linear RGBA of the containment sphere.
    pub containment_color: [f32; 4],
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            target_size: 1.0,
            spacing: 2.0,
            padding: 1.1,
            containment: true,
            containment_color: [0.3, 0.6, 1.0, 0.25],
        }
    }
}

/// A successfully loaded and post-processed model.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub name: String,
    /// Position in the requested name list.
    pub index: usize,
    pub mesh: Arc<Mesh>,
    /// Uniform normalization scale.
    pub scale: f32,
    /// Initial root position: `index * spacing` along x.
    pub offset: Vec3,
    /// Bounds after normalization, in the node's local frame.
    pub bounds: Aabb,
    pub decoration: Decoration,
}

impl LoadedAsset {
    /// Scene node for this asset at its initial offset.
    pub fn to_node(&self) -> SceneNode {
        SceneNode {
            name: self.name.clone(),
            transform: Transform::from_position(self.offset),
            content: NodeContent::Model {
                mesh: Arc::clone(&self.mesh),
                mesh_scale: self.scale,
                decoration: self.decoration,
            },
        }
    }
}

/// One name that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub name: String,
    pub index: usize,
    pub error: AssetError,
}

/// Per-asset outcome, delivered as soon as that asset resolves.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded(LoadedAsset),
    Failed(LoadFailure),
}

impl LoadEvent {
    /// Position of the name in the requested list.
    pub fn index(&self) -> usize {
        match self {
            LoadEvent::Loaded(asset) => asset.index,
            LoadEvent::Failed(failure) => failure.index,
        }
    }
}

/// Summary produced once every asset has resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Names that loaded, in request order.
    pub loaded: Vec<String>,
    /// Names that failed, in request order.
    pub failed: Vec<String>,
}

impl LoadReport {
    pub fn total(&self) -> usize {
        self.loaded.len() + self.failed.len()
    }
}

/// Handle to an in-progress `load_all`.
///
/// `events` yields one event per name in completion order. `completion`
/// must be polled (spawned on an executor) to drive the loads, and resolves
/// after the last one.
pub struct LoadJob {
    pub events: mpsc::UnboundedReceiver<LoadEvent>,
    pub completion: LocalBoxFuture<'static, LoadReport>,
}

/// Fans out one load per name and joins them.
pub struct LoadPipeline {
    source: Rc<dyn AssetSource>,
    config: LoaderConfig,
}

impl LoadPipeline {
    pub fn new(source: Rc<dyn AssetSource>, config: LoaderConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Start loading every name concurrently.
    ///
    /// Dropping `LoadJob::events` is allowed at any time; loads that finish
    /// afterwards are discarded.
    pub fn load_all(&self, names: &[String]) -> LoadJob {
        let (tx, events) = mpsc::unbounded();

        let loads: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let source = Rc::clone(&self.source);
                let config = self.config.clone();
                let tx = tx.clone();
                let name = name.clone();
                let span = tracing::info_span!("load_asset", name = %name, index);
                async move {
                    let fetched = source.fetch(&name).await;
                    let event = match fetched.and_then(|mesh| prepare(&config, &name, index, mesh))
                    {
                        Ok(asset) => {
                            tracing::info!(
                                scale = asset.scale,
                                x = asset.offset.x,
                                "asset loaded"
                            );
                            LoadEvent::Loaded(asset)
                        }
                        Err(error) => {
                            tracing::warn!(%error, "asset failed to load");
                            LoadEvent::Failed(LoadFailure {
                                name: name.clone(),
                                index,
                                error,
                            })
                        }
                    };
                    let loaded = matches!(event, LoadEvent::Loaded(_));
                    if tx.unbounded_send(event).is_err() {
                        tracing::debug!("receiver gone, discarding load result");
                    }
                    (name, loaded)
                }
                .instrument(span)
            })
            .collect();
        drop(tx);

        let total = names.len();
        let completion = join_all(loads)
            .map(move |outcomes| {
                let mut report = LoadReport::default();
                for (name, loaded) in outcomes {
                    if loaded {
                        report.loaded.push(name);
                    } else {
                        report.failed.push(name);
                    }
                }
                tracing::info!(
                    total,
                    loaded = report.loaded.len(),
                    failed = report.failed.len(),
                    "all assets resolved"
                );
                report
            })
            .boxed_local();

        LoadJob { events, completion }
    }
}

/// Normalize, decorate and place one raw mesh.
pub(crate) fn prepare(
    config: &LoaderConfig,
    name: &str,
    index: usize,
    mesh: Mesh,
) -> Result<LoadedAsset, AssetError> {
    let normalized = normalize(name, &mesh, config.target_size)?;
    let decoration = if config.containment {
        Decoration::Contained(containment_sphere(
            &normalized.bounds,
            config.padding,
            config.containment_color,
        ))
    } else {
        Decoration::Plain
    };

    Ok(LoadedAsset {
        name: name.to_string(),
        index,
        mesh: Arc::new(mesh),
        scale: normalized.scale,
        offset: Vec3::new(index as f32 * config.spacing, 0.0, 0.0),
        bounds: normalized.bounds,
        decoration,
    })
}
