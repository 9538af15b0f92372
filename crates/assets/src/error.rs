/// Errors from loading a model or the environment image.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("invalid asset name: {0:?}")]
    InvalidName(String),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("no geometry in {0}")]
    NoGeometry(String),
    #[error("degenerate geometry in {name}: bounding box has zero extent")]
    DegenerateGeometry { name: String },
    #[error("load worker exited without a result")]
    WorkerLost,
    #[error("environment image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("environment image has no pixels: {0}")]
    EmptyEnvironment(String),
}

impl AssetError {
    /// True for the zero-extent normalization failure.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, AssetError::DegenerateGeometry { .. })
    }
}
