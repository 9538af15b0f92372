use crate::motion::MotionConfig;
use landing_assets::{ENVIRONMENT_PATH, LoaderConfig};
use landing_common::SurfaceSize;
use landing_render::SurfaceSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a mount needs besides its platform services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Model names, loaded from `<asset_root>/assets/models/<name>/scene.gltf`.
    pub models: Vec<String>,
    pub asset_root: PathBuf,
    /// Environment image relative to `asset_root`. `None` keeps the flat
    /// clear colour.
    pub environment: Option<PathBuf>,
    /// Used when the container reports a zero size at mount.
    pub fallback_size: SurfaceSize,
    pub surface: SurfaceSettings,
    pub loader: LoaderConfig,
    pub motion: MotionConfig,
    pub orbit_controls: bool,
    /// Spinning wireframe cube shown until the first asset arrives.
    pub placeholder: bool,
    /// Seed for drift speeds and respawn positions. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            asset_root: PathBuf::from("."),
            environment: Some(PathBuf::from(ENVIRONMENT_PATH)),
            fallback_size: SurfaceSize::new(1280, 720),
            surface: SurfaceSettings::default(),
            loader: LoaderConfig::default(),
            motion: MotionConfig::default(),
            orbit_controls: true,
            placeholder: true,
            seed: None,
        }
    }
}

impl HostConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fallback_size.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "fallback_size must be non-zero, got {}",
                self.fallback_size
            )));
        }
        if self.loader.target_size <= 0.0 {
            return Err(ConfigError::Invalid("loader.target_size must be positive".into()));
        }
        let m = &self.motion;
        if m.speed_min < 0.0 || m.speed_max < m.speed_min {
            return Err(ConfigError::Invalid(format!(
                "motion speed range [{}, {}] is invalid",
                m.speed_min, m.speed_max
            )));
        }
        if m.bottom >= m.top {
            return Err(ConfigError::Invalid(format!(
                "motion.bottom ({}) must be below motion.top ({})",
                m.bottom, m.top
            )));
        }
        Ok(())
    }

    /// Absolute location of the environment image, if one is configured.
    pub fn environment_path(&self) -> Option<PathBuf> {
        self.environment.as_ref().map(|p| self.asset_root.join(p))
    }
}
