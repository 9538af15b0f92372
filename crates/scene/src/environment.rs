use serde::{Deserialize, Serialize};

/// Clear colour used when no environment image is available.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.05, 0.05, 0.08, 1.0];

/// Where the environment lighting came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnvironmentSource {
    /// Flat clear colour, no image.
    Flat,
    /// Radiance HDR image.
    Radiance { path: String, width: u32, height: u32 },
}

/// Background and ambient lighting owned by the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Linear RGBA background.
    pub background: [f32; 4],
    /// Ambient light multiplier applied to every lit surface.
    pub ambient: f32,
    pub source: EnvironmentSource,
}

impl Environment {
    pub fn flat(background: [f32; 4]) -> Self {
        Self {
            background,
            ambient: 0.3,
            source: EnvironmentSource::Flat,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.source, EnvironmentSource::Flat)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::flat(DEFAULT_CLEAR_COLOR)
    }
}
