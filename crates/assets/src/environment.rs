use crate::error::AssetError;
use landing_scene::{Environment, EnvironmentSource};
use std::path::Path;

/// Conventional location of the environment image, relative to the asset root.
pub const ENVIRONMENT_PATH: &str = "assets/textures/environment.hdr";

const AMBIENT_RANGE: (f32, f32) = (0.05, 4.0);

/// Load a Radiance HDR image and derive the scene background and ambient
/// light from its mean radiance.
pub fn load_environment(path: &Path) -> Result<Environment, AssetError> {
    let image = image::open(path)?.to_rgb32f();
    let (width, height) = image.dimensions();
    let count = (width as usize) * (height as usize);
    if count == 0 {
        return Err(AssetError::EmptyEnvironment(path.display().to_string()));
    }

    let mut sum = [0.0f64; 3];
    for pixel in image.pixels() {
        for (acc, c) in sum.iter_mut().zip(pixel.0) {
            if c.is_finite() {
                *acc += c.max(0.0) as f64;
            }
        }
    }
    let mean = sum.map(|s| (s / count as f64) as f32);

    let environment = Environment {
        background: background_from_radiance(mean),
        ambient: luminance(mean).clamp(AMBIENT_RANGE.0, AMBIENT_RANGE.1),
        source: EnvironmentSource::Radiance {
            path: path.display().to_string(),
            width,
            height,
        },
    };
    tracing::info!(
        path = %path.display(),
        width,
        height,
        ambient = environment.ambient,
        "environment loaded"
    );
    Ok(environment)
}

/// Reinhard tone map of a linear radiance into [0, 1).
fn background_from_radiance(rgb: [f32; 3]) -> [f32; 4] {
    let [r, g, b] = rgb.map(|c| c / (1.0 + c));
    [r, g, b, 1.0]
}

fn luminance([r, g, b]: [f32; 3]) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}
