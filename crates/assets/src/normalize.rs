use crate::error::AssetError;
use landing_scene::{Aabb, ContainmentSphere, Mesh};

/// Result of normalizing a mesh to the target size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    /// Uniform scale applied to the raw geometry.
    pub scale: f32,
    /// Bounds after scaling.
    pub bounds: Aabb,
}

/// Compute the uniform scale that makes the largest bounding-box dimension
/// equal `target_size`.
///
/// A mesh without positions or with zero extent on every axis fails with
/// `DegenerateGeometry`.
pub fn normalize(name: &str, mesh: &Mesh, target_size: f32) -> Result<Normalized, AssetError> {
    let degenerate = || AssetError::DegenerateGeometry {
        name: name.to_string(),
    };
    let raw = mesh.bounds().ok_or_else(degenerate)?;
    if raw.is_degenerate() {
        return Err(degenerate());
    }

    let scale = target_size / raw.max_extent();
    Ok(Normalized {
        scale,
        bounds: raw.scaled(scale),
    })
}

/// Sphere around post-scale bounds: centered on the box, radius is half
/// the diagonal times `padding`.
pub fn containment_sphere(bounds: &Aabb, padding: f32, color: [f32; 4]) -> ContainmentSphere {
    ContainmentSphere {
        center: bounds.center(),
        radius: bounds.diagonal() * 0.5 * padding,
        color,
    }
}
