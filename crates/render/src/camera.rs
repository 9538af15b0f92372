use glam::{Mat4, Vec3};
use landing_common::SurfaceSize;

/// Perspective camera. The aspect ratio is derived from the surface size
/// and recomputed on every resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    pub const FOV_DEGREES: f32 = 75.0;
    pub const NEAR: f32 = 0.1;
    pub const FAR: f32 = 1000.0;
    /// Initial distance along +Z.
    pub const DISTANCE: f32 = 5.0;

    pub fn new(aspect: f32) -> Self {
        Self {
            fov_degrees: Self::FOV_DEGREES,
            aspect,
            near: Self::NEAR,
            far: Self::FAR,
            position: Vec3::new(0.0, 0.0, Self::DISTANCE),
            target: Vec3::ZERO,
        }
    }

    pub fn for_size(size: SurfaceSize) -> Self {
        Self::new(size.aspect())
    }

    /// Recompute the aspect from pixel dimensions. Empty sizes are ignored
    /// and return false.
    pub fn set_aspect(&mut self, size: SurfaceSize) -> bool {
        if size.is_empty() {
            return false;
        }
        self.aspect = size.aspect();
        true
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Orbit input around a fixed target.
///
/// Holds only the orbit state (yaw, pitch, distance) and writes the
/// resulting position into a camera it does not own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.0, 0.0))
    }
}

impl OrbitControls {
    /// Orbit the default camera position around `target`.
    pub fn new(target: Vec3) -> Self {
        let offset = Vec3::new(0.0, 0.0, PerspectiveCamera::DISTANCE) - target;
        let distance = offset.length().max(f32::EPSILON);
        Self {
            target,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).asin(),
            distance,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            min_distance: 1.0,
            max_distance: 100.0,
        }
    }

    /// Rotate by a pointer delta in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Scale the distance by a wheel delta; positive moves closer.
    pub fn zoom(&mut self, delta: f32) {
        self.distance *= 1.0 - delta * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(sy * cp, sp, cy * cp) * self.distance
    }

    /// Write position and look-at target into the camera.
    pub fn apply(&self, camera: &mut PerspectiveCamera) {
        camera.position = self.eye();
        camera.target = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_projection() {
        let cam = PerspectiveCamera::new(1.0);
        assert_eq!(cam.fov_degrees, 75.0);
        assert_eq!(cam.near, 0.1);
        assert_eq!(cam.far, 1000.0);
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 5.0));
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn mount_800_by_600() {
        let cam = PerspectiveCamera::for_size(SurfaceSize::new(800, 600));
        assert!((cam.aspect - 1.333_333).abs() < 1e-5);
    }

    #[test]
    fn set_aspect_ignores_empty() {
        let mut cam = PerspectiveCamera::new(2.0);
        assert!(!cam.set_aspect(SurfaceSize::new(640, 0)));
        assert_eq!(cam.aspect, 2.0);
        assert!(cam.set_aspect(SurfaceSize::new(300, 600)));
        assert_eq!(cam.aspect, 0.5);
    }

    #[test]
    fn orbit_starts_at_default_camera() {
        let controls = OrbitControls::default();
        let eye = controls.eye();
        assert!((eye - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn orbit_keeps_distance_and_clamps_pitch() {
        let mut controls = OrbitControls::default();
        controls.orbit(120.0, 10_000.0);
        assert!(controls.pitch <= 89.0_f32.to_radians());
        let d = (controls.eye() - controls.target).length();
        assert!((d - controls.distance).abs() < 1e-4);

        let mut cam = PerspectiveCamera::new(1.0);
        controls.apply(&mut cam);
        assert_eq!(cam.target, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(cam.position, controls.eye());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut controls = OrbitControls::default();
        for _ in 0..100 {
            controls.zoom(1.0);
        }
        assert_eq!(controls.distance, controls.min_distance);
        for _ in 0..100 {
            controls.zoom(-5.0);
        }
        assert_eq!(controls.distance, controls.max_distance);
    }
}
