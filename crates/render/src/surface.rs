use crate::camera::PerspectiveCamera;
use crate::renderer::{RenderError, Renderer};
use landing_common::SurfaceSize;
use landing_scene::{DEFAULT_CLEAR_COLOR, Scene};
use serde::{Deserialize, Serialize};

/// The element a surface is mounted into.
pub trait MountContainer {
    /// Current content-box size in pixels. May be zero before layout.
    fn content_size(&self) -> SurfaceSize;

    /// Insert the surface's drawable output into the container.
    fn insert_drawable(&mut self, label: &str);
}

/// Fixed renderer options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSettings {
    /// Linear RGBA used when the scene has no environment image.
    pub clear_color: [f32; 4],
    pub antialias: bool,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            clear_color: DEFAULT_CLEAR_COLOR,
            antialias: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceState {
    Live,
    Disposed,
}

/// Owns a renderer backend, its pixel size and settings.
pub struct RenderSurface<R: Renderer> {
    renderer: R,
    size: SurfaceSize,
    settings: SurfaceSettings,
    state: SurfaceState,
}

impl<R: Renderer> RenderSurface<R> {
    pub const DRAWABLE_LABEL: &'static str = "landing-scene-canvas";

    /// Size the renderer and insert its drawable into the container.
    pub fn initialize(
        mut renderer: R,
        container: &mut dyn MountContainer,
        size: SurfaceSize,
        settings: SurfaceSettings,
    ) -> Self {
        renderer.resize(size);
        container.insert_drawable(Self::DRAWABLE_LABEL);
        tracing::info!(
            width = size.width,
            height = size.height,
            antialias = settings.antialias,
            "render surface initialized"
        );
        Self {
            renderer,
            size,
            settings,
            state: SurfaceState::Live,
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn settings(&self) -> &SurfaceSettings {
        &self.settings
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn is_disposed(&self) -> bool {
        self.state == SurfaceState::Disposed
    }

    /// Resize drawing buffers. Returns false when nothing changed: same
    /// size, empty size, or a disposed surface.
    pub fn resize(&mut self, size: SurfaceSize) -> bool {
        if self.is_disposed() || size.is_empty() || size == self.size {
            return false;
        }
        self.renderer.resize(size);
        tracing::debug!(from = %self.size, to = %size, "render surface resized");
        self.size = size;
        true
    }

    /// Clear colour for the next frame: the environment background when an
    /// image was loaded, the configured clear colour otherwise.
    pub fn clear_color_for(&self, scene: &Scene) -> [f32; 4] {
        let environment = scene.environment();
        if environment.is_flat() {
            self.settings.clear_color
        } else {
            environment.background
        }
    }

    /// Draw one frame.
    pub fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        if self.is_disposed() {
            return Err(RenderError::Disposed);
        }
        let clear = self.clear_color_for(scene);
        self.renderer.render(scene, camera, clear)
    }

    /// Release GPU resources. Only the first call does anything; it
    /// returns true.
    pub fn dispose(&mut self) -> bool {
        if self.is_disposed() {
            tracing::warn!("render surface disposed twice; ignoring");
            return false;
        }
        self.renderer.release();
        self.state = SurfaceState::Disposed;
        tracing::info!("render surface disposed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TextRenderer;
    use landing_scene::{Environment, EnvironmentSource};

    #[derive(Default)]
    struct Div {
        size: SurfaceSize,
        children: Vec<String>,
    }

    impl MountContainer for Div {
        fn content_size(&self) -> SurfaceSize {
            self.size
        }

        fn insert_drawable(&mut self, label: &str) {
            self.children.push(label.to_string());
        }
    }

    fn mounted(size: SurfaceSize) -> (RenderSurface<TextRenderer>, Div) {
        let mut div = Div {
            size,
            ..Div::default()
        };
        let surface = RenderSurface::initialize(
            TextRenderer::new(),
            &mut div,
            size,
            SurfaceSettings::default(),
        );
        (surface, div)
    }

    #[test]
    fn initialize_inserts_one_drawable() {
        let (surface, div) = mounted(SurfaceSize::new(800, 600));
        assert_eq!(div.children, vec![RenderSurface::<TextRenderer>::DRAWABLE_LABEL]);
        assert_eq!(surface.size(), SurfaceSize::new(800, 600));
        assert_eq!(surface.renderer().size(), SurfaceSize::new(800, 600));
        assert!(surface.settings().antialias);
    }

    #[test]
    fn resize_is_idempotent() {
        let (mut surface, _) = mounted(SurfaceSize::new(800, 600));
        assert!(surface.resize(SurfaceSize::new(1024, 768)));
        assert!(!surface.resize(SurfaceSize::new(1024, 768)));
        assert!(!surface.resize(SurfaceSize::new(0, 768)));
        assert_eq!(surface.size(), SurfaceSize::new(1024, 768));
        assert_eq!(surface.renderer().size(), SurfaceSize::new(1024, 768));
    }

    #[test]
    fn dispose_once() {
        let (mut surface, _) = mounted(SurfaceSize::new(800, 600));
        assert!(surface.dispose());
        assert!(!surface.dispose());
        assert!(surface.is_disposed());
        assert!(surface.renderer().is_released());
    }

    #[test]
    fn disposed_surface_does_not_touch_backend() {
        let (mut surface, _) = mounted(SurfaceSize::new(800, 600));
        let camera = PerspectiveCamera::for_size(surface.size());
        surface.render(&Scene::new(), &camera).unwrap();
        surface.dispose();

        let result = surface.render(&Scene::new(), &camera);
        assert!(matches!(result, Err(RenderError::Disposed)));
        assert!(!surface.resize(SurfaceSize::new(10, 10)));
        assert_eq!(surface.renderer().frames(), 1);
    }

    #[test]
    fn clear_color_follows_environment() {
        let (surface, _) = mounted(SurfaceSize::new(8, 8));
        let flat = Scene::new();
        assert_eq!(surface.clear_color_for(&flat), DEFAULT_CLEAR_COLOR);

        let lit = Scene::with_environment(Environment {
            background: [0.5, 0.4, 0.3, 1.0],
            ambient: 1.0,
            source: EnvironmentSource::Radiance {
                path: "env.hdr".into(),
                width: 1,
                height: 1,
            },
        });
        assert_eq!(surface.clear_color_for(&lit), [0.5, 0.4, 0.3, 1.0]);
    }
}
