use crate::camera::PerspectiveCamera;
use landing_common::SurfaceSize;
use landing_scene::{NodeContent, Scene};

/// Errors from drawing a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render surface already disposed")]
    Disposed,
    #[error("surface lost; reconfigured, frame skipped")]
    SurfaceLost,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Renderer-agnostic backend. All backends implement this trait.
///
/// The backend reads the scene and camera and produces pixels (or a
/// record). It never mutates the scene.
pub trait Renderer {
    /// Resize drawing buffers. Called only when the size actually changes.
    fn resize(&mut self, size: SurfaceSize);

    /// Draw one frame. `clear_color` is the background to clear to.
    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        clear_color: [f32; 4],
    ) -> Result<(), RenderError>;

    /// Release every GPU-side resource. Called exactly once.
    fn release(&mut self);
}

/// What one frame was drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRecord {
    pub size: SurfaceSize,
    pub aspect: f32,
    pub nodes: usize,
}

/// Headless text renderer.
///
/// Produces a human-readable dump of each frame and remembers the size and
/// aspect used, for the CLI and for tests.
#[derive(Debug, Default)]
pub struct TextRenderer {
    size: SurfaceSize,
    frames: u64,
    last: Option<FrameRecord>,
    last_text: String,
    released: bool,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> Option<FrameRecord> {
        self.last
    }

    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Renderer for TextRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        clear_color: [f32; 4],
    ) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Disposed);
        }
        self.frames += 1;

        let mut out = String::new();
        out.push_str(&format!(
            "=== Frame {} ({}, aspect={:.3}) ===\n",
            self.frames, self.size, camera.aspect
        ));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov_degrees
        ));
        out.push_str(&format!(
            "Clear: ({:.2}, {:.2}, {:.2})\n",
            clear_color[0], clear_color[1], clear_color[2]
        ));

        for (id, node) in scene.nodes() {
            let p = node.transform.position;
            let kind = match &node.content {
                NodeContent::Model { decoration, .. } if decoration.sphere().is_some() => {
                    "model+sphere"
                }
                NodeContent::Model { .. } => "model",
                NodeContent::Placeholder { .. } => "placeholder",
            };
            out.push_str(&format!(
                "  [{}] {} {} pos=({:.2}, {:.2}, {:.2})\n",
                id.short(),
                node.name,
                kind,
                p.x,
                p.y,
                p.z
            ));
        }

        self.last = Some(FrameRecord {
            size: self.size,
            aspect: camera.aspect,
            nodes: scene.node_count(),
        });
        self.last_text = out;
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use landing_common::Transform;
    use landing_scene::SceneNode;

    #[test]
    fn empty_scene_frame() {
        let mut renderer = TextRenderer::new();
        renderer.resize(SurfaceSize::new(800, 600));
        let cam = PerspectiveCamera::for_size(SurfaceSize::new(800, 600));
        renderer.render(&Scene::new(), &cam, [0.0; 4]).unwrap();

        assert_eq!(renderer.frames(), 1);
        assert!(renderer.last_text().contains("800x600"));
        let record = renderer.last_frame().unwrap();
        assert_eq!(record.nodes, 0);
        assert!((record.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn lists_nodes() {
        let mut scene = Scene::new();
        scene.attach(SceneNode {
            name: "placeholder".into(),
            transform: Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
            content: NodeContent::Placeholder { size: 1.0 },
        });
        let mut renderer = TextRenderer::new();
        renderer
            .render(&scene, &PerspectiveCamera::new(1.0), [0.0; 4])
            .unwrap();
        assert!(renderer.last_text().contains("placeholder"));
        assert!(renderer.last_text().contains("pos=(1.00, 2.00, 3.00)"));
    }

    #[test]
    fn released_renderer_refuses_frames() {
        let mut renderer = TextRenderer::new();
        renderer.release();
        let result = renderer.render(&Scene::new(), &PerspectiveCamera::new(1.0), [0.0; 4]);
        assert!(matches!(result, Err(RenderError::Disposed)));
        assert_eq!(renderer.frames(), 0);
    }
}
