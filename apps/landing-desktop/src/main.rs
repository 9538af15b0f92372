use anyhow::Result;
use clap::Parser;
use landing_assets::FileSource;
use landing_common::SurfaceSize;
use landing_host::{FrameRequest, FrameScheduler, HostConfig, HostServices, ResizeFeed, SceneHost};
use landing_render::MountContainer;
use landing_render_wgpu::WgpuRenderer;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "landing-desktop", about = "Landing scene in a desktop window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Host config (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model names; overrides the config list
    #[arg(short, long)]
    model: Vec<String>,

    /// Asset root directory
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Seed for drift speeds and respawn positions
    #[arg(long)]
    seed: Option<u64>,
}

/// The window plays the part of the mount container.
struct WindowContainer {
    window: Arc<Window>,
}

impl MountContainer for WindowContainer {
    fn content_size(&self) -> SurfaceSize {
        let size = self.window.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn insert_drawable(&mut self, label: &str) {
        tracing::debug!(label, "drawable attached to window");
    }
}

#[derive(Debug, Default)]
struct RedrawState {
    next: u64,
    pending: Option<FrameRequest>,
}

/// Maps frame requests onto window redraws.
#[derive(Clone)]
struct RedrawScheduler {
    window: Arc<Window>,
    state: Rc<RefCell<RedrawState>>,
}

impl RedrawScheduler {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            state: Rc::default(),
        }
    }

    fn take_due(&self) -> Option<FrameRequest> {
        self.state.borrow_mut().pending.take()
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        let mut state = self.state.borrow_mut();
        state.next += 1;
        let request = FrameRequest(state.next);
        state.pending = Some(request);
        self.window.request_redraw();
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut state = self.state.borrow_mut();
        if state.pending == Some(request) {
            state.pending = None;
        }
    }
}

struct Mounted {
    host: SceneHost<WgpuRenderer>,
    scheduler: RedrawScheduler,
    resize: ResizeFeed,
}

struct DesktopApp {
    config: HostConfig,
    mounted: Option<Mounted>,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
    error: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(config: HostConfig) -> Self {
        Self {
            config,
            mounted: None,
            dragging: false,
            cursor: None,
            error: None,
        }
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<Mounted> {
        let fallback = self.config.fallback_size;
        let attrs = Window::default_attributes()
            .with_title("Landing Scene")
            .with_inner_size(PhysicalSize::new(fallback.width, fallback.height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let mut container = WindowContainer {
            window: window.clone(),
        };
        let size = container.content_size();
        let renderer =
            pollster::block_on(WgpuRenderer::new(window.clone(), size, &self.config.surface))?;
        tracing::info!(backend = renderer.backend(), "renderer ready");

        let scheduler = RedrawScheduler::new(window.clone());
        let resize = ResizeFeed::new();
        let services = HostServices {
            renderer,
            scheduler: Box::new(scheduler.clone()),
            resize_observer: Box::new(resize.clone()),
            assets: Rc::new(FileSource::new(self.config.asset_root.clone())),
        };
        let host = SceneHost::on_mount(&mut container, services, self.config.clone());

        Ok(Mounted {
            host,
            scheduler,
            resize,
        })
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.mounted.is_some() {
            return;
        }
        match self.mount(event_loop) {
            Ok(mounted) => self.mounted = Some(mounted),
            Err(error) => {
                tracing::error!(%error, "could not mount scene");
                self.error = Some(error);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                mounted.host.on_unmount();
                tracing::info!("{}", mounted.host.summary());
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                mounted
                    .resize
                    .emit(SurfaceSize::new(size.width, size.height));
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (self.dragging, self.cursor) {
                    let dx = (position.x - last.x) as f32;
                    let dy = (position.y - last.y) as f32;
                    mounted.host.orbit(dx, dy);
                }
                self.cursor = Some(position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                mounted.host.zoom(notches);
            }
            WindowEvent::RedrawRequested => {
                if let Some(request) = mounted.scheduler.take_due() {
                    mounted.host.on_frame(request);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mounted) = &mut self.mounted {
            mounted.host.pump_tasks();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    if !cli.model.is_empty() {
        config.models = cli.model;
    }
    if let Some(root) = cli.assets {
        config.asset_root = root;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    tracing::info!(models = config.models.len(), "landing-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = DesktopApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
