use crate::config::HostConfig;
use crate::frame_loop::{AnimationLoop, FrameRequest, FrameScheduler};
use crate::motion::MotionTable;
use crate::resize::{ResizeObserver, ResizeReactor};
use futures::channel::{mpsc, oneshot};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use glam::{EulerRot, Quat, Vec3};
use landing_assets::{
    AssetSource, LoadEvent, LoadFailure, LoadPipeline, LoadReport, LoadedAsset, load_environment,
};
use landing_common::{NodeId, SurfaceSize, Transform};
use landing_render::{
    MountContainer, OrbitControls, PerspectiveCamera, RenderError, RenderSurface, Renderer,
};
use landing_scene::{NodeContent, Scene, SceneNode};
use std::fmt;
use std::rc::Rc;

/// Placeholder spin per tick about x and y, radians.
const PLACEHOLDER_SPIN: f32 = 0.01;

/// Platform pieces handed to a mount.
pub struct HostServices<R: Renderer> {
    pub renderer: R,
    pub scheduler: Box<dyn FrameScheduler>,
    pub resize_observer: Box<dyn ResizeObserver>,
    pub assets: Rc<dyn AssetSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    Mounted,
    Unmounted,
}

/// A loaded model and the node it became.
#[derive(Debug, Clone)]
pub struct LoadedEntry {
    pub node: NodeId,
    pub asset: LoadedAsset,
}

/// Snapshot for logs and the CLI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostSummary {
    pub phase: HostPhase,
    pub ticks: u64,
    pub nodes: usize,
    pub loaded: usize,
    pub failed: usize,
    pub loading_complete: bool,
    pub size: SurfaceSize,
    pub aspect: f32,
}

impl fmt::Display for HostSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: ticks={} nodes={} loaded={} failed={} loading={} size={} aspect={:.3}",
            self.phase,
            self.ticks,
            self.nodes,
            self.loaded,
            self.failed,
            if self.loading_complete { "done" } else { "pending" },
            self.size,
            self.aspect
        )
    }
}

/// One mounted 3D scene: scene graph, camera, surface, frame loop, resize
/// reactor and in-flight asset loads.
pub struct SceneHost<R: Renderer> {
    config: HostConfig,
    phase: HostPhase,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: Option<OrbitControls>,
    surface: RenderSurface<R>,
    animation: AnimationLoop,
    resize: ResizeReactor,
    motion: MotionTable,
    pool: LocalPool,
    load_events: Option<mpsc::UnboundedReceiver<LoadEvent>>,
    load_done: Option<oneshot::Receiver<LoadReport>>,
    report: Option<LoadReport>,
    objects: Vec<LoadedEntry>,
    failures: Vec<LoadFailure>,
    placeholder: Option<NodeId>,
}

impl<R: Renderer> SceneHost<R> {
    /// Build the scene inside `container` and start everything.
    ///
    /// Environment and resize-observation failures are logged and
    /// tolerated; asset loads report their own failures as they resolve.
    pub fn on_mount(
        container: &mut dyn MountContainer,
        services: HostServices<R>,
        config: HostConfig,
    ) -> Self {
        let _span = tracing::info_span!("mount", models = config.models.len()).entered();

        let mut size = container.content_size();
        if size.is_empty() {
            tracing::warn!(
                reported = %size,
                fallback = %config.fallback_size,
                "container has no size yet; using fallback"
            );
            size = config.fallback_size;
        }

        let mut scene = Scene::new();
        if let Some(path) = config.environment_path() {
            match load_environment(&path) {
                Ok(environment) => scene.set_environment(environment),
                Err(error) => tracing::warn!(
                    path = %path.display(),
                    %error,
                    "environment unavailable; keeping flat background"
                ),
            }
        }

        let mut camera = PerspectiveCamera::for_size(size);
        let controls = config.orbit_controls.then(|| {
            let controls = OrbitControls::default();
            controls.apply(&mut camera);
            controls
        });

        let surface = RenderSurface::initialize(services.renderer, container, size, config.surface);

        let placeholder = config.placeholder.then(|| {
            scene.attach(SceneNode {
                name: "placeholder".into(),
                transform: Transform::default(),
                content: NodeContent::Placeholder { size: 1.0 },
            })
        });

        let pool = LocalPool::new();
        let job = LoadPipeline::new(services.assets, config.loader.clone()).load_all(&config.models);
        let (done_tx, done_rx) = oneshot::channel();
        let completion = job.completion;
        let spawned = pool.spawner().spawn_local(async move {
            let _ = done_tx.send(completion.await);
        });
        let load_done = match spawned {
            Ok(()) => Some(done_rx),
            Err(error) => {
                tracing::error!(%error, "could not start asset loads");
                None
            }
        };

        let motion = match config.seed {
            Some(seed) => MotionTable::new(config.motion.clone(), seed),
            None => MotionTable::from_os_rng(config.motion.clone()),
        };

        let animation = AnimationLoop::start(services.scheduler);

        let mut resize = ResizeReactor::new();
        if let Err(error) = resize.subscribe(services.resize_observer) {
            tracing::warn!(%error, "resize observation unavailable; size stays fixed");
        }

        tracing::info!(%size, aspect = camera.aspect, "scene mounted");

        let mut host = Self {
            config,
            phase: HostPhase::Mounted,
            scene,
            camera,
            controls,
            surface,
            animation,
            resize,
            motion,
            pool,
            load_events: Some(job.events),
            load_done,
            report: None,
            objects: Vec::new(),
            failures: Vec::new(),
            placeholder,
        };
        host.pump_tasks();
        host
    }

    /// Run one frame callback. Returns false when the request is stale or
    /// the host is unmounted.
    pub fn on_frame(&mut self, request: FrameRequest) -> bool {
        if self.phase == HostPhase::Unmounted || !self.animation.begin_tick(request) {
            return false;
        }
        let tick = self.animation.ticks() + 1;
        let _span = tracing::info_span!("frame", tick).entered();

        self.pump_tasks();
        self.apply_resize();
        self.apply_load_events();
        self.poll_completion();

        self.motion.step(&mut self.scene);
        self.spin_placeholder(tick);

        match self.surface.render(&self.scene, &self.camera) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost) => tracing::debug!("surface lost; frame skipped"),
            Err(error) => tracing::warn!(%error, "frame failed"),
        }

        self.animation.finish_tick();
        true
    }

    /// Tear down: stop resize delivery, cancel the pending frame, dispose
    /// the surface. Loads still in flight resolve into closed channels.
    /// Returns false if already unmounted.
    pub fn on_unmount(&mut self) -> bool {
        if self.phase == HostPhase::Unmounted {
            return false;
        }
        self.resize.unsubscribe();
        self.animation.cancel();
        self.surface.dispose();
        self.load_events = None;
        self.load_done = None;
        self.phase = HostPhase::Unmounted;
        tracing::info!(
            ticks = self.animation.ticks(),
            loaded = self.objects.len(),
            "scene unmounted"
        );
        true
    }

    /// Drive pending asset loads as far as they can go without blocking.
    pub fn pump_tasks(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Block until every asset load has resolved. Results are applied on
    /// the next frame. Meant for headless runs; a mounted window should
    /// keep rendering instead.
    pub fn wait_for_loads(&mut self) {
        if self.phase == HostPhase::Mounted {
            self.pool.run();
        }
    }

    /// Rotate the orbit controls by a pointer delta.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        if self.phase == HostPhase::Unmounted {
            return;
        }
        if let Some(controls) = self.controls.as_mut() {
            controls.orbit(dx, dy);
            controls.apply(&mut self.camera);
        }
    }

    /// Zoom the orbit controls by a wheel delta.
    pub fn zoom(&mut self, delta: f32) {
        if self.phase == HostPhase::Unmounted {
            return;
        }
        if let Some(controls) = self.controls.as_mut() {
            controls.zoom(delta);
            controls.apply(&mut self.camera);
        }
    }

    fn apply_resize(&mut self) {
        let Some(size) = self.resize.take_latest() else {
            return;
        };
        // Camera first so the projection matches the new buffers.
        if self.camera.set_aspect(size) {
            self.surface.resize(size);
            tracing::debug!(%size, aspect = self.camera.aspect, "resize applied");
        }
    }

    fn apply_load_events(&mut self) {
        let mut events = Vec::new();
        let mut closed = false;
        if let Some(rx) = self.load_events.as_mut() {
            loop {
                match rx.try_next() {
                    Ok(Some(event)) => events.push(event),
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }
        }
        if closed {
            self.load_events = None;
        }

        // Workers finish in any order; a batch is applied by request index
        // so attach and motion order do not depend on thread timing.
        events.sort_by_key(LoadEvent::index);
        for event in events {
            match event {
                LoadEvent::Loaded(asset) => {
                    let node = self.scene.attach(asset.to_node());
                    self.motion.enroll(node);
                    self.objects.push(LoadedEntry { node, asset });
                }
                LoadEvent::Failed(failure) => {
                    tracing::error!(
                        name = %failure.name,
                        index = failure.index,
                        error = %failure.error,
                        "model failed to load"
                    );
                    self.failures.push(failure);
                }
            }
        }
    }

    fn poll_completion(&mut self) {
        let Some(rx) = self.load_done.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(Some(report)) => {
                self.load_done = None;
                if !report.loaded.is_empty() {
                    self.retire_placeholder();
                }
                self.report = Some(report);
            }
            Ok(None) => {}
            Err(_) => {
                self.load_done = None;
                tracing::warn!("asset loads dropped before completing");
            }
        }
    }

    fn retire_placeholder(&mut self) {
        if let Some(id) = self.placeholder.take() {
            self.scene.detach(id);
            tracing::debug!("placeholder removed");
        }
    }

    fn spin_placeholder(&mut self, tick: u64) {
        let Some(id) = self.placeholder else {
            return;
        };
        if let Some(node) = self.scene.get_mut(id) {
            let angle = tick as f32 * PLACEHOLDER_SPIN;
            node.transform.rotation = Quat::from_euler(EulerRot::XYZ, angle, angle, 0.0);
        }
    }

    pub fn phase(&self) -> HostPhase {
        self.phase
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    pub fn surface(&self) -> &RenderSurface<R> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut RenderSurface<R> {
        &mut self.surface
    }

    pub fn animation(&self) -> &AnimationLoop {
        &self.animation
    }

    pub fn resize_reactor(&self) -> &ResizeReactor {
        &self.resize
    }

    pub fn motion(&self) -> &MotionTable {
        &self.motion
    }

    /// Loaded models in arrival order.
    pub fn objects(&self) -> &[LoadedEntry] {
        &self.objects
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn placeholder(&self) -> Option<NodeId> {
        self.placeholder
    }

    /// Set once every load has resolved.
    pub fn load_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    pub fn is_loading_complete(&self) -> bool {
        self.report.is_some()
    }

    /// Centre of the loaded row, for framing.
    pub fn row_center(&self) -> Option<Vec3> {
        if self.objects.is_empty() {
            return None;
        }
        let sum: Vec3 = self.objects.iter().map(|e| e.asset.offset).sum();
        Some(sum / self.objects.len() as f32)
    }

    pub fn summary(&self) -> HostSummary {
        HostSummary {
            phase: self.phase,
            ticks: self.animation.ticks(),
            nodes: self.scene.node_count(),
            loaded: self.objects.len(),
            failed: self.failures.len(),
            loading_complete: self.is_loading_complete(),
            size: self.surface.size(),
            aspect: self.camera.aspect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_loop::ManualScheduler;
    use crate::resize::{NoResizeObserver, ResizeFeed};
    use landing_assets::{FileSource, ManualSource, MemorySource};
    use landing_render::TextRenderer;
    use landing_scene::Mesh;
    use std::path::Path;

    #[derive(Default)]
    struct Div {
        size: SurfaceSize,
        drawables: Vec<String>,
    }

    impl MountContainer for Div {
        fn content_size(&self) -> SurfaceSize {
            self.size
        }

        fn insert_drawable(&mut self, label: &str) {
            self.drawables.push(label.to_string());
        }
    }

    struct Rig {
        host: SceneHost<TextRenderer>,
        scheduler: ManualScheduler,
        feed: ResizeFeed,
        div: Div,
    }

    impl Rig {
        fn tick(&mut self) -> bool {
            let request = self.scheduler.next_due().unwrap();
            self.host.on_frame(request)
        }

        fn frames(&self) -> u64 {
            self.host.surface().renderer().frames()
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn config(models: &[&str]) -> HostConfig {
        HostConfig {
            models: names(models),
            environment: None,
            seed: Some(42),
            ..HostConfig::default()
        }
    }

    fn cubes(list: &[(&str, f32)]) -> Rc<dyn AssetSource> {
        let mut source = MemorySource::new();
        for (name, size) in list {
            source.insert(*name, Mesh::cuboid(Vec3::splat(*size)));
        }
        Rc::new(source)
    }

    fn mount_with(
        size: SurfaceSize,
        assets: Rc<dyn AssetSource>,
        observer: Option<Box<dyn ResizeObserver>>,
        config: HostConfig,
    ) -> Rig {
        let scheduler = ManualScheduler::new();
        let feed = ResizeFeed::new();
        let mut div = Div {
            size,
            ..Div::default()
        };
        let services = HostServices {
            renderer: TextRenderer::new(),
            scheduler: Box::new(scheduler.clone()),
            resize_observer: observer
                .unwrap_or_else(|| Box::new(feed.clone()) as Box<dyn ResizeObserver>),
            assets,
        };
        let host = SceneHost::on_mount(&mut div, services, config);
        Rig {
            host,
            scheduler,
            feed,
            div,
        }
    }

    fn mount(size: SurfaceSize, assets: Rc<dyn AssetSource>, config: HostConfig) -> Rig {
        mount_with(size, assets, None, config)
    }

    #[test]
    fn mount_sets_camera_and_surface() {
        let rig = mount(SurfaceSize::new(800, 600), cubes(&[]), config(&[]));
        let camera = rig.host.camera();
        assert!((camera.aspect - 1.333_333).abs() < 1e-5);
        assert_eq!(camera.fov_degrees, 75.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(rig.host.surface().size(), SurfaceSize::new(800, 600));
        assert_eq!(rig.div.drawables.len(), 1);
        assert_eq!(rig.scheduler.due_count(), 1);
        assert!(rig.host.resize_reactor().is_active());
        assert_eq!(rig.host.phase(), HostPhase::Mounted);
    }

    #[test]
    fn zero_sized_container_uses_fallback() {
        let rig = mount(SurfaceSize::new(0, 0), cubes(&[]), config(&[]));
        assert_eq!(rig.host.surface().size(), SurfaceSize::new(1280, 720));
        assert!((rig.host.camera().aspect - 1280.0 / 720.0).abs() < 1e-5);
    }

    #[test]
    fn failed_model_leaves_gap_in_row() {
        let assets = cubes(&[("a", 3.0), ("c", 0.5)]);
        let mut rig = mount(SurfaceSize::new(800, 600), assets, config(&["a", "b", "c"]));
        assert!(rig.tick());

        let objects = rig.host.objects();
        assert_eq!(objects.len(), 2);
        let xs: Vec<f32> = objects.iter().map(|e| e.asset.offset.x).collect();
        assert!(xs.contains(&0.0) && xs.contains(&4.0));
        for entry in objects {
            let node = rig.host.scene().get(entry.node).unwrap();
            assert_eq!(node.transform.position.x, entry.asset.offset.x);
            let extent = entry.asset.bounds.max_extent();
            assert!((extent - 1.0).abs() < 1e-5);
        }

        assert_eq!(rig.host.failures().len(), 1);
        assert_eq!(rig.host.failures()[0].name, "b");
        assert_eq!(rig.host.failures()[0].index, 1);
        let report = rig.host.load_report().unwrap();
        assert_eq!(report.loaded.len(), 2);
        assert_eq!(report.failed, vec!["b".to_string()]);

        assert_eq!(rig.host.placeholder(), None);
        assert_eq!(rig.host.scene().node_count(), 2);
        assert_eq!(rig.host.row_center(), Some(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn placeholder_stays_when_every_load_fails() {
        let mut rig = mount(SurfaceSize::new(800, 600), cubes(&[]), config(&["x", "y"]));
        rig.tick();
        rig.tick();
        assert!(rig.host.is_loading_complete());
        assert_eq!(rig.host.failures().len(), 2);
        let id = rig.host.placeholder().unwrap();
        let node = rig.host.scene().get(id).unwrap();
        let expected = Quat::from_euler(EulerRot::XYZ, 0.02, 0.02, 0.0);
        assert!(node.transform.rotation.angle_between(expected) < 1e-5);
    }

    #[test]
    fn frames_render_while_loads_pending() {
        let source = Rc::new(ManualSource::new());
        let mut rig = mount(SurfaceSize::new(800, 600), source.clone(), config(&["slow", "fast"]));

        for _ in 0..3 {
            assert!(rig.tick());
        }
        assert_eq!(rig.frames(), 3);
        assert!(rig.host.objects().is_empty());
        assert!(rig.host.placeholder().is_some());

        source.resolve("fast", Ok(Mesh::cuboid(Vec3::ONE)));
        rig.tick();
        assert_eq!(rig.host.objects().len(), 1);
        assert_eq!(rig.host.objects()[0].asset.offset.x, 2.0);
        assert!(!rig.host.is_loading_complete());
        assert!(rig.host.placeholder().is_some());

        source.resolve("slow", Ok(Mesh::cuboid(Vec3::ONE)));
        rig.tick();
        assert_eq!(rig.host.objects().len(), 2);
        assert!(rig.host.is_loading_complete());
        assert!(rig.host.placeholder().is_none());
    }

    #[test]
    fn latest_resize_applied_before_render() {
        let mut rig = mount(SurfaceSize::new(800, 600), cubes(&[]), config(&[]));
        rig.tick();

        assert!(rig.feed.emit(SurfaceSize::new(1024, 768)));
        assert!(rig.feed.emit(SurfaceSize::new(640, 480)));
        rig.tick();

        assert!((rig.host.camera().aspect - 640.0 / 480.0).abs() < 1e-6);
        assert_eq!(rig.host.surface().size(), SurfaceSize::new(640, 480));
        let frame = rig.host.surface().renderer().last_frame().unwrap();
        assert_eq!(frame.size, SurfaceSize::new(640, 480));
        assert!((frame.aspect - 640.0 / 480.0).abs() < 1e-6);

        rig.feed.emit(SurfaceSize::new(300, 600));
        rig.tick();
        assert_eq!(rig.host.camera().aspect, 0.5);
    }

    #[test]
    fn unmount_tears_down_in_order() {
        let mut rig = mount(SurfaceSize::new(800, 600), cubes(&[]), config(&[]));
        rig.tick();
        let pending = rig.host.animation().pending().unwrap();

        assert!(rig.host.on_unmount());
        assert!(!rig.host.on_unmount());

        assert!(!rig.host.resize_reactor().is_active());
        assert!(!rig.feed.emit(SurfaceSize::new(100, 100)));
        assert_eq!(rig.scheduler.due_count(), 0);
        assert_eq!(rig.scheduler.cancelled_count(), 1);
        assert!(rig.host.surface().is_disposed());
        assert!(rig.host.surface().renderer().is_released());

        assert!(!rig.host.on_frame(pending));
        assert_eq!(rig.frames(), 1);
        assert_eq!(rig.host.phase(), HostPhase::Unmounted);
    }

    #[test]
    fn load_finishing_after_unmount_is_dropped() {
        let source = Rc::new(ManualSource::new());
        let mut rig = mount(SurfaceSize::new(800, 600), source.clone(), config(&["late"]));
        rig.tick();
        let nodes_before = rig.host.scene().node_count();
        rig.host.on_unmount();

        source.resolve("late", Ok(Mesh::cuboid(Vec3::ONE)));
        rig.host.pump_tasks();

        assert!(rig.host.objects().is_empty());
        assert_eq!(rig.host.scene().node_count(), nodes_before);
        assert!(!rig.host.is_loading_complete());
        assert_eq!(rig.frames(), 1);
    }

    #[test]
    fn missing_resize_support_is_not_fatal() {
        let mut rig = mount_with(
            SurfaceSize::new(800, 600),
            cubes(&[]),
            Some(Box::new(NoResizeObserver)),
            config(&[]),
        );
        assert!(!rig.host.resize_reactor().is_active());
        assert!(rig.tick());
        assert!(rig.tick());
        assert_eq!(rig.frames(), 2);
        assert_eq!(rig.host.surface().size(), SurfaceSize::new(800, 600));
    }

    fn write_grey_hdr(path: &Path) {
        let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 2 +X 2\n".to_vec();
        for _ in 0..4 {
            bytes.extend_from_slice(&[128, 128, 128, 129]);
        }
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn environment_loaded_from_asset_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig {
            asset_root: dir.path().to_path_buf(),
            ..HostConfig::default()
        };
        write_grey_hdr(&config.environment_path().unwrap());

        let rig = mount(SurfaceSize::new(800, 600), cubes(&[]), config);
        assert!(!rig.host.scene().environment().is_flat());
    }

    #[test]
    fn missing_environment_keeps_flat_background() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig {
            asset_root: dir.path().to_path_buf(),
            seed: Some(1),
            ..HostConfig::default()
        };
        let mut rig = mount(SurfaceSize::new(800, 600), cubes(&[]), config);
        assert!(rig.host.scene().environment().is_flat());
        assert!(rig.tick());
        assert!(rig.host.surface().renderer().last_text().contains("Clear: (0.05, 0.05, 0.08)"));
    }

    #[test]
    fn orbit_input_moves_camera() {
        let mut rig = mount(SurfaceSize::new(800, 600), cubes(&[]), config(&[]));
        assert_eq!(rig.host.camera().target, Vec3::new(0.0, 1.0, 0.0));
        let before = rig.host.camera().position;
        rig.host.orbit(50.0, 0.0);
        assert_ne!(rig.host.camera().position, before);
        rig.host.zoom(1.0);
        let distance = (rig.host.camera().position - rig.host.camera().target).length();
        assert!((distance - rig.host.controls().unwrap().distance).abs() < 1e-4);
    }

    #[test]
    fn seeded_runs_are_identical() {
        let run = || {
            let assets = cubes(&[("a", 1.0), ("b", 2.0), ("c", 4.0)]);
            let mut rig = mount(SurfaceSize::new(800, 600), assets, config(&["a", "b", "c"]));
            for _ in 0..600 {
                rig.tick();
            }
            rig.host.scene().state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn seeded_runs_with_repeated_names_are_identical() {
        let run = || {
            let assets = cubes(&[("a", 1.0)]);
            let mut rig = mount(SurfaceSize::new(800, 600), assets, config(&["a", "a"]));
            for _ in 0..10 {
                rig.tick();
            }
            rig.host.scene().state_hash()
        };
        let first = run();
        for _ in 0..16 {
            assert_eq!(run(), first);
        }
    }

    #[test]
    fn out_of_order_arrivals_attach_by_index() {
        let run = |order: [&str; 2]| {
            let source = Rc::new(ManualSource::new());
            let mut rig = mount(SurfaceSize::new(800, 600), source.clone(), config(&["a", "b"]));
            for name in order {
                source.resolve(name, Ok(Mesh::cuboid(Vec3::ONE)));
            }
            for _ in 0..5 {
                rig.tick();
            }
            let indices: Vec<usize> = rig.host.objects().iter().map(|e| e.asset.index).collect();
            assert_eq!(indices, vec![0, 1]);
            rig.host.scene().state_hash()
        };
        assert_eq!(run(["a", "b"]), run(["b", "a"]));
    }

    #[test]
    fn file_models_arrive_after_mount() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileSource::new(dir.path());
        let path = files.path_for("tri");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();

        let config = HostConfig {
            asset_root: dir.path().to_path_buf(),
            ..config(&["tri", "missing"])
        };
        let mut rig = mount(SurfaceSize::new(800, 600), Rc::new(files), config);
        rig.host.wait_for_loads();
        assert!(rig.host.objects().is_empty());

        rig.tick();
        assert_eq!(rig.host.objects().len(), 1);
        assert_eq!(rig.host.failures().len(), 1);
        assert!(rig.host.is_loading_complete());
        assert!(rig.host.placeholder().is_none());
    }

    /// Triangle spanning 2 x 1 in the xy plane.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "mesh": 0 } ],
        "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 } } ] } ],
        "buffers": [ {
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAQAAAAAAAAAAAAAAAAAAAgD8AAAAA"
        } ],
        "bufferViews": [ { "buffer": 0, "byteOffset": 0, "byteLength": 36 } ],
        "accessors": [ {
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [2.0, 1.0, 0.0]
        } ]
    }"#;

    #[test]
    fn summary_reports_progress() {
        let mut rig = mount(SurfaceSize::new(800, 600), cubes(&[("a", 1.0)]), config(&["a", "b"]));
        rig.tick();
        let summary = rig.host.summary();
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.loaded, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.loading_complete);
        let text = summary.to_string();
        assert!(text.contains("loaded=1"));
        assert!(text.contains("800x600"));
    }
}
