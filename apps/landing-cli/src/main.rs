use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use landing_assets::{AssetSource, FileSource, MemorySource, containment_sphere, normalize};
use landing_common::SurfaceSize;
use landing_host::{HostConfig, HostServices, ManualScheduler, ResizeFeed, SceneHost};
use landing_render::{MountContainer, TextRenderer};
use landing_scene::Mesh;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "landing-cli", about = "Headless tool for the landing scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Mount the scene headlessly and run frames
    Simulate {
        /// Host config (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Model names; overrides the config list
        #[arg(short, long)]
        model: Vec<String>,
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        ticks: u64,
        /// Seed for drift speeds and respawn positions
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Container size at mount, WxH
        #[arg(long, default_value = "800x600", value_parser = parse_size)]
        size: SurfaceSize,
        /// Resize the container before a frame, WxH@FRAME (repeatable)
        #[arg(long, value_parser = parse_resize)]
        resize: Vec<(u64, SurfaceSize)>,
        /// Use generated boxes instead of files; a name ending in `!` fails
        #[arg(long)]
        procedural: bool,
        /// Print the final frame
        #[arg(long)]
        dump: bool,
        /// Start frames while loads are in flight instead of waiting for them
        #[arg(long)]
        live: bool,
    },
    /// Decode one glTF file and report what loading would do with it
    Inspect {
        path: PathBuf,
        /// Slot index used for the row offset
        #[arg(long, default_value = "0")]
        index: usize,
    },
}

/// Stand-in for a page element.
struct HeadlessContainer {
    size: SurfaceSize,
    drawables: Vec<String>,
}

impl MountContainer for HeadlessContainer {
    fn content_size(&self) -> SurfaceSize {
        self.size
    }

    fn insert_drawable(&mut self, label: &str) {
        self.drawables.push(label.to_string());
    }
}

fn parse_size(text: &str) -> Result<SurfaceSize, String> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {text:?}"))?;
    let width = w.trim().parse::<u32>().map_err(|e| format!("width: {e}"))?;
    let height = h.trim().parse::<u32>().map_err(|e| format!("height: {e}"))?;
    Ok(SurfaceSize::new(width, height))
}

fn parse_resize(text: &str) -> Result<(u64, SurfaceSize), String> {
    let (size, frame) = text
        .split_once('@')
        .ok_or_else(|| format!("expected WxH@FRAME, got {text:?}"))?;
    let frame = frame.trim().parse::<u64>().map_err(|e| format!("frame: {e}"))?;
    Ok((frame, parse_size(size)?))
}

/// Boxes of growing size per slot. Names ending in `!` are left out so
/// they fail to load.
fn procedural_source(models: &[String]) -> MemorySource {
    let mut source = MemorySource::new();
    for (i, name) in models.iter().enumerate() {
        if name.ends_with('!') {
            continue;
        }
        let s = 1.0 + i as f32;
        source.insert(name.clone(), Mesh::cuboid(Vec3::new(s, s * 0.5, s * 0.75)));
    }
    source
}

#[allow(clippy::too_many_arguments)]
fn simulate(
    config_path: Option<PathBuf>,
    models: Vec<String>,
    ticks: u64,
    seed: u64,
    size: SurfaceSize,
    mut resizes: Vec<(u64, SurfaceSize)>,
    procedural: bool,
    dump: bool,
    live: bool,
) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => HostConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => HostConfig::default(),
    };
    if !models.is_empty() {
        config.models = models;
    }
    config.seed = Some(seed);

    let assets: Rc<dyn AssetSource> = if procedural {
        Rc::new(procedural_source(&config.models))
    } else {
        Rc::new(FileSource::new(config.asset_root.clone()))
    };

    println!(
        "Simulate: models={} ticks={ticks} seed={seed} size={size}",
        config.models.len()
    );

    let scheduler = ManualScheduler::new();
    let feed = ResizeFeed::new();
    let mut container = HeadlessContainer {
        size,
        drawables: Vec::new(),
    };
    let services = HostServices {
        renderer: TextRenderer::new(),
        scheduler: Box::new(scheduler.clone()),
        resize_observer: Box::new(feed.clone()),
        assets,
    };
    let mut host = SceneHost::on_mount(&mut container, services, config);
    tracing::debug!(drawables = container.drawables.len(), "mounted");
    if !live {
        host.wait_for_loads();
    }

    resizes.sort_by_key(|(frame, _)| *frame);
    let mut pending = resizes.into_iter().peekable();
    for frame in 0..ticks {
        while let Some((_, size)) = pending.next_if(|(at, _)| *at <= frame) {
            container.size = size;
            feed.emit(size);
        }
        let Some(request) = scheduler.next_due() else {
            break;
        };
        host.on_frame(request);
    }

    println!("{}", host.scene().summary());
    for entry in host.objects() {
        let sphere = entry
            .asset
            .decoration
            .sphere()
            .map(|s| format!(" sphere_r={:.3}", s.radius))
            .unwrap_or_default();
        println!(
            "  loaded [{}] {} scale={:.4} x={:.1}{}",
            entry.asset.index, entry.asset.name, entry.asset.scale, entry.asset.offset.x, sphere
        );
    }
    for failure in host.failures() {
        println!("  failed [{}] {}: {}", failure.index, failure.name, failure.error);
    }
    if dump {
        print!("{}", host.surface().renderer().last_text());
    }
    println!("State hash: {:#018x}", host.scene().state_hash());

    host.on_unmount();
    println!("{}", host.summary());
    Ok(())
}

fn inspect(path: PathBuf, index: usize) -> anyhow::Result<()> {
    let mesh = landing_assets::decode_gltf_file(&path)
        .with_context(|| format!("decoding {}", path.display()))?;
    let config = landing_assets::LoaderConfig::default();
    println!("File: {}", path.display());
    println!(
        "Geometry: vertices={} triangles={}",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    if let Some(bounds) = mesh.bounds() {
        let s = bounds.size();
        println!("Raw size: {:.3} x {:.3} x {:.3}", s.x, s.y, s.z);
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let normalized = normalize(&name, &mesh, config.target_size)?;
    let sphere = containment_sphere(
        &normalized.bounds,
        config.padding,
        config.containment_color,
    );
    println!("Normalization scale: {:.6}", normalized.scale);
    println!("Row offset: x={:.1}", index as f32 * config.spacing);
    println!(
        "Containment sphere: center=({:.3}, {:.3}, {:.3}) radius={:.3}",
        sphere.center.x, sphere.center.y, sphere.center.z, sphere.radius
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("landing-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("scene: {}", landing_scene::crate_info());
            println!("assets: {}", landing_assets::crate_info());
            println!("render: {}", landing_render::crate_info());
            println!("host: {}", landing_host::crate_info());
        }
        Commands::Simulate {
            config,
            model,
            ticks,
            seed,
            size,
            resize,
            procedural,
            dump,
            live,
        } => simulate(config, model, ticks, seed, size, resize, procedural, dump, live)?,
        Commands::Inspect { path, index } => inspect(path, index)?,
    }

    Ok(())
}
