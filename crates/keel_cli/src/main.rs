//! Keel CLI
//!
//! Drive the Keel 3D configuration engine headlessly: render frames for a
//! configuration, inspect hull assets, and check mapping tables.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keel_3d::configuration::{Configuration, ConfigurationInput, OptionCatalog};
use keel_3d::loader::SourceRegistry;
use keel_3d::model::{BaseModelId, ModelId, WaveMode};
use keel_3d::scene::{NodeKind, SceneGraph};
use keel_3d::settings::{JsonDirSettings, MappingTables};
use keel_3d::{Configurator, EngineConfig};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod demo;
mod report;

use report::FrameReport;

#[derive(Parser)]
#[command(name = "keel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keel boat configurator engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file
    #[arg(short, long, global = true, default_value = "keel.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a configuration and render frames headlessly
    Render {
        /// Configuration as JSON, inline or `@file`
        #[arg(long)]
        configuration: Option<String>,

        /// Directory holding the mapping table documents
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Option catalog JSON file (`{"id": "name", ...}`)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: usize,

        /// Seconds per frame
        #[arg(long, default_value = "0.016666")]
        dt: f32,

        /// Use the built-in stand-in hull when the asset is missing
        #[arg(long)]
        demo: bool,

        /// Include the draw list of the last frame
        #[arg(long)]
        draws: bool,
    },

    /// Print the node tree of a hull asset
    Inspect {
        /// Asset file
        path: PathBuf,
    },

    /// Load mapping tables and summarize them
    Settings {
        /// Directory holding the mapping table documents
        dir: PathBuf,
    },

    /// Show models and the resolved engine configuration
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("keel=debug")
        } else {
            EnvFilter::new("keel=info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let engine = load_engine_config(&cli.config)?;

    match cli.command {
        Commands::Render {
            configuration,
            settings,
            catalog,
            frames,
            dt,
            demo,
            draws,
        } => cmd_render(
            engine,
            configuration.as_deref(),
            settings.as_deref(),
            catalog.as_deref(),
            frames,
            dt,
            demo,
            draws,
        ),

        Commands::Inspect { path } => cmd_inspect(&path),

        Commands::Settings { dir } => cmd_settings(&dir),

        Commands::Info => cmd_info(&engine),
    }
}

/// Missing config file means defaults; a broken one is an error
fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        info!("No {} found, using default engine settings", path.display());
        return Ok(EngineConfig::default());
    }
    EngineConfig::load(path).with_context(|| format!("Failed to load engine config {}", path.display()))
}

fn parse_configuration(arg: Option<&str>) -> Result<Configuration> {
    let Some(arg) = arg else {
        return Ok(Configuration::default());
    };
    let json = match arg.strip_prefix('@') {
        Some(file) => fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))?,
        None => arg.to_string(),
    };
    let input: ConfigurationInput = serde_json::from_str(&json).context("Invalid configuration JSON")?;
    Ok(input.into())
}

fn load_catalog(path: Option<&Path>) -> Result<OptionCatalog> {
    let Some(path) = path else {
        return Ok(OptionCatalog::new());
    };
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let entries: BTreeMap<String, String> =
        serde_json::from_str(&content).with_context(|| format!("Invalid option catalog {}", path.display()))?;
    Ok(OptionCatalog::from_pairs(entries))
}

#[allow(clippy::too_many_arguments)]
fn cmd_render(
    engine: EngineConfig,
    configuration: Option<&str>,
    settings: Option<&Path>,
    catalog: Option<&Path>,
    frames: usize,
    dt: f32,
    demo: bool,
    draws: bool,
) -> Result<()> {
    if !dt.is_finite() || dt <= 0.0 {
        anyhow::bail!("Frame time must be positive, got {}", dt);
    }

    let config = parse_configuration(configuration)?;
    let catalog = load_catalog(catalog)?;
    let tables = match settings {
        Some(dir) => MappingTables::fetch(&JsonDirSettings::new(dir)),
        None => MappingTables::new(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("keel-loader")
        .build()
        .context("Failed to start loader runtime")?;

    let mut configurator = Configurator::new(engine, tables, catalog, runtime.handle().clone());
    if demo {
        for base in BaseModelId::ALL {
            let path = configurator.engine_config().model_path(base);
            if !path.exists() {
                info!("Using demo hull for {}", base);
                configurator.preload(base, demo::hull(base));
            }
        }
    }
    configurator.on_bounds_center(|center| info!("Hull centered at ({:.2}, {:.2})", center.x, center.y));
    configurator.set_configuration(config);

    info!(
        "Rendering {} frames of {} ({})",
        frames,
        configurator.configuration().model,
        configurator.configuration().wave_mode.as_str()
    );
    if !configurator.wait_for_scene(Duration::from_secs(30)) {
        warn!("Hull did not load, rendering an empty scene");
    }

    let mut last = None;
    for index in 0..frames {
        let frame = configurator.frame(dt);
        last = Some(FrameReport::new(index, &frame, draws));
    }

    if let Some(report) = last {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    let stats = configurator.loader().cache_stats();
    info!(
        "Template cache: {} entries, {} hits, {} misses",
        stats.entries, stats.hits, stats.misses
    );
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let registry = SourceRegistry::new();
    let template = registry
        .load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let scene = SceneGraph::instantiate(&template);

    println!("{} ({} nodes)", scene.name(), scene.node_count());
    for (_, node) in scene.nodes() {
        let mut depth = 0;
        let mut parent = node.parent;
        while let Some(id) = parent {
            depth += 1;
            parent = scene.node(id).and_then(|n| n.parent);
        }
        let kind = match node.kind {
            NodeKind::Group => "group",
            NodeKind::Mesh => "mesh",
        };
        let materials: Vec<&str> = node
            .materials
            .iter()
            .filter_map(|&m| scene.material(m).map(|m| m.name.as_str()))
            .collect();
        let mask = if node.depth_mask { " [depth mask]" } else { "" };
        println!("{}{} ({}) {:?}{}", "  ".repeat(depth), node.name, kind, materials, mask);
    }

    match scene.horizontal_center() {
        Some(center) => println!("Horizontal center: ({:.3}, {:.3})", center.x, center.y),
        None => println!("Horizontal center: none (no mesh bounds)"),
    }
    Ok(())
}

fn cmd_settings(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Settings directory '{}' does not exist", dir.display());
    }
    let tables = MappingTables::fetch(&JsonDirSettings::new(dir));

    println!("Group mappings: {}", tables.group_count());
    println!("Material collections: {}", tables.collections().len());
    for collection in tables.collections() {
        let variants: Vec<&str> = collection.variants.iter().map(|v| v.name.as_str()).collect();
        println!("  {} -> {:?}: {:?}", collection.id, collection.targets, variants);
    }
    let env = tables.environment();
    println!(
        "Environment: sun {:.2}, ambient {:.2}, water radius {}",
        env.sun_intensity, env.ambient_intensity, env.water_radius
    );
    Ok(())
}

fn cmd_info(engine: &EngineConfig) -> Result<()> {
    println!("Keel {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Models:");
    for model in ModelId::ALL {
        let path = engine.model_path(model.base());
        let status = if path.exists() { "ok" } else { "missing" };
        println!("  {:<16} {} ({})", model.as_str(), path.display(), status);
    }
    println!();
    println!("Wave modes: {}, {}", WaveMode::Ocean.as_str(), WaveMode::DryDock.as_str());
    println!("Template cache size: {}", engine.assets.template_cache_size);
    match engine.water_normals_path() {
        Some(path) => println!("Water normals: {}", path.display()),
        None => println!("Water normals: none"),
    }
    Ok(())
}
