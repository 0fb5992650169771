use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3, Vec4};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vesper_common::Transform;
use vesper_input::{InputState, Key};
use vesper_kernel::{Engine, EngineConfig, SceneObject};
use vesper_render::{LayerMask, RecordingBackend, RenderStats};
use vesper_tools::RegistryInspector;

#[derive(Parser)]
#[command(name = "vesper-cli", about = "CLI tool for vesper operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default configuration
    Info,
    /// Render frames headlessly with a scripted freelook camera
    Render {
        /// Number of frames to render
        #[arg(short, long, default_value = "3")]
        frames: u32,
        /// Engine config (JSON, or YAML by extension)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the draw commands of the last frame
        #[arg(long)]
        dump: bool,
    },
    /// Print the registry after loading a scene
    Inspect {
        /// Engine config (JSON, or YAML by extension)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = EngineConfig::default();
            println!("vesper-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "viewport: {}x{}",
                config.viewport.width, config.viewport.height
            );
            println!("camera: {:?}", config.camera.projection);
            println!(
                "freelook: move_speed={} rotate_speed={}",
                config.freelook.move_speed, config.freelook.rotate_speed
            );
        }
        Commands::Render {
            frames,
            config,
            dump,
        } => {
            let mut engine = load_engine(config.as_deref())?;
            let camera = engine
                .spawn_default_camera(Transform::from_position(Vec3::new(0.0, 0.0, 5.0)))
                .context("spawn camera")?;

            let viewport = engine.config().viewport;
            let mut input = InputState::for_window(viewport.width, viewport.height);
            input.set_cursor_visible(false);
            input.press(Key::W);

            let dt = 1.0 / 60.0;
            let mut backend = RecordingBackend::new();
            for frame in 0..frames {
                // drift the mouse right a little every frame
                input.set_cursor(input.window_center() + Vec2::new(4.0, 0.0));
                engine.update(&mut input, dt);

                backend.drain();
                let stats = engine.render(&mut backend).context("render frame")?;
                log_frame(frame, &stats, backend.commands().len());
            }

            if let Some(transform) = engine.registry().get::<Transform>(camera) {
                let p = transform.position;
                println!("camera {camera} at ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
            }
            println!(
                "backend balanced: {}",
                if backend.is_balanced() { "OK" } else { "NO" }
            );
            if dump {
                print!("{}", backend.to_text());
            }
        }
        Commands::Inspect { config } => {
            let mut engine = load_engine(config.as_deref())?;
            engine
                .spawn_default_camera(Transform::from_position(Vec3::new(0.0, 0.0, 5.0)))
                .context("spawn camera")?;

            let registry = engine.registry();
            println!("{}", RegistryInspector::summary(registry));
            for id in RegistryInspector::list_entities(registry) {
                if let Some(info) = RegistryInspector::inspect_entity(registry, id) {
                    println!("{info}");
                }
            }
        }
    }

    Ok(())
}

/// Build an engine from `path`, falling back to defaults, and spawn its
/// scene. An empty scene gets the demo objects.
fn load_engine(path: Option<&Path>) -> anyhow::Result<Engine> {
    let mut config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if config.scene.is_empty() {
        config.scene = demo_scene();
    }

    let mut engine = Engine::new(config);
    engine.populate().context("populate scene")?;
    Ok(engine)
}

fn log_frame(frame: u32, stats: &RenderStats, commands: usize) {
    tracing::info!(
        frame,
        cameras = stats.cameras,
        drawn = stats.drawn,
        gizmos = stats.gizmos,
        culled = stats.culled,
        commands,
        "frame rendered"
    );
}

fn demo_scene() -> Vec<SceneObject> {
    vec![
        SceneObject {
            quad: Some(1.0),
            color: Vec4::new(1.0, 0.5, 0.0, 1.0),
            ..SceneObject::default()
        },
        SceneObject {
            position: Vec3::new(2.0, 0.0, 0.0),
            ..SceneObject::default()
        },
        // only visible to cameras that include layer 1
        SceneObject {
            position: Vec3::new(-2.0, 0.0, 0.0),
            layers: LayerMask::layer(1),
            quad: Some(0.5),
            ..SceneObject::default()
        },
    ]
}
