mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Mat4;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use treecrown_common::DemoConfig;
use treecrown_growth::GrowthStep;
use treecrown_render::{DebugTextRenderer, Renderer};
use treecrown_scene::Scene;

#[derive(Parser)]
#[command(name = "treecrown-cli", about = "Headless tools for the tree-crown demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Scene config file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective configuration
    Info,
    /// Replay camera commands and print the resulting basis and matrices
    Camera {
        /// Commands such as "walk 1; yaw 90; pitch -10"
        #[arg(short, long, default_value = "")]
        script: String,
    },
    /// Grow the tree and print statistics
    Grow {
        /// Stop after this many iterations instead of running to completion
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Render one frame as text
    Frame {
        /// Commands to apply before capturing the frame
        #[arg(short, long, default_value = "")]
        script: String,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DemoConfig> {
    match path {
        Some(path) => DemoConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(DemoConfig::default()),
    }
}

fn run_script(scene: &mut Scene, script: &str) -> anyhow::Result<()> {
    for action in script::parse(script)? {
        if !scene.apply(action) {
            tracing::warn!(?action, "action ignored in headless run");
        }
    }
    Ok(())
}

fn print_matrix(name: &str, m: &Mat4) {
    println!("{name}:");
    // Row-major for reading; glam stores columns.
    let rows = m.transpose().to_cols_array_2d();
    for row in rows {
        println!(
            "  [{:9.4} {:9.4} {:9.4} {:9.4}]",
            row[0], row[1], row[2], row[3]
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("treecrown-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "window: {}x{} \"{}\" fill={}",
                config.window.width, config.window.height, config.window.title, config.window.fill_mode
            );
            println!(
                "camera: pos={} target={} fov={}deg near={} far={}",
                config.camera.position,
                config.camera.target,
                config.camera.fov_y_degrees,
                config.camera.near,
                config.camera.far
            );
            println!(
                "crown: center={} radius={} points={} ({:?}, seed {})",
                config.crown.center,
                config.crown.radius,
                config.crown.point_count,
                config.crown.distribution,
                config.crown.seed
            );
            println!(
                "growth: influence={} kill={} branch={} max_iterations={}",
                config.growth.influence_distance,
                config.growth.kill_distance,
                config.growth.branch_length,
                config.growth.max_iterations
            );
        }
        Commands::Camera { script } => {
            let mut scene = Scene::new(config)?;
            run_script(&mut scene, &script)?;

            let camera = scene.camera_mut();
            camera.update_view_matrix();
            println!("position: {}", camera.position());
            println!("right:    {}", camera.right());
            println!("up:       {}", camera.up());
            println!("look:     {}", camera.look());
            println!("orthonormality error: {:.3e}", camera.orthonormality_error());
            if let Some(lens) = camera.lens() {
                println!(
                    "lens: fov_y={:.2}deg fov_x={:.2}deg aspect={:.3} near={} far={}",
                    lens.fov_y().to_degrees(),
                    lens.fov_x().to_degrees(),
                    lens.aspect(),
                    lens.near(),
                    lens.far()
                );
            }
            print_matrix("view", &camera.view());
            print_matrix("proj", &camera.proj()?);
            print_matrix("view_proj", &camera.view_proj()?);
        }
        Commands::Grow { steps } => {
            let mut scene = Scene::new(config)?;
            let limit = steps.unwrap_or(u32::MAX);
            let start_points = scene.points().len();

            let mut ran = 0u32;
            while ran < limit {
                ran += 1;
                if let GrowthStep::Finished(_) = scene.grow_step() {
                    break;
                }
            }

            let grower = scene.grower();
            let max_depth = grower.branches().iter().map(|b| b.depth).max().unwrap_or(0);
            println!("iterations: {}", grower.iteration());
            println!("branches: {}", grower.branches().len());
            println!("max depth: {max_depth}");
            println!(
                "points: {} of {} consumed, {} remaining",
                start_points - scene.points().len(),
                start_points,
                scene.points().len()
            );
            match grower.finished() {
                Some(reason) => println!("finished: {reason}"),
                None => println!("finished: no (stopped after {ran} steps)"),
            }
        }
        Commands::Frame { script } => {
            let mut scene = Scene::new(config)?;
            run_script(&mut scene, &script)?;
            let frame = scene
                .frame()
                .context("camera produced no valid frame")?;
            print!("{}", DebugTextRenderer::new().render(frame));
        }
    }

    Ok(())
}
