#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Rustcaster renderer.

mod config;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rustcaster_rendering::{Color, Presentation, RenderingBackend};
use rustcaster_rendering_macroquad::MacroquadBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

use self::config::{Config, FileConfig, ProjectionArg};
use self::session::Session;

const WINDOW_TITLE: &str = "Rustcaster";

/// Command-line arguments accepted by the renderer.
#[derive(Debug, Parser)]
#[command(name = "rustcaster")]
#[command(about = "Grid-based raycasting renderer")]
struct Args {
    /// Map file to load: a `.png` image or a text grid of digits.
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,
    /// Use the built-in 5x5 map and start with the debug overlay enabled.
    #[arg(long)]
    debug: bool,
    /// Wall height projection.
    #[arg(long, value_enum)]
    projection: Option<ProjectionArg>,
    /// TOML file with default settings. Command-line flags take precedence.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Width of the rendered view in pixels.
    #[arg(long)]
    width: Option<u32>,
    /// Height of the rendered view in pixels.
    #[arg(long)]
    height: Option<u32>,
    /// Column of the block the player starts in.
    #[arg(long)]
    start_column: Option<i32>,
    /// Row of the block the player starts in.
    #[arg(long)]
    start_row: Option<i32>,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long)]
    vsync: bool,
    /// Log frame timings once per second.
    #[arg(long)]
    show_fps: bool,
    /// Simulate the given number of frames without opening a window.
    #[arg(long, value_name = "N")]
    headless_frames: Option<u32>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = Config::resolve(&args, file)?;
    let mut session = Session::start(&config)?;

    if let Some(frames) = config.headless_frames {
        let summary = session.run_headless(frames);
        info!(
            frames = summary.frames,
            wall_slices = summary.wall_slices,
            x = summary.position.x,
            y = summary.position.y,
            "headless run finished"
        );
        return Ok(());
    }

    let scene = session.draw();
    let mut backend = MacroquadBackend::new().with_show_fps(config.show_fps);
    if let Some(enabled) = config.vsync {
        backend = backend.with_vsync(enabled);
    }

    backend
        .run(
            Presentation::new(WINDOW_TITLE, Color::from_rgb_u8(0, 0, 0), scene),
            move |dt, input, scene| {
                *scene = session.advance(dt, input);
            },
        )
        .context("rendering backend failed")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
