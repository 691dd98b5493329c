//! Layered configuration: built-in defaults, then an optional TOML file, then
//! command-line flags.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use rustcaster_core::{BlockCoord, ProjectionMode, Viewport};
use rustcaster_system_movement::PlayerTuning;
use rustcaster_system_raycasting::DEFAULT_MAX_RAY_BLOCKS;
use rustcaster_world::MapSource;
use serde::Deserialize;
use tracing::warn;

use crate::Args;

pub(crate) const DEFAULT_MAP_PATH: &str = "default_map.png";
pub(crate) const DEFAULT_WIDTH: u32 = 1080;
pub(crate) const DEFAULT_HEIGHT: u32 = 607;
pub(crate) const DEFAULT_START: BlockCoord = BlockCoord::new(1, 1);

/// Projection names accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ProjectionArg {
    Perspective,
    Orthographic,
    Gaussian,
}

impl From<ProjectionArg> for ProjectionMode {
    fn from(value: ProjectionArg) -> Self {
        match value {
            ProjectionArg::Perspective => Self::Perspective,
            ProjectionArg::Orthographic => Self::Orthographic,
            ProjectionArg::Gaussian => Self::Gaussian,
        }
    }
}

/// Settings read from a TOML file. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    map: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    projection: Option<ProjectionMode>,
    field_of_view: Option<f32>,
    step_size: Option<f32>,
    turn_speed: Option<f32>,
    max_ray_blocks: Option<f32>,
    start_column: Option<i32>,
    start_row: Option<i32>,
    vsync: Option<bool>,
    show_fps: Option<bool>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Fully resolved startup settings.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Config {
    pub(crate) map: MapSource,
    pub(crate) viewport: Viewport,
    pub(crate) projection: ProjectionMode,
    /// Maximum ray length in blocks; scaled by the loaded map's block size.
    pub(crate) max_ray_blocks: f32,
    pub(crate) tuning: PlayerTuning,
    pub(crate) start: BlockCoord,
    pub(crate) debug: bool,
    pub(crate) vsync: Option<bool>,
    pub(crate) show_fps: bool,
    pub(crate) headless_frames: Option<u32>,
}

impl Config {
    pub(crate) fn resolve(args: &Args, file: FileConfig) -> Result<Self> {
        let map = if args.debug {
            MapSource::Debug
        } else {
            args.map
                .clone()
                .or(file.map)
                .map_or_else(|| default_map(Path::new(DEFAULT_MAP_PATH)), MapSource::File)
        };

        let tuning = PlayerTuning::new(
            file.step_size.unwrap_or(PlayerTuning::DEFAULT_STEP_SIZE),
            file.turn_speed.unwrap_or(PlayerTuning::DEFAULT_TURN_SPEED),
            file.field_of_view.unwrap_or(PlayerTuning::DEFAULT_FIELD_OF_VIEW),
        )
        .context("invalid player tuning")?;

        Ok(Self {
            map,
            viewport: Viewport::new(
                args.width.or(file.width).unwrap_or(DEFAULT_WIDTH),
                args.height.or(file.height).unwrap_or(DEFAULT_HEIGHT),
            ),
            projection: args
                .projection
                .map(ProjectionMode::from)
                .or(file.projection)
                .unwrap_or_default(),
            max_ray_blocks: file.max_ray_blocks.unwrap_or(DEFAULT_MAX_RAY_BLOCKS),
            tuning,
            start: BlockCoord::new(
                args.start_column
                    .or(file.start_column)
                    .unwrap_or(DEFAULT_START.column()),
                args.start_row
                    .or(file.start_row)
                    .unwrap_or(DEFAULT_START.row()),
            ),
            debug: args.debug,
            vsync: if args.vsync { Some(true) } else { file.vsync },
            show_fps: args.show_fps || file.show_fps.unwrap_or(false),
            headless_frames: args.headless_frames,
        })
    }
}

/// Map used when neither flags nor the config file name one. Falls back to
/// the built-in debug map when `path` does not exist.
fn default_map(path: &Path) -> MapSource {
    if path.exists() {
        MapSource::file(path)
    } else {
        warn!(
            path = %path.display(),
            "default map not found, using the built-in debug map"
        );
        MapSource::Debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("rustcaster").chain(extra.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let config = Config::resolve(&args(&[]), FileConfig::default()).expect("valid defaults");

        assert_eq!(config.map, default_map(Path::new(DEFAULT_MAP_PATH)));
        assert_eq!(config.viewport, Viewport::new(DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(config.projection, ProjectionMode::Perspective);
        assert_eq!(config.start, DEFAULT_START);
        assert_eq!(config.tuning, PlayerTuning::default());
        assert_eq!(config.max_ray_blocks, DEFAULT_MAX_RAY_BLOCKS);
        assert_eq!(config.vsync, None);
        assert!(!config.debug);
        assert!(!config.show_fps);
        assert!(config.headless_frames.is_none());
    }

    #[test]
    fn debug_flag_overrides_every_map_path() {
        let file = FileConfig::parse("map = \"level.txt\"").expect("valid toml");
        let config =
            Config::resolve(&args(&["--debug", "--map", "other.txt"]), file).expect("valid");

        assert_eq!(config.map, MapSource::Debug);
        assert!(config.debug);
    }

    #[test]
    fn file_values_fill_in_missing_flags() {
        let file = FileConfig::parse(
            r#"
map = "level.txt"
width = 320
height = 200
projection = "gaussian"
field_of_view = 90.0
step_size = 2.0
turn_speed = 0.05
max_ray_blocks = 16.0
start_column = 3
start_row = 4
vsync = false
show_fps = true
"#,
        )
        .expect("valid toml");

        let config = Config::resolve(&args(&[]), file).expect("valid config");

        assert_eq!(config.map, MapSource::file("level.txt"));
        assert_eq!(config.viewport, Viewport::new(320, 200));
        assert_eq!(config.projection, ProjectionMode::Gaussian);
        assert_eq!(config.tuning.field_of_view(), 90.0);
        assert_eq!(config.tuning.step_size(), 2.0);
        assert_eq!(config.tuning.turn_speed(), 0.05);
        assert_eq!(config.max_ray_blocks, 16.0);
        assert_eq!(config.start, BlockCoord::new(3, 4));
        assert_eq!(config.vsync, Some(false));
        assert!(config.show_fps);
    }

    #[test]
    fn flags_win_over_file_values() {
        let file = FileConfig::parse(
            r#"
map = "level.txt"
width = 320
projection = "gaussian"
start_column = 3
vsync = false
"#,
        )
        .expect("valid toml");

        let config = Config::resolve(
            &args(&[
                "--map",
                "flag.png",
                "--width",
                "800",
                "--projection",
                "orthographic",
                "--start-column",
                "2",
                "--vsync",
                "--headless-frames",
                "5",
            ]),
            file,
        )
        .expect("valid config");

        assert_eq!(config.map, MapSource::file("flag.png"));
        assert_eq!(config.viewport.width(), 800);
        assert_eq!(config.viewport.height(), DEFAULT_HEIGHT);
        assert_eq!(config.projection, ProjectionMode::Orthographic);
        assert_eq!(config.start, BlockCoord::new(2, DEFAULT_START.row()));
        assert_eq!(config.vsync, Some(true));
        assert_eq!(config.headless_frames, Some(5));
    }

    #[test]
    fn default_map_falls_back_to_debug_when_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let present = dir.path().join("default_map.png");
        fs::write(&present, b"").expect("write map");

        assert_eq!(default_map(&present), MapSource::file(&present));
        assert_eq!(
            default_map(&dir.path().join("absent.png")),
            MapSource::Debug
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("colour = \"red\"").is_err());
    }

    #[test]
    fn invalid_tuning_is_reported() {
        let file = FileConfig::parse("field_of_view = 0.0").expect("valid toml");

        let error = Config::resolve(&args(&[]), file).expect_err("zero fov must be rejected");

        assert!(error.to_string().contains("invalid player tuning"));
    }

    #[test]
    fn load_reads_files_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("rustcaster.toml");
        fs::write(&path, "width = 640\n").expect("write config");

        let file = FileConfig::load(&path).expect("config should load");

        assert_eq!(file.width, Some(640));
        assert!(FileConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
