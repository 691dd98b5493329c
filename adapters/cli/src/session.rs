use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;
use rustcaster_rendering::{FrameInput, Scene};
use rustcaster_system_movement::{Player, REFERENCE_FRAME_SECONDS};
use rustcaster_system_raycasting::{Game, RenderSettings};
use rustcaster_world::WorldMap;
use tracing::{debug, info};

use crate::config::Config;

/// World, player and render settings driven by the frame loop.
#[derive(Debug)]
pub(crate) struct Session {
    world: WorldMap,
    player: Player,
    settings: RenderSettings,
}

/// Outcome of a run without a window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct HeadlessSummary {
    pub(crate) frames: u32,
    /// Wall slices visible in the last frame.
    pub(crate) wall_slices: usize,
    pub(crate) position: Vec2,
}

impl Session {
    /// Loads the configured map and places the player in it.
    pub(crate) fn start(config: &Config) -> Result<Self> {
        let world = WorldMap::load(&config.map)
            .with_context(|| format!("failed to load map {}", config.map))?;
        let player = Player::spawn(&world, config.start, config.tuning).with_context(|| {
            format!(
                "cannot start at column {}, row {}",
                config.start.column(),
                config.start.row()
            )
        })?;
        let settings = RenderSettings::new(
            config.viewport,
            config.projection,
            config.max_ray_blocks * world.block_size(),
            config.debug,
        )
        .context("invalid render settings")?;

        info!(
            map = %config.map,
            columns = world.width(),
            rows = world.height(),
            projection = settings.projection().name(),
            max_ray_length = settings.max_ray_length(),
            "session started"
        );

        Ok(Self {
            world,
            player,
            settings,
        })
    }

    /// Scene for the current state without advancing the player.
    pub(crate) fn draw(&self) -> Scene {
        let frame = Game::new(&self.world, self.settings).draw(&self.player);
        Scene::from_frame(&frame, self.world.palette())
    }

    /// Applies one frame of input and returns the resulting scene.
    pub(crate) fn advance(&mut self, dt: Duration, input: FrameInput) -> Scene {
        if input.toggle_debug {
            self.settings = self.settings.with_debug(!self.settings.debug());
            debug!(enabled = self.settings.debug(), "debug overlay toggled");
        }

        let game = Game::new(&self.world, self.settings);
        let frame = game.frame(&mut self.player, input.intent, dt);
        Scene::from_frame(&frame, self.world.palette())
    }

    /// Simulates `frames` idle frames at the reference frame rate.
    pub(crate) fn run_headless(&mut self, frames: u32) -> HeadlessSummary {
        let dt = Duration::from_secs_f32(REFERENCE_FRAME_SECONDS);
        let mut wall_slices = 0;
        for _ in 0..frames {
            wall_slices = self.advance(dt, FrameInput::default()).walls.len();
        }

        HeadlessSummary {
            frames,
            wall_slices,
            position: self.player.position(),
        }
    }
}
