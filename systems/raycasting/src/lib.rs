#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-column ray casting that turns a player's view into a [`Frame`].
//!
//! [`Game`] borrows the [`WorldMap`] for its whole lifetime and the
//! [`Player`] for the duration of a single call, so it can never outlive the
//! world it renders nor hold the player while the movement system mutates it.

mod ray;

use std::time::Duration;

use glam::Vec2;
use rustcaster_core::{
    Frame, Minimap, MinimapBlock, MinimapSegment, MoveIntent, ProjectionMode, RayAxis, Viewport,
    WallColumn,
};
use rustcaster_system_movement::Player;
use rustcaster_world::WorldMap;
use thiserror::Error;
use tracing::trace;

pub use ray::{RayHit, DIST_ERR_TOLERANCE};

use ray::Ray;

/// Default longest ray, measured in blocks.
pub const DEFAULT_MAX_RAY_BLOCKS: f32 = 64.0;

/// Share of the viewport height filled by walls in orthographic mode.
pub const ORTHOGRAPHIC_FILL: f32 = 0.5;

/// Standard deviation of the gaussian projection, measured in blocks.
pub const GAUSSIAN_SPREAD_BLOCKS: f32 = 2.0;

/// Share of the viewport height the gaussian projection never drops below.
const GAUSSIAN_FLOOR: f32 = 0.1;

/// Settings that shape how frames are computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    viewport: Viewport,
    projection: ProjectionMode,
    max_ray_length: f32,
    debug: bool,
}

impl RenderSettings {
    /// Creates validated render settings.
    ///
    /// `max_ray_length` is expressed in world units.
    pub fn new(
        viewport: Viewport,
        projection: ProjectionMode,
        max_ray_length: f32,
        debug: bool,
    ) -> Result<Self, GameError> {
        if viewport.is_degenerate() {
            return Err(GameError::DegenerateViewport {
                width: viewport.width(),
                height: viewport.height(),
            });
        }
        if !max_ray_length.is_finite() || max_ray_length <= 0.0 {
            return Err(GameError::InvalidMaxRayLength { max_ray_length });
        }

        Ok(Self {
            viewport,
            projection,
            max_ray_length,
            debug,
        })
    }

    /// Viewport the frames are computed for.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Wall height projection.
    #[must_use]
    pub const fn projection(&self) -> ProjectionMode {
        self.projection
    }

    /// Longest distance a ray travels before it is reported as a miss.
    #[must_use]
    pub const fn max_ray_length(&self) -> f32 {
        self.max_ray_length
    }

    /// Whether frames carry the debug overlay.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Returns a copy of the settings with the debug overlay toggled.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Errors raised while validating render settings.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GameError {
    /// The viewport has no pixels to render into.
    #[error("viewport must have a non-zero size (received {width}x{height})")]
    DegenerateViewport {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// The maximum ray length was zero, negative or not finite.
    #[error("maximum ray length must be positive and finite (received {max_ray_length})")]
    InvalidMaxRayLength {
        /// Rejected value in world units.
        max_ray_length: f32,
    },
}

/// Ray caster bound to a world map.
#[derive(Clone, Copy, Debug)]
pub struct Game<'w> {
    world: &'w WorldMap,
    settings: RenderSettings,
}

impl<'w> Game<'w> {
    /// Creates a ray caster for the provided world.
    #[must_use]
    pub const fn new(world: &'w WorldMap, settings: RenderSettings) -> Self {
        Self { world, settings }
    }

    /// Distance from the eye to the projection plane in pixels.
    #[must_use]
    pub fn projection_plane_distance(&self, player: &Player) -> f32 {
        let half_width = self.settings.viewport.width() as f32 * 0.5;
        half_width / (player.field_of_view() * 0.5).tan()
    }

    /// Casts a ray that only inspects the grid lines of one family.
    #[must_use]
    pub fn raycast(&self, player: &Player, angle: f32, axis: RayAxis) -> RayHit {
        ray::along_axis(self.world, self.ray(player, angle), axis)
    }

    /// Casts a ray through the grid with a DDA traversal.
    ///
    /// The result matches the nearer of the two [`Game::raycast`] families.
    #[must_use]
    pub fn cast_ray(&self, player: &Player, angle: f32) -> RayHit {
        ray::traverse(self.world, self.ray(player, angle))
    }

    /// Advances the player by one tick and draws the resulting view.
    pub fn frame(&self, player: &mut Player, intent: MoveIntent, dt: Duration) -> Frame {
        let _ = player.tick(self.world, intent, dt);
        self.draw(player)
    }

    /// Computes the wall slices and minimap for the player's current view.
    #[must_use]
    pub fn draw(&self, player: &Player) -> Frame {
        let viewport = self.settings.viewport;
        let width = viewport.width();
        let height = viewport.height() as f32;
        let field_of_view = player.field_of_view();
        let heading = player.direction();
        let plane = self.projection_plane_distance(player);
        let scale = self.minimap_block_size() / self.world.block_size();

        let mut columns = Vec::with_capacity(width as usize);
        let mut ray_hits = Vec::new();
        let mut shaded = false;

        for column in 0..width {
            let angle = heading - field_of_view * 0.5
                + column as f32 / width as f32 * field_of_view;
            let hit = self.cast_ray(player, angle);

            if !hit.ambiguous {
                shaded = hit.axis == RayAxis::Horizontal;
            }

            let cosine = (angle - heading).cos();
            let distance = hit.distance * cosine;
            let wall_height = if hit.is_hit() {
                self.project(hit.distance, cosine, plane, height)
            } else {
                0.0
            };

            columns.push(WallColumn {
                column,
                top: (height - wall_height) * 0.5,
                height: wall_height,
                distance,
                tile: hit.tile,
                axis: hit.axis,
                shaded: shaded && hit.is_hit(),
            });

            if self.settings.debug && hit.is_hit() {
                ray_hits.push(hit.point * scale);
            }
        }

        trace!(columns = columns.len(), hits = ray_hits.len(), "frame cast");

        Frame {
            viewport,
            columns,
            minimap: self.minimap(player, ray_hits),
        }
    }

    fn ray(&self, player: &Player, angle: f32) -> Ray {
        Ray::new(player.position(), angle, self.settings.max_ray_length)
    }

    /// Wall height for a hit `distance` away along a ray whose angle to the
    /// heading has the given `cosine`. The gaussian falloff weights the squared
    /// distance by the cosine once, so edge columns fall off more gently than
    /// with the fully corrected distance.
    fn project(&self, distance: f32, cosine: f32, plane: f32, height: f32) -> f32 {
        let block_size = self.world.block_size();
        match self.settings.projection {
            ProjectionMode::Perspective => {
                (block_size * plane / (distance * cosine).max(f32::EPSILON)).min(height)
            }
            ProjectionMode::Orthographic => height * ORTHOGRAPHIC_FILL,
            ProjectionMode::Gaussian => {
                let variance = (GAUSSIAN_SPREAD_BLOCKS * block_size).powi(2);
                let falloff = (-0.5 * distance * distance * cosine / variance).exp();
                (1.0 - GAUSSIAN_FLOOR) * height * falloff + GAUSSIAN_FLOOR * height
            }
        }
    }

    fn minimap_block_size(&self) -> f32 {
        self.settings.viewport.height() as f32 / 3.0 / self.world.height() as f32
    }

    fn minimap(&self, player: &Player, ray_hits: Vec<Vec2>) -> Minimap {
        let block_size = self.minimap_block_size();
        let scale = block_size / self.world.block_size();
        let centre = player.position() * scale;

        let blocks = self
            .world
            .blocks()
            .filter(|(_, tile)| tile.is_solid())
            .map(|(block, tile)| MinimapBlock { block, tile })
            .collect();

        let heading = if self.settings.debug {
            let length = (block_size * 0.5).max(8.0);
            let half_fov = player.tuning().field_of_view() * 0.5;
            [0.0, -half_fov, half_fov]
                .into_iter()
                .map(|offset| MinimapSegment {
                    from: centre,
                    to: centre + player.direction_vector(offset) * length,
                })
                .collect()
        } else {
            Vec::new()
        };

        Minimap {
            block_size,
            extent: Vec2::new(self.world.width() as f32, self.world.height() as f32) * block_size,
            background: !self.settings.debug,
            blocks,
            player: centre,
            player_radius: (block_size / 15.0).max(2.0),
            heading,
            ray_hits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustcaster_core::{BlockCoord, TileId};
    use rustcaster_system_movement::PlayerTuning;
    use std::f32::consts::{FRAC_PI_2, PI};

    const FRAME: Duration = Duration::from_micros(16_667);

    fn settings(projection: ProjectionMode, debug: bool) -> RenderSettings {
        RenderSettings::new(
            Viewport::new(320, 240),
            projection,
            DEFAULT_MAX_RAY_BLOCKS * 80.0,
            debug,
        )
        .expect("valid settings")
    }

    fn centre_player(world: &WorldMap) -> Player {
        Player::spawn(world, BlockCoord::new(2, 2), PlayerTuning::default()).expect("inside map")
    }

    fn assert_close(actual: f32, expected: f32, tolerance: f32) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn settings_reject_degenerate_viewport() {
        let error = RenderSettings::new(
            Viewport::new(0, 240),
            ProjectionMode::Perspective,
            10.0,
            false,
        )
        .expect_err("zero width must be rejected");

        assert_eq!(
            error,
            GameError::DegenerateViewport {
                width: 0,
                height: 240
            }
        );
    }

    #[test]
    fn settings_reject_non_positive_ray_length() {
        for max_ray_length in [0.0, -5.0, f32::INFINITY] {
            assert!(matches!(
                RenderSettings::new(
                    Viewport::new(10, 10),
                    ProjectionMode::Perspective,
                    max_ray_length,
                    false
                ),
                Err(GameError::InvalidMaxRayLength { .. })
            ));
        }
    }

    #[test]
    fn ray_from_centre_hits_east_wall() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Perspective, false));

        let hit = game.cast_ray(&player, 0.0);

        assert_close(hit.distance, 120.0, 1e-3);
        assert_eq!(hit.tile, TileId::new(1));
        assert_eq!(hit.axis, RayAxis::Vertical);
        assert_close(hit.point.x, 320.0, 1e-3);
    }

    #[test]
    fn ray_from_centre_hits_north_wall_on_horizontal_line() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Perspective, false));

        let hit = game.cast_ray(&player, FRAC_PI_2);

        assert_close(hit.distance, 120.0, 1e-3);
        assert_eq!(hit.axis, RayAxis::Horizontal);
    }

    #[test]
    fn single_axis_rays_only_cross_their_own_lines() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Perspective, false));

        let vertical = game.raycast(&player, 0.0, RayAxis::Vertical);
        let horizontal = game.raycast(&player, 0.0, RayAxis::Horizontal);

        assert_close(vertical.distance, 120.0, 1e-3);
        assert!(vertical.is_hit());
        assert!(!horizontal.is_hit());
        assert_close(horizontal.distance, DEFAULT_MAX_RAY_BLOCKS * 80.0, 1e-3);
    }

    #[test]
    fn dda_matches_nearer_axis_family() {
        let world = WorldMap::from_text("111111\n100001\n102001\n100031\n111111\n")
            .expect("valid map");
        let player = Player::spawn(&world, BlockCoord::new(1, 1), PlayerTuning::default())
            .expect("inside map");
        let game = Game::new(&world, settings(ProjectionMode::Perspective, false));

        for step in 0..24 {
            let angle = 0.13 + step as f32 * (PI / 12.0);
            let dda = game.cast_ray(&player, angle);
            let horizontal = game.raycast(&player, angle, RayAxis::Horizontal);
            let vertical = game.raycast(&player, angle, RayAxis::Vertical);
            let nearer = if horizontal.distance <= vertical.distance {
                horizontal
            } else {
                vertical
            };

            assert_close(dda.distance, nearer.distance, 1e-2);
            assert_eq!(dda.tile, nearer.tile, "angle {angle}");
        }
    }

    #[test]
    fn rays_that_leave_an_open_map_report_max_length() {
        let world = WorldMap::from_text("000\n000\n000\n").expect("valid map");
        let player = Player::spawn(&world, BlockCoord::new(1, 1), PlayerTuning::default())
            .expect("inside map");
        let game = Game::new(&world, settings(ProjectionMode::Perspective, false));

        let hit = game.cast_ray(&player, 0.4);

        assert!(!hit.is_hit());
        assert_eq!(hit.tile, TileId::EMPTY);
        assert_close(hit.distance, DEFAULT_MAX_RAY_BLOCKS * 80.0, 1e-3);
    }

    #[test]
    fn rays_past_the_length_limit_report_max_length() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let short = RenderSettings::new(
            Viewport::new(64, 48),
            ProjectionMode::Perspective,
            50.0,
            false,
        )
        .expect("valid settings");
        let game = Game::new(&world, short);

        let hit = game.cast_ray(&player, 0.0);

        assert!(!hit.is_hit());
        assert_close(hit.distance, 50.0, 1e-3);
    }

    #[test]
    fn draw_emits_one_column_per_pixel() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Perspective, false));

        let frame = game.draw(&player);

        assert_eq!(frame.columns.len(), 320);
        for (index, column) in frame.columns.iter().enumerate() {
            assert_eq!(column.column as usize, index);
            assert!(column.height >= 0.0);
            assert!(column.height <= 240.0);
            assert_close(column.top * 2.0 + column.height, 240.0, 1e-3);
        }
    }

    #[test]
    fn centre_column_uses_perspective_height() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Perspective, false));

        let frame = game.draw(&player);
        let centre = frame.columns[160];
        let plane = game.projection_plane_distance(&player);

        assert_close(plane, 160.0 / (30.0f32).to_radians().tan(), 1e-2);
        let expected = (80.0 * plane / centre.distance).min(240.0);
        assert_close(centre.height, expected, 1e-2);
        assert_eq!(centre.axis, RayAxis::Vertical);
        assert!(!centre.shaded);
    }

    #[test]
    fn horizontal_hits_are_shaded() {
        let world = WorldMap::debug();
        let tuning = PlayerTuning::new(4.0, FRAC_PI_2 - 0.01, 60.0).expect("valid tuning");
        let mut player = Player::spawn(&world, BlockCoord::new(2, 2), tuning).expect("inside map");
        let game = Game::new(&world, settings(ProjectionMode::Perspective, false));

        let frame = game.frame(&mut player, MoveIntent::new(0.0, 0.0, 1.0), FRAME);
        let centre = frame.columns[160];

        assert_close(player.direction(), FRAC_PI_2, 1e-2);
        assert_eq!(centre.axis, RayAxis::Horizontal);
        assert!(centre.shaded);
    }

    #[test]
    fn orthographic_projection_fills_constant_height() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Orthographic, false));

        let frame = game.draw(&player);

        for column in frame.columns.iter().filter(|column| column.tile.is_solid()) {
            assert_close(column.height, 240.0 * ORTHOGRAPHIC_FILL, 1e-3);
        }
    }

    #[test]
    fn gaussian_projection_stays_within_floor_and_viewport() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Gaussian, false));

        let frame = game.draw(&player);

        for column in &frame.columns {
            assert!(column.height >= 24.0 - 1e-3);
            assert!(column.height <= 240.0);
        }
    }

    #[test]
    fn gaussian_falloff_weights_squared_distance_by_cosine_once() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Gaussian, false));
        let angle = player.direction() - player.field_of_view() * 0.5;
        let hit = game.cast_ray(&player, angle);
        let cosine = (angle - player.direction()).cos();
        let variance = (GAUSSIAN_SPREAD_BLOCKS * world.block_size()).powi(2);

        let frame = game.draw(&player);

        let expected = 0.9 * 240.0 * (-0.5 * hit.distance.powi(2) * cosine / variance).exp()
            + 0.1 * 240.0;
        assert_close(frame.columns[0].height, expected, 1e-2);
    }

    #[test]
    fn minimap_lists_solid_blocks() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Perspective, false));

        let minimap = game.draw(&player).minimap;

        assert_eq!(minimap.blocks.len(), 17);
        assert_close(minimap.block_size, 16.0, 1e-3);
        assert_eq!(minimap.extent, Vec2::splat(80.0));
        assert_close(minimap.player.x, 40.0, 1e-3);
        assert_close(minimap.player_radius, 2.0, 1e-3);
        assert!(minimap.background);
        assert!(minimap.heading.is_empty());
        assert!(minimap.ray_hits.is_empty());
    }

    #[test]
    fn debug_minimap_carries_heading_and_hits() {
        let world = WorldMap::debug();
        let player = centre_player(&world);
        let game = Game::new(&world, settings(ProjectionMode::Perspective, true));

        let minimap = game.draw(&player).minimap;

        assert!(!minimap.background);
        assert_eq!(minimap.heading.len(), 3);
        for segment in &minimap.heading {
            assert_close(segment.from.distance(segment.to), 8.0, 1e-3);
        }
        assert_eq!(minimap.ray_hits.len(), 320);
    }
}
