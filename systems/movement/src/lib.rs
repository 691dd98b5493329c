#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player state and the per-tick movement and collision pipeline.
//!
//! Each tick runs three stages in a fixed order: [`Player::find_walls`]
//! samples the four neighbours of the block the player currently stands in,
//! [`Player::step`] turns a [`MoveIntent`] into a candidate pose without
//! touching the committed one, and [`Player::collide`] clamps the candidate
//! against the sampled walls before [`Player::tick`] commits it.

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use rustcaster_core::{BlockCoord, Cardinal, MoveIntent, WallFlags};
use rustcaster_world::WorldMap;
use thiserror::Error;
use tracing::trace;

/// Frame duration the step size and turn speed are expressed against.
pub const REFERENCE_FRAME_SECONDS: f32 = 1.0 / 60.0;

/// Longest frame delta honoured by a single tick. Longer stalls are truncated.
pub const MAX_TICK: Duration = Duration::from_millis(100);

/// Clearance kept between the player and the face of a solid neighbour.
pub const COLLISION_MARGIN: f32 = 1.0;

const INITIAL_DIRECTION: f32 = 0.01;

/// Movement and view constants of a player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerTuning {
    step_size: f32,
    turn_speed: f32,
    field_of_view: f32,
}

impl PlayerTuning {
    /// World units travelled per reference frame at full forward intent.
    pub const DEFAULT_STEP_SIZE: f32 = 4.0;
    /// Radians turned per reference frame at full turn intent.
    pub const DEFAULT_TURN_SPEED: f32 = 0.03;
    /// Horizontal field of view in degrees.
    pub const DEFAULT_FIELD_OF_VIEW: f32 = 60.0;

    /// Creates validated tuning values.
    ///
    /// `field_of_view` is expressed in degrees and must lie strictly between 0 and 180.
    pub fn new(step_size: f32, turn_speed: f32, field_of_view: f32) -> Result<Self, PlayerError> {
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(PlayerError::InvalidStepSize { step_size });
        }
        if !turn_speed.is_finite() || turn_speed <= 0.0 {
            return Err(PlayerError::InvalidTurnSpeed { turn_speed });
        }
        if !field_of_view.is_finite() || field_of_view <= 0.0 || field_of_view >= 180.0 {
            return Err(PlayerError::InvalidFieldOfView { field_of_view });
        }

        Ok(Self {
            step_size,
            turn_speed,
            field_of_view,
        })
    }

    /// World units travelled per reference frame.
    #[must_use]
    pub const fn step_size(&self) -> f32 {
        self.step_size
    }

    /// Radians turned per reference frame.
    #[must_use]
    pub const fn turn_speed(&self) -> f32 {
        self.turn_speed
    }

    /// Field of view in degrees.
    #[must_use]
    pub const fn field_of_view(&self) -> f32 {
        self.field_of_view
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            step_size: Self::DEFAULT_STEP_SIZE,
            turn_speed: Self::DEFAULT_TURN_SPEED,
            field_of_view: Self::DEFAULT_FIELD_OF_VIEW,
        }
    }
}

/// Errors raised while constructing a player.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum PlayerError {
    /// The requested start block does not exist in the map.
    #[error("start block ({column}, {row}) lies outside the {width}x{height} map")]
    StartOutOfBounds {
        /// Requested start column.
        column: i32,
        /// Requested start row.
        row: i32,
        /// Number of columns in the map.
        width: u32,
        /// Number of rows in the map.
        height: u32,
    },
    /// Step size was zero, negative or not finite.
    #[error("step size must be positive and finite (received {step_size})")]
    InvalidStepSize {
        /// Rejected value.
        step_size: f32,
    },
    /// Turn speed was zero, negative or not finite.
    #[error("turn speed must be positive and finite (received {turn_speed})")]
    InvalidTurnSpeed {
        /// Rejected value.
        turn_speed: f32,
    },
    /// Field of view fell outside the open interval (0, 180) degrees.
    #[error("field of view must lie strictly between 0 and 180 degrees (received {field_of_view})")]
    InvalidFieldOfView {
        /// Rejected value in degrees.
        field_of_view: f32,
    },
}

/// Pose proposed by [`Player::step`] before collision resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Proposed world-space position.
    pub position: Vec2,
    /// Proposed heading in radians, normalised to `0..TAU`.
    pub direction: f32,
}

/// Player pose inside a [`WorldMap`].
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    position: Vec2,
    direction: f32,
    block: BlockCoord,
    tuning: PlayerTuning,
}

impl Player {
    /// Places a player at the centre of the provided block.
    pub fn spawn(
        world: &WorldMap,
        start: BlockCoord,
        tuning: PlayerTuning,
    ) -> Result<Self, PlayerError> {
        if !world.contains_block(start.column(), start.row()) {
            return Err(PlayerError::StartOutOfBounds {
                column: start.column(),
                row: start.row(),
                width: world.width(),
                height: world.height(),
            });
        }

        Ok(Self {
            position: world.block_center(start),
            direction: INITIAL_DIRECTION,
            block: start,
            tuning,
        })
    }

    /// Committed world-space position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Committed heading in radians.
    #[must_use]
    pub const fn direction(&self) -> f32 {
        self.direction
    }

    /// Block sampled by the most recent [`Player::find_walls`].
    #[must_use]
    pub const fn block(&self) -> BlockCoord {
        self.block
    }

    /// Movement and view constants.
    #[must_use]
    pub const fn tuning(&self) -> PlayerTuning {
        self.tuning
    }

    /// Field of view in radians.
    #[must_use]
    pub fn field_of_view(&self) -> f32 {
        self.tuning.field_of_view.to_radians()
    }

    /// Unit vector pointing `offset_degrees` clockwise of the heading.
    #[must_use]
    pub fn direction_vector(&self, offset_degrees: f32) -> Vec2 {
        unit_vector(self.direction + offset_degrees.to_radians())
    }

    /// Refreshes the current block and reports which neighbours are solid.
    pub fn find_walls(&mut self, world: &WorldMap) -> WallFlags {
        self.block = world.block_of(self.position);

        let mut flags = WallFlags::EMPTY;
        for direction in Cardinal::ALL {
            if world.is_solid(self.block.neighbour(direction)) {
                flags.insert(direction);
            }
        }
        flags
    }

    /// Proposes the pose reached by applying `intent` for `dt`.
    ///
    /// Turning is applied first so translation follows the new heading.
    /// Translation is capped at half a block per tick.
    #[must_use]
    pub fn step(&self, world: &WorldMap, intent: MoveIntent, dt: Duration) -> Candidate {
        let intent = intent.clamped();
        let elapsed = dt.min(MAX_TICK).as_secs_f32() / REFERENCE_FRAME_SECONDS;

        let direction =
            (self.direction + intent.turn * self.tuning.turn_speed * elapsed).rem_euclid(TAU);
        let forward = unit_vector(direction);
        let right = forward.perp();
        let displacement = (forward * intent.forward + right * intent.strafe)
            * self.tuning.step_size
            * elapsed;

        Candidate {
            position: self.position + displacement.clamp_length_max(world.block_size() * 0.5),
            direction,
        }
    }

    /// Clamps `candidate` so it cannot cross into a neighbour marked in `flags`.
    ///
    /// North and south walls clamp `y`, east and west walls clamp `x`, always
    /// against the faces of the block sampled by [`Player::find_walls`]. A
    /// candidate that still ends up in a different solid block (a diagonal
    /// corner) slides along whichever axis remains open.
    #[must_use]
    pub fn collide(&self, world: &WorldMap, flags: WallFlags, candidate: Vec2) -> Vec2 {
        let block_size = world.block_size();
        let low = Vec2::new(
            self.block.column() as f32 * block_size,
            self.block.row() as f32 * block_size,
        );
        let high = low + Vec2::splat(block_size);

        let mut resolved = candidate;
        for direction in flags.iter() {
            match direction {
                Cardinal::North => resolved.y = resolved.y.min(high.y - COLLISION_MARGIN),
                Cardinal::East => resolved.x = resolved.x.min(high.x - COLLISION_MARGIN),
                Cardinal::South => resolved.y = resolved.y.max(low.y + COLLISION_MARGIN),
                Cardinal::West => resolved.x = resolved.x.max(low.x + COLLISION_MARGIN),
            }
        }

        if !self.admits(world, resolved) {
            let slides = [
                Vec2::new(resolved.x, self.position.y),
                Vec2::new(self.position.x, resolved.y),
            ];
            resolved = slides
                .into_iter()
                .find(|slide| self.admits(world, *slide))
                .unwrap_or(self.position);
        }

        if resolved != candidate {
            trace!(
                flags = flags.bits(),
                candidate = ?candidate,
                resolved = ?resolved,
                "player collision resolved"
            );
        }

        resolved
    }

    /// Runs one simulation tick and returns the wall flags it sampled.
    pub fn tick(&mut self, world: &WorldMap, intent: MoveIntent, dt: Duration) -> WallFlags {
        let flags = self.find_walls(world);
        let candidate = self.step(world, intent, dt);
        self.position = self.collide(world, flags, candidate.position);
        self.direction = candidate.direction;
        flags
    }

    fn admits(&self, world: &WorldMap, position: Vec2) -> bool {
        if !world.in_boundaries(position.x, position.y) {
            return false;
        }
        let block = world.block_of(position);
        block == self.block || !world.is_solid(block)
    }
}

fn unit_vector(angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(cos, sin)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn player_at(world: &WorldMap, column: i32, row: i32) -> Player {
        Player::spawn(world, BlockCoord::new(column, row), PlayerTuning::default())
            .expect("start inside map")
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() <= 1e-2,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn spawn_centres_player_in_block() {
        let world = WorldMap::debug();
        let player = player_at(&world, 1, 1);

        assert_eq!(player.position(), Vec2::new(120.0, 120.0));
        assert_eq!(player.block(), BlockCoord::new(1, 1));
        assert_close(player.direction(), INITIAL_DIRECTION);
    }

    #[test]
    fn spawn_rejects_blocks_outside_map() {
        let world = WorldMap::debug();
        let error = Player::spawn(&world, BlockCoord::new(5, 1), PlayerTuning::default())
            .expect_err("column 5 does not exist");

        assert_eq!(
            error,
            PlayerError::StartOutOfBounds {
                column: 5,
                row: 1,
                width: 5,
                height: 5
            }
        );
    }

    #[test]
    fn tuning_rejects_invalid_values() {
        assert!(matches!(
            PlayerTuning::new(0.0, 0.03, 60.0),
            Err(PlayerError::InvalidStepSize { .. })
        ));
        assert!(matches!(
            PlayerTuning::new(4.0, f32::NAN, 60.0),
            Err(PlayerError::InvalidTurnSpeed { .. })
        ));
        assert!(matches!(
            PlayerTuning::new(4.0, 0.03, 180.0),
            Err(PlayerError::InvalidFieldOfView { .. })
        ));
        assert!(PlayerTuning::new(4.0, 0.03, 90.0).is_ok());
    }

    #[test]
    fn direction_vector_is_unit_length() {
        let world = WorldMap::debug();
        let player = player_at(&world, 2, 2);

        for offset in [0.0, 30.0, -30.0, 90.0, 275.5] {
            assert_close(player.direction_vector(offset).length(), 1.0);
        }
        let forward = player.direction_vector(0.0);
        assert_close(forward.x, INITIAL_DIRECTION.cos());
        assert_close(forward.y, INITIAL_DIRECTION.sin());
    }

    #[test]
    fn find_walls_reports_no_walls_around_centre_tile() {
        let world = WorldMap::debug();
        let mut player = player_at(&world, 2, 2);

        assert_eq!(player.find_walls(&world), WallFlags::EMPTY);
    }

    #[test]
    fn find_walls_reports_south_and_west_in_corner() {
        let world = WorldMap::debug();
        let mut player = player_at(&world, 1, 1);

        let flags = player.find_walls(&world);

        assert_eq!(
            flags,
            WallFlags::EMPTY
                .with(Cardinal::South)
                .with(Cardinal::West)
        );
    }

    #[test]
    fn find_walls_sets_bit_zero_for_wall_at_next_row() {
        let world = WorldMap::from_text("000\n000\n010\n").expect("valid map");
        let mut player = player_at(&world, 1, 1);

        let flags = player.find_walls(&world);

        assert_eq!(flags.bits(), 0b0001);
        assert!(flags.contains(Cardinal::North));
    }

    #[test]
    fn idle_step_keeps_pose() {
        let world = WorldMap::debug();
        let player = player_at(&world, 2, 2);

        let candidate = player.step(&world, MoveIntent::IDLE, FRAME);

        assert_eq!(candidate.position, player.position());
        assert_close(candidate.direction, player.direction());
    }

    #[test]
    fn forward_step_moves_along_heading() {
        let world = WorldMap::debug();
        let player = player_at(&world, 2, 2);

        let candidate = player.step(&world, MoveIntent::new(1.0, 0.0, 0.0), FRAME);
        let travelled = candidate.position - player.position();

        assert_close(travelled.length(), PlayerTuning::DEFAULT_STEP_SIZE);
        assert!(travelled.x > 0.0);
        assert_eq!(player.position(), Vec2::new(200.0, 200.0));
    }

    #[test]
    fn strafe_moves_perpendicular_to_heading() {
        let world = WorldMap::debug();
        let player = player_at(&world, 2, 2);

        let candidate = player.step(&world, MoveIntent::new(0.0, 1.0, 0.0), FRAME);
        let travelled = candidate.position - player.position();

        assert_close(travelled.dot(player.direction_vector(0.0)), 0.0);
        assert!(travelled.y > 0.0);
    }

    #[test]
    fn turning_scales_with_turn_speed() {
        let world = WorldMap::debug();
        let player = player_at(&world, 2, 2);

        let candidate = player.step(&world, MoveIntent::new(0.0, 0.0, -1.0), FRAME);

        let expected = (INITIAL_DIRECTION - PlayerTuning::DEFAULT_TURN_SPEED).rem_euclid(TAU);
        assert_close(candidate.direction, expected);
    }

    #[test]
    fn long_frames_are_truncated() {
        let world = WorldMap::debug();
        let player = player_at(&world, 2, 2);

        let stalled = player.step(&world, MoveIntent::new(1.0, 0.0, 0.0), Duration::from_secs(5));
        let capped = player.step(&world, MoveIntent::new(1.0, 0.0, 0.0), MAX_TICK);

        assert_eq!(stalled, capped);
        assert!((stalled.position - player.position()).length() <= world.block_size() * 0.5);
    }

    #[test]
    fn collide_clamps_against_south_and_west_walls() {
        let world = WorldMap::debug();
        let mut player = player_at(&world, 1, 1);
        let flags = player.find_walls(&world);

        let resolved = player.collide(&world, flags, Vec2::new(60.0, 70.0));

        assert_eq!(resolved, Vec2::new(80.0 + COLLISION_MARGIN, 80.0 + COLLISION_MARGIN));
    }

    #[test]
    fn collide_keeps_player_inside_block_with_north_wall() {
        let world = WorldMap::from_text("111\n101\n111\n").expect("valid map");
        let mut player = player_at(&world, 1, 1);
        let flags = player.find_walls(&world);
        assert!(flags.contains(Cardinal::North));

        let resolved = player.collide(&world, flags, Vec2::new(150.0, 170.0));

        assert!(resolved.y < 2.0 * world.block_size());
        assert_eq!(resolved, Vec2::new(150.0, 160.0 - COLLISION_MARGIN));
    }

    #[test]
    fn collide_leaves_open_directions_untouched() {
        let world = WorldMap::debug();
        let mut player = player_at(&world, 1, 1);
        let flags = player.find_walls(&world);

        let resolved = player.collide(&world, flags, Vec2::new(150.0, 150.0));

        assert_eq!(resolved, Vec2::new(150.0, 150.0));
    }

    #[test]
    fn collide_slides_past_diagonal_corner() {
        let world =
            WorldMap::from_text("11111\n10001\n10001\n10011\n11111\n").expect("valid map");
        let mut player = player_at(&world, 2, 2);
        player.position = Vec2::new(235.0, 235.0);
        let flags = player.find_walls(&world);
        assert_eq!(flags, WallFlags::EMPTY);

        let resolved = player.collide(&world, flags, Vec2::new(245.0, 245.0));

        assert_eq!(resolved, Vec2::new(245.0, 235.0));
    }

    #[test]
    fn tick_commits_collided_candidate() {
        let world = WorldMap::debug();
        let mut player = player_at(&world, 1, 1);
        player.direction = std::f32::consts::PI;

        for _ in 0..60 {
            let _ = player.tick(&world, MoveIntent::new(1.0, 0.0, 0.0), FRAME);
        }

        assert_eq!(player.block(), BlockCoord::new(1, 1));
        assert_close(player.position().x, 80.0 + COLLISION_MARGIN);
        assert!(world.in_boundaries(player.position().x, player.position().y));
    }
}
