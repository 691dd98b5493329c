use glam::Vec2;
use rustcaster_core::{RayAxis, TileId};
use rustcaster_world::WorldMap;

/// Relative difference under which two crossing distances count as the same corner.
pub const DIST_ERR_TOLERANCE: f32 = 0.03;

/// Result of casting a single ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Euclidean distance from the origin to the hit, or the maximum ray length on a miss.
    pub distance: f32,
    /// Tile that stopped the ray, [`TileId::EMPTY`] on a miss.
    pub tile: TileId,
    /// Grid line family crossed last.
    pub axis: RayAxis,
    /// World-space point where the ray stopped.
    pub point: Vec2,
    /// Whether the hit lies so close to a block corner that the struck face is unreliable.
    pub ambiguous: bool,
}

impl RayHit {
    /// Reports whether the ray struck a wall.
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        self.tile.is_solid()
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Ray {
    pub(crate) origin: Vec2,
    pub(crate) direction: Vec2,
    pub(crate) max_length: f32,
}

impl Ray {
    pub(crate) fn new(origin: Vec2, angle: f32, max_length: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            origin,
            direction: Vec2::new(cos, sin),
            max_length,
        }
    }

    fn miss(&self, axis: RayAxis) -> RayHit {
        RayHit {
            distance: self.max_length,
            tile: TileId::EMPTY,
            axis,
            point: self.origin + self.direction * self.max_length,
            ambiguous: false,
        }
    }

    fn hit(&self, distance: f32, tile: TileId, axis: RayAxis, ambiguous: bool) -> RayHit {
        RayHit {
            distance,
            tile,
            axis,
            point: self.origin + self.direction * distance,
            ambiguous,
        }
    }
}

/// Walks the grid lines of a single family until a wall, the map edge or the length limit.
pub(crate) fn along_axis(world: &WorldMap, ray: Ray, axis: RayAxis) -> RayHit {
    let block_size = world.block_size();
    let (origin, heading) = match axis {
        RayAxis::Horizontal => (ray.origin.y, ray.direction.y),
        RayAxis::Vertical => (ray.origin.x, ray.direction.x),
    };
    if heading.abs() <= f32::EPSILON {
        return ray.miss(axis);
    }

    let step = if heading > 0.0 { 1 } else { -1 };
    let current = (origin / block_size).floor() as i32;
    let mut line = if step > 0 { current + 1 } else { current };

    loop {
        let distance = (line as f32 * block_size - origin) / heading;
        if distance > ray.max_length {
            return ray.miss(axis);
        }

        let point = ray.origin + ray.direction * distance;
        let beyond = if step > 0 { line } else { line - 1 };
        let (column, row) = match axis {
            RayAxis::Horizontal => ((point.x / block_size).floor() as i32, beyond),
            RayAxis::Vertical => (beyond, (point.y / block_size).floor() as i32),
        };
        if !world.contains_block(column, row) {
            return ray.miss(axis);
        }

        let tile = world.tile_at(column, row);
        if tile.is_solid() {
            return ray.hit(distance, tile, axis, false);
        }
        line += step;
    }
}

/// Digital differential analysis: always advances to the nearer of the next
/// vertical or horizontal grid line.
pub(crate) fn traverse(world: &WorldMap, ray: Ray) -> RayHit {
    let block_size = world.block_size();
    let mut column = (ray.origin.x / block_size).floor() as i32;
    let mut row = (ray.origin.y / block_size).floor() as i32;
    let x = LineStepper::new(ray.origin.x, ray.direction.x, column, block_size);
    let y = LineStepper::new(ray.origin.y, ray.direction.y, row, block_size);
    let (mut next_x, mut next_y) = (x.first, y.first);

    loop {
        let (distance, axis) = if next_x < next_y {
            column += x.step;
            let distance = next_x;
            next_x += x.delta;
            (distance, RayAxis::Vertical)
        } else {
            row += y.step;
            let distance = next_y;
            next_y += y.delta;
            (distance, RayAxis::Horizontal)
        };

        if distance > ray.max_length || !world.contains_block(column, row) {
            return ray.miss(axis);
        }

        let tile = world.tile_at(column, row);
        if tile.is_solid() {
            let (other_next, other_delta) = match axis {
                RayAxis::Vertical => (next_y, y.delta),
                RayAxis::Horizontal => (next_x, x.delta),
            };
            let ambiguous = near_corner(distance, other_next)
                || near_corner(distance, other_next - other_delta);
            return ray.hit(distance, tile, axis, ambiguous);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct LineStepper {
    step: i32,
    first: f32,
    delta: f32,
}

impl LineStepper {
    fn new(origin: f32, heading: f32, cell: i32, block_size: f32) -> Self {
        if heading > f32::EPSILON {
            Self {
                step: 1,
                first: ((cell + 1) as f32 * block_size - origin) / heading,
                delta: block_size / heading,
            }
        } else if heading < -f32::EPSILON {
            Self {
                step: -1,
                first: (cell as f32 * block_size - origin) / heading,
                delta: -block_size / heading,
            }
        } else {
            Self {
                step: 0,
                first: f32::INFINITY,
                delta: f32::INFINITY,
            }
        }
    }
}

fn near_corner(distance: f32, crossing: f32) -> bool {
    crossing.is_finite()
        && crossing > 0.0
        && (distance - crossing).abs() <= DIST_ERR_TOLERANCE * distance.max(crossing)
}
