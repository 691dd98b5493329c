#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rustcaster engine.
//!
//! This crate defines the value types that connect the world map, the
//! movement and raycasting systems, and the rendering adapters. The world
//! answers tile queries using [`TileId`] and [`BlockCoord`], the movement
//! system consumes [`MoveIntent`] values and reports adjacency through
//! [`WallFlags`], and the raycaster describes every rendered frame with a
//! [`Frame`] that adapters translate into pixels.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Side length of a single tile measured in world units.
pub const DEFAULT_BLOCK_SIZE: f32 = 80.0;

/// Grid offsets of the four orthogonal neighbours, indexed by [`Cardinal::bit`] order.
pub const ADJACENT_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Identifier of the tile variant stored in a grid block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u16);

impl TileId {
    /// Tile that contains no wall.
    pub const EMPTY: Self = Self(0);

    /// Sentinel reported for blocks that lie outside the grid. Always solid.
    pub const BOUNDARY: Self = Self(u16::MAX);

    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Reports whether the tile blocks movement and rays.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.0 != 0
    }
}

/// Location of a single grid block expressed as column and row coordinates.
///
/// Coordinates are signed so neighbours of edge blocks can be expressed and
/// answered with [`TileId::BOUNDARY`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockCoord {
    column: i32,
    row: i32,
}

impl BlockCoord {
    /// Creates a new block coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the block.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the block.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Block adjacent to this one in the provided direction.
    #[must_use]
    pub const fn neighbour(self, direction: Cardinal) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.column + dx, self.row + dy)
    }
}

/// Orthogonal directions on the tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cardinal {
    /// Toward increasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward decreasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Cardinal {
    /// Every direction in wall flag bit order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Index of the bit that represents the direction inside [`WallFlags`].
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Column and row delta that leads to the neighbouring block.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        ADJACENT_OFFSETS[self.bit() as usize]
    }
}

/// Set of orthogonal neighbours that contain a solid tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WallFlags(u8);

impl WallFlags {
    /// Flags with no neighbour marked as solid.
    pub const EMPTY: Self = Self(0);

    /// Raw bit pattern, north in the least significant bit.
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Returns a copy of the flags with the provided direction marked as solid.
    #[must_use]
    pub const fn with(self, direction: Cardinal) -> Self {
        Self(self.0 | 1 << direction.bit())
    }

    /// Marks the provided direction as solid.
    pub fn insert(&mut self, direction: Cardinal) {
        *self = self.with(direction);
    }

    /// Reports whether the provided direction is marked as solid.
    #[must_use]
    pub const fn contains(&self, direction: Cardinal) -> bool {
        self.0 & (1 << direction.bit()) != 0
    }

    /// Iterates over the directions marked as solid in bit order.
    pub fn iter(self) -> impl Iterator<Item = Cardinal> {
        Cardinal::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

/// Movement requested by the player for a single tick.
///
/// Every channel is expected in `-1.0..=1.0`; positive values move forward,
/// strafe to the right and turn clockwise on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveIntent {
    /// Forward (positive) or backward (negative) translation.
    pub forward: f32,
    /// Rightward (positive) or leftward (negative) translation.
    pub strafe: f32,
    /// Clockwise (positive) or counter-clockwise (negative) rotation.
    pub turn: f32,
}

impl MoveIntent {
    /// Intent that leaves the player untouched.
    pub const IDLE: Self = Self {
        forward: 0.0,
        strafe: 0.0,
        turn: 0.0,
    };

    /// Creates a new movement intent.
    #[must_use]
    pub const fn new(forward: f32, strafe: f32, turn: f32) -> Self {
        Self {
            forward,
            strafe,
            turn,
        }
    }

    /// Returns the intent with every channel clamped to `-1.0..=1.0`.
    ///
    /// Non-finite channels are treated as zero.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            forward: clamp_channel(self.forward),
            strafe: clamp_channel(self.strafe),
            turn: clamp_channel(self.turn),
        }
    }
}

fn clamp_channel(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Family of grid lines a ray crosses when it hits a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RayAxis {
    /// Lines of constant `y`; hits land on north or south wall faces.
    Horizontal,
    /// Lines of constant `x`; hits land on east or west wall faces.
    Vertical,
}

/// Strategy used to convert ray distances into wall heights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    /// Height inversely proportional to the perpendicular distance.
    #[default]
    Perspective,
    /// Every wall hit is drawn with the same height.
    Orthographic,
    /// Height falls off along a gaussian curve of the distance.
    Gaussian,
}

impl ProjectionMode {
    /// Lower-case name used in configuration files and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::Orthographic => "orthographic",
            Self::Gaussian => "gaussian",
        }
    }
}

/// Opaque colour assigned to a tile variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl TileColor {
    /// Creates a new tile colour from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Adds `amount` to every channel, saturating at full intensity.
    #[must_use]
    pub const fn lightened(self, amount: u8) -> Self {
        Self {
            red: self.red.saturating_add(amount),
            green: self.green.saturating_add(amount),
            blue: self.blue.saturating_add(amount),
        }
    }

    /// Subtracts `amount` from every channel, saturating at zero.
    #[must_use]
    pub const fn darkened(self, amount: u8) -> Self {
        Self {
            red: self.red.saturating_sub(amount),
            green: self.green.saturating_sub(amount),
            blue: self.blue.saturating_sub(amount),
        }
    }
}

/// Colours indexed by [`TileId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<TileColor>,
}

impl Palette {
    /// Colour reported for tiles the palette does not describe.
    pub const FALLBACK: TileColor = TileColor::from_rgb(0xff, 0x00, 0xff);

    /// Creates a palette where the colour at index `n` belongs to `TileId::new(n)`.
    #[must_use]
    pub fn new(colors: Vec<TileColor>) -> Self {
        Self { colors }
    }

    /// Palette of the built-in debug map.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(vec![
            TileColor::from_rgb(0, 0, 0),
            TileColor::from_rgb(30, 30, 30),
            TileColor::from_rgb(20, 200, 20),
        ])
    }

    /// Palette applied to text maps, one colour per digit.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(STANDARD_COLORS.to_vec())
    }

    /// Colour assigned to the provided tile.
    #[must_use]
    pub fn color(&self, tile: TileId) -> TileColor {
        self.colors
            .get(usize::from(tile.get()))
            .copied()
            .unwrap_or(Self::FALLBACK)
    }

    /// Number of tile variants described by the palette, including the empty tile.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Reports whether the palette describes no tiles at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

const STANDARD_COLORS: [TileColor; 10] = [
    TileColor::from_rgb(0x00, 0x00, 0x00),
    TileColor::from_rgb(0x6e, 0x6e, 0x6e),
    TileColor::from_rgb(0x14, 0xc8, 0x14),
    TileColor::from_rgb(0xc8, 0x32, 0x32),
    TileColor::from_rgb(0x32, 0x5a, 0xc8),
    TileColor::from_rgb(0xd2, 0xb4, 0x28),
    TileColor::from_rgb(0x8c, 0x3c, 0xb4),
    TileColor::from_rgb(0x28, 0xb4, 0xb4),
    TileColor::from_rgb(0xc8, 0x78, 0x3c),
    TileColor::from_rgb(0xdc, 0xdc, 0xdc),
];

/// Size of the rendered 3D view in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Creates a new viewport description.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixel columns, one ray per column.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of pixel rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether either dimension is zero.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Vertical wall slice computed for a single screen column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallColumn {
    /// Zero-based screen column the slice belongs to.
    pub column: u32,
    /// Distance in pixels from the top of the viewport to the slice.
    pub top: f32,
    /// Projected slice height in pixels. Never negative.
    pub height: f32,
    /// Fish-eye corrected distance to the wall in world units.
    pub distance: f32,
    /// Tile struck by the ray, or [`TileId::EMPTY`] when nothing was hit.
    pub tile: TileId,
    /// Grid line family the ray crossed when it stopped.
    pub axis: RayAxis,
    /// Whether the slice should be drawn with side shading.
    pub shaded: bool,
}

/// Solid block drawn on the minimap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinimapBlock {
    /// Block coordinate of the wall.
    pub block: BlockCoord,
    /// Tile variant stored in the block.
    pub tile: TileId,
}

/// Line segment drawn on the minimap, expressed in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimapSegment {
    /// Start of the segment.
    pub from: Vec2,
    /// End of the segment.
    pub to: Vec2,
}

/// Top-down overlay describing the grid and the player.
#[derive(Clone, Debug, PartialEq)]
pub struct Minimap {
    /// Side length of a minimap block in pixels.
    pub block_size: f32,
    /// Pixel size of the whole grid on the minimap.
    pub extent: Vec2,
    /// Whether a backdrop should be drawn behind the blocks.
    pub background: bool,
    /// Solid blocks in row-major order.
    pub blocks: Vec<MinimapBlock>,
    /// Player marker centre in pixels.
    pub player: Vec2,
    /// Player marker radius in pixels.
    pub player_radius: f32,
    /// Heading and field-of-view edges. Empty unless debugging.
    pub heading: Vec<MinimapSegment>,
    /// Ray hit points in pixels. Empty unless debugging.
    pub ray_hits: Vec<Vec2>,
}

/// Everything a rendering adapter needs to present one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Viewport the frame was computed for.
    pub viewport: Viewport,
    /// One wall slice per viewport column, ordered left to right.
    pub columns: Vec<WallColumn>,
    /// Minimap overlay.
    pub minimap: Minimap,
}
