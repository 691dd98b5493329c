#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static tile grid that the player walks through and rays are cast against.
//!
//! A [`WorldMap`] is built once from a [`MapSource`] and never mutated. Every
//! query is range-checked: blocks outside the grid report
//! [`TileId::BOUNDARY`], which counts as solid, so callers never index past
//! the edge of the map.

mod picture;
mod text;

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use glam::Vec2;
use rustcaster_core::{BlockCoord, Palette, TileId, DEFAULT_BLOCK_SIZE};
use thiserror::Error;
use tracing::{debug, info};

const DEBUG_MAP: [[u16; 5]; 5] = [
    [1, 1, 1, 1, 1],
    [1, 0, 0, 0, 1],
    [1, 0, 2, 0, 1],
    [1, 0, 0, 0, 1],
    [1, 1, 1, 1, 1],
];

/// Where the tile grid is read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapSource {
    /// Built-in 5×5 map: a ring of walls around an open room with a pillar in the centre.
    Debug,
    /// Map file on disk. Files with a `.png` extension are decoded as images,
    /// everything else is parsed as a text map.
    File(PathBuf),
}

impl MapSource {
    /// Creates a file-backed source.
    #[must_use]
    pub fn file<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self::File(path.into())
    }
}

impl fmt::Display for MapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => f.write_str("<debug map>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reasons a map source could not be turned into a tile grid.
#[derive(Debug, Error)]
pub enum MapFormatError {
    /// The source did not contain a single row of tiles.
    #[error("map contains no rows")]
    Empty,
    /// A row's length differs from the first row.
    #[error("row on line {line} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// One-based line number of the offending row.
        line: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A text map contained a character that is not a tile digit.
    #[error("unknown tile symbol `{symbol}` on line {line}, column {column}")]
    UnknownSymbol {
        /// One-based line number.
        line: usize,
        /// One-based character column.
        column: usize,
        /// Character that could not be interpreted.
        symbol: char,
    },
    /// An image map used more distinct colours than tile identifiers exist.
    #[error("map uses more than {limit} tile variants")]
    TooManyVariants {
        /// Largest supported number of wall variants.
        limit: usize,
    },
    /// The grid is too large to be addressed with block coordinates.
    #[error("map dimensions {width}x{height} exceed the supported grid size")]
    TooLarge {
        /// Number of columns in the source.
        width: usize,
        /// Number of rows in the source.
        height: usize,
    },
    /// The map file could not be read.
    #[error("failed to read map `{}`", .path.display())]
    Io {
        /// Path of the map file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The map image could not be decoded.
    #[error("failed to decode map image `{}`", .path.display())]
    Image {
        /// Path of the map image.
        path: PathBuf,
        /// Underlying decoder failure.
        #[source]
        source: image::ImageError,
    },
}

/// Immutable tile grid together with its world-space geometry and colours.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldMap {
    width: u32,
    height: u32,
    block_size: f32,
    tiles: Vec<TileId>,
    palette: Palette,
}

impl WorldMap {
    /// Loads the grid described by `source`.
    ///
    /// Malformed sources fail as a whole; no partial grid is ever produced.
    pub fn load(source: &MapSource) -> Result<Self, MapFormatError> {
        let world = match source {
            MapSource::Debug => Self::debug(),
            MapSource::File(path) => Self::from_path(path)?,
        };

        info!(
            source = %source,
            columns = world.width,
            rows = world.height,
            "world map loaded"
        );
        debug!(variants = world.palette.len(), "world palette resolved");

        Ok(world)
    }

    /// Built-in 5×5 debug map with its own palette.
    #[must_use]
    pub fn debug() -> Self {
        let tiles = DEBUG_MAP
            .iter()
            .flat_map(|row| row.iter().copied().map(TileId::new))
            .collect();

        Self {
            width: 5,
            height: 5,
            block_size: DEFAULT_BLOCK_SIZE,
            tiles,
            palette: Palette::debug(),
        }
    }

    /// Parses a text map: one line per row, one digit per tile.
    ///
    /// Blank lines and lines starting with `;` are ignored.
    pub fn from_text(text: &str) -> Result<Self, MapFormatError> {
        let grid = text::parse(text)?;
        Self::from_tiles(grid.width, grid.height, grid.tiles, Palette::standard())
    }

    /// Builds a map from an image where every distinct opaque colour is a wall
    /// variant and fully transparent pixels are empty.
    pub fn from_image(image: &image::RgbaImage) -> Result<Self, MapFormatError> {
        let grid = picture::parse(image)?;
        Self::from_tiles(grid.width, grid.height, grid.tiles, grid.palette)
    }

    fn from_path(path: &Path) -> Result<Self, MapFormatError> {
        if is_image_path(path) {
            let image = image::open(path)
                .map_err(|source| MapFormatError::Image {
                    path: path.to_path_buf(),
                    source,
                })?
                .to_rgba8();
            return Self::from_image(&image);
        }

        let text = fs::read_to_string(path).map_err(|source| MapFormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text)
    }

    fn from_tiles(
        width: usize,
        height: usize,
        tiles: Vec<TileId>,
        palette: Palette,
    ) -> Result<Self, MapFormatError> {
        if width == 0 || height == 0 {
            return Err(MapFormatError::Empty);
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(MapFormatError::TooLarge { width, height });
        }
        debug_assert_eq!(tiles.len(), width * height);

        Ok(Self {
            width: width as u32,
            height: height as u32,
            block_size: DEFAULT_BLOCK_SIZE,
            tiles,
            palette,
        })
    }

    /// Number of block columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of block rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Side length of a block in world units.
    #[must_use]
    pub const fn block_size(&self) -> f32 {
        self.block_size
    }

    /// Width of the playable area in world units.
    #[must_use]
    pub fn world_width(&self) -> f32 {
        self.width as f32 * self.block_size
    }

    /// Height of the playable area in world units.
    #[must_use]
    pub fn world_height(&self) -> f32 {
        self.height as f32 * self.block_size
    }

    /// Colours of the tile variants used by the map.
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Reports whether the block coordinate lies inside the grid.
    #[must_use]
    pub fn contains_block(&self, column: i32, row: i32) -> bool {
        column >= 0 && row >= 0 && (column as u32) < self.width && (row as u32) < self.height
    }

    /// Tile stored at the block coordinate, or [`TileId::BOUNDARY`] outside the grid.
    #[must_use]
    pub fn tile_at(&self, column: i32, row: i32) -> TileId {
        if !self.contains_block(column, row) {
            return TileId::BOUNDARY;
        }

        let index = row as usize * self.width as usize + column as usize;
        self.tiles.get(index).copied().unwrap_or(TileId::BOUNDARY)
    }

    /// Tile stored in the provided block.
    #[must_use]
    pub fn tile(&self, block: BlockCoord) -> TileId {
        self.tile_at(block.column(), block.row())
    }

    /// Reports whether the block blocks movement. Blocks outside the grid are solid.
    #[must_use]
    pub fn is_solid(&self, block: BlockCoord) -> bool {
        self.tile(block).is_solid()
    }

    /// Reports whether the world-space point lies inside the grid.
    ///
    /// Lower edges are inclusive, upper edges exclusive.
    #[must_use]
    pub fn in_boundaries(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.world_width() && y < self.world_height()
    }

    /// Block containing the world-space position, truncating toward zero.
    #[must_use]
    pub fn block_of(&self, position: Vec2) -> BlockCoord {
        BlockCoord::new(
            (position.x / self.block_size) as i32,
            (position.y / self.block_size) as i32,
        )
    }

    /// World-space centre of the provided block.
    #[must_use]
    pub fn block_center(&self, block: BlockCoord) -> Vec2 {
        Vec2::new(
            (block.column() as f32 + 0.5) * self.block_size,
            (block.row() as f32 + 0.5) * self.block_size,
        )
    }

    /// Iterates over every block in row-major order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockCoord, TileId)> + '_ {
        let width = self.width as usize;
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let column = (index % width) as i32;
            let row = (index / width) as i32;
            (BlockCoord::new(column, row), *tile)
        })
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}
