#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Rustcaster adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use rustcaster_core::{Frame, MoveIntent, Palette, TileColor, Viewport};
use std::time::Duration;

/// Byte amount added to side-shaded walls and removed from minimap blocks.
pub const SIDE_SHADE: u8 = 20;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from a tile palette entry.
    #[must_use]
    pub const fn from_tile(color: TileColor) -> Self {
        Self::from_rgb_u8(color.red(), color.green(), color.blue())
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Movement requested for this frame.
    pub intent: MoveIntent,
    /// Whether the adapter detected a debug overlay toggle on this frame.
    pub toggle_debug: bool,
}

/// Vertical wall slice drawn into a single screen column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSlice {
    /// Zero-based screen column.
    pub column: u32,
    /// Distance in pixels from the top of the viewport.
    pub top: f32,
    /// Slice height in pixels.
    pub height: f32,
    /// Fill color.
    pub color: Color,
}

/// Filled square drawn on the minimap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimapBlockPresentation {
    /// Upper-left corner in pixels.
    pub origin: Vec2,
    /// Side length in pixels.
    pub size: f32,
    /// Fill color.
    pub color: Color,
}

/// Line drawn on the minimap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimapLine {
    /// Start of the line in pixels.
    pub from: Vec2,
    /// End of the line in pixels.
    pub to: Vec2,
}

/// Top-down overlay drawn over the upper-left corner of the view.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimapPresentation {
    /// Backdrop size and color, absent while debugging.
    pub backdrop: Option<(Vec2, Color)>,
    /// Wall blocks.
    pub blocks: Vec<MinimapBlockPresentation>,
    /// Player marker centre in pixels.
    pub player: Vec2,
    /// Player marker radius in pixels.
    pub player_radius: f32,
    /// Heading and field-of-view edges.
    pub lines: Vec<MinimapLine>,
    /// Ray hit points.
    pub points: Vec<Vec2>,
}

impl MinimapPresentation {
    /// Backdrop color behind the minimap blocks.
    pub const BACKDROP_COLOR: Color = Color::from_rgb_u8(120, 120, 120);
    /// Player marker color.
    pub const PLAYER_COLOR: Color = Color::from_rgb_u8(50, 0, 150);
    /// Heading line color.
    pub const LINE_COLOR: Color = Color::from_rgb_u8(255, 255, 255);
    /// Ray hit marker color.
    pub const POINT_COLOR: Color = Color::from_rgb_u8(0, 255, 255);
}

/// Scene description combining the 3D view and the minimap.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Viewport the scene was computed for.
    pub viewport: Viewport,
    /// Wall slices ordered left to right. Columns without a wall are omitted.
    pub walls: Vec<WallSlice>,
    /// Minimap overlay.
    pub minimap: MinimapPresentation,
}

impl Scene {
    /// Converts a computed frame into drawable primitives.
    #[must_use]
    pub fn from_frame(frame: &Frame, palette: &Palette) -> Self {
        let walls = frame
            .columns
            .iter()
            .filter(|column| column.tile.is_solid() && column.height > 0.0)
            .map(|column| {
                let base = palette.color(column.tile);
                let color = if column.shaded {
                    base.lightened(SIDE_SHADE)
                } else {
                    base
                };
                WallSlice {
                    column: column.column,
                    top: column.top,
                    height: column.height,
                    color: Color::from_tile(color),
                }
            })
            .collect();

        let minimap = &frame.minimap;
        let blocks = minimap
            .blocks
            .iter()
            .map(|block| MinimapBlockPresentation {
                origin: Vec2::new(
                    block.block.column() as f32 * minimap.block_size,
                    block.block.row() as f32 * minimap.block_size,
                ),
                size: minimap.block_size,
                color: Color::from_tile(palette.color(block.tile).darkened(SIDE_SHADE)),
            })
            .collect();

        Self {
            viewport: frame.viewport,
            walls,
            minimap: MinimapPresentation {
                backdrop: minimap
                    .background
                    .then_some((minimap.extent, MinimapPresentation::BACKDROP_COLOR)),
                blocks,
                player: minimap.player,
                player_radius: minimap.player_radius,
                lines: minimap
                    .heading
                    .iter()
                    .map(|segment| MinimapLine {
                        from: segment.from,
                        to: segment.to,
                    })
                    .collect(),
                points: minimap.ray_hits.clone(),
            },
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Rustcaster scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and replaces the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}
