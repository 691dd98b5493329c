use image::RgbaImage;
use rustcaster_core::{Palette, TileColor, TileId};

use crate::MapFormatError;

/// Largest number of wall variants an image may introduce.
const MAX_VARIANTS: usize = (u16::MAX - 1) as usize;

/// Grid decoded from a map image together with the colours it introduced.
#[derive(Debug)]
pub(crate) struct PictureGrid {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) tiles: Vec<TileId>,
    pub(crate) palette: Palette,
}

pub(crate) fn parse(image: &RgbaImage) -> Result<PictureGrid, MapFormatError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(MapFormatError::Empty);
    }

    let mut colors = vec![TileColor::from_rgb(0, 0, 0)];
    let mut tiles = Vec::with_capacity(width as usize * height as usize);

    for pixel in image.pixels() {
        let [red, green, blue, alpha] = pixel.0;
        if alpha == 0 {
            tiles.push(TileId::EMPTY);
            continue;
        }

        let color = TileColor::from_rgb(red, green, blue);
        let variant = match colors.iter().skip(1).position(|known| *known == color) {
            Some(position) => position + 1,
            None => {
                if colors.len() > MAX_VARIANTS {
                    return Err(MapFormatError::TooManyVariants {
                        limit: MAX_VARIANTS,
                    });
                }
                colors.push(color);
                colors.len() - 1
            }
        };
        tiles.push(TileId::new(variant as u16));
    }

    Ok(PictureGrid {
        width: width as usize,
        height: height as usize,
        tiles,
        palette: Palette::new(colors),
    })
}
