use rustcaster_core::TileId;

use crate::MapFormatError;

const COMMENT_PREFIX: char = ';';

/// Rectangular grid parsed from a text map.
#[derive(Debug)]
pub(crate) struct TextGrid {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) tiles: Vec<TileId>,
}

pub(crate) fn parse(text: &str) -> Result<TextGrid, MapFormatError> {
    let mut width = None;
    let mut height = 0;
    let mut tiles = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let row = line.trim_end();
        if row.is_empty() || row.starts_with(COMMENT_PREFIX) {
            continue;
        }

        let mut found = 0;
        for (column, symbol) in row.chars().enumerate() {
            let digit = symbol
                .to_digit(10)
                .ok_or(MapFormatError::UnknownSymbol {
                    line: line_number,
                    column: column + 1,
                    symbol,
                })?;
            tiles.push(TileId::new(digit as u16));
            found += 1;
        }

        let expected = *width.get_or_insert(found);
        if found != expected {
            return Err(MapFormatError::RaggedRow {
                line: line_number,
                expected,
                found,
            });
        }
        height += 1;
    }

    match width {
        Some(width) => Ok(TextGrid {
            width,
            height,
            tiles,
        }),
        None => Err(MapFormatError::Empty),
    }
}
