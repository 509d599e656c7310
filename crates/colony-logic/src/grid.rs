//! Fixed-size rectangular tile grid.
//!
//! Out-of-bounds coordinates are an ordinary outcome here: reads return
//! `None`, writes return [`GridError::OutOfBounds`], and every predicate
//! answers `false`.

use crate::tiles::TileKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grid coordinates `(x, y)`.
pub type Cell = (i32, i32);

/// Cardinal neighbor offsets, in the order neighbors are visited.
pub const CARDINAL_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("map row {row} has width {found}, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },
    #[error("map has no rows")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
}

/// Cell count for a `width` x `height` grid, computed in `usize`.
fn tile_count(width: i32, height: i32) -> usize {
    width.max(0) as usize * height.max(0) as usize
}

impl Grid {
    /// A grid filled with the default open tile.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![TileKind::default(); tile_count(width, height)],
        }
    }

    /// Parse a map from rows of tile glyphs, top row first (y = 0).
    /// Unknown glyphs become the default open tile.
    pub fn parse(rows: &[&str]) -> Result<Self, GridError> {
        let expected = rows.first().ok_or(GridError::Empty)?.chars().count();
        let mut tiles = Vec::with_capacity(expected * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(GridError::RaggedRow { row, expected, found });
            }
            tiles.extend(line.chars().map(TileKind::from_glyph));
        }
        Ok(Self {
            width: expected as i32,
            height: rows.len() as i32,
            tiles,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// True for cells on the outermost ring of the grid.
    pub fn is_edge(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && (x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1)
    }

    /// Row-major index of an in-bounds cell.
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, x: i32, y: i32) -> Option<TileKind> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    pub fn set(&mut self, x: i32, y: i32, tile: TileKind) -> Result<(), GridError> {
        let i = self.index(x, y).ok_or(GridError::OutOfBounds { x, y })?;
        self.tiles[i] = tile;
        Ok(())
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(|t| t.info().walkable)
    }

    pub fn is_buildable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(|t| t.info().buildable)
    }

    pub fn is_gatherable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(|t| t.info().gather.is_some())
    }

    pub fn is_demolishable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(|t| t.info().demolishable)
    }

    pub fn is_storage(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(|t| t.info().storage)
    }

    /// In-bounds 4-neighbors of `cell`, in [`CARDINAL_OFFSETS`] order.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        CARDINAL_OFFSETS
            .iter()
            .map(move |(dx, dy)| (cell.0 + dx, cell.1 + dy))
            .filter(move |&(x, y)| self.in_bounds(x, y))
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    pub fn storage_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(|&(x, y)| self.is_storage(x, y))
    }

    /// Render the grid as glyph rows, mirroring [`Grid::parse`].
    pub fn dump(&self) -> String {
        let mut out = String::with_capacity(tile_count(self.width + 1, self.height));
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(self.get(x, y).unwrap_or_default().glyph());
            }
            out.push('\n');
        }
        out
    }
}
