//! Room detection by flood fill.
//!
//! A room is a maximal 4-connected set of non-enclosing cells that never
//! touches the grid edge. Walls and doors enclose; everything else (including
//! trees and furniture) is room interior. Detection is a full rescan: rooms
//! are rebuilt from scratch and receive fresh ids every time.

use crate::grid::{Cell, Grid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// Inclusive bounding box of a room's interior cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl RegionBounds {
    fn around(cells: &[Cell]) -> Self {
        let mut bounds = RegionBounds {
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
        };
        for &(x, y) in cells {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }
        bounds
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Interior cells, sorted.
    pub cells: Vec<Cell>,
    /// Wall and door cells orthogonally adjacent to the interior, sorted.
    pub boundary: Vec<Cell>,
    pub bounds: RegionBounds,
}

impl Region {
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.binary_search(&cell).is_ok()
    }
}

/// Hands out region ids that stay unique across rescans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionDetector {
    next_id: u32,
}

impl RegionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescan the whole grid.
    pub fn detect_regions(&mut self, grid: &Grid) -> Vec<Region> {
        let mut visited = vec![false; grid.len()];
        let mut regions = Vec::new();
        let mut stack: Vec<Cell> = Vec::new();

        for seed in grid.cells() {
            let Some(seed_idx) = grid.index(seed.0, seed.1) else {
                continue;
            };
            if visited[seed_idx] || grid.get(seed.0, seed.1).is_some_and(|t| t.encloses()) {
                continue;
            }

            let mut cells = Vec::new();
            let mut touches_edge = false;
            visited[seed_idx] = true;
            stack.push(seed);

            while let Some(cell) = stack.pop() {
                touches_edge |= grid.is_edge(cell.0, cell.1);
                cells.push(cell);
                for n in grid.neighbors(cell) {
                    let Some(idx) = grid.index(n.0, n.1) else {
                        continue;
                    };
                    if visited[idx] || grid.get(n.0, n.1).is_some_and(|t| t.encloses()) {
                        continue;
                    }
                    visited[idx] = true;
                    stack.push(n);
                }
            }

            if touches_edge {
                continue;
            }

            let boundary: BTreeSet<Cell> = cells
                .iter()
                .flat_map(|&c| grid.neighbors(c))
                .filter(|&(x, y)| grid.get(x, y).is_some_and(|t| t.encloses()))
                .collect();

            cells.sort_unstable();
            let bounds = RegionBounds::around(&cells);
            regions.push(Region {
                id: RegionId(self.next_id),
                cells,
                boundary: boundary.into_iter().collect(),
                bounds,
            });
            self.next_id += 1;
        }

        regions
    }
}

/// Region containing `cell`, if any.
pub fn region_at(regions: &[Region], cell: Cell) -> Option<&Region> {
    regions.iter().find(|r| r.contains(cell))
}
