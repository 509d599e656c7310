//! 4-directional A* over walkable grid cells.
//!
//! Edge cost is uniform and the heuristic is Manhattan distance, which is
//! admissible and consistent on this grid. Ties on f-score are broken by push
//! order (oldest first), so identical inputs always yield identical routes.

use crate::grid::{Cell, Grid};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

pub fn manhattan(a: Cell, b: Cell) -> u32 {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    cell: Cell,
    g: u32,
    f: u32,
    seq: u64,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: lowest f first, then earliest push.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Walkable neighbor of `goal` closest to `start`, used when the goal itself
/// blocks movement (a tree, a wall, a chest).
fn substitute_goal(grid: &Grid, start: Cell, goal: Cell) -> Option<Cell> {
    grid.neighbors(goal)
        .filter(|&(x, y)| grid.is_walkable(x, y))
        .min_by_key(|&n| manhattan(n, start))
}

/// Shortest route from `start` to `goal`, both ends included.
///
/// A non-walkable goal is replaced by its walkable neighbor nearest to
/// `start`; with no such neighbor the search is skipped and `None` returned.
/// The start cell is never tested for walkability since the mover already
/// stands there.
pub fn find_path(grid: &Grid, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
    if !grid.in_bounds(start.0, start.1) || !grid.in_bounds(goal.0, goal.1) {
        return None;
    }

    let goal = if grid.is_walkable(goal.0, goal.1) {
        goal
    } else {
        substitute_goal(grid, start, goal)?
    };

    if start == goal {
        return Some(vec![start]);
    }

    let mut open = BinaryHeap::new();
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut g_score: HashMap<Cell, u32> = HashMap::new();
    let mut seq: u64 = 0;

    g_score.insert(start, 0);
    open.push(OpenNode {
        cell: start,
        g: 0,
        f: manhattan(start, goal),
        seq,
    });

    while let Some(current) = open.pop() {
        if current.cell == goal {
            let mut path = vec![goal];
            let mut at = goal;
            while let Some(&prev) = came_from.get(&at) {
                path.push(prev);
                at = prev;
            }
            path.reverse();
            return Some(path);
        }

        // Stale heap entry superseded by a cheaper route.
        if g_score.get(&current.cell).is_some_and(|&g| current.g > g) {
            continue;
        }

        for neighbor in grid.neighbors(current.cell) {
            if !grid.is_walkable(neighbor.0, neighbor.1) {
                continue;
            }
            let tentative = current.g + 1;
            if tentative < g_score.get(&neighbor).copied().unwrap_or(u32::MAX) {
                came_from.insert(neighbor, current.cell);
                g_score.insert(neighbor, tentative);
                seq += 1;
                open.push(OpenNode {
                    cell: neighbor,
                    g: tentative,
                    f: tentative + manhattan(neighbor, goal),
                    seq,
                });
            }
        }
    }

    None
}

/// A walkable cell adjacent to `target` to work from.
///
/// Keeps the worker where it stands if that is already adjacent, otherwise
/// picks the walkable neighbor nearest to the worker. `None` when the target
/// is walled in on all four sides.
pub fn find_work_position(grid: &Grid, target: Cell, worker: Cell) -> Option<Cell> {
    let mut best: Option<Cell> = None;
    for n in grid.neighbors(target) {
        if !grid.is_walkable(n.0, n.1) {
            continue;
        }
        if n == worker {
            return Some(n);
        }
        if best.map_or(true, |b| manhattan(n, worker) < manhattan(b, worker)) {
            best = Some(n);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::TileKind;

    fn assert_contiguous(grid: &Grid, path: &[Cell]) {
        for pair in path.windows(2) {
            assert_eq!(manhattan(pair[0], pair[1]), 1, "gap in {:?}", path);
        }
        for &(x, y) in &path[1..] {
            assert!(grid.is_walkable(x, y), "({}, {}) blocks", x, y);
        }
    }

    #[test]
    fn test_trivial_path() {
        let grid = Grid::new(5, 5);
        assert_eq!(find_path(&grid, (2, 2), (2, 2)), Some(vec![(2, 2)]));
    }

    #[test]
    fn test_straight_line() {
        let grid = Grid::new(6, 1);
        let path = find_path(&grid, (0, 0), (5, 0)).unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&(0, 0)));
        assert_eq!(path.last(), Some(&(5, 0)));
    }

    #[test]
    fn test_routes_around_wall() {
        let grid = Grid::parse(&[
            ".....",
            ".###.",
            ".#...",
            ".#.#.",
            ".....",
        ])
        .unwrap();
        let path = find_path(&grid, (2, 2), (0, 0)).unwrap();
        assert_contiguous(&grid, &path);
        // (2,2) -> (2,3) -> (2,4) -> (1,4) -> (0,4) ... -> (0,0) is 8 steps,
        // the eastern detour is also 8; either is shortest.
        assert_eq!(path.len(), 9);
    }

    #[test]
    fn test_unreachable() {
        let grid = Grid::parse(&[
            "..#..",
            "..#..",
            "..#..",
        ])
        .unwrap();
        assert_eq!(find_path(&grid, (0, 0), (4, 2)), None);
    }

    #[test]
    fn test_blocked_goal_uses_nearest_neighbor() {
        let mut grid = Grid::new(7, 7);
        grid.set(3, 3, TileKind::Tree).unwrap();
        let path = find_path(&grid, (0, 3), (3, 3)).unwrap();
        assert_eq!(path.last(), Some(&(2, 3)));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_enclosed_goal_fails_without_search() {
        let grid = Grid::parse(&[
            ".....",
            "..#..",
            ".#T#.",
            "..#..",
            ".....",
        ])
        .unwrap();
        assert_eq!(find_path(&grid, (0, 0), (2, 2)), None);
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let grid = Grid::new(3, 3);
        assert_eq!(find_path(&grid, (0, 0), (5, 5)), None);
        assert_eq!(find_path(&grid, (-1, 0), (1, 1)), None);
    }

    #[test]
    fn test_deterministic_routes() {
        let grid = Grid::new(8, 8);
        let a = find_path(&grid, (0, 0), (7, 7)).unwrap();
        let b = find_path(&grid, (0, 0), (7, 7)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 15);
    }

    #[test]
    fn test_work_position_prefers_current_cell() {
        let grid = Grid::new(5, 5);
        // Worker at (2,1) is already adjacent to (2,2).
        assert_eq!(find_work_position(&grid, (2, 2), (2, 1)), Some((2, 1)));
    }

    #[test]
    fn test_work_position_nearest_neighbor() {
        let grid = Grid::new(9, 9);
        assert_eq!(find_work_position(&grid, (4, 4), (8, 4)), Some((5, 4)));
        assert_eq!(find_work_position(&grid, (4, 4), (4, 0)), Some((4, 3)));
    }

    #[test]
    fn test_work_position_enclosed() {
        let grid = Grid::parse(&[".#.", "#R#", ".#."]).unwrap();
        assert_eq!(find_work_position(&grid, (1, 1), (0, 0)), None);
    }
}
