//! Pure simulation logic for the colony simulation.
//!
//! This crate contains the grid-level logic that is independent of the ECS
//! engine. Functions take plain data and return results, making them
//! unit-testable and reusable from the engine, the headless harness, and
//! benchmarks alike.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`tiles`] | Tile kinds, resource types, and their static metadata |
//! | [`catalog`] | Building and furniture catalogs (costs + resulting tiles) |
//! | [`grid`] | Fixed-size tile grid with bounds-checked reads and writes |
//! | [`pathfinding`] | 4-directional A* and work-position resolution |
//! | [`rooms`] | Flood-fill detection of enclosed regions |

pub mod catalog;
pub mod grid;
pub mod pathfinding;
pub mod rooms;
pub mod tiles;

pub use grid::{Cell, Grid, GridError};
pub use tiles::{ResourceType, TileInfo, TileKind};
