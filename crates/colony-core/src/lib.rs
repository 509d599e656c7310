//! Colony Core - Colony Simulation Engine
//!
//! Autonomous colonists on a 2D tile grid discover work, route around
//! obstacles and cooperate through a shared task queue. The grid-level
//! algorithms (pathfinding, room detection, tile catalog) live in
//! `colony-logic`; this crate owns the mutable simulation state and the
//! per-tick systems that drive it.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: One per colonist
//! - **Components**: Position, Movement, Job, Carrying, Wandering
//! - **Systems**: Pickup synthesis, assignment, movement, work, wandering
//!
//! Shared stores (grid, task queue, resource ledger, regions) are owned by
//! [`SimulationEngine`](engine::SimulationEngine) and passed explicitly to
//! each system. Everything runs single-threaded, one tick at a time.
//!
//! # Example
//!
//! ```rust,no_run
//! use colony_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(SimConfig::default());
//! engine.designate_storage(0, 0).unwrap();
//! engine.set_tile(5, 5, TileKind::Tree).unwrap();
//! engine.populate();
//! engine.create_gather(5, 5).unwrap();
//!
//! for _ in 0..600 {
//!     engine.update();
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod snapshot;
pub mod systems;
pub mod tasks;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::engine::SimulationEngine;
    pub use crate::ledger::{ResourceLedger, StackId};
    pub use crate::snapshot::{ColonistView, Snapshot};
    pub use crate::tasks::{Task, TaskError, TaskId, TaskKind, TaskState};
    pub use colony_logic::catalog::{BuildingKind, FurnitureKind};
    pub use colony_logic::{Cell, Grid, ResourceType, TileKind};
}
