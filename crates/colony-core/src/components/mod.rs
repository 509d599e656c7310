//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to colonist entities.
//! They have no behavior - that lives in systems.

mod colonist;

pub use colonist::*;
