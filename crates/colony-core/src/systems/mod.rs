//! Systems - per-tick logic that operates on colonists and shared stores.
//!
//! Run order within a tick: pickup synthesis, assignment, movement, work,
//! wandering.

mod hauling;
mod movement;
mod scheduler;
mod wandering;
mod work;

pub use hauling::*;
pub use movement::*;
pub use scheduler::*;
pub use wandering::*;
pub use work::*;

pub(crate) use work::{clear_job, release_job};
