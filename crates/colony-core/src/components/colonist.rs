//! Colonist components: identity, position, route, carried stack, job.
//!
//! A colonist's state is read off which components it has:
//!
//! | Components | State |
//! |------------|-------|
//! | `Job` + `Movement` | Traversing |
//! | `Job` only | Working |
//! | `Wandering` + `Movement` | Wandering |
//! | neither | Idle |

use crate::tasks::TaskId;
use colony_logic::{Cell, ResourceType, TileKind};
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

/// Stable colonist identifier, assigned in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColonistId(pub u32);

impl std::fmt::Display for ColonistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "colonist#{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colonist {
    pub id: ColonistId,
    pub name: String,
}

/// Continuous position. Cell centers sit on integer coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn at_cell(cell: Cell) -> Self {
        Self::new(cell.0 as f32, cell.1 as f32)
    }

    pub fn cell(&self) -> Cell {
        (self.x.round() as i32, self.y.round() as i32)
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Route being followed. Present only while the colonist is moving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub route: Vec<Cell>,
    /// Index of the waypoint currently being walked to.
    pub index: usize,
}

impl Movement {
    pub fn new(route: Vec<Cell>) -> Self {
        Self { route, index: 0 }
    }

    pub fn next_waypoint(&self) -> Option<Cell> {
        self.route.get(self.index).copied()
    }

    /// Continuous target of the current waypoint.
    pub fn target(&self) -> Option<Position> {
        self.next_waypoint().map(Position::at_cell)
    }

    pub fn destination(&self) -> Option<Cell> {
        self.route.last().copied()
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.route.len()
    }
}

/// Resource stack held in the colonist's hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrying {
    pub resource: ResourceType,
    pub amount: u32,
}

/// The task a colonist has claimed, plus its work progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub task: TaskId,
    pub progress: u32,
    /// Set on the first work tick at the site.
    pub started: bool,
    /// Tile at the target before work began (builds and demolitions).
    pub original: Option<TileKind>,
}

impl Job {
    pub fn new(task: TaskId) -> Self {
        Self {
            task,
            progress: 0,
            started: false,
            original: None,
        }
    }
}

/// Marker for idle-filler movement with no task behind it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Wandering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColonistState {
    Idle,
    Wandering,
    Traversing,
    Working,
}

impl ColonistState {
    pub fn of(world: &World, entity: Entity) -> Self {
        let has_job = world.get::<&Job>(entity).is_ok();
        let moving = world.get::<&Movement>(entity).is_ok();
        match (has_job, moving) {
            (true, true) => ColonistState::Traversing,
            (true, false) => ColonistState::Working,
            (false, true) if world.get::<&Wandering>(entity).is_ok() => ColonistState::Wandering,
            _ => ColonistState::Idle,
        }
    }
}

/// Clone a component out of the world so no borrow outlives the call.
pub(crate) fn component<T: hecs::Component + Clone>(world: &World, entity: Entity) -> Option<T> {
    world.get::<&T>(entity).ok().map(|c| (*c).clone())
}
