//! Read-only views of the simulation for renderers, UIs and the harness.

use crate::components::{Carrying, ColonistId, ColonistState};
use crate::ledger::ItemStack;
use crate::tasks::{Task, TaskId};
use colony_logic::rooms::{Region, RegionBounds, RegionId};
use colony_logic::Cell;
use serde::{Deserialize, Serialize};

/// Per-colonist status for status text and progress bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonistView {
    pub id: ColonistId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub cell: Cell,
    pub state: ColonistState,
    pub carrying: Option<Carrying>,
    pub task: Option<TaskId>,
    /// Fraction of the current task's work threshold, 0.0 to 1.0.
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionView {
    pub id: RegionId,
    pub area: usize,
    pub boundary: usize,
    pub bounds: RegionBounds,
}

impl From<&Region> for RegionView {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id,
            area: region.area(),
            boundary: region.boundary.len(),
            bounds: region.bounds,
        }
    }
}

/// Whole-simulation dump, serialized by the harness with `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    /// Glyph rows, `y = 0` first.
    pub grid: Vec<String>,
    pub colonists: Vec<ColonistView>,
    pub tasks: Vec<Task>,
    pub stacks: Vec<ItemStack>,
    pub regions: Vec<RegionView>,
    pub selected_region: Option<RegionId>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
