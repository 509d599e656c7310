//! Shared task queue and task factories.
//!
//! Tasks live in insertion order; the scheduler scans oldest first. A task
//! is either unassigned or owned by exactly one colonist, and is removed from
//! the queue when it completes, is invalidated, or is cancelled.
//!
//! Factories validate their input against the grid and the ledger and return
//! a [`TaskError`] instead of a task when the request cannot be honored. For
//! builds the cost is paid at creation, after every other check has passed,
//! so a rejected request never touches the ledger.

use crate::components::ColonistId;
use crate::ledger::{ResourceLedger, StackId, StackLocation};
use colony_logic::catalog::{BuildingKind, Cost, FurnitureKind};
use colony_logic::{Cell, Grid, ResourceType, TileKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Gather,
    Build(BuildingKind),
    Furniture(FurnitureKind),
    Demolish,
    Haul { resource: ResourceType },
    Pickup { stack: StackId },
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Gather => "gather",
            TaskKind::Build(_) => "build",
            TaskKind::Furniture(_) => "furniture",
            TaskKind::Demolish => "demolish",
            TaskKind::Haul { .. } => "haul",
            TaskKind::Pickup { .. } => "pickup",
        }
    }

    /// Pickup and haul are performed on the target cell itself and complete
    /// on arrival. Everything else is worked from an adjacent cell.
    pub fn is_cell_direct(&self) -> bool {
        matches!(self, TaskKind::Haul { .. } | TaskKind::Pickup { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Unassigned,
    Assigned(ColonistId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub kind: TaskKind,
    pub target: Cell,
    pub state: TaskState,
    /// Continuation enqueued at the same target when this task completes.
    pub then: Option<TaskKind>,
}

impl Task {
    pub fn is_unassigned(&self) -> bool {
        self.state == TaskState::Unassigned
    }

    pub fn owner(&self) -> Option<ColonistId> {
        match self.state {
            TaskState::Assigned(colonist) => Some(colonist),
            TaskState::Unassigned => None,
        }
    }

    /// Whether the world still permits this task. Invalid tasks are retired.
    pub fn is_valid(&self, grid: &Grid, ledger: &ResourceLedger) -> bool {
        let (x, y) = self.target;
        match self.kind {
            TaskKind::Gather => grid.is_gatherable(x, y),
            TaskKind::Demolish => grid.is_demolishable(x, y),
            TaskKind::Build(_) | TaskKind::Furniture(_) => {
                grid.is_buildable(x, y) || grid.get(x, y) == Some(TileKind::Construction)
            }
            TaskKind::Pickup { stack } => ledger
                .stack(stack)
                .is_some_and(|s| s.location == StackLocation::Ground),
            TaskKind::Haul { .. } => grid.in_bounds(x, y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("nothing to gather at ({x}, {y})")]
    NotGatherable { x: i32, y: i32 },
    #[error("cannot build on ({x}, {y})")]
    NotBuildable { x: i32, y: i32 },
    #[error("nothing to demolish at ({x}, {y})")]
    NotDemolishable { x: i32, y: i32 },
    #[error("a {kind} task already targets ({x}, {y})")]
    AlreadyQueued { kind: &'static str, x: i32, y: i32 },
    #[error("cannot afford {0:?}")]
    Insufficient(Cost),
    #[error("no ground stack {0:?}")]
    NoSuchStack(StackId),
    #[error("nothing to pick up at ({x}, {y})")]
    NothingToPickUp { x: i32, y: i32 },
    #[error("no task {0}")]
    NoSuchTask(TaskId),
    #[error("({x}, {y}) cannot store {}", .resource.name())]
    NoStorage { x: i32, y: i32, resource: ResourceType },
    #[error("cannot stock zero {} at ({x}, {y})", .resource.name())]
    ZeroAmount { x: i32, y: i32, resource: ResourceType },
    #[error("({x}, {y}) is not a stockpile")]
    NotStorage { x: i32, y: i32 },
    #[error("unknown building or furniture {0:?}")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQueue {
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Append a task to the back of the queue.
    pub fn push(&mut self, kind: TaskKind, target: Cell, then: Option<TaskKind>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            kind,
            target,
            state: TaskState::Unassigned,
            then,
        });
        id
    }

    /// Pending task at `target` whose kind matches `pred`.
    pub fn pending_at(&self, target: Cell, pred: impl Fn(&TaskKind) -> bool) -> Option<&Task> {
        self.tasks.iter().find(|t| t.target == target && pred(&t.kind))
    }

    pub fn has_pickup_for(&self, stack: StackId) -> bool {
        self.tasks
            .iter()
            .any(|t| t.kind == TaskKind::Pickup { stack })
    }

    /// Hand an unassigned task to `colonist`. Returns false if it was
    /// already owned or does not exist.
    pub fn assign(&mut self, id: TaskId, colonist: ColonistId) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) if task.is_unassigned() => {
                task.state = TaskState::Assigned(colonist);
                true
            }
            Some(task) => {
                log::warn!("{} already assigned, refusing {}", task.id, colonist);
                false
            }
            None => false,
        }
    }

    /// Return an assigned task to the queue.
    pub fn release(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.state = TaskState::Unassigned;
        }
    }

    /// Remove a task, returning it.
    pub fn retire(&mut self, id: TaskId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    /// Task count per kind name, for overlay legends.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for task in &self.tasks {
            *counts.entry(task.kind.name()).or_insert(0) += 1;
        }
        counts
    }

    fn check_bounds(grid: &Grid, x: i32, y: i32) -> Result<(), TaskError> {
        if grid.in_bounds(x, y) {
            Ok(())
        } else {
            Err(TaskError::OutOfBounds { x, y })
        }
    }

    fn check_not_queued(&self, x: i32, y: i32, kind: &'static str, pred: impl Fn(&TaskKind) -> bool) -> Result<(), TaskError> {
        match self.pending_at((x, y), pred) {
            Some(_) => Err(TaskError::AlreadyQueued { kind, x, y }),
            None => Ok(()),
        }
    }

    fn is_site_work(kind: &TaskKind) -> bool {
        matches!(
            kind,
            TaskKind::Build(_) | TaskKind::Furniture(_) | TaskKind::Demolish
        )
    }

    pub fn create_gather(&mut self, grid: &Grid, x: i32, y: i32) -> Result<TaskId, TaskError> {
        Self::check_bounds(grid, x, y)?;
        if !grid.is_gatherable(x, y) {
            return Err(TaskError::NotGatherable { x, y });
        }
        self.check_not_queued(x, y, "gather", |k| *k == TaskKind::Gather)?;
        Ok(self.push(TaskKind::Gather, (x, y), None))
    }

    pub fn create_demolish(&mut self, grid: &Grid, x: i32, y: i32) -> Result<TaskId, TaskError> {
        Self::check_bounds(grid, x, y)?;
        if !grid.is_demolishable(x, y) {
            return Err(TaskError::NotDemolishable { x, y });
        }
        self.check_not_queued(x, y, "demolish", Self::is_site_work)?;
        Ok(self.push(TaskKind::Demolish, (x, y), None))
    }

    /// Queue a building. A door placed over a wall becomes a demolish task
    /// that carries the door build as its continuation.
    pub fn create_build(
        &mut self,
        grid: &Grid,
        ledger: &mut ResourceLedger,
        x: i32,
        y: i32,
        building: BuildingKind,
    ) -> Result<TaskId, TaskError> {
        Self::check_bounds(grid, x, y)?;
        let door_over_wall = building == BuildingKind::Door && grid.get(x, y) == Some(TileKind::Wall);
        if !door_over_wall && !grid.is_buildable(x, y) {
            return Err(TaskError::NotBuildable { x, y });
        }
        self.check_not_queued(x, y, "build", Self::is_site_work)?;
        let cost = building.cost();
        ledger
            .pay(&cost)
            .map_err(|_| TaskError::Insufficient(cost.clone()))?;

        let id = if door_over_wall {
            self.push(TaskKind::Demolish, (x, y), Some(TaskKind::Build(building)))
        } else {
            self.push(TaskKind::Build(building), (x, y), None)
        };
        Ok(id)
    }

    pub fn create_furniture(
        &mut self,
        grid: &Grid,
        ledger: &mut ResourceLedger,
        x: i32,
        y: i32,
        furniture: FurnitureKind,
    ) -> Result<TaskId, TaskError> {
        Self::check_bounds(grid, x, y)?;
        if !grid.is_buildable(x, y) {
            return Err(TaskError::NotBuildable { x, y });
        }
        self.check_not_queued(x, y, "furniture", Self::is_site_work)?;
        let cost = furniture.cost();
        ledger
            .pay(&cost)
            .map_err(|_| TaskError::Insufficient(cost.clone()))?;
        Ok(self.push(TaskKind::Furniture(furniture), (x, y), None))
    }

    pub fn create_pickup(&mut self, ledger: &ResourceLedger, stack: StackId) -> Result<TaskId, TaskError> {
        let cell = ledger
            .stack(stack)
            .filter(|s| s.location == StackLocation::Ground)
            .map(|s| s.cell)
            .ok_or(TaskError::NoSuchStack(stack))?;
        if self.has_pickup_for(stack) {
            return Err(TaskError::AlreadyQueued {
                kind: "pickup",
                x: cell.0,
                y: cell.1,
            });
        }
        Ok(self.push(TaskKind::Pickup { stack }, cell, None))
    }

    /// Queue a haul of `resource` into the storage cell at `(x, y)`.
    pub fn create_haul(
        &mut self,
        grid: &Grid,
        ledger: &ResourceLedger,
        x: i32,
        y: i32,
        resource: ResourceType,
    ) -> Result<TaskId, TaskError> {
        Self::check_bounds(grid, x, y)?;
        let accepts = grid.is_storage(x, y)
            && ledger
                .storage_stack_at((x, y))
                .map_or(true, |s| s.resource == resource);
        if !accepts {
            return Err(TaskError::NoStorage { x, y, resource });
        }
        Ok(self.push(TaskKind::Haul { resource }, (x, y), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_logic::catalog::cost;

    fn stocked(wood: u32) -> ResourceLedger {
        let mut ledger = ResourceLedger::new();
        if wood > 0 {
            ledger.deposit((0, 0), ResourceType::Wood, wood).unwrap();
        }
        ledger
    }

    #[test]
    fn test_gather_requires_gatherable_and_unique() {
        let grid = Grid::parse(&["S.T", "..."]).unwrap();
        let mut queue = TaskQueue::new();
        assert_eq!(
            queue.create_gather(&grid, 1, 0),
            Err(TaskError::NotGatherable { x: 1, y: 0 })
        );
        assert!(queue.create_gather(&grid, 2, 0).is_ok());
        assert_eq!(
            queue.create_gather(&grid, 2, 0),
            Err(TaskError::AlreadyQueued {
                kind: "gather",
                x: 2,
                y: 0
            })
        );
        assert_eq!(
            queue.create_gather(&grid, 7, 0),
            Err(TaskError::OutOfBounds { x: 7, y: 0 })
        );
    }

    #[test]
    fn test_build_pays_cost_once() {
        let grid = Grid::new(5, 5);
        let mut ledger = stocked(2);
        let mut queue = TaskQueue::new();
        queue
            .create_build(&grid, &mut ledger, 2, 2, BuildingKind::Wall)
            .unwrap();
        assert_eq!(ledger.stored_total(ResourceType::Wood), 1);

        // Duplicate is rejected before payment.
        assert!(queue
            .create_build(&grid, &mut ledger, 2, 2, BuildingKind::Wall)
            .is_err());
        assert_eq!(ledger.stored_total(ResourceType::Wood), 1);
    }

    #[test]
    fn test_unaffordable_build_is_rejected() {
        let grid = Grid::new(5, 5);
        let mut ledger = stocked(1);
        let mut queue = TaskQueue::new();
        let err = queue
            .create_build(&grid, &mut ledger, 1, 1, BuildingKind::Door)
            .unwrap_err();
        assert_eq!(err, TaskError::Insufficient(cost(&[(ResourceType::Wood, 2)])));
        assert!(queue.is_empty());
        assert_eq!(ledger.stored_total(ResourceType::Wood), 1);
    }

    #[test]
    fn test_door_over_wall_becomes_demolish_with_follow_up() {
        let grid = Grid::parse(&["...", ".#.", "..."]).unwrap();
        let mut ledger = stocked(2);
        let mut queue = TaskQueue::new();
        let id = queue
            .create_build(&grid, &mut ledger, 1, 1, BuildingKind::Door)
            .unwrap();
        let task = queue.get(id).unwrap();
        assert_eq!(task.kind, TaskKind::Demolish);
        assert_eq!(task.then, Some(TaskKind::Build(BuildingKind::Door)));
        assert_eq!(ledger.stored_total(ResourceType::Wood), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_wall_over_wall_is_not_buildable() {
        let grid = Grid::parse(&["#"]).unwrap();
        let mut ledger = stocked(5);
        let mut queue = TaskQueue::new();
        assert_eq!(
            queue.create_build(&grid, &mut ledger, 0, 0, BuildingKind::Wall),
            Err(TaskError::NotBuildable { x: 0, y: 0 })
        );
    }

    #[test]
    fn test_assign_is_exclusive() {
        let grid = Grid::parse(&["T"]).unwrap();
        let mut queue = TaskQueue::new();
        let id = queue.create_gather(&grid, 0, 0).unwrap();
        assert!(queue.assign(id, ColonistId(0)));
        assert!(!queue.assign(id, ColonistId(1)));
        assert_eq!(queue.get(id).unwrap().owner(), Some(ColonistId(0)));
        queue.release(id);
        assert!(queue.get(id).unwrap().is_unassigned());
        assert!(queue.retire(id).is_some());
        assert!(queue.retire(id).is_none());
    }

    #[test]
    fn test_pickup_requires_ground_stack() {
        let mut ledger = ResourceLedger::new();
        let stored = ledger.deposit((0, 0), ResourceType::Wood, 1).unwrap();
        let ground = ledger.drop_on_ground((3, 3), ResourceType::Wood, 1).unwrap();
        let mut queue = TaskQueue::new();
        assert_eq!(
            queue.create_pickup(&ledger, stored),
            Err(TaskError::NoSuchStack(stored))
        );
        let id = queue.create_pickup(&ledger, ground).unwrap();
        assert_eq!(queue.get(id).unwrap().target, (3, 3));
        assert!(queue.create_pickup(&ledger, ground).is_err());
    }

    #[test]
    fn test_haul_rejects_incompatible_storage() {
        let grid = Grid::parse(&["S.S"]).unwrap();
        let mut ledger = ResourceLedger::new();
        ledger.deposit((0, 0), ResourceType::Stone, 1).unwrap();
        let mut queue = TaskQueue::new();
        assert!(queue.create_haul(&grid, &ledger, 0, 0, ResourceType::Wood).is_err());
        assert!(queue.create_haul(&grid, &ledger, 1, 0, ResourceType::Wood).is_err());
        assert!(queue.create_haul(&grid, &ledger, 2, 0, ResourceType::Wood).is_ok());
    }

    #[test]
    fn test_task_validity_tracks_grid() {
        let mut grid = Grid::parse(&["T"]).unwrap();
        let ledger = ResourceLedger::new();
        let mut queue = TaskQueue::new();
        let id = queue.create_gather(&grid, 0, 0).unwrap();
        assert!(queue.get(id).unwrap().is_valid(&grid, &ledger));
        grid.set(0, 0, TileKind::Stump).unwrap();
        assert!(!queue.get(id).unwrap().is_valid(&grid, &ledger));
    }

    #[test]
    fn test_counts() {
        let grid = Grid::parse(&["TT#"]).unwrap();
        let mut queue = TaskQueue::new();
        queue.create_gather(&grid, 0, 0).unwrap();
        queue.create_gather(&grid, 1, 0).unwrap();
        queue.create_demolish(&grid, 2, 0).unwrap();
        let counts = queue.counts();
        assert_eq!(counts.get("gather"), Some(&2));
        assert_eq!(counts.get("demolish"), Some(&1));
    }
}
