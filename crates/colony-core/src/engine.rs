//! Simulation engine - main entry point for running the colony simulation

use crate::components::*;
use crate::config::{ColonistConfig, SimConfig};
use crate::ledger::{LedgerError, ResourceLedger, StackId};
use crate::snapshot::{ColonistView, RegionView, Snapshot};
use crate::systems::*;
use crate::tasks::{Task, TaskError, TaskId, TaskKind, TaskQueue};
use colony_logic::catalog::{BuildingKind, Cost, FurnitureKind};
use colony_logic::pathfinding::manhattan;
use colony_logic::rooms::{self, Region, RegionDetector, RegionId};
use colony_logic::{Cell, Grid, GridError, ResourceType, TileKind};
use hecs::{Entity, World};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const NAMES: [&str; 8] = ["Ada", "Bo", "Cyd", "Dara", "Eli", "Fen", "Gus", "Hana"];

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world holding one entity per colonist
    pub world: World,
    pub grid: Grid,
    pub tasks: TaskQueue,
    pub ledger: ResourceLedger,

    regions: Vec<Region>,
    detector: RegionDetector,
    selected_region: Option<RegionId>,
    /// Colonist entities in spawn order; index equals `ColonistId`
    roster: Vec<Entity>,
    rng: SmallRng,
    config: SimConfig,
    tick: u64,
    regions_dirty: bool,
}

impl SimulationEngine {
    /// Create an empty, all-grass world sized by `config`
    pub fn new(config: SimConfig) -> Self {
        let grid = Grid::new(config.world.width, config.world.height);
        Self::with_grid(config, grid)
    }

    /// Create a simulation over a prepared map. The grid's own size wins
    /// over the configured one.
    pub fn with_grid(config: SimConfig, grid: Grid) -> Self {
        if config.colonists.speed > ColonistConfig::MAX_SPEED {
            log::warn!(
                "colonist speed {} capped at {} cells per tick",
                config.colonists.speed,
                ColonistConfig::MAX_SPEED
            );
        }
        let mut detector = RegionDetector::new();
        let regions = detector.detect_regions(&grid);
        Self {
            world: World::new(),
            grid,
            tasks: TaskQueue::new(),
            ledger: ResourceLedger::new(),
            regions,
            detector,
            selected_region: None,
            roster: Vec::new(),
            rng: SmallRng::seed_from_u64(config.world.seed),
            config,
            tick: 0,
            regions_dirty: false,
        }
    }

    /// Spawn a colonist on a walkable cell.
    pub fn spawn_colonist(&mut self, cell: Cell) -> Option<ColonistId> {
        if !self.grid.is_walkable(cell.0, cell.1) {
            return None;
        }
        let index = self.roster.len();
        let id = ColonistId(index as u32);
        let name = match index / NAMES.len() {
            0 => NAMES[index].to_string(),
            round => format!("{} {}", NAMES[index % NAMES.len()], round + 1),
        };
        let entity = self.world.spawn((Colonist { id, name: name.clone() }, Position::at_cell(cell)));
        self.roster.push(entity);
        log::info!("{} ({}) spawned at {:?}", id, name, cell);
        Some(id)
    }

    /// Spawn the configured number of colonists on free walkable cells
    /// nearest the map center.
    pub fn populate(&mut self) -> Vec<ColonistId> {
        let center = (self.grid.width() / 2, self.grid.height() / 2);
        let occupied: Vec<Cell> = self
            .world
            .query::<(&Colonist, &Position)>()
            .iter()
            .map(|(_, (_, pos))| pos.cell())
            .collect();
        let mut free: Vec<Cell> = self
            .grid
            .cells()
            .filter(|&(x, y)| self.grid.is_walkable(x, y))
            .filter(|c| !occupied.contains(c))
            .collect();
        free.sort_by_key(|&c| manhattan(c, center));

        free.into_iter()
            .take(self.config.colonists.count as usize)
            .filter_map(|cell| self.spawn_colonist(cell))
            .collect()
    }

    /// Advance the simulation by one tick.
    pub fn update(&mut self) -> WorkReport {
        self.tick += 1;

        synthesize_pickup_tasks(&self.grid, &self.ledger, &mut self.tasks);
        assign_tasks(&mut self.world, &self.roster, &self.grid, &self.ledger, &mut self.tasks);
        movement_system(
            &mut self.world,
            &self.roster,
            &self.grid,
            &mut self.tasks,
            self.config.colonists.effective_speed(),
        );
        let report = work_system(
            &mut self.world,
            &self.roster,
            &mut self.grid,
            &mut self.ledger,
            &mut self.tasks,
            &self.config.work,
        );
        wandering_system(
            &mut self.world,
            &self.roster,
            &self.grid,
            &mut self.rng,
            &self.config.wander,
        );

        if report.topology_changed {
            self.regions_dirty = true;
        }
        if self.regions_dirty {
            self.rescan_regions();
        }
        report
    }

    /// Run `ticks` updates, returning every task completed along the way.
    pub fn run(&mut self, ticks: u64) -> Vec<(TaskId, TaskKind)> {
        let mut completed = Vec::new();
        for _ in 0..ticks {
            completed.extend(self.update().completed);
        }
        completed
    }

    fn rescan_regions(&mut self) {
        self.regions = self.detector.detect_regions(&self.grid);
        self.regions_dirty = false;
        log::info!("tick {}: rescanned regions, {} found", self.tick, self.regions.len());

        if let Some(selected) = self.selected_region {
            if !self.regions.iter().any(|r| r.id == selected) {
                self.selected_region = None;
                log::debug!("selected region {:?} vanished", selected);
            }
        }
    }

    fn created(result: Result<TaskId, TaskError>, what: &str, x: i32, y: i32) -> Result<TaskId, TaskError> {
        match &result {
            Ok(id) => log::info!("{} created: {} at ({}, {})", id, what, x, y),
            Err(err) => log::debug!("{} at ({}, {}) rejected: {}", what, x, y, err),
        }
        result
    }

    // ---- Task factories ----

    pub fn create_gather(&mut self, x: i32, y: i32) -> Result<TaskId, TaskError> {
        Self::created(self.tasks.create_gather(&self.grid, x, y), "gather", x, y)
    }

    /// Queue a building; the cost is paid immediately.
    pub fn create_build(&mut self, x: i32, y: i32, building: BuildingKind) -> Result<TaskId, TaskError> {
        let result = self
            .tasks
            .create_build(&self.grid, &mut self.ledger, x, y, building);
        Self::created(result, building.name(), x, y)
    }

    pub fn create_furniture(&mut self, x: i32, y: i32, furniture: FurnitureKind) -> Result<TaskId, TaskError> {
        let result = self
            .tasks
            .create_furniture(&self.grid, &mut self.ledger, x, y, furniture);
        Self::created(result, furniture.name(), x, y)
    }

    /// Place a building or piece of furniture by catalog name.
    pub fn create_by_name(&mut self, x: i32, y: i32, name: &str) -> Result<TaskId, TaskError> {
        if let Some(building) = BuildingKind::from_name(name) {
            return self.create_build(x, y, building);
        }
        if let Some(furniture) = FurnitureKind::from_name(name) {
            return self.create_furniture(x, y, furniture);
        }
        Err(TaskError::UnknownKind(name.to_string()))
    }

    pub fn create_demolish(&mut self, x: i32, y: i32) -> Result<TaskId, TaskError> {
        Self::created(self.tasks.create_demolish(&self.grid, x, y), "demolish", x, y)
    }

    pub fn create_pickup(&mut self, stack: StackId) -> Result<TaskId, TaskError> {
        let result = self.tasks.create_pickup(&self.ledger, stack);
        match &result {
            Ok(id) => log::info!("{} created: pickup of {:?}", id, stack),
            Err(err) => log::debug!("pickup of {:?} rejected: {}", stack, err),
        }
        result
    }

    /// Pick up the first ground stack lying on `(x, y)`.
    pub fn create_pickup_at(&mut self, x: i32, y: i32) -> Result<TaskId, TaskError> {
        if !self.grid.in_bounds(x, y) {
            return Err(TaskError::OutOfBounds { x, y });
        }
        let stack = self
            .ledger
            .ground_stack_at((x, y))
            .map(|s| s.id)
            .ok_or(TaskError::NothingToPickUp { x, y })?;
        self.create_pickup(stack)
    }

    pub fn create_haul(&mut self, x: i32, y: i32, resource: ResourceType) -> Result<TaskId, TaskError> {
        let result = self.tasks.create_haul(&self.grid, &self.ledger, x, y, resource);
        Self::created(result, "haul", x, y)
    }

    /// Remove a task. An owning colonist drops the job; a half-raised
    /// structure reverts to the tile it replaced. Costs are not refunded.
    pub fn cancel_task(&mut self, id: TaskId) -> Result<Task, TaskError> {
        let task = self.tasks.retire(id).ok_or(TaskError::NoSuchTask(id))?;

        let job = task
            .owner()
            .and_then(|owner| self.roster.get(owner.0 as usize).copied())
            .and_then(|entity| clear_job(&mut self.world, entity));

        if let Some(original) = job.and_then(|j| j.original) {
            let (x, y) = task.target;
            if self.grid.get(x, y) == Some(TileKind::Construction) {
                if let Err(err) = self.grid.set(x, y, original) {
                    log::warn!("could not restore {:?}: {}", task.target, err);
                }
            }
        }

        log::info!("{} cancelled: {} at {:?}", id, task.kind.name(), task.target);
        Ok(task)
    }

    // ---- Zoning and map edits ----

    /// Mark an open cell as a stockpile.
    pub fn designate_storage(&mut self, x: i32, y: i32) -> Result<(), TaskError> {
        if !self.grid.in_bounds(x, y) {
            return Err(TaskError::OutOfBounds { x, y });
        }
        if !self.grid.is_buildable(x, y) {
            return Err(TaskError::NotBuildable { x, y });
        }
        if let Some(pending) = self.tasks.pending_at((x, y), |k| !k.is_cell_direct()) {
            return Err(TaskError::AlreadyQueued {
                kind: pending.kind.name(),
                x,
                y,
            });
        }
        self.grid
            .set(x, y, TileKind::Stockpile)
            .map_err(|_| TaskError::OutOfBounds { x, y })?;
        log::info!("stockpile designated at ({}, {})", x, y);
        Ok(())
    }

    /// Remove a stockpile. Whatever it held drops to the ground and gets
    /// hauled elsewhere.
    pub fn clear_storage(&mut self, x: i32, y: i32) -> Result<Option<StackId>, TaskError> {
        if self.grid.get(x, y) != Some(TileKind::Stockpile) {
            return Err(TaskError::NotStorage { x, y });
        }
        self.grid
            .set(x, y, TileKind::Grass)
            .map_err(|_| TaskError::OutOfBounds { x, y })?;
        let spilled = self.ledger.demote_storage((x, y));
        log::info!("stockpile cleared at ({}, {})", x, y);
        Ok(spilled)
    }

    /// Overwrite a tile directly, for map setup and scripted scenarios.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: TileKind) -> Result<(), GridError> {
        let before = self.grid.get(x, y).ok_or(GridError::OutOfBounds { x, y })?;
        self.grid.set(x, y, tile)?;
        if before.is_storage() && !tile.is_storage() {
            self.ledger.demote_storage((x, y));
        }
        if before.encloses() != tile.encloses() {
            self.regions_dirty = true;
        }
        Ok(())
    }

    /// Seed storage directly, bypassing hauling.
    pub fn stock(&mut self, x: i32, y: i32, resource: ResourceType, amount: u32) -> Result<StackId, TaskError> {
        if !self.grid.is_storage(x, y) {
            return Err(TaskError::NotStorage { x, y });
        }
        self.ledger.deposit((x, y), resource, amount).map_err(|err| match err {
            LedgerError::Empty { .. } => TaskError::ZeroAmount { x, y, resource },
            _ => TaskError::NoStorage { x, y, resource },
        })
    }

    // ---- Queries ----

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.tasks()
    }

    pub fn colonist_count(&self) -> usize {
        self.roster.len()
    }

    pub fn colonist_entity(&self, id: ColonistId) -> Option<Entity> {
        self.roster.get(id.0 as usize).copied()
    }

    pub fn colonist_view(&self, id: ColonistId) -> Option<ColonistView> {
        let entity = self.colonist_entity(id)?;
        let colonist = component::<Colonist>(&self.world, entity)?;
        let position = component::<Position>(&self.world, entity)?;
        let job = component::<Job>(&self.world, entity);
        let progress = job
            .as_ref()
            .and_then(|j| {
                let kind = self.tasks.get(j.task)?.kind;
                let threshold = self.config.work.threshold(&kind);
                (threshold > 0).then(|| (j.progress as f32 / threshold as f32).min(1.0))
            })
            .unwrap_or(0.0);

        Some(ColonistView {
            id: colonist.id,
            name: colonist.name,
            x: position.x,
            y: position.y,
            cell: position.cell(),
            state: ColonistState::of(&self.world, entity),
            carrying: component::<Carrying>(&self.world, entity),
            task: job.map(|j| j.task),
            progress,
        })
    }

    /// Status of every colonist, in spawn order.
    pub fn colonist_views(&self) -> Vec<ColonistView> {
        (0..self.roster.len() as u32)
            .filter_map(|i| self.colonist_view(ColonistId(i)))
            .collect()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region_at(&self, cell: Cell) -> Option<&Region> {
        rooms::region_at(&self.regions, cell)
    }

    /// Select the region under `cell`, or clear the selection if there is none.
    pub fn select_region_at(&mut self, cell: Cell) -> Option<RegionId> {
        self.selected_region = self.region_at(cell).map(|r| r.id);
        self.selected_region
    }

    /// The selected region, valid until a rescan drops it.
    pub fn selected_region(&self) -> Option<&Region> {
        let id = self.selected_region?;
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.ledger.can_afford(cost)
    }

    pub fn stored_total(&self, resource: ResourceType) -> u32 {
        self.ledger.stored_total(resource)
    }

    pub fn ground_total(&self, resource: ResourceType) -> u32 {
        self.ledger.ground_total(resource)
    }

    /// Resources in colonists' hands.
    pub fn carried_total(&self, resource: ResourceType) -> u32 {
        self.world
            .query::<&Carrying>()
            .iter()
            .filter(|(_, c)| c.resource == resource)
            .map(|(_, c)| c.amount)
            .sum()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            grid: self.grid.dump().lines().map(str::to_string).collect(),
            colonists: self.colonist_views(),
            tasks: self.tasks.tasks().to_vec(),
            stacks: self.ledger.stacks().to_vec(),
            regions: self.regions.iter().map(RegionView::from).collect(),
            selected_region: self.selected_region,
        }
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
