//! Work system - advances progress for colonists standing at their work
//! position and applies each task kind's completion effect.
//!
//! Haul and pickup complete on arrival. Site work (gather, build, furniture,
//! demolish) accumulates one progress point per tick until the kind's
//! threshold from [`WorkConfig`] is reached.

use crate::components::{component, Carrying, Colonist, Job, Movement, Position, Wandering};
use crate::config::WorkConfig;
use crate::ledger::ResourceLedger;
use crate::tasks::{Task, TaskId, TaskKind, TaskQueue};
use colony_logic::{Cell, Grid, TileKind};
use hecs::{Entity, World};

/// What the work phase changed this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkReport {
    pub completed: Vec<(TaskId, TaskKind)>,
    /// A wall or door appeared or disappeared, so regions need a rescan.
    pub topology_changed: bool,
}

enum Outcome {
    Continue(Job),
    Done,
    Released,
}

pub fn work_system(
    world: &mut World,
    roster: &[Entity],
    grid: &mut Grid,
    ledger: &mut ResourceLedger,
    tasks: &mut TaskQueue,
    work: &WorkConfig,
) -> WorkReport {
    let mut report = WorkReport::default();

    for &entity in roster {
        if world.get::<&Movement>(entity).is_ok() {
            continue;
        }
        let (Some(job), Some(colonist)) = (
            component::<Job>(world, entity),
            component::<Colonist>(world, entity),
        ) else {
            continue;
        };

        let Some(task) = tasks.get(job.task).cloned() else {
            clear_job(world, entity);
            continue;
        };
        if task.owner() != Some(colonist.id) {
            log::warn!("{} holds {} owned by {:?}", colonist.id, task.id, task.owner());
            clear_job(world, entity);
            continue;
        }
        if !task.is_valid(grid, ledger) {
            tasks.retire(task.id);
            clear_job(world, entity);
            log::info!("{} retired: {} target at {:?} no longer valid", task.id, task.kind.name(), task.target);
            continue;
        }

        let outcome = match task.kind {
            TaskKind::Pickup { stack } => {
                if let Some((resource, amount)) = ledger.take_ground(stack) {
                    let _ = world.insert_one(entity, Carrying { resource, amount });
                }
                Outcome::Done
            }
            TaskKind::Haul { .. } => {
                haul(world, entity, grid, ledger, &task);
                Outcome::Done
            }
            TaskKind::Gather => gather(grid, ledger, &task, job, work.threshold(&task.kind)),
            TaskKind::Build(building) => advance_structure(
                world,
                entity,
                grid,
                tasks,
                &task,
                job,
                building.tile(),
                work.threshold(&task.kind),
                &mut report,
            ),
            TaskKind::Furniture(furniture) => advance_structure(
                world,
                entity,
                grid,
                tasks,
                &task,
                job,
                furniture.tile(),
                work.threshold(&task.kind),
                &mut report,
            ),
            TaskKind::Demolish => demolish(grid, ledger, tasks, &task, job, work.threshold(&task.kind), &mut report),
        };

        match outcome {
            Outcome::Continue(job) => {
                if let Ok(mut j) = world.get::<&mut Job>(entity) {
                    *j = job;
                }
            }
            Outcome::Done => {
                tasks.retire(task.id);
                clear_job(world, entity);
                log::info!(
                    "{} completed: {} at {:?} by {}",
                    task.id,
                    task.kind.name(),
                    task.target,
                    colonist.id
                );
                report.completed.push((task.id, task.kind));
            }
            Outcome::Released => {}
        }
    }

    report
}

/// Deposit the carried stack at the haul target, or drop it where the
/// colonist stands if the target no longer accepts it.
fn haul(world: &mut World, entity: Entity, grid: &Grid, ledger: &mut ResourceLedger, task: &Task) {
    let Ok(carrying) = world.remove_one::<Carrying>(entity) else {
        return;
    };
    let (x, y) = task.target;
    if grid.is_storage(x, y) && ledger.deposit(task.target, carrying.resource, carrying.amount).is_ok() {
        return;
    }
    let here = component::<Position>(world, entity)
        .map(|p| p.cell())
        .unwrap_or(task.target);
    ledger.drop_on_ground(here, carrying.resource, carrying.amount);
    log::info!("{} dropped {} {} at {:?}", task.id, carrying.amount, carrying.resource.name(), here);
}

fn gather(grid: &mut Grid, ledger: &mut ResourceLedger, task: &Task, mut job: Job, threshold: u32) -> Outcome {
    job.progress += 1;
    if job.progress < threshold {
        return Outcome::Continue(job);
    }
    let (x, y) = task.target;
    if let Some(yielded) = grid.get(x, y).and_then(|t| t.info().gather) {
        ledger.drop_on_ground(task.target, yielded.resource, yielded.amount);
        write_tile(grid, task.target, yielded.depleted);
    }
    Outcome::Done
}

/// Shared by buildings and furniture: claim the site on the first tick,
/// then raise `tile` once the threshold is reached.
#[allow(clippy::too_many_arguments)]
fn advance_structure(
    world: &mut World,
    entity: Entity,
    grid: &mut Grid,
    tasks: &mut TaskQueue,
    task: &Task,
    mut job: Job,
    tile: TileKind,
    threshold: u32,
    report: &mut WorkReport,
) -> Outcome {
    if !job.started {
        let occupied = world
            .query::<(&Colonist, &Position)>()
            .iter()
            .any(|(_, (_, pos))| pos.cell() == task.target);
        if occupied {
            release_job(world, entity, tasks);
            log::debug!("{} released: site {:?} is occupied", task.id, task.target);
            return Outcome::Released;
        }
        job.original = grid.get(task.target.0, task.target.1);
        write_tile(grid, task.target, TileKind::Construction);
        job.started = true;
    }

    job.progress += 1;
    if job.progress < threshold {
        return Outcome::Continue(job);
    }

    write_tile(grid, task.target, tile);
    if tile.encloses() {
        report.topology_changed = true;
    }
    if tile.is_storage() {
        log::info!("{:?} is now storage ({})", task.target, tile.name());
    }
    Outcome::Done
}

fn demolish(
    grid: &mut Grid,
    ledger: &mut ResourceLedger,
    tasks: &mut TaskQueue,
    task: &Task,
    mut job: Job,
    threshold: u32,
    report: &mut WorkReport,
) -> Outcome {
    if !job.started {
        job.original = grid.get(task.target.0, task.target.1);
        job.started = true;
    }

    job.progress += 1;
    if job.progress < threshold {
        return Outcome::Continue(job);
    }

    write_tile(grid, task.target, TileKind::Rubble);
    if let Some(original) = job.original {
        if original.encloses() {
            report.topology_changed = true;
        }
        if original.is_storage() {
            if let Some(stack) = ledger.demote_storage(task.target) {
                log::info!("stack {:?} spilled from demolished {}", stack, original.name());
            }
        }
    }
    if let Some(follow_up) = task.then {
        let id = tasks.push(follow_up, task.target, None);
        log::info!("{} created: {} at {:?} after {}", id, follow_up.name(), task.target, task.id);
    }
    Outcome::Done
}

fn write_tile(grid: &mut Grid, cell: Cell, tile: TileKind) {
    if let Err(err) = grid.set(cell.0, cell.1, tile) {
        log::warn!("could not write {} at {:?}: {}", tile.name(), cell, err);
    }
}

/// Drop the colonist's job and route. The task itself is left untouched.
pub(crate) fn clear_job(world: &mut World, entity: Entity) -> Option<Job> {
    let _ = world.remove_one::<Movement>(entity);
    let _ = world.remove_one::<Wandering>(entity);
    world.remove_one::<Job>(entity).ok()
}

/// Drop the colonist's job and hand its task back to the queue.
pub(crate) fn release_job(world: &mut World, entity: Entity, tasks: &mut TaskQueue) -> Option<TaskId> {
    let job = clear_job(world, entity)?;
    tasks.release(job.task);
    Some(job.task)
}
