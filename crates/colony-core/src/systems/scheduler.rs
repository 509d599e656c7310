//! Scheduler - matches idle colonists to queued tasks.
//!
//! Colonists are serviced in roster order and the queue is scanned oldest
//! first, so the first-registered colonist gets the oldest feasible task. An
//! assignment is only committed once a route to the work position exists;
//! an infeasible task is skipped for this colonist and retried next tick.

use crate::components::{component, Carrying, Colonist, Job, Movement, Position, Wandering};
use crate::ledger::ResourceLedger;
use crate::tasks::{TaskId, TaskKind, TaskQueue};
use colony_logic::pathfinding::{find_path, find_work_position};
use colony_logic::{Cell, Grid};
use hecs::{Entity, World};

type Plan = (TaskId, Vec<Cell>);

/// Give every idle colonist the first task it can reach. Wandering colonists
/// count as idle and drop their stroll for real work.
pub fn assign_tasks(
    world: &mut World,
    roster: &[Entity],
    grid: &Grid,
    ledger: &ResourceLedger,
    tasks: &mut TaskQueue,
) -> usize {
    let mut assigned = 0;

    for &entity in roster {
        if world.get::<&Job>(entity).is_ok() {
            continue;
        }
        let (Some(colonist), Some(position)) = (
            component::<Colonist>(world, entity),
            component::<Position>(world, entity),
        ) else {
            continue;
        };
        let here = position.cell();

        let plan = match component::<Carrying>(world, entity) {
            Some(carrying) => plan_haul(grid, ledger, tasks, here, carrying),
            None => plan_site_task(grid, ledger, tasks, here),
        };
        let Some((task, route)) = plan else {
            continue;
        };
        if !tasks.assign(task, colonist.id) {
            continue;
        }

        let _ = world.remove_one::<Wandering>(entity);
        let _ = world.insert(entity, (Job::new(task), Movement::new(route)));
        log::debug!("{} assigned to {}", task, colonist.id);
        assigned += 1;
    }

    assigned
}

fn accepts(grid: &Grid, ledger: &ResourceLedger, cell: Cell, carrying: &Carrying) -> bool {
    grid.is_storage(cell.0, cell.1)
        && ledger
            .storage_stack_at(cell)
            .map_or(true, |s| s.resource == carrying.resource)
}

/// A carrying colonist takes a queued haul for its resource if one is
/// reachable, otherwise a fresh haul to the nearest compatible storage.
fn plan_haul(
    grid: &Grid,
    ledger: &ResourceLedger,
    tasks: &mut TaskQueue,
    here: Cell,
    carrying: Carrying,
) -> Option<Plan> {
    let queued: Vec<(TaskId, Cell)> = tasks
        .tasks()
        .iter()
        .filter(|t| {
            t.is_unassigned()
                && t.kind
                    == TaskKind::Haul {
                        resource: carrying.resource,
                    }
        })
        .map(|t| (t.id, t.target))
        .collect();

    for (id, dest) in queued {
        if !accepts(grid, ledger, dest, &carrying) {
            tasks.retire(id);
            log::info!("{} retired: {:?} no longer takes {}", id, dest, carrying.resource.name());
            continue;
        }
        if let Some(route) = find_path(grid, here, dest) {
            return Some((id, route));
        }
    }

    let dest = ledger.find_available_storage(grid, carrying.resource, here)?;
    let Some(route) = find_path(grid, here, dest) else {
        log::trace!("no route from {:?} to storage {:?}", here, dest);
        return None;
    };
    let id = tasks
        .create_haul(grid, ledger, dest.0, dest.1, carrying.resource)
        .ok()?;
    log::info!("{} created: haul {} to {:?}", id, carrying.resource.name(), dest);
    Some((id, route))
}

/// First unassigned, reachable, non-haul task in queue order. Tasks whose
/// target no longer allows them are retired along the way.
fn plan_site_task(grid: &Grid, ledger: &ResourceLedger, tasks: &mut TaskQueue, here: Cell) -> Option<Plan> {
    let candidates: Vec<(TaskId, TaskKind, Cell, bool)> = tasks
        .tasks()
        .iter()
        .filter(|t| t.is_unassigned() && !matches!(t.kind, TaskKind::Haul { .. }))
        .map(|t| (t.id, t.kind, t.target, t.is_valid(grid, ledger)))
        .collect();

    let mut stale = Vec::new();
    let mut plan = None;

    for (id, kind, target, valid) in candidates {
        if !valid {
            stale.push(id);
            continue;
        }
        let route = match kind {
            TaskKind::Pickup { stack } => {
                let has_storage = ledger
                    .stack(stack)
                    .and_then(|s| ledger.find_available_storage(grid, s.resource, s.cell))
                    .is_some();
                if has_storage {
                    find_path(grid, here, target)
                } else {
                    None
                }
            }
            _ => find_work_position(grid, target, here).and_then(|spot| find_path(grid, here, spot)),
        };
        match route {
            Some(route) => {
                plan = Some((id, route));
                break;
            }
            None => log::trace!("{} unreachable from {:?}", id, here),
        }
    }

    for id in stale {
        tasks.retire(id);
        log::info!("{} retired: target no longer valid", id);
    }

    plan
}
