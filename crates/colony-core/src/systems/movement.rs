//! Movement system - walks colonists along their routes one waypoint at a time.
//!
//! Only the next waypoint is checked before each step. A route that becomes
//! blocked further ahead is caught when the colonist gets there.

use super::work::release_job;
use crate::components::{component, Colonist, Job, Movement, Position, Wandering};
use crate::config::ColonistConfig;
use crate::tasks::TaskQueue;
use colony_logic::Grid;
use hecs::{Entity, World};

/// Advance every moving colonist by at most `speed` cells, never past the
/// current waypoint. Speeds above [`ColonistConfig::MAX_SPEED`] are capped.
/// Returns how many colonists had their route blocked this tick.
pub fn movement_system(
    world: &mut World,
    roster: &[Entity],
    grid: &Grid,
    tasks: &mut TaskQueue,
    speed: f32,
) -> usize {
    let speed = speed.min(ColonistConfig::MAX_SPEED);
    let mut blocked = 0;

    for &entity in roster {
        let (Some(position), Some(movement)) = (
            component::<Position>(world, entity),
            component::<Movement>(world, entity),
        ) else {
            continue;
        };

        let Some(next) = movement.next_waypoint() else {
            arrive(world, entity);
            continue;
        };

        if !grid.is_walkable(next.0, next.1) {
            blocked += 1;
            let who = component::<Colonist>(world, entity).map(|c| c.id);
            match release_job(world, entity, tasks) {
                Some(task) => log::debug!("{:?} blocked at {:?}, released {}", who, next, task),
                None => {
                    let _ = world.remove_one::<Movement>(entity);
                    let _ = world.remove_one::<Wandering>(entity);
                    log::debug!("{:?} stopped wandering, {:?} is blocked", who, next);
                }
            }
            continue;
        }

        let (new_pos, new_movement) = step(position, movement, speed);

        if let Ok(mut pos) = world.get::<&mut Position>(entity) {
            *pos = new_pos;
        }
        if new_movement.is_finished() {
            arrive(world, entity);
        } else if let Ok(mut m) = world.get::<&mut Movement>(entity) {
            *m = new_movement;
        }
    }

    blocked
}

/// Move toward the current waypoint, snapping onto it once within reach.
fn step(pos: Position, mut movement: Movement, speed: f32) -> (Position, Movement) {
    let Some(target) = movement.target() else {
        return (pos, movement);
    };
    let distance = pos.distance_to(&target);

    if distance <= speed {
        movement.index += 1;
        return (target, movement);
    }

    let scale = speed / distance;
    let moved = Position::new(
        pos.x + (target.x - pos.x) * scale,
        pos.y + (target.y - pos.y) * scale,
    );
    (moved, movement)
}

fn arrive(world: &mut World, entity: Entity) {
    let _ = world.remove_one::<Movement>(entity);
    if world.get::<&Job>(entity).is_err() {
        let _ = world.remove_one::<Wandering>(entity);
    }
}
