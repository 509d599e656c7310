//! Wandering system - gives idle, empty-handed colonists short random strolls

use crate::components::{component, Carrying, Colonist, Job, Movement, Position, Wandering};
use crate::config::WanderConfig;
use colony_logic::pathfinding::find_path;
use colony_logic::{Cell, Grid};
use hecs::{Entity, World};
use rand::Rng;

/// Roll once per idle colonist; on a hit, route to a random walkable cell
/// within `radius` on each axis. Returns how many colonists started moving.
pub fn wandering_system(
    world: &mut World,
    roster: &[Entity],
    grid: &Grid,
    rng: &mut impl Rng,
    config: &WanderConfig,
) -> usize {
    let mut started = 0;

    for &entity in roster {
        if world.get::<&Job>(entity).is_ok()
            || world.get::<&Movement>(entity).is_ok()
            || world.get::<&Carrying>(entity).is_ok()
        {
            continue;
        }
        let Some(position) = component::<Position>(world, entity) else {
            continue;
        };

        if rng.gen::<f32>() >= config.chance {
            continue;
        }

        let here = position.cell();
        let candidates = wander_targets(grid, here, config.radius);
        if candidates.is_empty() {
            continue;
        }
        let target = candidates[rng.gen_range(0..candidates.len())];

        if let Some(route) = find_path(grid, here, target) {
            let _ = world.insert(entity, (Wandering, Movement::new(route)));
            if let Some(colonist) = component::<Colonist>(world, entity) {
                log::debug!("{} wandering to {:?}", colonist.id, target);
            }
            started += 1;
        }
    }

    started
}

fn wander_targets(grid: &Grid, here: Cell, radius: i32) -> Vec<Cell> {
    let mut cells = Vec::new();
    for y in here.1 - radius..=here.1 + radius {
        for x in here.0 - radius..=here.0 + radius {
            if (x, y) != here && grid.is_walkable(x, y) {
                cells.push((x, y));
            }
        }
    }
    cells
}
