//! End-to-end scenarios through the public engine surface.
//!
//! Exercises: task factories → scheduler → movement → work → hauling →
//! region rescans, with no rendering or input layer.

use colony_core::prelude::*;
use std::collections::HashSet;

// ── Helpers ────────────────────────────────────────────────────────────

fn calm_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.wander.chance = 0.0;
    config.colonists.speed = 0.5;
    config
}

/// Step until `done` holds, returning the tick it first held on.
fn run_until(engine: &mut SimulationEngine, max_ticks: u64, mut done: impl FnMut(&SimulationEngine) -> bool) -> Option<u64> {
    for _ in 0..max_ticks {
        engine.update();
        if done(engine) {
            return Some(engine.tick());
        }
    }
    None
}

fn tasks_of(engine: &SimulationEngine, pred: impl Fn(&TaskKind) -> bool) -> Vec<Task> {
    engine.tasks().iter().filter(|t| pred(&t.kind)).cloned().collect()
}

// ── Gather → pickup → haul ─────────────────────────────────────────────

#[test]
fn test_tree_ends_up_in_storage() {
    let mut engine = SimulationEngine::new({
        let mut c = calm_config();
        c.world.width = 10;
        c.world.height = 10;
        c
    });
    engine.set_tile(5, 5, TileKind::Tree).unwrap();
    engine.designate_storage(0, 0).unwrap();
    engine.spawn_colonist((2, 7)).unwrap();

    engine.create_gather(5, 5).unwrap();
    run_until(&mut engine, 500, |e| e.grid.get(5, 5) == Some(TileKind::Stump)).expect("gather never finished");

    let ground: Vec<_> = engine.ledger.ground_stacks().cloned().collect();
    assert_eq!(ground.len(), 1);
    assert_eq!(ground[0].cell, (5, 5));
    assert_eq!(ground[0].resource, ResourceType::Wood);
    assert_eq!(ground[0].amount, 1);

    let mut saw_pickup = false;
    let mut saw_haul = false;
    run_until(&mut engine, 500, |e| {
        saw_pickup |= e.tasks().iter().any(|t| matches!(t.kind, TaskKind::Pickup { .. }));
        saw_haul |= e
            .tasks()
            .iter()
            .any(|t| t.kind == TaskKind::Haul { resource: ResourceType::Wood } && t.target == (0, 0));
        e.stored_total(ResourceType::Wood) == 1
    })
    .expect("wood never reached storage");

    assert!(saw_pickup);
    assert!(saw_haul);
    assert_eq!(engine.ledger.storage_stack_at((0, 0)).unwrap().amount, 1);
    assert_eq!(engine.ledger.ground_stacks().count(), 0);
    assert_eq!(engine.carried_total(ResourceType::Wood), 0);
    assert!(engine.tasks().is_empty());
}

// ── Door over wall ─────────────────────────────────────────────────────

#[test]
fn test_door_over_wall_demolishes_first() {
    let grid = Grid::parse(&[
        "S.......",
        "........",
        "........",
        "....#...",
        "........",
    ])
    .unwrap();
    let mut engine = SimulationEngine::with_grid(calm_config(), grid);
    engine.stock(0, 0, ResourceType::Wood, 2).unwrap();
    engine.spawn_colonist((1, 3)).unwrap();

    engine.create_build(4, 3, BuildingKind::Door).unwrap();
    assert_eq!(engine.stored_total(ResourceType::Wood), 0);
    let queued = engine.tasks().to_vec();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].kind, TaskKind::Demolish);

    let mut saw_rubble = false;
    let mut saw_door_build = false;
    run_until(&mut engine, 1000, |e| {
        let demolish = tasks_of(e, |k| *k == TaskKind::Demolish);
        let build = tasks_of(e, |k| *k == TaskKind::Build(BuildingKind::Door));
        assert!(
            demolish.is_empty() || build.is_empty(),
            "demolish and door build queued together at tick {}",
            e.tick()
        );
        saw_rubble |= e.grid.get(4, 3) == Some(TileKind::Rubble);
        saw_door_build |= !build.is_empty();
        if !build.is_empty() {
            assert!(saw_rubble, "door build queued before the wall came down");
        }
        e.grid.get(4, 3) == Some(TileKind::Door)
    })
    .expect("door never finished");

    assert!(saw_rubble);
    assert!(saw_door_build);
    assert!(engine.tasks().is_empty());
    assert_eq!(engine.stored_total(ResourceType::Wood), 0);
}

#[test]
fn test_door_over_wall_rejected_when_broke() {
    let grid = Grid::parse(&["S.#.."]).unwrap();
    let mut engine = SimulationEngine::with_grid(calm_config(), grid);
    engine.stock(0, 0, ResourceType::Wood, 1).unwrap();

    assert!(matches!(
        engine.create_build(2, 0, BuildingKind::Door),
        Err(TaskError::Insufficient(_))
    ));
    assert!(engine.tasks().is_empty());
    assert_eq!(engine.stored_total(ResourceType::Wood), 1);
}

// ── Exclusivity ────────────────────────────────────────────────────────

#[test]
fn test_no_task_is_ever_shared() {
    let mut rows = vec![String::from("SS..........SS"); 14];
    for (y, row) in rows.iter_mut().enumerate() {
        if (3..11).contains(&y) {
            *row = if y % 2 == 0 {
                String::from("..T.R.T.R.T.R.")
            } else {
                String::from("..............")
            };
        }
    }
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let grid = Grid::parse(&refs).unwrap();

    let mut config = SimConfig::default();
    config.colonists.count = 5;
    config.colonists.speed = 0.5;
    config.work.gather_ticks = 5;
    config.wander.chance = 0.1;
    let mut engine = SimulationEngine::with_grid(config, grid);
    engine.populate();

    let mut trees = 0;
    for cell in engine.grid.cells().collect::<Vec<_>>() {
        if matches!(engine.grid.get(cell.0, cell.1), Some(TileKind::Tree | TileKind::Rock)) {
            engine.create_gather(cell.0, cell.1).unwrap();
            if engine.grid.get(cell.0, cell.1) == Some(TileKind::Tree) {
                trees += 1;
            }
        }
    }
    assert!(trees > 0);

    for _ in 0..1500 {
        engine.update();

        let views = engine.colonist_views();
        let held: Vec<TaskId> = views.iter().filter_map(|v| v.task).collect();
        let unique: HashSet<TaskId> = held.iter().copied().collect();
        assert_eq!(held.len(), unique.len(), "shared task at tick {}", engine.tick());

        for view in &views {
            if let Some(id) = view.task {
                let task = engine.tasks.get(id).expect("job points at a retired task");
                assert_eq!(task.owner(), Some(view.id));
            }
        }
        for task in engine.tasks() {
            if let Some(owner) = task.owner() {
                assert_eq!(views[owner.0 as usize].task, Some(task.id));
            }
        }

        let mut open_sites = HashSet::new();
        for task in engine.tasks() {
            let single = matches!(task.kind, TaskKind::Gather | TaskKind::Demolish | TaskKind::Pickup { .. });
            if single && task.is_unassigned() {
                assert!(open_sites.insert((format!("{:?}", task.kind), task.target)));
            }
        }

        let wood = engine.stored_total(ResourceType::Wood)
            + engine.ground_total(ResourceType::Wood)
            + engine.carried_total(ResourceType::Wood);
        let stumps = engine
            .grid
            .cells()
            .filter(|&(x, y)| engine.grid.get(x, y) == Some(TileKind::Stump))
            .count() as u32;
        assert_eq!(wood, stumps, "wood appeared or vanished at tick {}", engine.tick());
    }

    assert_eq!(
        engine
            .grid
            .cells()
            .filter(|&(x, y)| engine.grid.get(x, y) == Some(TileKind::Tree))
            .count(),
        0
    );
}

// ── Movement-blocked recovery ──────────────────────────────────────────

#[test]
fn test_blocked_route_releases_and_recovers() {
    let grid = Grid::parse(&["........T"]).unwrap();
    let mut engine = SimulationEngine::with_grid(calm_config(), grid);
    let colonist = engine.spawn_colonist((0, 0)).unwrap();
    let gather = engine.create_gather(8, 0).unwrap();

    engine.update();
    assert_eq!(engine.tasks.get(gather).unwrap().owner(), Some(colonist));

    engine.set_tile(1, 0, TileKind::Wall).unwrap();
    engine.update();
    assert!(engine.tasks.get(gather).unwrap().is_unassigned());
    let view = engine.colonist_view(colonist).unwrap();
    assert_eq!(view.state, ColonistState::Idle);
    assert_eq!(view.task, None);

    // No route exists, so the task stays queued rather than failing.
    engine.run(20);
    assert!(engine.tasks.get(gather).unwrap().is_unassigned());

    engine.set_tile(1, 0, TileKind::Grass).unwrap();
    run_until(&mut engine, 500, |e| e.grid.get(8, 0) == Some(TileKind::Stump)).expect("gather never resumed");
}

// ── Wandering ──────────────────────────────────────────────────────────

#[test]
fn test_wanderer_takes_new_work() {
    let mut config = calm_config();
    config.wander.chance = 1.0;
    config.world.width = 12;
    config.world.height = 12;
    let mut engine = SimulationEngine::new(config);
    let colonist = engine.spawn_colonist((6, 6)).unwrap();

    engine.update();
    assert_eq!(engine.colonist_view(colonist).unwrap().state, ColonistState::Wandering);

    engine.set_tile(1, 1, TileKind::Rock).unwrap();
    let id = engine.create_gather(1, 1).unwrap();
    engine.update();
    let view = engine.colonist_view(colonist).unwrap();
    assert_eq!(view.task, Some(id));
    assert_eq!(view.state, ColonistState::Traversing);
}

#[test]
fn test_stranded_carrier_waits_instead_of_wandering() {
    let mut config = calm_config();
    config.wander.chance = 1.0;
    // Storage exists but sits behind a wall.
    let grid = Grid::parse(&["S#...."]).unwrap();
    let mut engine = SimulationEngine::with_grid(config, grid);
    engine.ledger.drop_on_ground((4, 0), ResourceType::Stone, 1);
    let colonist = engine.spawn_colonist((3, 0)).unwrap();

    run_until(&mut engine, 100, |e| {
        let view = e.colonist_view(colonist).unwrap();
        if view.carrying.is_some() {
            assert_ne!(view.state, ColonistState::Wandering);
        }
        view.carrying.is_some()
    })
    .expect("stone never picked up");

    for _ in 0..30 {
        engine.update();
        let view = engine.colonist_view(colonist).unwrap();
        assert_eq!(view.state, ColonistState::Idle);
        assert_eq!(view.task, None);
        assert!(view.carrying.is_some());
    }
}

// ── Rooms ──────────────────────────────────────────────────────────────

#[test]
fn test_closing_a_ring_creates_a_room() {
    let grid = Grid::parse(&[
        ".......",
        ".......",
        "..#.#..",
        "..#.#..",
        "..###..",
        ".......",
        "......S",
    ])
    .unwrap();
    let mut engine = SimulationEngine::with_grid(calm_config(), grid);
    engine.stock(6, 6, ResourceType::Wood, 1).unwrap();
    engine.spawn_colonist((0, 0)).unwrap();
    assert!(engine.regions().is_empty());

    engine.create_build(3, 2, BuildingKind::Wall).unwrap();
    run_until(&mut engine, 500, |e| e.grid.get(3, 2) == Some(TileKind::Wall)).expect("wall never finished");

    assert_eq!(engine.regions().len(), 1);
    let room = engine.region_at((3, 3)).unwrap();
    assert_eq!(room.area(), 1);
    assert_eq!(room.boundary.len(), 4);
    let id = engine.select_region_at((3, 3)).unwrap();
    assert_eq!(engine.selected_region().map(|r| r.id), Some(id));
}

#[test]
fn test_chest_becomes_storage() {
    let grid = Grid::parse(&["S.....", "......", "......"]).unwrap();
    let mut engine = SimulationEngine::with_grid(calm_config(), grid);
    engine.stock(0, 0, ResourceType::Wood, 2).unwrap();
    engine.designate_storage(0, 2).unwrap();
    engine.stock(0, 2, ResourceType::Stone, 1).unwrap();
    engine.spawn_colonist((2, 1)).unwrap();

    engine.create_furniture(4, 1, FurnitureKind::Chest).unwrap();
    assert_eq!(engine.stored_total(ResourceType::Wood), 0);
    assert_eq!(engine.stored_total(ResourceType::Stone), 0);

    run_until(&mut engine, 500, |e| e.grid.get(4, 1) == Some(TileKind::Chest)).expect("chest never finished");
    assert!(engine.grid.is_storage(4, 1));

    engine.ledger.drop_on_ground((5, 2), ResourceType::Wood, 3);
    run_until(&mut engine, 500, |e| e.stored_total(ResourceType::Wood) == 3).expect("wood never stored");
    assert_eq!(engine.ground_total(ResourceType::Wood), 0);
}
