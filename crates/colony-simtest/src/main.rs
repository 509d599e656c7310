//! Colony Headless Simulation Harness
//!
//! Validates grid logic and runs scripted colonies through the engine.
//! Runs entirely in-process: no rendering, no input handling.
//!
//! Usage:
//!   cargo run -p colony-simtest
//!   cargo run -p colony-simtest -- --verbose --ticks 5000
//!   cargo run -p colony-simtest -- --config colony.toml --json

use clap::Parser;
use colony_core::prelude::*;
use colony_logic::catalog::cost;
use colony_logic::pathfinding::{find_path, find_work_position, manhattan};
use colony_logic::rooms::RegionDetector;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command line arguments for the harness
#[derive(Parser, Debug)]
#[command(name = "colony-simtest")]
#[command(about = "Headless colony simulation harness")]
struct Args {
    /// Random seed for map generation and wandering (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to run the demo colony
    #[arg(long, default_value_t = 3000)]
    ticks: u64,

    /// Number of colonists (overrides config)
    #[arg(long)]
    colonists: Option<u32>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print results and the final demo snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Print passing checks and engine logs
    #[arg(long)]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => match SimConfig::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}: {}", path.display(), err);
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world.seed = seed;
    }
    if let Some(count) = args.colonists {
        config.colonists.count = count;
    }
    log::info!(
        "seed {}, {}x{} map, {} colonists, {} ticks",
        config.world.seed,
        config.world.width,
        config.world.height,
        config.colonists.count,
        args.ticks
    );

    if !args.json {
        println!("=== Colony Simulation Harness ===\n");
    }

    let mut results = Vec::new();

    // 1. Tile and build catalogs
    results.extend(validate_catalogs(&args));

    // 2. Pathfinding on synthetic grids
    results.extend(validate_pathfinding(&args, config.world.seed));

    // 3. Region detection
    results.extend(validate_regions(&args));

    // 4. Ledger payment
    results.extend(validate_ledger(&args));

    // 5. Scripted scenarios
    results.extend(validate_scenarios(&args, &config));

    // 6. Demo colony
    let (demo_results, engine) = run_demo_colony(&args, &config);
    results.extend(demo_results);

    // ── Summary ──
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    if args.json {
        let report = serde_json::json!({
            "passed": passed,
            "failed": failed,
            "results": results
                .iter()
                .map(|r| serde_json::json!({ "name": r.name, "passed": r.passed, "detail": r.detail }))
                .collect::<Vec<_>>(),
            "snapshot": engine.snapshot(),
        });
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(err) => eprintln!("could not serialize report: {}", err),
        }
    } else {
        println!();
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || args.verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed,
            results.len(),
            failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn section(args: &Args, title: &str) {
    if !args.json {
        println!("--- {} ---", title);
    }
}

// ── 1. Catalogs ─────────────────────────────────────────────────────────

fn validate_catalogs(args: &Args) -> Vec<TestResult> {
    section(args, "Catalogs");
    let mut results = Vec::new();

    let unnamed: Vec<_> = TileKind::ALL
        .iter()
        .filter(|t| TileKind::from_name(t.name()) != **t)
        .collect();
    results.push(TestResult::new(
        "tiles_name_lookup",
        unnamed.is_empty(),
        format!("{} tile kinds, {} fail name lookup", TileKind::ALL.len(), unnamed.len()),
    ));

    results.push(TestResult::new(
        "tiles_unknown_falls_back",
        TileKind::from_name("lava") == TileKind::Grass,
        "unknown names resolve to grass",
    ));

    let glyphs: HashSet<char> = TileKind::ALL.iter().map(|t| t.glyph()).collect();
    results.push(TestResult::new(
        "tiles_glyphs_unique",
        glyphs.len() == TileKind::ALL.len(),
        format!("{} distinct glyphs", glyphs.len()),
    ));

    let gatherable_solid = TileKind::ALL
        .iter()
        .filter(|t| t.info().gather.is_some())
        .all(|t| !t.is_walkable());
    results.push(TestResult::new(
        "tiles_resources_block",
        gatherable_solid,
        "resource tiles are worked from a neighbor",
    ));

    let priced = BuildingKind::ALL.iter().all(|b| !b.cost().is_empty())
        && FurnitureKind::ALL.iter().all(|f| !f.cost().is_empty());
    results.push(TestResult::new(
        "catalog_costs",
        priced,
        "every building and furniture has a cost",
    ));

    let storage_consistent = FurnitureKind::ALL
        .iter()
        .all(|f| f.is_storage() == f.tile().is_storage());
    results.push(TestResult::new(
        "catalog_storage_flags",
        storage_consistent,
        "storage furniture places storage tiles",
    ));

    results
}

// ── 2. Pathfinding ──────────────────────────────────────────────────────

fn validate_pathfinding(args: &Args, seed: u64) -> Vec<TestResult> {
    section(args, "Pathfinding");
    let mut results = Vec::new();

    let open = Grid::new(10, 10);
    let route = find_path(&open, (0, 0), (9, 9));
    results.push(TestResult::new(
        "path_open_manhattan",
        route.as_ref().map(|r| r.len()) == Some(19),
        format!("{:?} cells corner to corner", route.map(|r| r.len())),
    ));

    let maze = Grid::parse(&[
        ".#...",
        ".#.#.",
        ".#.#.",
        "...#.",
    ]);
    let route = maze.ok().and_then(|g| find_path(&g, (0, 0), (4, 0)));
    results.push(TestResult::new(
        "path_detour",
        route.as_ref().map(|r| r.len()) == Some(13),
        format!("{:?} cells through the maze", route.map(|r| r.len())),
    ));

    let mut tree = Grid::new(5, 5);
    let _ = tree.set(2, 2, TileKind::Tree);
    let route = find_path(&tree, (0, 2), (2, 2));
    results.push(TestResult::new(
        "path_goal_substitution",
        route.as_ref().and_then(|r| r.last().copied()) == Some((1, 2)),
        "blocked goal replaced by nearest walkable neighbor",
    ));

    let mut boxed = Grid::new(5, 5);
    for cell in [(2, 1), (1, 2), (3, 2), (2, 3)] {
        let _ = boxed.set(cell.0, cell.1, TileKind::Wall);
    }
    let _ = boxed.set(2, 2, TileKind::Rock);
    results.push(TestResult::new(
        "path_enclosed_goal",
        find_path(&boxed, (0, 0), (2, 2)).is_none() && find_work_position(&boxed, (2, 2), (0, 0)).is_none(),
        "fully enclosed target has no route and no work position",
    ));

    // Random sweep: routes are contiguous, walkable and as short as a breadth-first search finds.
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut broken = 0;
    let mut found = 0;
    for _ in 0..200 {
        let mut grid = Grid::new(16, 16);
        for (x, y) in grid.cells().collect::<Vec<_>>() {
            if rng.gen_bool(0.25) {
                let _ = grid.set(x, y, TileKind::Wall);
            }
        }
        let start = (rng.gen_range(0..16), rng.gen_range(0..16));
        let goal = (rng.gen_range(0..16), rng.gen_range(0..16));
        let _ = grid.set(start.0, start.1, TileKind::Grass);
        let _ = grid.set(goal.0, goal.1, TileKind::Grass);
        match (find_path(&grid, start, goal), bfs_distance(&grid, start, goal)) {
            (Some(route), Some(shortest)) => {
                found += 1;
                let contiguous = route.windows(2).all(|w| manhattan(w[0], w[1]) == 1);
                let walkable = route.iter().all(|&(x, y)| grid.is_walkable(x, y));
                let ends = route.first() == Some(&start) && route.last() == Some(&goal);
                if !contiguous || !walkable || !ends || route.len() != shortest + 1 {
                    broken += 1;
                }
            }
            (None, None) => {}
            _ => broken += 1,
        }
    }
    results.push(TestResult::new(
        "path_random_sweep",
        broken == 0 && found > 0,
        format!("{} routes found, {} malformed or suboptimal", found, broken),
    ));

    results
}

/// Step count of the shortest walkable route, by breadth-first search.
fn bfs_distance(grid: &Grid, start: Cell, goal: Cell) -> Option<usize> {
    let mut dist: HashMap<Cell, usize> = HashMap::from([(start, 0)]);
    let mut queue = VecDeque::from([start]);
    while let Some(cell) = queue.pop_front() {
        let d = dist[&cell];
        if cell == goal {
            return Some(d);
        }
        for n in grid.neighbors(cell) {
            if grid.is_walkable(n.0, n.1) && !dist.contains_key(&n) {
                dist.insert(n, d + 1);
                queue.push_back(n);
            }
        }
    }
    None
}

// ── 3. Regions ──────────────────────────────────────────────────────────

fn validate_regions(args: &Args) -> Vec<TestResult> {
    section(args, "Regions");
    let mut results = Vec::new();
    let mut detector = RegionDetector::new();

    let Ok(mut ring) = Grid::parse(&[".....", ".###.", ".#.#.", ".###.", "....."]) else {
        results.push(TestResult::new("regions_parse", false, "ring map failed to parse"));
        return results;
    };

    let regions = detector.detect_regions(&ring);
    let closed = regions.len() == 1 && regions[0].area() == 1 && regions[0].boundary.len() == 4;
    results.push(TestResult::new(
        "regions_ring_closed",
        closed,
        format!("{} regions", regions.len()),
    ));

    let again = detector.detect_regions(&ring);
    let same = regions.len() == again.len()
        && regions
            .iter()
            .zip(&again)
            .all(|(a, b)| a.cells == b.cells && a.boundary == b.boundary && a.id != b.id);
    results.push(TestResult::new(
        "regions_idempotent",
        same,
        "rescan yields same cells and fresh ids",
    ));

    let _ = ring.set(2, 1, TileKind::Door);
    let with_door = detector.detect_regions(&ring).len();
    let _ = ring.set(2, 1, TileKind::Grass);
    let breached = detector.detect_regions(&ring).len();
    results.push(TestResult::new(
        "regions_door_and_breach",
        with_door == 1 && breached == 0,
        format!("door: {} regions, breach: {} regions", with_door, breached),
    ));

    results
}

// ── 4. Ledger ───────────────────────────────────────────────────────────

fn validate_ledger(args: &Args) -> Vec<TestResult> {
    section(args, "Ledger");
    let mut results = Vec::new();

    let mut ledger = ResourceLedger::new();
    let _ = ledger.deposit((0, 0), ResourceType::Wood, 3);
    let _ = ledger.deposit((1, 0), ResourceType::Stone, 1);
    let before = ledger.stacks().to_vec();

    let rejected = ledger
        .pay(&cost(&[(ResourceType::Wood, 2), (ResourceType::Stone, 2)]))
        .is_err();
    results.push(TestResult::new(
        "ledger_atomic_reject",
        rejected && ledger.stacks() == before.as_slice(),
        "short payment leaves every stack untouched",
    ));

    let paid = ledger
        .pay(&cost(&[(ResourceType::Wood, 3), (ResourceType::Stone, 1)]))
        .is_ok();
    results.push(TestResult::new(
        "ledger_exact_payment",
        paid && ledger.stacks().is_empty(),
        format!("{} stacks left after paying everything", ledger.stacks().len()),
    ));

    results
}

// ── 5. Scenarios ────────────────────────────────────────────────────────

fn scenario_config(base: &SimConfig) -> SimConfig {
    let mut config = base.clone();
    config.wander.chance = 0.0;
    config
}

fn validate_scenarios(args: &Args, base: &SimConfig) -> Vec<TestResult> {
    section(args, "Scenarios");
    let mut results = Vec::new();

    // Tree at (5,5), storage at (0,0), one colonist.
    let mut engine = SimulationEngine::new({
        let mut c = scenario_config(base);
        c.world.width = 10;
        c.world.height = 10;
        c
    });
    let _ = engine.set_tile(5, 5, TileKind::Tree);
    let _ = engine.designate_storage(0, 0);
    engine.spawn_colonist((2, 7));
    let queued = engine.create_gather(5, 5).is_ok();

    let mut gathered_at = None;
    for _ in 0..5000 {
        engine.update();
        if gathered_at.is_none() && engine.grid.get(5, 5) == Some(TileKind::Stump) {
            gathered_at = Some(engine.tick());
        }
        if engine.stored_total(ResourceType::Wood) == 1 {
            break;
        }
    }
    let delivered = engine.ledger.storage_stack_at((0, 0)).map(|s| s.amount) == Some(1)
        && engine.ledger.ground_stacks().count() == 0;
    results.push(TestResult::new(
        "scenario_gather_haul",
        queued && gathered_at.is_some() && delivered,
        format!("gathered at tick {:?}, stored by tick {}", gathered_at, engine.tick()),
    ));

    // Door over wall: demolish first, door build only afterwards.
    let grid = Grid::parse(&["S......", ".......", "...#...", "......."]).unwrap_or_else(|_| Grid::new(7, 4));
    let mut engine = SimulationEngine::with_grid(scenario_config(base), grid);
    let _ = engine.stock(0, 0, ResourceType::Wood, 2);
    engine.spawn_colonist((0, 2));
    let queued = engine.create_build(3, 2, BuildingKind::Door).is_ok();
    let paid = engine.stored_total(ResourceType::Wood) == 0;

    let mut overlap = false;
    for _ in 0..5000 {
        engine.update();
        let demolish = engine.tasks().iter().any(|t| t.kind == TaskKind::Demolish);
        let build = engine
            .tasks()
            .iter()
            .any(|t| t.kind == TaskKind::Build(BuildingKind::Door));
        overlap |= demolish && build;
        if engine.grid.get(3, 2) == Some(TileKind::Door) {
            break;
        }
    }
    results.push(TestResult::new(
        "scenario_door_over_wall",
        queued && paid && !overlap && engine.grid.get(3, 2) == Some(TileKind::Door),
        format!("door finished by tick {}", engine.tick()),
    ));

    results
}

// ── 6. Demo colony ──────────────────────────────────────────────────────

/// Stockpile in one corner, scattered trees and rocks, and a walled room
/// whose doorway is built once the colony can afford it.
fn demo_map(config: &SimConfig) -> (Grid, Option<Cell>) {
    let width = config.world.width.max(8);
    let height = config.world.height.max(8);
    let mut rng = SmallRng::seed_from_u64(config.world.seed);
    let mut grid = Grid::new(width, height);

    let room = (width >= 16 && height >= 16).then(|| (width - 10, height - 10, width - 4, height - 4));
    let in_room = |x: i32, y: i32| room.is_some_and(|(x0, y0, x1, y1)| (x0..=x1).contains(&x) && (y0..=y1).contains(&y));

    for (x, y) in grid.cells().collect::<Vec<_>>() {
        if (x <= 4 && y <= 4) || in_room(x, y) {
            continue;
        }
        let roll = rng.gen::<f32>();
        if roll < 0.08 {
            let _ = grid.set(x, y, TileKind::Tree);
        } else if roll < 0.12 {
            let _ = grid.set(x, y, TileKind::Rock);
        }
    }
    for x in 1..=3 {
        for y in 1..=3 {
            let _ = grid.set(x, y, TileKind::Stockpile);
        }
    }

    let doorway = room.map(|(x0, y0, x1, y1)| {
        for x in x0..=x1 {
            let _ = grid.set(x, y0, TileKind::Wall);
            let _ = grid.set(x, y1, TileKind::Wall);
        }
        for y in y0..=y1 {
            let _ = grid.set(x0, y, TileKind::Wall);
            let _ = grid.set(x1, y, TileKind::Wall);
        }
        let gap = ((x0 + x1) / 2, y0);
        let _ = grid.set(gap.0, gap.1, TileKind::Grass);
        gap
    });

    (grid, doorway)
}

fn run_demo_colony(args: &Args, config: &SimConfig) -> (Vec<TestResult>, SimulationEngine) {
    section(args, "Demo Colony");
    let mut results = Vec::new();

    let (grid, doorway) = demo_map(config);
    let mut engine = SimulationEngine::with_grid(config.clone(), grid);
    let spawned = engine.populate().len();
    results.push(TestResult::new(
        "demo_populated",
        spawned == config.colonists.count as usize,
        format!("{} of {} colonists placed", spawned, config.colonists.count),
    ));

    let mut queued = 0;
    for (x, y) in engine.grid.cells().collect::<Vec<_>>() {
        if engine.grid.is_gatherable(x, y) && engine.create_gather(x, y).is_ok() {
            queued += 1;
        }
    }
    if args.verbose && !args.json {
        println!("  {} gather tasks on a {}x{} map", queued, engine.grid.width(), engine.grid.height());
    }

    let mut door_queued = false;
    let mut shared_at = None;
    let mut completed = 0;
    for _ in 0..args.ticks {
        completed += engine.update().completed.len();

        if let Some((x, y)) = doorway {
            if !door_queued && engine.can_afford(&BuildingKind::Door.cost()) {
                door_queued = engine.create_build(x, y, BuildingKind::Door).is_ok();
            }
        }

        if shared_at.is_none() {
            let held: Vec<TaskId> = engine.colonist_views().iter().filter_map(|v| v.task).collect();
            let unique: HashSet<&TaskId> = held.iter().collect();
            if unique.len() != held.len() {
                shared_at = Some(engine.tick());
            }
        }
    }

    results.push(TestResult::new(
        "demo_exclusive_tasks",
        shared_at.is_none(),
        match shared_at {
            Some(tick) => format!("task shared at tick {}", tick),
            None => format!("{} ticks without a shared task", engine.tick()),
        },
    ));

    let stored: u32 = ResourceType::ALL.iter().map(|&r| engine.stored_total(r)).sum();
    results.push(TestResult::new(
        "demo_progress",
        queued == 0 || completed > 0,
        format!(
            "{} tasks completed, {} resources in storage, {} tasks open",
            completed,
            stored,
            engine.tasks().len()
        ),
    ));

    if let Some(gap) = doorway {
        let built = engine.grid.get(gap.0, gap.1) == Some(TileKind::Door);
        let inside = (gap.0, gap.1 + 1);
        let room_found = engine.region_at(inside).is_some();
        results.push(TestResult::new(
            "demo_room",
            !built || room_found,
            if built {
                format!("door built, {} regions", engine.regions().len())
            } else {
                "door not built yet".to_string()
            },
        ));
    }

    (results, engine)
}
