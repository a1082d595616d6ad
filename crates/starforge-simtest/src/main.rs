//! Starforge Headless Simulation Harness
//!
//! Generates a seeded game, drives two scripted players through the public
//! commands, runs the full tick pipeline on a manual clock and checks world
//! invariants after every tick. Runs entirely in-process against the
//! in-memory store.
//!
//! Usage:
//!   cargo run -p starforge-simtest
//!   cargo run -p starforge-simtest -- --ticks 500 --seed 7 --systems 25
//!   cargo run -p starforge-simtest -- --config balance.json --verbose

mod logging;

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use starforge_core::events::SinkEvent;
use starforge_core::generation::NewGame;
use starforge_core::prelude::*;
use starforge_logic::geometry::Point;
use starforge_logic::resources::{BuildingType, ResourceKind};
use starforge_logic::ships::ShipState;
use std::sync::Arc;

const PLAYERS: [&str; 2] = ["alice", "bob"];

// ── Options ─────────────────────────────────────────────────────────────

struct Options {
    ticks: u32,
    seed: u64,
    systems: Option<usize>,
    config: Option<String>,
    difficulty: Difficulty,
    verbose: bool,
}

impl Options {
    fn from_args() -> std::result::Result<Self, String> {
        let mut opts = Options {
            ticks: 200,
            seed: 42,
            systems: None,
            config: None,
            difficulty: Difficulty::Normal,
            verbose: false,
        };
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| format!("{} needs a value", flag))
            };
            match arg.as_str() {
                "--ticks" => opts.ticks = parse_number(&arg, &value("--ticks")?)?,
                "--seed" => opts.seed = parse_number(&arg, &value("--seed")?)?,
                "--systems" => opts.systems = Some(parse_number(&arg, &value("--systems")?)?),
                "--config" => opts.config = Some(value("--config")?),
                "--difficulty" => opts.difficulty = Difficulty::parse(&value("--difficulty")?),
                "--verbose" | "-v" => opts.verbose = true,
                other => return Err(format!("unknown argument: {}", other)),
            }
        }
        Ok(opts)
    }

    fn simulation_config(&self) -> std::result::Result<SimulationConfig, String> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path).map_err(|e| e.to_string())?,
            None => SimulationConfig::preset(self.difficulty),
        };
        if let Some(systems) = self.systems {
            config.system_count = systems;
        }
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, raw: &str) -> std::result::Result<T, String> {
    raw.parse()
        .map_err(|_| format!("{} expects a number, got '{}'", flag, raw))
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

/// Everything one harness run needs.
struct Sim {
    engine: Arc<SimulationEngine>,
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
    sink: Arc<RecordingSink>,
    game: NewGame,
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

async fn boot(config: SimulationConfig, seed: u64) -> Result<Sim> {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(start_time()));
    let sink = Arc::new(RecordingSink::new());
    let engine = Arc::new(SimulationEngine::new(
        store.clone(),
        config,
        sink.clone(),
        clock.clone(),
        seed,
    )?);
    let players: Vec<PlayerId> = PLAYERS.iter().map(|p| p.to_string()).collect();
    let game = engine.create_game("Harness", &players).await?;
    Ok(Sim {
        engine,
        store,
        clock,
        sink,
        game,
    })
}

#[tokio::main]
async fn main() {
    let opts = match Options::from_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!(
                "usage: starforge-simtest [--ticks N] [--seed N] [--systems N] [--config FILE] [--difficulty easy|normal|hard] [--verbose]"
            );
            std::process::exit(2);
        }
    };
    logging::init(opts.verbose);

    println!("=== Starforge Simulation Harness ===");
    println!(
        "seed {}, {} ticks, difficulty {:?}\n",
        opts.seed, opts.ticks, opts.difficulty
    );

    let config = match opts.simulation_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };
    if opts.verbose {
        if let Ok(json) = serde_json::to_string_pretty(&config) {
            println!("{}\n", json);
        }
    }

    let mut results = Vec::new();

    // 1. Config presets
    results.extend(validate_presets());

    // 2. Galaxy and starting positions
    let sim = match boot(config.clone(), opts.seed).await {
        Ok(sim) => sim,
        Err(e) => {
            println!("  ✗ boot: {}", e);
            std::process::exit(1);
        }
    };
    results.extend(validate_generation(&sim).await);

    // 3. Scripted play and per-tick invariants
    results.extend(run_campaign(&sim, opts.ticks, opts.seed).await);

    // 4. Snapshot round trip
    results.extend(validate_snapshot(&sim).await);

    // 5. Determinism
    results.extend(validate_determinism(config, opts.seed).await);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;
    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || opts.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }
    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Presets ──────────────────────────────────────────────────────────

fn validate_presets() -> Vec<TestResult> {
    println!("--- Config Presets ---");
    let mut results = Vec::new();

    for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
        let preset = SimulationConfig::preset(difficulty);
        results.push(TestResult::check(
            &format!("preset_{:?}_valid", difficulty).to_lowercase(),
            preset.validate().is_ok(),
            format!(
                "rate {}, build {}s, npcs {}..={}",
                preset.production_rate_per_tick,
                preset.building_construction_seconds,
                preset.npc_min_count,
                preset.npc_max_count
            ),
        ));
    }

    let easy = SimulationConfig::preset(Difficulty::Easy);
    let hard = SimulationConfig::preset(Difficulty::Hard);
    results.push(TestResult::check(
        "presets_ordered",
        easy.production_rate_per_tick > hard.production_rate_per_tick
            && easy.building_construction_seconds < hard.building_construction_seconds,
        "easy produces faster and builds quicker than hard",
    ));

    let mut broken = SimulationConfig::default();
    broken.npc_min_count = broken.npc_max_count + 1;
    results.push(TestResult::check(
        "config_rejects_inverted_npc_bounds",
        broken.validate().is_err(),
        "npc_min_count above npc_max_count",
    ));

    results
}

// ── 2. Generation ───────────────────────────────────────────────────────

async fn validate_generation(sim: &Sim) -> Vec<TestResult> {
    println!("--- Galaxy Generation ---");
    let mut results = Vec::new();
    let config = sim.engine.config();
    let galaxy = &sim.game.galaxy;

    results.push(TestResult::check(
        "system_count",
        galaxy.systems.len() == config.system_count,
        format!("{} of {} systems", galaxy.systems.len(), config.system_count),
    ));

    let mut closest = f64::INFINITY;
    for (i, a) in galaxy.systems.iter().enumerate() {
        for b in &galaxy.systems[i + 1..] {
            closest = closest.min(a.position.distance_to(b.position));
        }
    }
    results.push(TestResult::check(
        "system_spacing",
        galaxy.systems.len() < 2 || closest >= config.min_system_distance - 1e-6,
        format!("closest pair {:.1} (min {})", closest, config.min_system_distance),
    ));

    let wormholes = sim
        .store
        .list_wormholes(galaxy.galaxy.id)
        .await
        .unwrap_or_default();
    let mut pairs: Vec<_> = wormholes
        .iter()
        .map(|w| (w.system_a.min(w.system_b), w.system_a.max(w.system_b)))
        .collect();
    let self_loops = wormholes.iter().filter(|w| w.system_a == w.system_b).count();
    pairs.sort_unstable();
    pairs.dedup();
    results.push(TestResult::check(
        "wormholes_well_formed",
        self_loops == 0 && pairs.len() == wormholes.len() && wormholes.len() == galaxy.wormhole_count,
        format!("{} wormholes, {} self loops", wormholes.len(), self_loops),
    ));

    let bad_planets = galaxy
        .planets
        .iter()
        .filter(|p| !galaxy.systems.iter().any(|s| s.id == p.system_id))
        .count();
    results.push(TestResult::check(
        "planets_in_galaxy",
        !galaxy.planets.is_empty() && bad_planets == 0,
        format!("{} planets, {} orphaned", galaxy.planets.len(), bad_planets),
    ));

    for start in &sim.game.players {
        let grid = sim
            .store
            .grid_for_planet(start.planet.id)
            .await
            .ok()
            .flatten();
        results.push(TestResult::check(
            &format!("{}_start", start.player_id),
            start.station.resources == config.starting_resources
                && start.builders.len() == config.starting_builders_per_planet as usize
                && start.station.system_id == start.planet.system_id
                && grid.is_some(),
            format!(
                "{} builders on {}, station {}",
                start.builders.len(),
                start.planet.name,
                start.station.name
            ),
        ));
    }

    let npc_start = sim
        .engine
        .create_game("Reserved", &[NPC_PLAYER_ID.to_string()])
        .await;
    results.push(TestResult::check(
        "npc_player_reserved",
        npc_start.is_err(),
        "NPC cannot join as a player",
    ));

    results
}

// ── 3. Campaign ─────────────────────────────────────────────────────────

/// Opening moves: a miner on the richest iron square, a queued farm for the
/// AutoBuilder, and one agent of each built-in behavior.
async fn open_player(sim: &Sim, player: &str) -> Result<()> {
    let start = sim
        .game
        .players
        .iter()
        .find(|s| s.player_id == player)
        .ok_or_else(|| SimError::not_found("Player start", 0))?;
    let grid = sim
        .store
        .grid_for_planet(start.planet.id)
        .await?
        .ok_or_else(|| SimError::not_found("Grid for planet", start.planet.id))?;
    let mut squares = sim.store.list_squares(grid.id).await?;
    squares.sort_by(|a, b| b.iron.unwrap_or(0.0).total_cmp(&a.iron.unwrap_or(0.0)));

    let commands = sim.engine.commands();
    if let Some(square) = squares.first() {
        commands
            .place_building(player, square.id, BuildingType::IronMiner)
            .await?;
    }
    if let Some(square) = squares.get(1) {
        commands
            .queue_building(player, square.id, BuildingType::Farm)
            .await?;
    }

    let game_id = sim.game.game.id;
    commands
        .create_agent(
            player,
            NewAgent {
                game_id,
                name: format!("{} foreman", player),
                agent_type: AgentType::Builder,
                behavior_name: Some("AutoBuilder".into()),
                config: Some(r#"{"priority_building_types":["Farm","IronMiner"]}"#.into()),
                builder_id: start.builders.last().map(|b| b.id),
            },
        )
        .await?;
    commands
        .create_agent(
            player,
            NewAgent {
                game_id,
                name: format!("{} quartermaster", player),
                agent_type: AgentType::Custom,
                behavior_name: Some("ProductionMonitor".into()),
                config: Some(
                    r#"{"monitored_resources":["Iron","Fuel"],"alert_thresholds":{"Iron":200,"Fuel":100}}"#
                        .into(),
                ),
                builder_id: None,
            },
        )
        .await?;

    let neighbour = sim
        .store
        .wormholes_for_system(start.station.system_id)
        .await?
        .first()
        .and_then(|w| w.other_end(start.station.system_id));
    if let Some(target) = neighbour {
        commands
            .create_agent(
                player,
                NewAgent {
                    game_id,
                    name: format!("{} ferry", player),
                    agent_type: AgentType::ResourceFerry,
                    behavior_name: Some("ResourceFerry".into()),
                    config: Some(format!(
                        r#"{{"source_system_id":{},"target_system_id":{},"resource_type":"Iron","min_amount":100,"max_amount":150,"ferry_interval_seconds":60}}"#,
                        start.station.system_id, target
                    )),
                    builder_id: None,
                },
            )
            .await?;
    }
    Ok(())
}

/// Per-tick player script: keep the shipyard busy with scouts and send idle
/// ships through a random wormhole now and then.
async fn play_turn(sim: &Sim, player: &str, rng: &mut StdRng) -> Result<()> {
    let commands = sim.engine.commands();
    if let Some(start) = sim.game.players.iter().find(|s| s.player_id == player) {
        match commands
            .create_spaceship(player, start.shipyard.id, "Scout", None)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_validation() => {}
            Err(e) => return Err(e),
        }
    }

    let ships = sim.store.list_ships(sim.game.game.id).await?;
    for ship in ships
        .iter()
        .filter(|s| s.player_id == player && s.state == ShipState::Idle)
    {
        if !rng.gen_bool(0.2) {
            continue;
        }
        let links = sim.store.wormholes_for_system(ship.system_id).await?;
        if links.is_empty() {
            continue;
        }
        let link = &links[rng.gen_range(0..links.len())];
        let Some(next) = link.other_end(ship.system_id) else {
            continue;
        };
        let destination = Point::new(rng.gen_range(-200.0..200.0), rng.gen_range(-200.0..200.0));
        match commands
            .move_ship(player, ship.id, Some(next), destination)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_validation() => log::debug!("{} could not move {}: {}", player, ship.id, e),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

async fn run_campaign(sim: &Sim, ticks: u32, seed: u64) -> Vec<TestResult> {
    println!("--- Campaign ({} ticks) ---", ticks);
    let mut results = Vec::new();
    let game_id = sim.game.game.id;
    let interval = sim.engine.config().tick_interval_seconds as i64;
    let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);

    for player in PLAYERS {
        let opened = open_player(sim, player).await;
        results.push(TestResult::check(
            &format!("{}_opening", player),
            opened.is_ok(),
            match &opened {
                Ok(()) => "miner placed, farm queued, agents created".to_string(),
                Err(e) => e.to_string(),
            },
        ));
    }

    let mut tick_errors = Vec::new();
    let mut violations = Vec::new();
    let mut totals = Totals::default();
    for tick in 1..=ticks {
        for player in PLAYERS {
            if let Err(e) = play_turn(sim, player, &mut rng).await {
                tick_errors.push(format!("tick {} {}: {}", tick, player, e));
            }
        }
        sim.clock.advance_secs(interval);
        match sim.engine.run_tick(game_id, CancellationToken::never()).await {
            Ok(report) => totals.add(&report),
            Err(e) => tick_errors.push(format!("tick {}: {}", tick, e)),
        }
        match check_invariants(sim).await {
            Ok(found) => violations.extend(found.into_iter().map(|v| format!("tick {}: {}", tick, v))),
            Err(e) => tick_errors.push(format!("tick {} invariants: {}", tick, e)),
        }
        if tick % 50 == 0 {
            log::info!("tick {}: {:?}", tick, totals);
        }
    }

    results.push(TestResult::check(
        "ticks_without_errors",
        tick_errors.is_empty(),
        tick_errors
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{} ticks ran", ticks)),
    ));
    results.push(TestResult::check(
        "invariants_hold",
        violations.is_empty(),
        match violations.first() {
            Some(v) => format!("{} violations, first: {}", violations.len(), v),
            None => "every tick".to_string(),
        },
    ));

    let expected_build = sim.engine.config().building_construction_seconds;
    let built_expected = ticks as f64 * interval as f64 >= expected_build;
    results.push(TestResult::check(
        "buildings_complete",
        !built_expected || totals.buildings_completed > 0,
        format!("{} buildings completed", totals.buildings_completed),
    ));
    results.push(TestResult::check(
        "production_flows",
        !built_expected || totals.extracted > 0.0,
        format!("{:.1} units extracted", totals.extracted),
    ));
    results.push(TestResult::check(
        "ships_launched",
        ticks < 20 || totals.ships_completed > 0,
        format!(
            "{} ships launched, {} arrivals",
            totals.ships_completed, totals.arrived
        ),
    ));
    results.push(TestResult::check(
        "agents_ran",
        ticks == 0 || totals.agent_runs > 0,
        format!("{} agent runs, {} failed", totals.agent_runs, totals.agent_failures),
    ));
    results.push(TestResult::check(
        "combat_summary",
        true,
        format!(
            "{} battles started, {} ended, {} ships destroyed, {} NPCs spawned",
            totals.battles_started, totals.battles_ended, totals.destroyed, totals.npcs_spawned
        ),
    ));
    results.push(TestResult::check(
        "notifications_emitted",
        ticks == 0 || sim.sink.count(|e| matches!(e, SinkEvent::AgentLog(..))) > 0,
        format!("{} notifications recorded", sim.sink.events().len()),
    ));

    results
}

#[derive(Debug, Default)]
struct Totals {
    buildings_completed: usize,
    ships_completed: usize,
    extracted: f64,
    arrived: usize,
    battles_started: usize,
    battles_ended: usize,
    destroyed: usize,
    npcs_spawned: usize,
    agent_runs: usize,
    agent_failures: usize,
}

impl Totals {
    fn add(&mut self, report: &TickReport) {
        self.buildings_completed += report.construction.buildings_completed;
        self.ships_completed += report.construction.ships_completed;
        self.extracted += report.production.total_extracted;
        self.arrived += report.movement.arrived;
        self.battles_started += report.combat.battles_started;
        self.battles_ended += report.combat.battles_ended;
        self.destroyed += report.combat.ships_destroyed;
        self.npcs_spawned += report.npc.spawned;
        self.agent_runs += report.agents.executed;
        self.agent_failures += report.agents.failed;
    }
}

/// World invariants that must hold between ticks.
async fn check_invariants(sim: &Sim) -> Result<Vec<String>> {
    let store = &sim.store;
    let config = sim.engine.config();
    let game_id = sim.game.game.id;
    let mut found = Vec::new();

    for player in PLAYERS {
        for station in store.list_stations(game_id, player).await? {
            for kind in ResourceKind::ALL {
                let amount = station.resources.get(kind);
                if !(amount >= 0.0) {
                    found.push(format!("station {} has {} {}", station.id, amount, kind.name()));
                }
            }
        }
        for builder in store.list_builders(game_id, player).await? {
            if builder.is_available == builder.assigned_building_id.is_some() {
                found.push(format!("builder {} availability disagrees with assignment", builder.id));
            }
        }
    }

    for building in store.list_buildings(game_id).await? {
        let p = building.construction_progress;
        if !(0.0..=100.0).contains(&p) {
            found.push(format!("building {} progress {}", building.id, p));
        }
        if building.is_complete && (p < 100.0 || building.completed_at.is_none()) {
            found.push(format!("building {} complete at {}", building.id, p));
        }
    }

    let ships = store.list_ships(game_id).await?;
    for ship in &ships {
        if ship.health > ship.max_health || (ship.state != ShipState::Destroyed && ship.health <= 0) {
            found.push(format!("ship {} health {}/{}", ship.id, ship.health, ship.max_health));
        }
        if !(0.0..=100.0).contains(&ship.construction_progress) {
            found.push(format!("ship {} construction {}", ship.id, ship.construction_progress));
        }
    }

    let living_npcs = ships.iter().filter(|s| s.is_npc() && s.is_alive()).count();
    if living_npcs > config.npc_max_count as usize {
        found.push(format!("{} NPCs alive (max {})", living_npcs, config.npc_max_count));
    }

    let mut engaged = Vec::new();
    for battle in store.list_battles(game_id, None).await? {
        if battle.rounds_elapsed > config.max_combat_rounds {
            found.push(format!("battle {} ran {} rounds", battle.id, battle.rounds_elapsed));
        }
        match battle.state {
            BattleState::InProgress => {
                engaged.extend(battle.participants.iter().map(|p| p.spaceship_id));
            }
            _ if battle.ended_at.is_none() || battle.end_reason.is_none() => {
                found.push(format!("battle {} ended without a reason", battle.id));
            }
            _ => {}
        }
    }
    let before = engaged.len();
    engaged.sort_unstable();
    engaged.dedup();
    if engaged.len() != before {
        found.push("a ship is in more than one active battle".to_string());
    }

    Ok(found)
}

// ── 4. Snapshot ─────────────────────────────────────────────────────────

async fn validate_snapshot(sim: &Sim) -> Vec<TestResult> {
    println!("--- Snapshot ---");
    let game_id = sim.game.game.id;
    let outcome: Result<(usize, usize)> = async {
        let mut bytes = Vec::new();
        sim.store.save_snapshot(&mut bytes).await?;
        let restored = InMemoryStore::new();
        restored.load_snapshot(bytes.as_slice()).await?;
        Ok((
            restored.list_ships(game_id).await?.len(),
            restored.list_agents(game_id).await?.len(),
        ))
    }
    .await;

    let expected = (
        sim.store.list_ships(game_id).await.map(|s| s.len()).unwrap_or(0),
        sim.store.list_agents(game_id).await.map(|a| a.len()).unwrap_or(0),
    );
    vec![TestResult::check(
        "snapshot_round_trip",
        matches!(&outcome, Ok(counts) if *counts == expected),
        match outcome {
            Ok((ships, agents)) => format!("{} ships, {} agents restored", ships, agents),
            Err(e) => e.to_string(),
        },
    )]
}

// ── 5. Determinism ──────────────────────────────────────────────────────

/// A coarse digest of the world: counts plus station totals.
async fn fingerprint(sim: &Sim) -> Result<String> {
    let game_id = sim.game.game.id;
    let mut parts = vec![
        sim.store.list_ships(game_id).await?.len().to_string(),
        sim.store.list_battles(game_id, None).await?.len().to_string(),
        sim.store.list_buildings(game_id).await?.len().to_string(),
    ];
    for player in PLAYERS {
        for station in sim.store.list_stations(game_id, player).await? {
            let r = station.resources;
            parts.push(format!("{:.3}/{:.3}/{:.3}/{:.3}", r.iron, r.copper, r.fuel, r.soil));
        }
    }
    for ship in sim.store.list_ships(game_id).await? {
        parts.push(format!("{:.3},{:.3}", ship.position.x, ship.position.y));
    }
    Ok(parts.join(";"))
}

async fn seeded_run(config: SimulationConfig, seed: u64, ticks: u32) -> Result<String> {
    let sim = boot(config, seed).await?;
    let interval = sim.engine.config().tick_interval_seconds as i64;
    let mut rng = StdRng::seed_from_u64(seed);
    for player in PLAYERS {
        open_player(&sim, player).await?;
    }
    for _ in 0..ticks {
        for player in PLAYERS {
            play_turn(&sim, player, &mut rng).await?;
        }
        sim.clock.advance_secs(interval);
        sim.engine
            .run_tick(sim.game.game.id, CancellationToken::never())
            .await?;
    }
    fingerprint(&sim).await
}

async fn validate_determinism(config: SimulationConfig, seed: u64) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let first = seeded_run(config.clone(), seed, 40).await;
    let second = seeded_run(config, seed, 40).await;
    let detail = match (&first, &second) {
        (Ok(a), Ok(b)) if a == b => "same seed, same world after 40 ticks".to_string(),
        (Ok(_), Ok(_)) => "worlds diverged".to_string(),
        (Err(e), _) | (_, Err(e)) => e.to_string(),
    };
    vec![TestResult::check(
        "seeded_runs_match",
        matches!((&first, &second), (Ok(a), Ok(b)) if a == b),
        detail,
    )]
}
