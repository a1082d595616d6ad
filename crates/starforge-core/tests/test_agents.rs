//! Integration tests for agent automation and the agent/colony commands.
//!
//! Exercises: Commands → Agent → BehaviorRegistry → agent_system → AgentLog,
//! and the AutoBuilder → construction hand-off.

mod common;

use async_trait::async_trait;
use common::*;
use starforge_core::agents::agent_system;
use starforge_core::cancel::Shutdown;
use starforge_core::commands::MAX_LOG_PAGE;
use starforge_core::events::SinkEvent;
use starforge_core::prelude::*;
use starforge_core::systems::construction_system;
use starforge_logic::geometry::Point;
use starforge_logic::resources::BuildingType;
use starforge_logic::ships::{ShipState, ShipType};
use std::sync::Arc;

// ── Helpers ────────────────────────────────────────────────────────────

async fn run_agents(w: &World) -> starforge_core::agents::AgentReport {
    agent_system(&mut w.ctx(), &w.registry).await.unwrap()
}

async fn fetch_agent(w: &World, id: AgentId) -> Agent {
    w.store.get_agent(id).await.unwrap().unwrap()
}

async fn last_log(w: &World, id: AgentId) -> AgentLog {
    w.store.list_logs(id, 1).await.unwrap().remove(0)
}

fn ferry_config(w: &World) -> String {
    format!(
        r#"{{"source_system_id":{},"target_system_id":{},"resource_type":"iron","min_amount":100,"max_amount":500,"ferry_interval_seconds":300}}"#,
        w.systems[0].id, w.systems[1].id
    )
}

async fn builder_agent(w: &World, config: Option<&str>) -> Agent {
    w.commands()
        .create_agent(
            ALICE,
            NewAgent {
                game_id: w.game.id,
                name: "Foreman".into(),
                agent_type: AgentType::Builder,
                behavior_name: Some("autobuilder".into()),
                config: config.map(str::to_string),
                builder_id: Some(w.builder.id),
            },
        )
        .await
        .unwrap()
}

// ── AutoBuilder ────────────────────────────────────────────────────────

#[tokio::test]
async fn auto_builder_assigns_its_builder_to_queued_work() {
    let w = world().await;
    let building = w
        .commands()
        .queue_building(ALICE, w.square_with_iron().id, BuildingType::IronMiner)
        .await
        .unwrap();
    let agent = builder_agent(&w, None).await;

    let report = run_agents(&w).await;
    assert_eq!((report.executed, report.succeeded), (1, 1));

    let builder = w.store.get_builder(w.builder.id).await.unwrap().unwrap();
    assert!(!builder.is_available);
    assert_eq!(builder.assigned_building_id, Some(building.id));
    let queued = w.store.get_building(building.id).await.unwrap().unwrap();
    assert_eq!(queued.construction_start_time, Some(w.clock.now()));
    assert_eq!(queued.assigned_builder_id, Some(builder.id));

    let log = last_log(&w, agent.id).await;
    assert_eq!(log.level, LogLevel::Info);
    assert!(log.message.starts_with("Assigned builder to construct IronMiner"));
    assert_eq!(agent_state(&w, agent.id).await, AgentState::Active);

    // The building then finishes on the normal construction schedule.
    w.clock.advance_secs(300);
    construction_system(&mut w.ctx()).await.unwrap();
    let done = w.store.get_building(building.id).await.unwrap().unwrap();
    assert!(done.is_complete);
    assert!(w.store.get_builder(w.builder.id).await.unwrap().unwrap().is_available);
}

async fn agent_state(w: &World, id: AgentId) -> AgentState {
    fetch_agent(w, id).await.state
}

#[tokio::test]
async fn auto_builder_prefers_priority_types_then_oldest() {
    let w = world().await;
    let cmds = w.commands();
    let squares: Vec<_> = w.squares.iter().map(|s| s.id).collect();
    let oldest = cmds
        .queue_building(ALICE, squares[0], BuildingType::IronMiner)
        .await
        .unwrap();
    w.clock.advance_secs(1);
    let farm = cmds
        .queue_building(ALICE, squares[1], BuildingType::Farm)
        .await
        .unwrap();
    w.clock.advance_secs(1);
    cmds.queue_building(ALICE, squares[2], BuildingType::Farm)
        .await
        .unwrap();

    builder_agent(&w, Some(r#"{"priority_building_types":["Farm"]}"#)).await;
    run_agents(&w).await;
    let builder = w.store.get_builder(w.builder.id).await.unwrap().unwrap();
    assert_eq!(builder.assigned_building_id, Some(farm.id));
    assert_ne!(builder.assigned_building_id, Some(oldest.id));
}

#[tokio::test]
async fn auto_builder_goes_idle_without_candidates() {
    let w = world().await;
    let agent = builder_agent(&w, None).await;
    run_agents(&w).await;
    assert_eq!(agent_state(&w, agent.id).await, AgentState::Idle);
    assert_eq!(
        last_log(&w, agent.id).await.message,
        "No buildings awaiting construction"
    );
}

#[tokio::test]
async fn auto_builder_leaves_work_on_other_planets_alone() {
    let w = world().await;
    let grid = w
        .store
        .add_grid(
            PlanetGrid {
                id: 0,
                planet_id: w.frontier.id,
                width: 1,
                height: 1,
            },
            vec![GridSquare {
                id: 0,
                grid_id: 0,
                x: 0,
                y: 0,
                iron: Some(100.0),
                copper: None,
                fuel: None,
                soil: None,
            }],
        )
        .await
        .unwrap();
    let far_square = w.store.list_squares(grid.id).await.unwrap().remove(0);
    let far = w
        .commands()
        .queue_building(ALICE, far_square.id, BuildingType::IronMiner)
        .await
        .unwrap();

    let agent = builder_agent(&w, None).await;
    run_agents(&w).await;
    assert_eq!(agent_state(&w, agent.id).await, AgentState::Idle);
    assert!(w.store.get_builder(w.builder.id).await.unwrap().unwrap().is_available);
    let untouched = w.store.get_building(far.id).await.unwrap().unwrap();
    assert_eq!(untouched.assigned_builder_id, None);
    assert_eq!(untouched.construction_start_time, None);
}

#[tokio::test]
async fn auto_builder_respects_concurrency_limit() {
    let w = world().await;
    // Another of alice's builders is already busy.
    let mut busy = w.builder.clone();
    busy.id = 0;
    busy.name = "Busy".into();
    let mut busy = w.store.add_builder(busy).await.unwrap();
    busy.is_available = false;
    w.store.update_builder(&busy).await.unwrap();

    w.commands()
        .queue_building(ALICE, w.square_with_iron().id, BuildingType::IronMiner)
        .await
        .unwrap();
    let agent = builder_agent(&w, Some(r#"{"max_concurrent_buildings":1}"#)).await;
    run_agents(&w).await;

    assert!(w.store.get_builder(w.builder.id).await.unwrap().unwrap().is_available);
    assert_eq!(
        last_log(&w, agent.id).await.message,
        "Max concurrent buildings limit reached (1)"
    );
    assert_eq!(agent_state(&w, agent.id).await, AgentState::Active);
}

#[tokio::test]
async fn auto_builder_without_builder_cannot_execute() {
    let w = world().await;
    let agent = w
        .add_agent(AgentType::Builder, Some("AutoBuilder"), None, None)
        .await;
    let report = run_agents(&w).await;
    assert_eq!(report.failed, 1);

    let log = last_log(&w, agent.id).await;
    assert_eq!(log.level, LogLevel::Error);
    assert_eq!(log.message, "Behavior AutoBuilder cannot execute for this agent");
    assert_eq!(agent_state(&w, agent.id).await, AgentState::Error);
}

// ── ResourceFerry ──────────────────────────────────────────────────────

#[tokio::test]
async fn ferry_moves_stock_on_its_interval_and_never_overdraws() {
    let w = world().await;
    let config = ferry_config(&w);
    let agent = w
        .add_agent(AgentType::ResourceFerry, Some("ResourceFerry"), Some(&config), None)
        .await;
    assert_eq!(w.station(w.station.id).await.resources.iron, 1000.0);

    run_agents(&w).await;
    let source = w.station(w.station.id).await;
    let target = w
        .store
        .find_station(ALICE, w.systems[1].id)
        .await
        .unwrap()
        .expect("target station created");
    assert_eq!(source.resources.iron, 500.0);
    assert_eq!(target.resources.iron, 500.0);

    // Past the minimum interval but not the ferry interval.
    w.clock.advance_secs(10);
    let report = run_agents(&w).await;
    assert_eq!(report.waiting, 1);
    assert_eq!(w.station(w.station.id).await.resources.iron, 500.0);

    w.clock.advance_secs(290);
    run_agents(&w).await;
    assert_eq!(w.station(w.station.id).await.resources.iron, 0.0);
    assert_eq!(w.station(target.id).await.resources.iron, 1000.0);

    // Below the minimum: nothing moves, the source stays at zero.
    w.clock.advance_secs(300);
    run_agents(&w).await;
    assert_eq!(w.station(w.station.id).await.resources.iron, 0.0);
    assert_eq!(w.station(target.id).await.resources.iron, 1000.0);
    assert!(last_log(&w, agent.id).await.message.contains("insufficient"));
    assert_eq!(agent_state(&w, agent.id).await, AgentState::Active);
}

#[tokio::test]
async fn ferry_caps_each_trip_and_keeps_remainders() {
    let w = world().await;
    let mut station = w.station(w.station.id).await;
    station.resources.iron = 730.0;
    w.store.update_station(&station).await.unwrap();

    let config = ferry_config(&w);
    w.add_agent(AgentType::ResourceFerry, Some("ResourceFerry"), Some(&config), None)
        .await;
    for _ in 0..3 {
        run_agents(&w).await;
        w.clock.advance_secs(300);
        let source = w.station(w.station.id).await.resources.iron;
        assert!(source >= 0.0);
    }
    let target = w
        .store
        .find_station(ALICE, w.systems[1].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(w.station(w.station.id).await.resources.iron, 0.0);
    assert_eq!(target.resources.iron, 730.0);
}

#[tokio::test]
async fn ferry_without_source_station_errors() {
    let w = world().await;
    let config = format!(
        r#"{{"source_system_id":{},"target_system_id":{}}}"#,
        w.systems[2].id, w.systems[1].id
    );
    let agent = w
        .add_agent(AgentType::ResourceFerry, Some("ResourceFerry"), Some(&config), None)
        .await;
    run_agents(&w).await;
    let log = last_log(&w, agent.id).await;
    assert_eq!(log.level, LogLevel::Error);
    assert_eq!(log.message, "Source space station not found");
    assert_eq!(agent_state(&w, agent.id).await, AgentState::Error);
}

#[tokio::test]
async fn ferry_refuses_a_target_in_another_game() {
    let w = world().await;
    let other_game = w
        .store
        .add_game(Game {
            id: 0,
            name: "Elsewhere".into(),
            is_active: true,
            players: vec![BOB.into()],
            created_at: w.clock.now(),
        })
        .await
        .unwrap();
    let other_galaxy = w
        .store
        .add_galaxy(Galaxy {
            id: 0,
            game_id: other_game.id,
            name: "Elsewhere Galaxy".into(),
            system_count: 1,
        })
        .await
        .unwrap();
    let foreign = w
        .store
        .add_system(StarSystem {
            id: 0,
            galaxy_id: other_galaxy.id,
            name: "Faraway".into(),
            position: Point::ORIGIN,
        })
        .await
        .unwrap();

    let config = format!(
        r#"{{"source_system_id":{},"target_system_id":{}}}"#,
        w.systems[0].id, foreign.id
    );
    let agent = w
        .add_agent(AgentType::ResourceFerry, Some("ResourceFerry"), Some(&config), None)
        .await;
    let iron = w.station(w.station.id).await.resources.iron;
    run_agents(&w).await;

    let log = last_log(&w, agent.id).await;
    assert_eq!(log.message, "Target system not found");
    assert_eq!(agent_state(&w, agent.id).await, AgentState::Error);
    assert!(w.store.find_station(ALICE, foreign.id).await.unwrap().is_none());
    assert_eq!(w.station(w.station.id).await.resources.iron, iron);
}

// ── ProductionMonitor ──────────────────────────────────────────────────

#[tokio::test]
async fn monitor_reports_low_stock_in_the_log_payload() {
    let w = world().await;
    let agent = w
        .add_agent(
            AgentType::Custom,
            Some("ProductionMonitor"),
            Some(r#"{"monitored_resources":["Iron","Soil"],"alert_thresholds":{"Iron":2000,"Soil":10}}"#),
            None,
        )
        .await;
    run_agents(&w).await;

    let log = last_log(&w, agent.id).await;
    assert_eq!(log.message, "Found 1 resource alert(s)");
    let data: serde_json::Value = serde_json::from_str(log.data.as_deref().unwrap()).unwrap();
    let alerts = data["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(
        alerts[0].as_str().unwrap(),
        "Station alice's Station: Iron low (1000.0 < 2000)"
    );

    // Next check waits for the 60s interval.
    w.clock.advance_secs(30);
    assert_eq!(run_agents(&w).await.executed, 0);
    w.clock.advance_secs(30);
    assert_eq!(run_agents(&w).await.executed, 1);
}

// ── Executor ───────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_behavior_falls_back_to_idle() {
    let w = world().await;
    let agent = w
        .add_agent(AgentType::Custom, Some("Teleporter"), None, None)
        .await;
    run_agents(&w).await;
    let stored = agent_state(&w, agent.id).await;
    assert_eq!(stored, AgentState::Idle);
    assert_eq!(last_log(&w, agent.id).await.message, "Agent is idle");
}

#[tokio::test]
async fn behavior_errors_put_the_agent_in_error_state() {
    let w = world().await;
    let agent = w
        .add_agent(
            AgentType::Builder,
            Some("AutoBuilder"),
            Some("{broken"),
            Some(w.builder.id),
        )
        .await;
    let report = run_agents(&w).await;
    assert_eq!(report.failed, 1);

    let log = last_log(&w, agent.id).await;
    assert_eq!(log.level, LogLevel::Error);
    assert!(log.message.starts_with("Agent execution error: "));
    let stored = fetch_agent(&w, agent.id).await;
    assert_eq!(stored.state, AgentState::Error);
    assert_eq!(stored.last_execution_time, Some(w.clock.now()));
    assert!(w
        .sink
        .count(|e| matches!(e, SinkEvent::AgentLog(id, _) if *id == agent.id))
        >= 1);
}

/// Blows up on every run.
struct Meltdown;

#[async_trait]
impl Behavior for Meltdown {
    fn name(&self) -> &'static str {
        "Meltdown"
    }

    fn description(&self) -> &'static str {
        "Panics when executed"
    }

    fn supported_types(&self) -> &'static [AgentType] {
        &[AgentType::Custom]
    }

    fn validate_config(&self, _config: Option<&str>) -> Result<()> {
        Ok(())
    }

    async fn can_execute(&self, _agent: &Agent, _ctx: &TickContext) -> Result<bool> {
        Ok(true)
    }

    async fn execute(&self, _agent: &Agent, _ctx: &mut TickContext) -> Result<BehaviorResult> {
        let cores: Vec<u32> = Vec::new();
        let core = cores[0];
        Ok(BehaviorResult::idle(format!("core {} online", core)))
    }
}

#[tokio::test]
async fn a_panicking_behavior_only_fails_its_own_agent() {
    let w = world().await;
    let mut registry = BehaviorRegistry::with_builtins();
    registry.register(Arc::new(Meltdown));

    let broken = w
        .add_agent(AgentType::Custom, Some("Meltdown"), None, None)
        .await;
    let steady = w.add_agent(AgentType::Custom, Some("Idle"), None, None).await;

    let report = agent_system(&mut w.ctx(), &registry).await.unwrap();
    assert_eq!(
        (report.executed, report.succeeded, report.failed),
        (2, 1, 1)
    );

    let stored = fetch_agent(&w, broken.id).await;
    assert_eq!(stored.state, AgentState::Error);
    assert_eq!(stored.last_execution_time, Some(w.clock.now()));
    let log = last_log(&w, broken.id).await;
    assert_eq!(log.level, LogLevel::Error);
    assert!(log.message.starts_with("Agent execution error: "));
    assert!(log.message.contains("Meltdown panicked"));

    let stored = fetch_agent(&w, steady.id).await;
    assert_eq!(stored.state, AgentState::Idle);
    assert_eq!(stored.last_execution_time, Some(w.clock.now()));
}

#[tokio::test]
async fn agents_respect_the_minimum_interval() {
    let w = world().await;
    let agent = builder_agent(&w, None).await;
    w.commands()
        .queue_building(ALICE, w.square_with_iron().id, BuildingType::IronMiner)
        .await
        .unwrap();

    assert_eq!(run_agents(&w).await.executed, 1);
    w.clock.advance_secs(4);
    let report = run_agents(&w).await;
    assert_eq!((report.executed, report.waiting), (0, 1));
    w.clock.advance_secs(1);
    assert_eq!(run_agents(&w).await.executed, 1);
    assert_eq!(
        last_log(&w, agent.id).await.message,
        "Builder is currently busy"
    );
}

#[tokio::test]
async fn paused_agents_are_skipped_and_cancellation_stops_the_stage() {
    let w = world().await;
    let cmds = w.commands();
    let agent = builder_agent(&w, None).await;
    cmds.pause_agent(ALICE, agent.id).await.unwrap();
    assert_eq!(run_agents(&w).await.executed, 0);

    cmds.resume_agent(ALICE, agent.id).await.unwrap();
    let shutdown = Shutdown::new();
    shutdown.cancel();
    let mut ctx = w.ctx().with_cancel(shutdown.token());
    let report = agent_system(&mut ctx, &w.registry).await.unwrap();
    assert_eq!(report.executed, 0);

    assert_eq!(run_agents(&w).await.executed, 1);
}

// ── Commands ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_agent_validates_behavior_config_and_ownership() {
    let w = world().await;
    let cmds = w.commands();
    let request = |agent_type, behavior: &str, config: Option<&str>, builder_id| NewAgent {
        game_id: w.game.id,
        name: "Agent".into(),
        agent_type,
        behavior_name: Some(behavior.into()),
        config: config.map(str::to_string),
        builder_id,
    };

    let err = cmds
        .create_agent(ALICE, request(AgentType::ResourceFerry, "ResourceFerry", None, None))
        .await
        .unwrap_err();
    assert!(matches!(err, SimError::InvalidBehaviorConfig { .. }));

    let err = cmds
        .create_agent(ALICE, request(AgentType::Custom, "AutoBuilder", None, None))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = cmds
        .create_agent(BOB, request(AgentType::Builder, "AutoBuilder", None, Some(w.builder.id)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not belong"));

    let err = cmds
        .create_agent("mallory", request(AgentType::Custom, "Idle", None, None))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert!(w.store.list_agents(w.game.id).await.unwrap().is_empty());

    let ok = cmds
        .create_agent(ALICE, request(AgentType::Custom, "productionmonitor", None, None))
        .await
        .unwrap();
    assert_eq!(ok.state, AgentState::Active);
}

#[tokio::test]
async fn agent_lifecycle_commands() {
    let w = world().await;
    let cmds = w.commands();
    let agent = builder_agent(&w, None).await;

    let err = cmds
        .update_agent_config(ALICE, agent.id, None, Some("{oops".into()))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    let updated = cmds
        .update_agent_config(
            ALICE,
            agent.id,
            None,
            Some(r#"{"max_concurrent_buildings":2}"#.into()),
        )
        .await
        .unwrap();
    assert_eq!(updated.behavior_name.as_deref(), Some("autobuilder"));

    for _ in 0..3 {
        run_agents(&w).await;
        cmds.resume_agent(ALICE, agent.id).await.unwrap();
    }
    assert_eq!(cmds.agent_logs(ALICE, agent.id, 2).await.unwrap().len(), 2);
    assert_eq!(cmds.agent_logs(ALICE, agent.id, 10_000).await.unwrap().len(), 3);
    assert!(MAX_LOG_PAGE <= 100);
    assert!(cmds.agent_logs(BOB, agent.id, 10).await.is_err());

    assert!(cmds.delete_agent(BOB, agent.id).await.is_err());
    cmds.delete_agent(ALICE, agent.id).await.unwrap();
    assert!(w.store.get_agent(agent.id).await.unwrap().is_none());
    assert!(w.store.list_logs(agent.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn place_building_needs_a_free_square_and_builder() {
    let w = world().await;
    let cmds = w.commands();
    let square = w.square_with_iron().id;

    cmds.place_building(ALICE, square, BuildingType::IronMiner)
        .await
        .unwrap();
    let err = cmds
        .place_building(ALICE, square, BuildingType::Farm)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already has a building"));

    // Alice's only builder is busy now.
    let other = w.squares.iter().find(|s| s.id != square).unwrap().id;
    let err = cmds
        .place_building(ALICE, other, BuildingType::Farm)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No available builder"));
    assert!(w.store.building_on_square(other).await.unwrap().is_none());
}

#[tokio::test]
async fn colony_ship_founds_a_station_and_is_consumed() {
    let w = world().await;
    let mut ship = w.add_ship(ALICE, 1, Point::ORIGIN, (100, 0, 10)).await;
    let cmds = w.commands();

    let err = cmds
        .colonize(ALICE, ship.id, w.frontier.id)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not a colony ship"));

    ship.ship_type = ShipType::Colony;
    w.store.update_ship(&ship).await.unwrap();
    let err = cmds.colonize(ALICE, ship.id, w.home.id).await.unwrap_err();
    assert!(err.is_validation());

    let colony = cmds.colonize(ALICE, ship.id, w.frontier.id).await.unwrap();
    assert!(colony.station_created);
    assert_eq!(colony.station.system_id, w.systems[1].id);
    assert_eq!(colony.builder.planet_id, w.frontier.id);
    assert_eq!(colony.builder.name, "Builder Beta I");
    assert_eq!(w.ship(ship.id).await.state, ShipState::Destroyed);
    assert_eq!(
        w.sink
            .count(|e| matches!(e, SinkEvent::ShipDestroyed(id) if *id == ship.id)),
        1
    );

    assert!(cmds.colonize(ALICE, ship.id, w.frontier.id).await.is_err());
}
