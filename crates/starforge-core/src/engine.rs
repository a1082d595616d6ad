//! Simulation engine - owns the shared dependencies and runs one game tick

use crate::agents::{agent_system, AgentReport, BehaviorRegistry};
use crate::cancel::CancellationToken;
use crate::clock::Clock;
use crate::commands::Commands;
use crate::config::SimulationConfig;
use crate::context::TickContext;
use crate::error::{Result, SimError};
use crate::events::EventSink;
use crate::generation::{create_game, NewGame};
use crate::model::{GameId, PlayerId};
use crate::repository::Store;
use crate::systems::*;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// What one game tick did, stage by stage.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub game_id: GameId,
    pub at: DateTime<Utc>,
    pub construction: ConstructionReport,
    pub production: ProductionReport,
    pub movement: MovementReport,
    pub combat: CombatReport,
    pub npc: NpcReport,
    pub agents: AgentReport,
}

pub struct SimulationEngine {
    store: Arc<dyn Store>,
    config: Arc<SimulationConfig>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    registry: Arc<BehaviorRegistry>,
    /// Master RNG; every tick draws its own seed from it.
    rng: Mutex<StdRng>,
}

impl SimulationEngine {
    pub fn new(
        store: Arc<dyn Store>,
        config: SimulationConfig,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
            sink,
            clock,
            registry: Arc::new(BehaviorRegistry::with_builtins()),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    pub fn with_registry(mut self, registry: BehaviorRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn config(&self) -> &Arc<SimulationConfig> {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn registry(&self) -> &Arc<BehaviorRegistry> {
        &self.registry
    }

    /// Command handle sharing this engine's store, config, sink and clock.
    pub fn commands(&self) -> Commands {
        Commands::new(
            Arc::clone(&self.store),
            Arc::clone(&self.config),
            Arc::clone(&self.sink),
            Arc::clone(&self.clock),
            Arc::clone(&self.registry),
        )
    }

    /// Create a game with a generated galaxy and starting positions.
    pub async fn create_game(&self, name: &str, players: &[PlayerId]) -> Result<NewGame> {
        let mut rng = self.rng.lock().await;
        create_game(
            self.store.as_ref(),
            &self.config,
            &mut rng,
            self.clock.now(),
            name,
            players,
        )
        .await
    }

    /// Next per-tick seed from the master RNG. Callers that tick several
    /// games at once draw all seeds up front, in game order, so a seeded run
    /// replays regardless of task scheduling.
    pub async fn next_tick_seed(&self) -> u64 {
        self.rng.lock().await.gen()
    }

    /// A context for `game_id` at the current clock time, its RNG seeded
    /// with `seed`.
    pub fn context(&self, game_id: GameId, seed: u64, cancel: CancellationToken) -> TickContext {
        TickContext::new(
            game_id,
            Arc::clone(&self.store),
            Arc::clone(&self.config),
            Arc::clone(&self.sink),
            self.clock.now(),
            StdRng::seed_from_u64(seed),
        )
        .with_cancel(cancel)
    }

    /// Run every stage once for one game with the next master seed.
    pub async fn run_tick(&self, game_id: GameId, cancel: CancellationToken) -> Result<TickReport> {
        let seed = self.next_tick_seed().await;
        self.run_tick_seeded(game_id, seed, cancel).await
    }

    /// Run every stage once for one game, in order:
    /// construction, production, movement, combat, NPCs, agents.
    pub async fn run_tick_seeded(
        &self,
        game_id: GameId,
        seed: u64,
        cancel: CancellationToken,
    ) -> Result<TickReport> {
        let game = self
            .store
            .get_game(game_id)
            .await?
            .ok_or_else(|| SimError::not_found("Game", game_id))?;
        if !game.is_active {
            return Err(SimError::Validation(format!("Game {} is not active", game_id)));
        }

        let started = Instant::now();
        let mut ctx = self.context(game_id, seed, cancel);

        let construction = construction_system(&mut ctx).await?;
        let production = production_system(&mut ctx).await?;
        let movement = movement_system(&mut ctx).await?;
        let combat = combat_system(&mut ctx).await?;
        let npc = npc_system(&mut ctx).await?;
        let agents = agent_system(&mut ctx, &self.registry).await?;

        let report = TickReport {
            game_id,
            at: ctx.now,
            construction,
            production,
            movement,
            combat,
            npc,
            agents,
        };
        log::info!(
            "Tick for game {} in {:.1}ms: {} buildings done, {:.1} extracted, {} ships arrived, {} battles ({} ended), {} NPCs spawned, {} agents ran",
            game_id,
            started.elapsed().as_secs_f64() * 1000.0,
            report.construction.buildings_completed,
            report.production.total_extracted,
            report.movement.arrived,
            report.combat.rounds_resolved,
            report.combat.battles_ended,
            report.npc.spawned,
            report.agents.executed
        );
        Ok(report)
    }
}
