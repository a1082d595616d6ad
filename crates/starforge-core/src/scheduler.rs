//! Periodic driver: ticks every active game on a bounded worker pool.
//!
//! A game is ticked by at most one task at a time ([`GameLocks`]). A failing
//! game is logged and does not affect the others.

use crate::cancel::CancellationToken;
use crate::engine::SimulationEngine;
use crate::error::Result;
use crate::model::GameId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

/// Advisory per-game locks.
#[derive(Debug, Default)]
pub struct GameLocks {
    held: Mutex<HashSet<GameId>>,
}

impl GameLocks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the lock for `game_id`, or `None` if someone holds it.
    pub fn try_acquire(self: &Arc<Self>, game_id: GameId) -> Option<GameLockGuard> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(game_id) {
            return None;
        }
        Some(GameLockGuard {
            locks: Arc::clone(self),
            game_id,
        })
    }

    pub fn is_locked(&self, game_id: GameId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&game_id)
    }
}

/// Releases its game's lock on drop.
#[derive(Debug)]
pub struct GameLockGuard {
    locks: Arc<GameLocks>,
    game_id: GameId,
}

impl Drop for GameLockGuard {
    fn drop(&mut self) {
        self.locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.game_id);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub games: usize,
    pub ticked: usize,
    /// Already being ticked elsewhere.
    pub skipped: usize,
    pub failed: usize,
}

pub struct TickScheduler {
    engine: Arc<SimulationEngine>,
    locks: Arc<GameLocks>,
    permits: Arc<Semaphore>,
}

impl TickScheduler {
    pub fn new(engine: Arc<SimulationEngine>) -> Self {
        let workers = engine.config().max_concurrent_games.max(1);
        Self {
            engine,
            locks: GameLocks::new(),
            permits: Arc::new(Semaphore::new(workers)),
        }
    }

    pub fn locks(&self) -> &Arc<GameLocks> {
        &self.locks
    }

    /// Tick every active game once and wait for all of them.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let mut games = self.engine.store().list_active_games().await?;
        games.sort_by_key(|g| g.id);
        let mut report = CycleReport {
            games: games.len(),
            ..Default::default()
        };

        let mut tasks = JoinSet::new();
        for game in games {
            if cancel.is_cancelled() {
                log::info!("Tick cycle cancelled before game {}", game.id);
                break;
            }
            let Some(guard) = self.locks.try_acquire(game.id) else {
                log::debug!("Game {} is still ticking; skipping", game.id);
                report.skipped += 1;
                continue;
            };
            // Seeds are drawn here, in game order, not inside the tasks.
            let seed = self.engine.next_tick_seed().await;
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };
            let engine = Arc::clone(&self.engine);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let _guard = guard;
                (game.id, engine.run_tick_seeded(game.id, seed, cancel).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => report.ticked += 1,
                Ok((game_id, Err(e))) => {
                    report.failed += 1;
                    log::error!("Tick failed for game {}: {}", game_id, e);
                }
                Err(e) => {
                    report.failed += 1;
                    log::error!("Game tick task failed: {}", e);
                }
            }
        }
        Ok(report)
    }

    /// Wait out the startup delay, then run a cycle every tick interval
    /// until `cancel` fires. The cycle in flight is allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        let config = Arc::clone(self.engine.config());
        log::info!(
            "Tick scheduler starting in {}s (every {}s, {} workers)",
            config.scheduler_startup_delay_seconds,
            config.tick_interval_seconds,
            config.max_concurrent_games
        );

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(config.scheduler_startup_delay_seconds)) => {}
            _ = cancel.cancelled() => {
                log::info!("Tick scheduler cancelled before start");
                return;
            }
        }

        let mut interval = tokio::time::interval(Duration::from_secs(config.tick_interval_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    match self.run_cycle(&cancel).await {
                        Ok(cycle) => log::debug!(
                            "Cycle: {} games, {} ticked, {} skipped, {} failed",
                            cycle.games,
                            cycle.ticked,
                            cycle.skipped,
                            cycle.failed
                        ),
                        Err(e) => log::error!("Tick cycle failed: {}", e),
                    }
                }
            }
        }
        log::info!("Tick scheduler stopped");
    }
}
