//! Per-tick dependency bundle.

use crate::cancel::CancellationToken;
use crate::config::SimulationConfig;
use crate::events::EventSink;
use crate::model::GameId;
use crate::repository::Store;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use std::sync::Arc;

/// Everything a stage needs to advance one game: storage, settings, the
/// event sink, a frozen "now", this tick's RNG and the cancellation token.
///
/// Each game tick owns its own `StdRng`, so concurrent games never share
/// random state and seeded runs replay exactly.
pub struct TickContext {
    pub game_id: GameId,
    pub store: Arc<dyn Store>,
    pub config: Arc<SimulationConfig>,
    pub sink: Arc<dyn EventSink>,
    pub now: DateTime<Utc>,
    pub rng: StdRng,
    pub cancel: CancellationToken,
}

impl TickContext {
    pub fn new(
        game_id: GameId,
        store: Arc<dyn Store>,
        config: Arc<SimulationConfig>,
        sink: Arc<dyn EventSink>,
        now: DateTime<Utc>,
        rng: StdRng,
    ) -> Self {
        Self {
            game_id,
            store,
            config,
            sink,
            now,
            rng,
            cancel: CancellationToken::never(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
