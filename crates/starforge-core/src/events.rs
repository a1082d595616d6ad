//! Outbound notifications for the presentation layer.
//!
//! The engine calls an [`EventSink`] after each committed mutation. Calls are
//! fire-and-forget: a sink must not block and cannot fail the tick.

use crate::model::{Agent, AgentId, AgentLog, Battle, ShipId, Shipyard, Spaceship};
use std::sync::{Mutex, PoisonError};

pub trait EventSink: Send + Sync {
    fn on_ship_updated(&self, ship: &Spaceship);
    fn on_ship_destroyed(&self, ship_id: ShipId);
    fn on_battle_updated(&self, battle: &Battle);
    fn on_agent_updated(&self, agent: &Agent);
    fn on_agent_log(&self, agent_id: AgentId, log: &AgentLog);
    fn on_shipyard_updated(&self, shipyard: &Shipyard);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_ship_updated(&self, _ship: &Spaceship) {}
    fn on_ship_destroyed(&self, _ship_id: ShipId) {}
    fn on_battle_updated(&self, _battle: &Battle) {}
    fn on_agent_updated(&self, _agent: &Agent) {}
    fn on_agent_log(&self, _agent_id: AgentId, _log: &AgentLog) {}
    fn on_shipyard_updated(&self, _shipyard: &Shipyard) {}
}

/// Writes each notification to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_ship_updated(&self, ship: &Spaceship) {
        log::debug!(
            "ship {} ({}) {:?} in system {} at ({:.1}, {:.1})",
            ship.id,
            ship.name,
            ship.state,
            ship.system_id,
            ship.position.x,
            ship.position.y
        );
    }

    fn on_ship_destroyed(&self, ship_id: ShipId) {
        log::debug!("ship {} destroyed", ship_id);
    }

    fn on_battle_updated(&self, battle: &Battle) {
        log::debug!(
            "battle {} round {} {:?}",
            battle.id,
            battle.rounds_elapsed,
            battle.state
        );
    }

    fn on_agent_updated(&self, agent: &Agent) {
        log::debug!("agent {} ({}) now {:?}", agent.id, agent.name, agent.state);
    }

    fn on_agent_log(&self, agent_id: AgentId, log: &AgentLog) {
        log::debug!("agent {} [{:?}] {}", agent_id, log.level, log.message);
    }

    fn on_shipyard_updated(&self, shipyard: &Shipyard) {
        log::debug!("shipyard {} updated", shipyard.id);
    }
}

/// A notification captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    ShipUpdated(ShipId),
    ShipDestroyed(ShipId),
    BattleUpdated(u64),
    AgentUpdated(AgentId),
    AgentLog(AgentId, String),
    ShipyardUpdated(u64),
}

/// Keeps every notification in memory, for assertions in tests and the
/// headless harness.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| pred(e))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn on_ship_updated(&self, ship: &Spaceship) {
        self.push(SinkEvent::ShipUpdated(ship.id));
    }

    fn on_ship_destroyed(&self, ship_id: ShipId) {
        self.push(SinkEvent::ShipDestroyed(ship_id));
    }

    fn on_battle_updated(&self, battle: &Battle) {
        self.push(SinkEvent::BattleUpdated(battle.id));
    }

    fn on_agent_updated(&self, agent: &Agent) {
        self.push(SinkEvent::AgentUpdated(agent.id));
    }

    fn on_agent_log(&self, agent_id: AgentId, log: &AgentLog) {
        self.push(SinkEvent::AgentLog(agent_id, log.message.clone()));
    }

    fn on_shipyard_updated(&self, shipyard: &Shipyard) {
        self.push(SinkEvent::ShipyardUpdated(shipyard.id));
    }
}
