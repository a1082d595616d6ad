use super::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use starforge_logic::combat::EndReason;
use starforge_logic::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleState {
    InProgress,
    Completed,
    Fled,
}

impl BattleState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleEventType {
    BattleStarted,
    Attack,
    ShipDestroyed,
    ShipFled,
    BattleEnded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: u32,
    pub event_type: BattleEventType,
    pub attacker_ship_id: Option<ShipId>,
    pub target_ship_id: Option<ShipId>,
    pub damage: Option<i32>,
    pub description: String,
    pub at: DateTime<Utc>,
}

/// Loot credited to one surviving participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Loot {
    pub iron: u32,
    pub copper: u32,
    pub fuel: u32,
}

/// A ship's combat snapshot within one battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleParticipant {
    pub spaceship_id: ShipId,
    pub player_id: PlayerId,
    pub is_npc: bool,
    pub initial_health: i32,
    pub final_health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub defense: i32,
    pub damage_dealt: i32,
    pub damage_taken: i32,
    pub survived: bool,
    pub fled: bool,
    pub experience_gained: i32,
    pub loot: Loot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battle {
    pub id: BattleId,
    pub game_id: GameId,
    pub system_id: SystemId,
    pub position: Point,
    pub state: BattleState,
    pub rounds_elapsed: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub winner_player_id: Option<PlayerId>,
    pub end_reason: Option<EndReason>,
    pub participants: Vec<BattleParticipant>,
    /// Append-only, in the order things happened.
    pub events: Vec<BattleEvent>,
}

impl Battle {
    pub fn involves(&self, ship_id: ShipId) -> bool {
        self.participants.iter().any(|p| p.spaceship_id == ship_id)
    }
}
