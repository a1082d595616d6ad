use super::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use starforge_logic::geometry::Point;
use starforge_logic::npc::{LootTable, NpcBehavior};
use starforge_logic::ships::{ShipState, ShipType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spaceship {
    pub id: ShipId,
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub name: String,
    pub ship_type: ShipType,
    pub state: ShipState,

    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: f64,
    pub cargo_capacity: u32,
    pub experience: i32,

    pub system_id: SystemId,
    pub position: Point,
    pub destination_system_id: Option<SystemId>,
    pub destination: Option<Point>,
    pub eta: Option<DateTime<Utc>>,

    pub shipyard_id: Option<ShipyardId>,
    pub construction_progress: f64,
    pub construction_start_time: Option<DateTime<Utc>>,
    pub construction_seconds: f64,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Spaceship {
    pub fn is_npc(&self) -> bool {
        self.player_id == NPC_PLAYER_ID
    }

    pub fn is_alive(&self) -> bool {
        self.state != ShipState::Destroyed && self.health > 0
    }

    pub fn clear_movement(&mut self) {
        self.destination_system_id = None;
        self.destination = None;
        self.eta = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipyard {
    pub id: ShipyardId,
    pub game_id: GameId,
    pub station_id: StationId,
    pub name: String,
    pub max_concurrent_builds: u32,
}

/// NPC metadata, one per NPC-owned [`Spaceship`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcShip {
    pub id: NpcId,
    pub game_id: GameId,
    pub spaceship_id: ShipId,
    pub behavior: NpcBehavior,
    pub difficulty: u32,
    pub loot: LootTable,
    pub target: Option<Point>,
    pub target_ship_id: Option<ShipId>,
    pub last_behavior_at: Option<DateTime<Utc>>,
}
