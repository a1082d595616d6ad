use super::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use starforge_logic::resources::{BuildingType, Resources};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub game_id: GameId,
    pub grid_square_id: SquareId,
    pub player_id: PlayerId,
    pub building_type: BuildingType,
    /// Percent in `[0, 100]`, never decreasing.
    pub construction_progress: f64,
    pub is_complete: bool,
    pub construction_start_time: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_builder_id: Option<BuilderId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Builder {
    pub id: BuilderId,
    pub game_id: GameId,
    pub planet_id: PlanetId,
    pub player_id: PlayerId,
    pub name: String,
    pub assigned_building_id: Option<BuildingId>,
    pub is_available: bool,
}

impl Builder {
    pub fn assign(&mut self, building_id: BuildingId) {
        self.assigned_building_id = Some(building_id);
        self.is_available = false;
    }

    pub fn release(&mut self) {
        self.assigned_building_id = None;
        self.is_available = true;
    }
}

/// Per-player, per-system resource reservoir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceStation {
    pub id: StationId,
    pub game_id: GameId,
    pub system_id: SystemId,
    pub player_id: PlayerId,
    pub name: String,
    pub resources: Resources,
}

impl SpaceStation {
    pub fn default_name(player_id: &str) -> String {
        format!("{}'s Station", player_id)
    }
}
