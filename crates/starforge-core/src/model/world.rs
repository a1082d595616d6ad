use super::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use starforge_logic::geometry::Point;
use starforge_logic::grid::PlanetType;
use starforge_logic::resources::ResourceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub is_active: bool,
    pub players: Vec<PlayerId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Galaxy {
    pub id: GalaxyId,
    pub game_id: GameId,
    pub name: String,
    pub system_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarSystem {
    pub id: SystemId,
    pub galaxy_id: GalaxyId,
    pub name: String,
    pub position: Point,
}

/// Undirected; `system_a != system_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wormhole {
    pub id: WormholeId,
    pub galaxy_id: GalaxyId,
    pub system_a: SystemId,
    pub system_b: SystemId,
}

impl Wormhole {
    pub fn connects(&self, a: SystemId, b: SystemId) -> bool {
        (self.system_a == a && self.system_b == b) || (self.system_a == b && self.system_b == a)
    }

    /// The far end as seen from `from`, if this edge touches it.
    pub fn other_end(&self, from: SystemId) -> Option<SystemId> {
        if self.system_a == from {
            Some(self.system_b)
        } else if self.system_b == from {
            Some(self.system_a)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: PlanetId,
    pub system_id: SystemId,
    pub name: String,
    pub size: u32,
    pub planet_type: PlanetType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetGrid {
    pub id: GridId,
    pub planet_id: PlanetId,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSquare {
    pub id: SquareId,
    pub grid_id: GridId,
    pub x: u32,
    pub y: u32,
    pub iron: Option<f64>,
    pub copper: Option<f64>,
    pub fuel: Option<f64>,
    pub soil: Option<f64>,
}

impl GridSquare {
    pub fn deposit(&self, kind: ResourceKind) -> Option<f64> {
        match kind {
            ResourceKind::Iron => self.iron,
            ResourceKind::Copper => self.copper,
            ResourceKind::Fuel => self.fuel,
            ResourceKind::Soil => self.soil,
        }
    }

    pub fn deposit_mut(&mut self, kind: ResourceKind) -> &mut Option<f64> {
        match kind {
            ResourceKind::Iron => &mut self.iron,
            ResourceKind::Copper => &mut self.copper,
            ResourceKind::Fuel => &mut self.fuel,
            ResourceKind::Soil => &mut self.soil,
        }
    }
}
