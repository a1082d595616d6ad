//! Ship types, lifecycle states and the default per-type stat table.

use crate::resources::Resources;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShipType {
    Scout,
    Colony,
    Freighter,
    Destroyer,
    Cruiser,
    Carrier,
    Capital,
}

impl ShipType {
    pub const ALL: [ShipType; 7] = [
        Self::Scout,
        Self::Colony,
        Self::Freighter,
        Self::Destroyer,
        Self::Cruiser,
        Self::Carrier,
        Self::Capital,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Scout => "Scout",
            Self::Colony => "Colony",
            Self::Freighter => "Freighter",
            Self::Destroyer => "Destroyer",
            Self::Cruiser => "Cruiser",
            Self::Carrier => "Carrier",
            Self::Capital => "Capital",
        }
    }

    /// Case-insensitive lookup, used when player input names a ship type.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Ship lifecycle state.
///
/// `Destroyed` is terminal. `InCombat` and `Fleeing` are entered only by the
/// combat stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipState {
    UnderConstruction,
    Idle,
    Moving,
    Colonizing,
    InCombat,
    Fleeing,
    Destroyed,
}

impl ShipState {
    /// Whether a ship in this state can be picked up by combat detection.
    pub fn can_engage(self) -> bool {
        matches!(self, Self::Idle | Self::Moving)
    }

    /// Whether a move order may be issued from this state.
    pub fn can_accept_move(self) -> bool {
        matches!(self, Self::Idle | Self::Fleeing)
    }
}

/// Stats and build parameters for one ship type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipStats {
    pub construction_seconds: u32,
    pub speed: f64,
    pub cargo_capacity: u32,
    pub max_health: i32,
    pub attack: i32,
    pub defense: i32,
    pub cost: Resources,
}

impl ShipStats {
    /// Built-in defaults for a ship type.
    pub fn default_for(ship_type: ShipType) -> Self {
        //                     secs  speed cargo  hp  atk  def   iron  copper fuel
        let (secs, speed, cargo, hp, atk, def, iron, copper, fuel) = match ship_type {
            ShipType::Scout => (60, 20.0, 10, 50, 5, 5, 20.0, 10.0, 15.0),
            ShipType::Colony => (300, 5.0, 50, 100, 0, 10, 100.0, 50.0, 75.0),
            ShipType::Freighter => (180, 8.0, 1000, 150, 0, 15, 80.0, 40.0, 60.0),
            ShipType::Destroyer => (240, 12.0, 50, 200, 50, 30, 200.0, 100.0, 150.0),
            ShipType::Cruiser => (420, 10.0, 100, 300, 80, 50, 400.0, 200.0, 300.0),
            ShipType::Carrier => (600, 8.0, 200, 400, 60, 60, 600.0, 300.0, 450.0),
            ShipType::Capital => (900, 6.0, 300, 600, 100, 100, 1000.0, 500.0, 750.0),
        };
        Self {
            construction_seconds: secs,
            speed,
            cargo_capacity: cargo,
            max_health: hp,
            attack: atk,
            defense: def,
            cost: Resources::new(iron, copper, fuel, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ship_type() {
        assert_eq!(ShipType::parse("destroyer"), Some(ShipType::Destroyer));
        assert_eq!(ShipType::parse(" Capital "), Some(ShipType::Capital));
        assert_eq!(ShipType::parse("Dreadnought"), None);
    }

    #[test]
    fn test_default_stats_scale_with_tier() {
        let scout = ShipStats::default_for(ShipType::Scout);
        let capital = ShipStats::default_for(ShipType::Capital);
        assert!(capital.max_health > scout.max_health);
        assert!(capital.construction_seconds > scout.construction_seconds);
        assert!(capital.speed < scout.speed);
        assert!(capital.cost.iron > scout.cost.iron);
    }

    #[test]
    fn test_colony_ship_is_unarmed() {
        assert_eq!(ShipStats::default_for(ShipType::Colony).attack, 0);
    }

    #[test]
    fn test_engage_states() {
        assert!(ShipState::Idle.can_engage());
        assert!(ShipState::Moving.can_engage());
        assert!(!ShipState::UnderConstruction.can_engage());
        assert!(!ShipState::Fleeing.can_engage());
        assert!(!ShipState::Destroyed.can_engage());
    }
}
