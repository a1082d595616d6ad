//! NPC pirate tables: difficulty tiers, stat scaling, loot, behavior picks.

use crate::geometry::Point;
use crate::ships::ShipType;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Player id that owns every NPC ship.
pub const NPC_PLAYER_ID: &str = "NPC";

pub const MIN_DIFFICULTY: u32 = 1;
pub const MAX_DIFFICULTY: u32 = 10;

/// Half-width of the square NPCs spawn in, around the system centre.
pub const SPAWN_RADIUS: f64 = 400.0;
/// Half-width of the square patrol waypoints are drawn from.
pub const PATROL_RADIUS: f64 = 500.0;
/// A patrolling NPC picks a new waypoint once this close to its target.
pub const WAYPOINT_ARRIVAL_DISTANCE: f64 = 10.0;
/// Distance of a wormhole mouth from the system centre.
pub const WORMHOLE_MOUTH_RADIUS: f64 = 400.0;
/// Maximum jitter on each axis around an ambush point.
pub const AMBUSH_JITTER: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcBehavior {
    Patrol,
    Ambush,
    Aggressive,
    Passive,
}

/// Ship tier an NPC of this difficulty flies.
pub fn ship_type_for_difficulty(difficulty: u32) -> ShipType {
    match difficulty {
        0..=2 => ShipType::Scout,
        3..=4 => ShipType::Destroyer,
        5..=6 => ShipType::Cruiser,
        7..=8 => ShipType::Carrier,
        _ => ShipType::Capital,
    }
}

pub fn stat_multiplier(difficulty: u32, per_level: f64) -> f64 {
    1.0 + difficulty as f64 * per_level
}

/// Unscaled combat profile of an NPC hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpcHull {
    pub max_health: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: f64,
}

impl NpcHull {
    pub fn base(ship_type: ShipType) -> Self {
        let (max_health, attack, defense, speed) = match ship_type {
            ShipType::Scout => (50, 10, 5, 15.0),
            ShipType::Destroyer => (150, 40, 20, 10.0),
            ShipType::Cruiser => (300, 60, 40, 8.0),
            ShipType::Carrier => (400, 50, 60, 6.0),
            ShipType::Capital => (600, 100, 80, 5.0),
            // Not flown by NPCs; treat as the weakest hull.
            ShipType::Colony | ShipType::Freighter => (50, 10, 5, 15.0),
        };
        Self {
            max_health,
            attack,
            defense,
            speed,
        }
    }

    /// Combat stats scale with difficulty; speed does not.
    pub fn scaled(self, multiplier: f64) -> Self {
        Self {
            max_health: (self.max_health as f64 * multiplier).round() as i32,
            attack: (self.attack as f64 * multiplier).round() as i32,
            defense: (self.defense as f64 * multiplier).round() as i32,
            speed: self.speed,
        }
    }
}

/// Inclusive loot bounds per resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LootTable {
    pub iron: (u32, u32),
    pub copper: (u32, u32),
    pub fuel: (u32, u32),
}

impl LootTable {
    pub fn for_difficulty(difficulty: u32) -> Self {
        let d = difficulty.max(MIN_DIFFICULTY);
        Self {
            iron: (d * 5, d * 15),
            copper: (d * 3, d * 10),
            fuel: (d * 2, d * 8),
        }
    }

    /// Draw one (iron, copper, fuel) drop.
    pub fn roll(&self, rng: &mut impl Rng) -> (u32, u32, u32) {
        (
            roll_range(self.iron, rng),
            roll_range(self.copper, rng),
            roll_range(self.fuel, rng),
        )
    }
}

fn roll_range((lo, hi): (u32, u32), rng: &mut impl Rng) -> u32 {
    if hi <= lo {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

/// Weighted behavior pick. Easy NPCs mostly patrol or idle; hard ones
/// lie in wait or hunt.
pub fn choose_behavior(difficulty: u32, rng: &mut impl Rng) -> NpcBehavior {
    let roll: f64 = rng.gen();
    if difficulty <= 2 {
        if roll < 0.7 {
            NpcBehavior::Patrol
        } else {
            NpcBehavior::Passive
        }
    } else if difficulty <= 5 {
        if roll < 0.5 {
            NpcBehavior::Patrol
        } else if roll < 0.8 {
            NpcBehavior::Ambush
        } else {
            NpcBehavior::Aggressive
        }
    } else if roll < 0.3 {
        NpcBehavior::Ambush
    } else {
        NpcBehavior::Aggressive
    }
}

pub fn spawn_position(rng: &mut impl Rng) -> Point {
    Point::new(
        rng.gen_range(-SPAWN_RADIUS..=SPAWN_RADIUS),
        rng.gen_range(-SPAWN_RADIUS..=SPAWN_RADIUS),
    )
}

pub fn patrol_waypoint(rng: &mut impl Rng) -> Point {
    Point::new(
        rng.gen_range(-PATROL_RADIUS..=PATROL_RADIUS),
        rng.gen_range(-PATROL_RADIUS..=PATROL_RADIUS),
    )
}

/// A point near a wormhole mouth, jittered on each axis.
pub fn ambush_point(mouth: Point, rng: &mut impl Rng) -> Point {
    mouth.offset(
        rng.gen_range(-AMBUSH_JITTER..=AMBUSH_JITTER),
        rng.gen_range(-AMBUSH_JITTER..=AMBUSH_JITTER),
    )
}

pub fn random_difficulty(rng: &mut impl Rng) -> u32 {
    rng.gen_range(1..=5)
}
