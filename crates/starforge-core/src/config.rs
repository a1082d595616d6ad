//! Simulation configuration.
//!
//! One flat, serde-friendly struct holds every tunable. Omitted JSON fields
//! fall back to the Normal preset, so a config file only needs the values it
//! overrides.

use serde::{Deserialize, Serialize};
use starforge_logic::combat::CombatRules;
use starforge_logic::galaxy::GalaxyParams;
use starforge_logic::resources::Resources;
use starforge_logic::ships::{ShipStats, ShipType};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Balance presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    /// Case-insensitive; anything unrecognised is Normal.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // Scheduling
    pub tick_interval_seconds: u64,
    pub scheduler_startup_delay_seconds: u64,
    pub max_concurrent_games: usize,
    pub agent_min_interval_seconds: f64,
    pub npc_behavior_interval_seconds: f64,

    // Combat
    pub combat_detection_range: f64,
    pub max_combat_rounds: u32,
    pub base_flee_chance: f64,
    pub damage_min_multiplier: f64,
    pub damage_max_multiplier: f64,
    pub defense_efficiency: f64,

    // Ships
    pub ship_stats: BTreeMap<ShipType, ShipStats>,

    // NPCs
    pub npc_min_count: u32,
    pub npc_max_count: u32,
    pub npc_spawn_chance: f64,
    pub npc_difficulty_multiplier: f64,

    // Galaxy generation
    pub system_count: usize,
    pub min_system_distance: f64,
    pub min_planets_per_system: u32,
    pub max_planets_per_system: u32,
    pub min_wormholes_per_system: u32,
    pub max_wormholes_per_system: u32,

    // Economy
    pub production_rate_per_tick: f64,
    pub building_construction_seconds: f64,
    pub starting_resources: Resources,
    pub starting_builders_per_planet: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 5,
            scheduler_startup_delay_seconds: 10,
            max_concurrent_games: 4,
            agent_min_interval_seconds: 5.0,
            npc_behavior_interval_seconds: 10.0,

            combat_detection_range: 50.0,
            max_combat_rounds: 20,
            base_flee_chance: 0.15,
            damage_min_multiplier: 0.8,
            damage_max_multiplier: 1.2,
            defense_efficiency: 0.5,

            ship_stats: ShipType::ALL
                .into_iter()
                .map(|t| (t, ShipStats::default_for(t)))
                .collect(),

            npc_min_count: 3,
            npc_max_count: 10,
            npc_spawn_chance: 0.1,
            npc_difficulty_multiplier: 0.2,

            system_count: 10,
            min_system_distance: 100.0,
            min_planets_per_system: 1,
            max_planets_per_system: 4,
            min_wormholes_per_system: 1,
            max_wormholes_per_system: 4,

            production_rate_per_tick: 0.1,
            building_construction_seconds: 300.0,
            starting_resources: Resources::new(1000.0, 500.0, 500.0, 200.0),
            starting_builders_per_planet: 3,
        }
    }
}

impl SimulationConfig {
    pub fn preset(difficulty: Difficulty) -> Self {
        let base = Self::default();
        match difficulty {
            Difficulty::Normal => base,
            Difficulty::Easy => Self {
                production_rate_per_tick: 0.15,
                building_construction_seconds: 180.0,
                base_flee_chance: 0.25,
                npc_min_count: 2,
                npc_max_count: 5,
                starting_resources: Resources::new(2000.0, 1000.0, 1000.0, 500.0),
                ..base
            },
            Difficulty::Hard => Self {
                production_rate_per_tick: 0.05,
                building_construction_seconds: 600.0,
                base_flee_chance: 0.10,
                npc_min_count: 5,
                npc_max_count: 15,
                npc_difficulty_multiplier: 0.3,
                starting_resources: Resources::new(500.0, 250.0, 250.0, 100.0),
                ..base
            },
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.tick_interval_seconds == 0 {
            return fail("tick_interval_seconds must be positive");
        }
        if self.max_concurrent_games == 0 {
            return fail("max_concurrent_games must be positive");
        }
        if self.max_combat_rounds == 0 {
            return fail("max_combat_rounds must be positive");
        }
        if !(0.0..=1.0).contains(&self.base_flee_chance) {
            return fail("base_flee_chance must be within [0, 1]");
        }
        if self.damage_min_multiplier < 0.0 || self.damage_min_multiplier > self.damage_max_multiplier {
            return fail("damage multipliers must satisfy 0 <= min <= max");
        }
        if self.npc_min_count > self.npc_max_count {
            return fail("npc_min_count exceeds npc_max_count");
        }
        if !(0.0..=1.0).contains(&self.npc_spawn_chance) {
            return fail("npc_spawn_chance must be within [0, 1]");
        }
        if self.system_count == 0 || self.system_count > 1000 {
            return fail("system_count must be within 1..=1000");
        }
        if self.min_planets_per_system == 0 || self.min_planets_per_system > self.max_planets_per_system {
            return fail("planets per system must satisfy 1 <= min <= max");
        }
        if self.min_wormholes_per_system > self.max_wormholes_per_system {
            return fail("min_wormholes_per_system exceeds max_wormholes_per_system");
        }
        if self.production_rate_per_tick < 0.0 {
            return fail("production_rate_per_tick must not be negative");
        }
        Ok(())
    }

    pub fn combat_rules(&self) -> CombatRules {
        CombatRules {
            detection_range: self.combat_detection_range,
            max_rounds: self.max_combat_rounds,
            base_flee_chance: self.base_flee_chance,
            damage_min: self.damage_min_multiplier,
            damage_max: self.damage_max_multiplier,
            defense_efficiency: self.defense_efficiency,
        }
    }

    pub fn galaxy_params(&self) -> GalaxyParams {
        GalaxyParams {
            system_count: self.system_count,
            min_system_distance: self.min_system_distance,
            min_planets_per_system: self.min_planets_per_system,
            max_planets_per_system: self.max_planets_per_system,
            min_wormholes_per_system: self.min_wormholes_per_system,
            max_wormholes_per_system: self.max_wormholes_per_system,
            ..GalaxyParams::default()
        }
    }

    pub fn ship_stats(&self, ship_type: ShipType) -> ShipStats {
        self.ship_stats
            .get(&ship_type)
            .copied()
            .unwrap_or_else(|| ShipStats::default_for(ship_type))
    }
}
