//! Flat value records for every persisted entity.
//!
//! Records reference each other by id only; there is no object-graph
//! navigation. Stages resolve relationships through explicit repository
//! queries.

mod agent;
mod battle;
mod economy;
mod fleet;
mod world;

pub use agent::*;
pub use battle::*;
pub use economy::*;
pub use fleet::*;
pub use world::*;

pub type GameId = u64;
pub type GalaxyId = u64;
pub type SystemId = u64;
pub type WormholeId = u64;
pub type PlanetId = u64;
pub type GridId = u64;
pub type SquareId = u64;
pub type BuildingId = u64;
pub type BuilderId = u64;
pub type ShipId = u64;
pub type ShipyardId = u64;
pub type StationId = u64;
pub type BattleId = u64;
pub type NpcId = u64;
pub type AgentId = u64;
pub type LogId = u64;

/// Players are identified by an opaque string from the identity layer.
pub type PlayerId = String;

pub use starforge_logic::npc::NPC_PLAYER_ID;
