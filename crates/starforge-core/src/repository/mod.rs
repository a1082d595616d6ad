//! Storage ports.
//!
//! One async trait per aggregate, with plain get/list/add/update semantics
//! and filters by game, system, player and state. `add_*` methods assign a
//! fresh id and return the stored record. [`Store`] bundles every port so
//! engine code can take a single `Arc<dyn Store>`.

mod memory;

pub use memory::{InMemoryStore, SNAPSHOT_VERSION};

use crate::error::Result;
use crate::model::*;
use async_trait::async_trait;

#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn add_game(&self, game: Game) -> Result<Game>;
    async fn get_game(&self, id: GameId) -> Result<Option<Game>>;
    async fn list_active_games(&self) -> Result<Vec<Game>>;
    async fn update_game(&self, game: &Game) -> Result<()>;
}

#[async_trait]
pub trait GalaxyRepository: Send + Sync {
    async fn add_galaxy(&self, galaxy: Galaxy) -> Result<Galaxy>;
    async fn get_galaxy(&self, id: GalaxyId) -> Result<Option<Galaxy>>;
    async fn galaxy_for_game(&self, game_id: GameId) -> Result<Option<Galaxy>>;

    async fn add_system(&self, system: StarSystem) -> Result<StarSystem>;
    async fn get_system(&self, id: SystemId) -> Result<Option<StarSystem>>;
    async fn list_systems(&self, galaxy_id: GalaxyId) -> Result<Vec<StarSystem>>;

    async fn add_wormhole(&self, wormhole: Wormhole) -> Result<Wormhole>;
    async fn list_wormholes(&self, galaxy_id: GalaxyId) -> Result<Vec<Wormhole>>;
    async fn wormholes_for_system(&self, system_id: SystemId) -> Result<Vec<Wormhole>>;

    async fn add_planet(&self, planet: Planet) -> Result<Planet>;
    async fn get_planet(&self, id: PlanetId) -> Result<Option<Planet>>;
    async fn list_planets(&self, system_id: SystemId) -> Result<Vec<Planet>>;

    /// Store a grid and all of its squares together.
    async fn add_grid(&self, grid: PlanetGrid, squares: Vec<GridSquare>) -> Result<PlanetGrid>;
    async fn get_grid(&self, id: GridId) -> Result<Option<PlanetGrid>>;
    async fn grid_for_planet(&self, planet_id: PlanetId) -> Result<Option<PlanetGrid>>;
    async fn get_square(&self, id: SquareId) -> Result<Option<GridSquare>>;
    async fn list_squares(&self, grid_id: GridId) -> Result<Vec<GridSquare>>;
    async fn update_square(&self, square: &GridSquare) -> Result<()>;
}

#[async_trait]
pub trait BuildingRepository: Send + Sync {
    async fn add_building(&self, building: Building) -> Result<Building>;
    async fn get_building(&self, id: BuildingId) -> Result<Option<Building>>;
    async fn update_building(&self, building: &Building) -> Result<()>;
    async fn list_buildings(&self, game_id: GameId) -> Result<Vec<Building>>;
    async fn building_on_square(&self, square_id: SquareId) -> Result<Option<Building>>;

    async fn add_builder(&self, builder: Builder) -> Result<Builder>;
    async fn get_builder(&self, id: BuilderId) -> Result<Option<Builder>>;
    async fn update_builder(&self, builder: &Builder) -> Result<()>;
    async fn list_builders(&self, game_id: GameId, player_id: &str) -> Result<Vec<Builder>>;
    async fn builders_on_planet(&self, planet_id: PlanetId) -> Result<Vec<Builder>>;
    async fn builder_for_building(&self, building_id: BuildingId) -> Result<Option<Builder>>;
}

#[async_trait]
pub trait ShipRepository: Send + Sync {
    async fn add_ship(&self, ship: Spaceship) -> Result<Spaceship>;
    async fn get_ship(&self, id: ShipId) -> Result<Option<Spaceship>>;
    async fn update_ship(&self, ship: &Spaceship) -> Result<()>;
    async fn list_ships(&self, game_id: GameId) -> Result<Vec<Spaceship>>;
    async fn list_ships_in_system(&self, system_id: SystemId) -> Result<Vec<Spaceship>>;

    async fn add_shipyard(&self, shipyard: Shipyard) -> Result<Shipyard>;
    async fn get_shipyard(&self, id: ShipyardId) -> Result<Option<Shipyard>>;
    async fn list_shipyards(&self, station_id: StationId) -> Result<Vec<Shipyard>>;
}

#[async_trait]
pub trait StationRepository: Send + Sync {
    async fn add_station(&self, station: SpaceStation) -> Result<SpaceStation>;
    async fn get_station(&self, id: StationId) -> Result<Option<SpaceStation>>;
    async fn update_station(&self, station: &SpaceStation) -> Result<()>;
    async fn find_station(&self, player_id: &str, system_id: SystemId) -> Result<Option<SpaceStation>>;
    async fn list_stations(&self, game_id: GameId, player_id: &str) -> Result<Vec<SpaceStation>>;
}

#[async_trait]
pub trait BattleRepository: Send + Sync {
    async fn add_battle(&self, battle: Battle) -> Result<Battle>;
    async fn get_battle(&self, id: BattleId) -> Result<Option<Battle>>;
    async fn update_battle(&self, battle: &Battle) -> Result<()>;
    async fn list_battles(&self, game_id: GameId, state: Option<BattleState>) -> Result<Vec<Battle>>;
}

#[async_trait]
pub trait NpcRepository: Send + Sync {
    async fn add_npc(&self, npc: NpcShip) -> Result<NpcShip>;
    async fn npc_for_ship(&self, ship_id: ShipId) -> Result<Option<NpcShip>>;
    async fn update_npc(&self, npc: &NpcShip) -> Result<()>;
    async fn list_npcs(&self, game_id: GameId) -> Result<Vec<NpcShip>>;
}

#[async_trait]
pub trait AgentRepository: Send + Sync {
    async fn add_agent(&self, agent: Agent) -> Result<Agent>;
    async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>>;
    async fn update_agent(&self, agent: &Agent) -> Result<()>;
    /// Removes the agent and its log. Returns false if it did not exist.
    async fn delete_agent(&self, id: AgentId) -> Result<bool>;
    async fn list_agents(&self, game_id: GameId) -> Result<Vec<Agent>>;

    async fn add_log(&self, log: AgentLog) -> Result<AgentLog>;
    /// Newest first.
    async fn list_logs(&self, agent_id: AgentId, limit: usize) -> Result<Vec<AgentLog>>;
}

/// Every storage port in one object.
pub trait Store:
    GameRepository
    + GalaxyRepository
    + BuildingRepository
    + ShipRepository
    + StationRepository
    + BattleRepository
    + NpcRepository
    + AgentRepository
{
}

impl<T> Store for T where
    T: GameRepository
        + GalaxyRepository
        + BuildingRepository
        + ShipRepository
        + StationRepository
        + BattleRepository
        + NpcRepository
        + AgentRepository
{
}
