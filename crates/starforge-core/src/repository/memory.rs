//! In-memory adapter for every storage port, plus bincode snapshots.
//!
//! All tables sit behind one `tokio::sync::RwLock`, so each call is atomic
//! with respect to the others. `BTreeMap` keeps iteration in id order, which
//! keeps seeded runs reproducible.

use super::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use tokio::sync::RwLock;

use crate::error::SimError;

/// Bump when the snapshot layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

trait Record: Clone {
    const ENTITY: &'static str;
    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

macro_rules! record {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(impl Record for $ty {
            const ENTITY: &'static str = $name;
            fn id(&self) -> u64 {
                self.id
            }
            fn set_id(&mut self, id: u64) {
                self.id = id;
            }
        })*
    };
}

record! {
    Game => "Game",
    Galaxy => "Galaxy",
    StarSystem => "StarSystem",
    Wormhole => "Wormhole",
    Planet => "Planet",
    PlanetGrid => "PlanetGrid",
    GridSquare => "GridSquare",
    Building => "Building",
    Builder => "Builder",
    Spaceship => "Spaceship",
    Shipyard => "Shipyard",
    SpaceStation => "SpaceStation",
    Battle => "Battle",
    NpcShip => "NpcShip",
    Agent => "Agent",
    AgentLog => "AgentLog",
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    next_id: u64,
    games: BTreeMap<u64, Game>,
    galaxies: BTreeMap<u64, Galaxy>,
    systems: BTreeMap<u64, StarSystem>,
    wormholes: BTreeMap<u64, Wormhole>,
    planets: BTreeMap<u64, Planet>,
    grids: BTreeMap<u64, PlanetGrid>,
    squares: BTreeMap<u64, GridSquare>,
    squares_by_grid: BTreeMap<u64, Vec<u64>>,
    buildings: BTreeMap<u64, Building>,
    builders: BTreeMap<u64, Builder>,
    ships: BTreeMap<u64, Spaceship>,
    shipyards: BTreeMap<u64, Shipyard>,
    stations: BTreeMap<u64, SpaceStation>,
    battles: BTreeMap<u64, Battle>,
    npcs: BTreeMap<u64, NpcShip>,
    agents: BTreeMap<u64, Agent>,
    agent_logs: BTreeMap<u64, AgentLog>,
}

impl Tables {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn insert<T: Record>(next: u64, map: &mut BTreeMap<u64, T>, mut item: T) -> T {
    item.set_id(next);
    map.insert(next, item.clone());
    item
}

fn replace<T: Record>(map: &mut BTreeMap<u64, T>, item: &T) -> Result<()> {
    match map.get_mut(&item.id()) {
        Some(slot) => {
            *slot = item.clone();
            Ok(())
        }
        None => Err(SimError::not_found(T::ENTITY, item.id())),
    }
}

fn select<T: Record>(map: &BTreeMap<u64, T>, pred: impl Fn(&T) -> bool) -> Vec<T> {
    map.values().filter(|v| pred(v)).cloned().collect()
}

#[derive(Serialize, Deserialize)]
struct SnapshotData {
    version: u32,
    tables: Tables,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every table to `writer` as a versioned bincode blob.
    pub async fn save_snapshot<W: Write>(&self, writer: W) -> Result<()> {
        let tables = self.tables.read().await.clone();
        let data = SnapshotData {
            version: SNAPSHOT_VERSION,
            tables,
        };
        bincode::serialize_into(writer, &data)?;
        Ok(())
    }

    /// Replace all tables with a snapshot previously written by
    /// [`save_snapshot`](Self::save_snapshot).
    pub async fn load_snapshot<R: Read>(&self, reader: R) -> Result<()> {
        let data: SnapshotData = bincode::deserialize_from(reader)?;
        if data.version != SNAPSHOT_VERSION {
            return Err(SimError::Repository(format!(
                "snapshot version {} does not match expected {}",
                data.version, SNAPSHOT_VERSION
            )));
        }
        *self.tables.write().await = data.tables;
        Ok(())
    }
}

#[async_trait]
impl GameRepository for InMemoryStore {
    async fn add_game(&self, game: Game) -> Result<Game> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.games, game))
    }

    async fn get_game(&self, id: GameId) -> Result<Option<Game>> {
        Ok(self.tables.read().await.games.get(&id).cloned())
    }

    async fn list_active_games(&self) -> Result<Vec<Game>> {
        Ok(select(&self.tables.read().await.games, |g| g.is_active))
    }

    async fn update_game(&self, game: &Game) -> Result<()> {
        replace(&mut self.tables.write().await.games, game)
    }
}

#[async_trait]
impl GalaxyRepository for InMemoryStore {
    async fn add_galaxy(&self, galaxy: Galaxy) -> Result<Galaxy> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.galaxies, galaxy))
    }

    async fn get_galaxy(&self, id: GalaxyId) -> Result<Option<Galaxy>> {
        Ok(self.tables.read().await.galaxies.get(&id).cloned())
    }

    async fn galaxy_for_game(&self, game_id: GameId) -> Result<Option<Galaxy>> {
        let t = self.tables.read().await;
        Ok(t.galaxies.values().find(|g| g.game_id == game_id).cloned())
    }

    async fn add_system(&self, system: StarSystem) -> Result<StarSystem> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.systems, system))
    }

    async fn get_system(&self, id: SystemId) -> Result<Option<StarSystem>> {
        Ok(self.tables.read().await.systems.get(&id).cloned())
    }

    async fn list_systems(&self, galaxy_id: GalaxyId) -> Result<Vec<StarSystem>> {
        Ok(select(&self.tables.read().await.systems, |s| s.galaxy_id == galaxy_id))
    }

    async fn add_wormhole(&self, wormhole: Wormhole) -> Result<Wormhole> {
        if wormhole.system_a == wormhole.system_b {
            return Err(SimError::Validation(format!(
                "wormhole cannot connect system {} to itself",
                wormhole.system_a
            )));
        }
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.wormholes, wormhole))
    }

    async fn list_wormholes(&self, galaxy_id: GalaxyId) -> Result<Vec<Wormhole>> {
        Ok(select(&self.tables.read().await.wormholes, |w| w.galaxy_id == galaxy_id))
    }

    async fn wormholes_for_system(&self, system_id: SystemId) -> Result<Vec<Wormhole>> {
        Ok(select(&self.tables.read().await.wormholes, |w| {
            w.system_a == system_id || w.system_b == system_id
        }))
    }

    async fn add_planet(&self, planet: Planet) -> Result<Planet> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.planets, planet))
    }

    async fn get_planet(&self, id: PlanetId) -> Result<Option<Planet>> {
        Ok(self.tables.read().await.planets.get(&id).cloned())
    }

    async fn list_planets(&self, system_id: SystemId) -> Result<Vec<Planet>> {
        Ok(select(&self.tables.read().await.planets, |p| p.system_id == system_id))
    }

    async fn add_grid(&self, grid: PlanetGrid, squares: Vec<GridSquare>) -> Result<PlanetGrid> {
        let mut t = self.tables.write().await;
        if t.grids.values().any(|g| g.planet_id == grid.planet_id) {
            return Err(SimError::Validation(format!(
                "planet {} already has a grid",
                grid.planet_id
            )));
        }
        let grid_id = t.allocate();
        let grid = insert(grid_id, &mut t.grids, grid);
        let mut ids = Vec::with_capacity(squares.len());
        for mut square in squares {
            square.grid_id = grid_id;
            let id = t.allocate();
            insert(id, &mut t.squares, square);
            ids.push(id);
        }
        t.squares_by_grid.insert(grid_id, ids);
        Ok(grid)
    }

    async fn get_grid(&self, id: GridId) -> Result<Option<PlanetGrid>> {
        Ok(self.tables.read().await.grids.get(&id).cloned())
    }

    async fn grid_for_planet(&self, planet_id: PlanetId) -> Result<Option<PlanetGrid>> {
        let t = self.tables.read().await;
        Ok(t.grids.values().find(|g| g.planet_id == planet_id).cloned())
    }

    async fn get_square(&self, id: SquareId) -> Result<Option<GridSquare>> {
        Ok(self.tables.read().await.squares.get(&id).cloned())
    }

    async fn list_squares(&self, grid_id: GridId) -> Result<Vec<GridSquare>> {
        let t = self.tables.read().await;
        let Some(ids) = t.squares_by_grid.get(&grid_id) else {
            return Ok(Vec::new());
        };
        Ok(ids.iter().filter_map(|id| t.squares.get(id).cloned()).collect())
    }

    async fn update_square(&self, square: &GridSquare) -> Result<()> {
        replace(&mut self.tables.write().await.squares, square)
    }
}

#[async_trait]
impl BuildingRepository for InMemoryStore {
    async fn add_building(&self, building: Building) -> Result<Building> {
        let mut t = self.tables.write().await;
        if t.buildings.values().any(|b| b.grid_square_id == building.grid_square_id) {
            return Err(SimError::Validation(format!(
                "grid square {} already has a building",
                building.grid_square_id
            )));
        }
        let id = t.allocate();
        Ok(insert(id, &mut t.buildings, building))
    }

    async fn get_building(&self, id: BuildingId) -> Result<Option<Building>> {
        Ok(self.tables.read().await.buildings.get(&id).cloned())
    }

    async fn update_building(&self, building: &Building) -> Result<()> {
        replace(&mut self.tables.write().await.buildings, building)
    }

    async fn list_buildings(&self, game_id: GameId) -> Result<Vec<Building>> {
        Ok(select(&self.tables.read().await.buildings, |b| b.game_id == game_id))
    }

    async fn building_on_square(&self, square_id: SquareId) -> Result<Option<Building>> {
        let t = self.tables.read().await;
        Ok(t.buildings.values().find(|b| b.grid_square_id == square_id).cloned())
    }

    async fn add_builder(&self, builder: Builder) -> Result<Builder> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.builders, builder))
    }

    async fn get_builder(&self, id: BuilderId) -> Result<Option<Builder>> {
        Ok(self.tables.read().await.builders.get(&id).cloned())
    }

    async fn update_builder(&self, builder: &Builder) -> Result<()> {
        replace(&mut self.tables.write().await.builders, builder)
    }

    async fn list_builders(&self, game_id: GameId, player_id: &str) -> Result<Vec<Builder>> {
        Ok(select(&self.tables.read().await.builders, |b| {
            b.game_id == game_id && b.player_id == player_id
        }))
    }

    async fn builders_on_planet(&self, planet_id: PlanetId) -> Result<Vec<Builder>> {
        Ok(select(&self.tables.read().await.builders, |b| b.planet_id == planet_id))
    }

    async fn builder_for_building(&self, building_id: BuildingId) -> Result<Option<Builder>> {
        let t = self.tables.read().await;
        Ok(t.builders
            .values()
            .find(|b| b.assigned_building_id == Some(building_id))
            .cloned())
    }
}

#[async_trait]
impl ShipRepository for InMemoryStore {
    async fn add_ship(&self, ship: Spaceship) -> Result<Spaceship> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.ships, ship))
    }

    async fn get_ship(&self, id: ShipId) -> Result<Option<Spaceship>> {
        Ok(self.tables.read().await.ships.get(&id).cloned())
    }

    async fn update_ship(&self, ship: &Spaceship) -> Result<()> {
        replace(&mut self.tables.write().await.ships, ship)
    }

    async fn list_ships(&self, game_id: GameId) -> Result<Vec<Spaceship>> {
        Ok(select(&self.tables.read().await.ships, |s| s.game_id == game_id))
    }

    async fn list_ships_in_system(&self, system_id: SystemId) -> Result<Vec<Spaceship>> {
        Ok(select(&self.tables.read().await.ships, |s| s.system_id == system_id))
    }

    async fn add_shipyard(&self, shipyard: Shipyard) -> Result<Shipyard> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.shipyards, shipyard))
    }

    async fn get_shipyard(&self, id: ShipyardId) -> Result<Option<Shipyard>> {
        Ok(self.tables.read().await.shipyards.get(&id).cloned())
    }

    async fn list_shipyards(&self, station_id: StationId) -> Result<Vec<Shipyard>> {
        Ok(select(&self.tables.read().await.shipyards, |s| s.station_id == station_id))
    }
}

#[async_trait]
impl StationRepository for InMemoryStore {
    async fn add_station(&self, station: SpaceStation) -> Result<SpaceStation> {
        let mut t = self.tables.write().await;
        if t.stations
            .values()
            .any(|s| s.player_id == station.player_id && s.system_id == station.system_id)
        {
            return Err(SimError::Validation(format!(
                "player {} already has a station in system {}",
                station.player_id, station.system_id
            )));
        }
        let id = t.allocate();
        Ok(insert(id, &mut t.stations, station))
    }

    async fn get_station(&self, id: StationId) -> Result<Option<SpaceStation>> {
        Ok(self.tables.read().await.stations.get(&id).cloned())
    }

    async fn update_station(&self, station: &SpaceStation) -> Result<()> {
        replace(&mut self.tables.write().await.stations, station)
    }

    async fn find_station(&self, player_id: &str, system_id: SystemId) -> Result<Option<SpaceStation>> {
        let t = self.tables.read().await;
        Ok(t.stations
            .values()
            .find(|s| s.player_id == player_id && s.system_id == system_id)
            .cloned())
    }

    async fn list_stations(&self, game_id: GameId, player_id: &str) -> Result<Vec<SpaceStation>> {
        Ok(select(&self.tables.read().await.stations, |s| {
            s.game_id == game_id && s.player_id == player_id
        }))
    }
}

#[async_trait]
impl BattleRepository for InMemoryStore {
    async fn add_battle(&self, battle: Battle) -> Result<Battle> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.battles, battle))
    }

    async fn get_battle(&self, id: BattleId) -> Result<Option<Battle>> {
        Ok(self.tables.read().await.battles.get(&id).cloned())
    }

    async fn update_battle(&self, battle: &Battle) -> Result<()> {
        let mut t = self.tables.write().await;
        if let Some(stored) = t.battles.get(&battle.id) {
            if stored.state.is_terminal() {
                return Err(SimError::Validation(format!(
                    "battle {} has already ended",
                    battle.id
                )));
            }
        }
        replace(&mut t.battles, battle)
    }

    async fn list_battles(&self, game_id: GameId, state: Option<BattleState>) -> Result<Vec<Battle>> {
        Ok(select(&self.tables.read().await.battles, |b| {
            b.game_id == game_id && state.map_or(true, |s| b.state == s)
        }))
    }
}

#[async_trait]
impl NpcRepository for InMemoryStore {
    async fn add_npc(&self, npc: NpcShip) -> Result<NpcShip> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.npcs, npc))
    }

    async fn npc_for_ship(&self, ship_id: ShipId) -> Result<Option<NpcShip>> {
        let t = self.tables.read().await;
        Ok(t.npcs.values().find(|n| n.spaceship_id == ship_id).cloned())
    }

    async fn update_npc(&self, npc: &NpcShip) -> Result<()> {
        replace(&mut self.tables.write().await.npcs, npc)
    }

    async fn list_npcs(&self, game_id: GameId) -> Result<Vec<NpcShip>> {
        Ok(select(&self.tables.read().await.npcs, |n| n.game_id == game_id))
    }
}

#[async_trait]
impl AgentRepository for InMemoryStore {
    async fn add_agent(&self, agent: Agent) -> Result<Agent> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.agents, agent))
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>> {
        Ok(self.tables.read().await.agents.get(&id).cloned())
    }

    async fn update_agent(&self, agent: &Agent) -> Result<()> {
        replace(&mut self.tables.write().await.agents, agent)
    }

    async fn delete_agent(&self, id: AgentId) -> Result<bool> {
        let mut t = self.tables.write().await;
        let existed = t.agents.remove(&id).is_some();
        t.agent_logs.retain(|_, log| log.agent_id != id);
        Ok(existed)
    }

    async fn list_agents(&self, game_id: GameId) -> Result<Vec<Agent>> {
        Ok(select(&self.tables.read().await.agents, |a| a.game_id == game_id))
    }

    async fn add_log(&self, log: AgentLog) -> Result<AgentLog> {
        let mut t = self.tables.write().await;
        let id = t.allocate();
        Ok(insert(id, &mut t.agent_logs, log))
    }

    async fn list_logs(&self, agent_id: AgentId, limit: usize) -> Result<Vec<AgentLog>> {
        let t = self.tables.read().await;
        Ok(t.agent_logs
            .values()
            .rev()
            .filter(|l| l.agent_id == agent_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn game() -> Game {
        Game {
            id: 0,
            name: "test".into(),
            is_active: true,
            players: vec!["alice".into()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_assigned() {
        let store = InMemoryStore::new();
        let a = store.add_game(game()).await.unwrap();
        let b = store.add_game(game()).await.unwrap();
        assert_ne!(a.id, 0);
        assert_ne!(a.id, b.id);
        assert_eq!(store.get_game(a.id).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryStore::new();
        let mut g = game();
        g.id = 99;
        let err = store.update_game(&g).await.unwrap_err();
        assert!(matches!(err, SimError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_self_loop_wormhole_rejected() {
        let store = InMemoryStore::new();
        let err = store
            .add_wormhole(Wormhole {
                id: 0,
                galaxy_id: 1,
                system_a: 5,
                system_b: 5,
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_preserves_games() {
        let store = InMemoryStore::new();
        let stored = store.add_game(game()).await.unwrap();
        let mut buf = Vec::new();
        store.save_snapshot(&mut buf).await.unwrap();

        let restored = InMemoryStore::new();
        restored.load_snapshot(buf.as_slice()).await.unwrap();
        assert_eq!(restored.get_game(stored.id).await.unwrap(), Some(stored));
        // Id allocation continues where the snapshot left off.
        let next = restored.add_game(game()).await.unwrap();
        assert!(next.id > 1);
    }

    #[tokio::test]
    async fn test_logs_newest_first_with_limit() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .add_log(AgentLog {
                    id: 0,
                    agent_id: 7,
                    level: LogLevel::Info,
                    message: format!("entry {i}"),
                    data: None,
                    at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let logs = store.list_logs(7, 2).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "entry 4");
        assert_eq!(logs[1].message, "entry 3");
    }
}
