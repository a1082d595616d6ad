//! Shared fixture: a small hand-built world with fixed ids and positions.
//!
//! Three systems in a row, A -(wormhole)- B   C, one planet in A and one in
//! B, a 2x2 grid on A's planet, alice's station and builder in A, and a
//! shipyard on that station. NPC spawning is disabled unless a test enables
//! it.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use starforge_core::prelude::*;
use starforge_logic::geometry::Point;
use starforge_logic::grid::PlanetType;
use starforge_logic::ships::{ShipState, ShipType};
use std::sync::Arc;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub struct World {
    pub store: Arc<InMemoryStore>,
    pub config: Arc<SimulationConfig>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
    pub registry: Arc<BehaviorRegistry>,
    pub game: Game,
    pub galaxy: Galaxy,
    /// A, B, C.
    pub systems: Vec<StarSystem>,
    pub home: Planet,
    pub frontier: Planet,
    pub squares: Vec<GridSquare>,
    pub station: SpaceStation,
    pub shipyard: Shipyard,
    pub builder: Builder,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
}

pub fn quiet_config() -> SimulationConfig {
    SimulationConfig {
        npc_min_count: 0,
        npc_max_count: 0,
        npc_spawn_chance: 0.0,
        base_flee_chance: 0.0,
        ..SimulationConfig::default()
    }
}

pub async fn world() -> World {
    world_with(quiet_config()).await
}

pub async fn world_with(config: SimulationConfig) -> World {
    let store = Arc::new(InMemoryStore::new());
    let now = start_time();

    let game = store
        .add_game(Game {
            id: 0,
            name: "Fixture".into(),
            is_active: true,
            players: vec![ALICE.into(), BOB.into()],
            created_at: now,
        })
        .await
        .unwrap();
    let galaxy = store
        .add_galaxy(Galaxy {
            id: 0,
            game_id: game.id,
            name: "Fixture Galaxy".into(),
            system_count: 3,
        })
        .await
        .unwrap();

    let mut systems = Vec::new();
    for (name, x) in [("Alpha", 0.0), ("Beta", 500.0), ("Gamma", 1000.0)] {
        systems.push(
            store
                .add_system(StarSystem {
                    id: 0,
                    galaxy_id: galaxy.id,
                    name: name.into(),
                    position: Point::new(x, 0.0),
                })
                .await
                .unwrap(),
        );
    }
    store
        .add_wormhole(Wormhole {
            id: 0,
            galaxy_id: galaxy.id,
            system_a: systems[0].id,
            system_b: systems[1].id,
        })
        .await
        .unwrap();

    let home = store
        .add_planet(Planet {
            id: 0,
            system_id: systems[0].id,
            name: "Alpha I".into(),
            size: 1,
            planet_type: PlanetType::Terrestrial,
        })
        .await
        .unwrap();
    let frontier = store
        .add_planet(Planet {
            id: 0,
            system_id: systems[1].id,
            name: "Beta I".into(),
            size: 1,
            planet_type: PlanetType::Ice,
        })
        .await
        .unwrap();

    let cells = vec![
        square(0, 0, Some(500.0), None),
        square(1, 0, None, Some(0.05)),
        square(0, 1, Some(20.0), Some(20.0)),
        square(1, 1, None, None),
    ];
    let grid = store
        .add_grid(
            PlanetGrid {
                id: 0,
                planet_id: home.id,
                width: 2,
                height: 2,
            },
            cells,
        )
        .await
        .unwrap();
    let squares = store.list_squares(grid.id).await.unwrap();

    let station = store
        .add_station(SpaceStation {
            id: 0,
            game_id: game.id,
            system_id: systems[0].id,
            player_id: ALICE.into(),
            name: SpaceStation::default_name(ALICE),
            resources: config.starting_resources,
        })
        .await
        .unwrap();
    let shipyard = store
        .add_shipyard(Shipyard {
            id: 0,
            game_id: game.id,
            station_id: station.id,
            name: "Alpha Yard".into(),
            max_concurrent_builds: 1,
        })
        .await
        .unwrap();
    let builder = store
        .add_builder(Builder {
            id: 0,
            game_id: game.id,
            planet_id: home.id,
            player_id: ALICE.into(),
            name: "Builder Alpha I #1".into(),
            assigned_building_id: None,
            is_available: true,
        })
        .await
        .unwrap();

    World {
        store,
        config: Arc::new(config),
        sink: Arc::new(RecordingSink::new()),
        clock: Arc::new(ManualClock::new(now)),
        registry: Arc::new(BehaviorRegistry::with_builtins()),
        game,
        galaxy,
        systems,
        home,
        frontier,
        squares,
        station,
        shipyard,
        builder,
    }
}

fn square(x: u32, y: u32, iron: Option<f64>, copper: Option<f64>) -> GridSquare {
    GridSquare {
        id: 0,
        grid_id: 0,
        x,
        y,
        iron,
        copper,
        fuel: None,
        soil: None,
    }
}

impl World {
    pub fn ctx(&self) -> TickContext {
        self.ctx_seeded(7)
    }

    pub fn ctx_seeded(&self, seed: u64) -> TickContext {
        TickContext::new(
            self.game.id,
            self.store.clone(),
            Arc::clone(&self.config),
            self.sink.clone(),
            self.clock.now(),
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn commands(&self) -> Commands {
        Commands::new(
            self.store.clone(),
            Arc::clone(&self.config),
            self.sink.clone(),
            self.clock.clone(),
            Arc::clone(&self.registry),
        )
    }

    pub fn square_with_iron(&self) -> &GridSquare {
        self.squares
            .iter()
            .find(|s| s.iron == Some(500.0))
            .unwrap()
    }

    pub async fn station(&self, id: StationId) -> SpaceStation {
        self.store.get_station(id).await.unwrap().unwrap()
    }

    pub async fn ship(&self, id: ShipId) -> Spaceship {
        self.store.get_ship(id).await.unwrap().unwrap()
    }

    /// A finished ship placed directly in the store.
    pub async fn add_ship(
        &self,
        player: &str,
        system: usize,
        position: Point,
        stats: (i32, i32, i32),
    ) -> Spaceship {
        let (health, attack, defense) = stats;
        self.store
            .add_ship(Spaceship {
                id: 0,
                game_id: self.game.id,
                player_id: player.into(),
                name: format!("{}'s ship", player),
                ship_type: ShipType::Destroyer,
                state: ShipState::Idle,
                health,
                max_health: health,
                attack,
                defense,
                speed: 10.0,
                cargo_capacity: 50,
                experience: 0,
                system_id: self.systems[system].id,
                position,
                destination_system_id: None,
                destination: None,
                eta: None,
                shipyard_id: None,
                construction_progress: 100.0,
                construction_start_time: None,
                construction_seconds: 0.0,
                completed_at: Some(self.clock.now()),
            })
            .await
            .unwrap()
    }

    pub async fn add_agent(
        &self,
        agent_type: AgentType,
        behavior: Option<&str>,
        config: Option<&str>,
        builder_id: Option<BuilderId>,
    ) -> Agent {
        let now = self.clock.now();
        self.store
            .add_agent(Agent {
                id: 0,
                game_id: self.game.id,
                player_id: ALICE.into(),
                name: "fixture agent".into(),
                agent_type,
                state: AgentState::Active,
                behavior_name: behavior.map(str::to_string),
                config: config.map(str::to_string),
                builder_id,
                spaceship_id: None,
                last_execution_time: None,
                next_execution_time: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }
}
