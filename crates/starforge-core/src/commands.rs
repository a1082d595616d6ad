//! Player-issued commands.
//!
//! Each command validates its input before touching storage, so a rejected
//! request leaves every record as it was. Ownership is checked against the
//! calling player; records owned by someone else read as not found.

use crate::agents::BehaviorRegistry;
use crate::clock::Clock;
use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::events::EventSink;
use crate::model::*;
use crate::repository::Store;
use crate::systems::{ensure_station, move_ship, resolve_square};
use chrono::{DateTime, Utc};
use starforge_logic::geometry::Point;
use starforge_logic::resources::BuildingType;
use starforge_logic::ships::{ShipState, ShipType};
use std::sync::Arc;

/// Most log entries a single [`Commands::agent_logs`] call returns.
pub const MAX_LOG_PAGE: usize = 100;

/// Input for [`Commands::create_agent`].
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub game_id: GameId,
    pub name: String,
    pub agent_type: AgentType,
    pub behavior_name: Option<String>,
    pub config: Option<String>,
    pub builder_id: Option<BuilderId>,
}

/// What a colony ship left behind.
#[derive(Debug, Clone)]
pub struct Colony {
    pub station: SpaceStation,
    pub builder: Builder,
    pub station_created: bool,
}

#[derive(Clone)]
pub struct Commands {
    store: Arc<dyn Store>,
    config: Arc<SimulationConfig>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    registry: Arc<BehaviorRegistry>,
}

impl Commands {
    pub fn new(
        store: Arc<dyn Store>,
        config: Arc<SimulationConfig>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        registry: Arc<BehaviorRegistry>,
    ) -> Self {
        Self {
            store,
            config,
            sink,
            clock,
            registry,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Buildings ──

    /// Place a building and start it with one of the player's available
    /// builders on that planet.
    pub async fn place_building(
        &self,
        player_id: &str,
        square_id: SquareId,
        building_type: BuildingType,
    ) -> Result<Building> {
        let (game_id, planet) = self.free_square(player_id, square_id).await?;
        let mut builder = self
            .store
            .builders_on_planet(planet.id)
            .await?
            .into_iter()
            .find(|b| b.player_id == player_id && b.is_available)
            .ok_or_else(|| {
                SimError::Validation(format!("No available builder on planet {}", planet.name))
            })?;

        let now = self.now();
        let building = self
            .store
            .add_building(Building {
                id: 0,
                game_id,
                grid_square_id: square_id,
                player_id: player_id.to_string(),
                building_type,
                construction_progress: 0.0,
                is_complete: false,
                construction_start_time: Some(now),
                completed_at: None,
                assigned_builder_id: Some(builder.id),
                created_at: now,
            })
            .await?;
        builder.assign(building.id);
        self.store.update_builder(&builder).await?;

        log::info!(
            "{} placed {} on square {} of {} (builder {})",
            player_id,
            building_type.name(),
            square_id,
            planet.name,
            builder.id
        );
        Ok(building)
    }

    /// Queue a building without a builder. It makes no progress until a
    /// builder is assigned, typically by an AutoBuilder agent.
    pub async fn queue_building(
        &self,
        player_id: &str,
        square_id: SquareId,
        building_type: BuildingType,
    ) -> Result<Building> {
        let (game_id, _) = self.free_square(player_id, square_id).await?;
        self.store
            .add_building(Building {
                id: 0,
                game_id,
                grid_square_id: square_id,
                player_id: player_id.to_string(),
                building_type,
                construction_progress: 0.0,
                is_complete: false,
                construction_start_time: None,
                completed_at: None,
                assigned_builder_id: None,
                created_at: self.now(),
            })
            .await
    }

    /// Resolve a square the player may build on: it exists, it is empty, and
    /// the player belongs to its game.
    async fn free_square(&self, player_id: &str, square_id: SquareId) -> Result<(GameId, Planet)> {
        let location = resolve_square(self.store.as_ref(), square_id)
            .await?
            .ok_or_else(|| SimError::not_found("GridSquare", square_id))?;
        self.member_game(location.game_id, player_id).await?;
        if self.store.building_on_square(square_id).await?.is_some() {
            return Err(SimError::Validation(format!(
                "Square {} already has a building",
                square_id
            )));
        }
        Ok((location.game_id, location.planet))
    }

    async fn member_game(&self, game_id: GameId, player_id: &str) -> Result<Game> {
        let game = self
            .store
            .get_game(game_id)
            .await?
            .ok_or_else(|| SimError::not_found("Game", game_id))?;
        if !game.players.iter().any(|p| p == player_id) {
            return Err(SimError::Validation(format!(
                "Player {} is not a member of game {}",
                player_id, game_id
            )));
        }
        Ok(game)
    }

    // ── Ships ──

    /// Start building a ship at one of the player's shipyards, charging its
    /// cost from the shipyard's station.
    pub async fn create_spaceship(
        &self,
        player_id: &str,
        shipyard_id: ShipyardId,
        ship_type: &str,
        name: Option<&str>,
    ) -> Result<Spaceship> {
        let ship_type =
            ShipType::parse(ship_type).ok_or_else(|| SimError::InvalidShipType(ship_type.to_string()))?;
        let shipyard = self
            .store
            .get_shipyard(shipyard_id)
            .await?
            .ok_or_else(|| SimError::not_found("Shipyard", shipyard_id))?;
        let mut station = self
            .store
            .get_station(shipyard.station_id)
            .await?
            .filter(|s| s.player_id == player_id)
            .ok_or_else(|| SimError::not_found("Shipyard", shipyard_id))?;

        let in_progress = self
            .store
            .list_ships_in_system(station.system_id)
            .await?
            .iter()
            .filter(|s| s.shipyard_id == Some(shipyard.id) && s.state == ShipState::UnderConstruction)
            .count();
        if in_progress >= shipyard.max_concurrent_builds as usize {
            return Err(SimError::CapacityExceeded {
                shipyard_id: shipyard.id,
                capacity: shipyard.max_concurrent_builds,
            });
        }

        let stats = self.config.ship_stats(ship_type);
        if !station.resources.try_pay(&stats.cost) {
            return Err(SimError::InsufficientResources(format!(
                "{} needs {:.0} iron, {:.0} copper and {:.0} fuel",
                ship_type.name(),
                stats.cost.iron,
                stats.cost.copper,
                stats.cost.fuel
            )));
        }
        self.store.update_station(&station).await?;

        let now = self.now();
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                let owned = self
                    .store
                    .list_ships(station.game_id)
                    .await?
                    .iter()
                    .filter(|s| s.player_id == player_id)
                    .count();
                format!("{} {}", ship_type.name(), owned + 1)
            }
        };
        let ship = self
            .store
            .add_ship(Spaceship {
                id: 0,
                game_id: station.game_id,
                player_id: player_id.to_string(),
                name,
                ship_type,
                state: ShipState::UnderConstruction,
                health: stats.max_health,
                max_health: stats.max_health,
                attack: stats.attack,
                defense: stats.defense,
                speed: stats.speed,
                cargo_capacity: stats.cargo_capacity,
                experience: 0,
                system_id: station.system_id,
                position: Point::ORIGIN,
                destination_system_id: None,
                destination: None,
                eta: None,
                shipyard_id: Some(shipyard.id),
                construction_progress: 0.0,
                construction_start_time: Some(now),
                construction_seconds: stats.construction_seconds as f64,
                completed_at: None,
            })
            .await?;

        self.sink.on_ship_updated(&ship);
        self.sink.on_shipyard_updated(&shipyard);
        log::info!(
            "{} started {} '{}' at shipyard {} ({}s)",
            player_id,
            ship_type.name(),
            ship.name,
            shipyard.id,
            stats.construction_seconds
        );
        Ok(ship)
    }

    pub async fn create_shipyard(
        &self,
        player_id: &str,
        station_id: StationId,
        name: Option<&str>,
    ) -> Result<Shipyard> {
        let station = self
            .store
            .get_station(station_id)
            .await?
            .filter(|s| s.player_id == player_id)
            .ok_or_else(|| SimError::not_found("SpaceStation", station_id))?;
        let existing = self.store.list_shipyards(station.id).await?.len();
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} Shipyard {}", station.name, existing + 1));

        let shipyard = self
            .store
            .add_shipyard(Shipyard {
                id: 0,
                game_id: station.game_id,
                station_id: station.id,
                name,
                max_concurrent_builds: 1,
            })
            .await?;
        self.sink.on_shipyard_updated(&shipyard);
        Ok(shipyard)
    }

    pub async fn move_ship(
        &self,
        player_id: &str,
        ship_id: ShipId,
        destination_system: Option<SystemId>,
        destination: Point,
    ) -> Result<Spaceship> {
        self.owned_ship(player_id, ship_id).await?;
        move_ship(
            self.store.as_ref(),
            self.sink.as_ref(),
            self.now(),
            ship_id,
            destination_system,
            destination,
        )
        .await
    }

    /// Spend an idle colony ship on a planet in its current system. The
    /// player gets a station there (if missing) and a builder on the planet.
    pub async fn colonize(
        &self,
        player_id: &str,
        ship_id: ShipId,
        planet_id: PlanetId,
    ) -> Result<Colony> {
        let mut ship = self.owned_ship(player_id, ship_id).await?;
        if ship.ship_type != ShipType::Colony {
            return Err(SimError::Validation(format!(
                "{} is not a colony ship",
                ship.name
            )));
        }
        if ship.state != ShipState::Idle {
            return Err(SimError::Validation(format!(
                "Colony ship must be idle (is {:?})",
                ship.state
            )));
        }
        let planet = self
            .store
            .get_planet(planet_id)
            .await?
            .ok_or_else(|| SimError::not_found("Planet", planet_id))?;
        if planet.system_id != ship.system_id {
            return Err(SimError::Validation(format!(
                "Planet {} is not in the ship's system",
                planet.name
            )));
        }

        let (station, station_created) =
            ensure_station(self.store.as_ref(), ship.game_id, player_id, planet.system_id).await?;
        let builder = self
            .store
            .add_builder(Builder {
                id: 0,
                game_id: ship.game_id,
                planet_id: planet.id,
                player_id: player_id.to_string(),
                name: format!("Builder {}", planet.name),
                assigned_building_id: None,
                is_available: true,
            })
            .await?;

        ship.state = ShipState::Destroyed;
        ship.clear_movement();
        self.store.update_ship(&ship).await?;
        self.sink.on_ship_destroyed(ship.id);

        log::info!("{} colonized {} with {}", player_id, planet.name, ship.name);
        Ok(Colony {
            station,
            builder,
            station_created,
        })
    }

    async fn owned_ship(&self, player_id: &str, ship_id: ShipId) -> Result<Spaceship> {
        self.store
            .get_ship(ship_id)
            .await?
            .filter(|s| s.player_id == player_id)
            .ok_or_else(|| SimError::not_found("Spaceship", ship_id))
    }

    // ── Agents ──

    fn check_behavior(
        &self,
        agent_type: AgentType,
        behavior_name: Option<&str>,
        config: Option<&str>,
    ) -> Result<()> {
        let Some(name) = behavior_name else {
            return Ok(());
        };
        let behavior = self
            .registry
            .get(name)
            .ok_or_else(|| SimError::Validation(format!("Unknown behavior: {}", name)))?;
        if !behavior.supports(agent_type) {
            return Err(SimError::Validation(format!(
                "Behavior {} does not support {:?} agents",
                behavior.name(),
                agent_type
            )));
        }
        behavior.validate_config(config)
    }

    pub async fn create_agent(&self, player_id: &str, request: NewAgent) -> Result<Agent> {
        if request.name.trim().is_empty() {
            return Err(SimError::Validation("Agent name is required".into()));
        }
        self.check_behavior(
            request.agent_type,
            request.behavior_name.as_deref(),
            request.config.as_deref(),
        )?;
        self.member_game(request.game_id, player_id).await?;
        if let Some(builder_id) = request.builder_id {
            let owned = self
                .store
                .get_builder(builder_id)
                .await?
                .map_or(false, |b| b.player_id == player_id);
            if !owned {
                return Err(SimError::Validation(
                    "Builder not found or does not belong to player".into(),
                ));
            }
        }

        let now = self.now();
        let agent = self
            .store
            .add_agent(Agent {
                id: 0,
                game_id: request.game_id,
                player_id: player_id.to_string(),
                name: request.name.trim().to_string(),
                agent_type: request.agent_type,
                state: AgentState::Active,
                behavior_name: request.behavior_name,
                config: request.config,
                builder_id: request.builder_id,
                spaceship_id: None,
                last_execution_time: None,
                next_execution_time: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
        log::info!("Created agent {} for player {}", agent.id, player_id);
        self.sink.on_agent_updated(&agent);
        Ok(agent)
    }

    /// Switch an agent's behavior and/or config. A `None` behavior keeps the
    /// current one; the resulting pair is validated before saving.
    pub async fn update_agent_config(
        &self,
        player_id: &str,
        agent_id: AgentId,
        behavior_name: Option<String>,
        config: Option<String>,
    ) -> Result<Agent> {
        let mut agent = self.owned_agent(player_id, agent_id).await?;
        let behavior_name = behavior_name.or_else(|| agent.behavior_name.clone());
        self.check_behavior(agent.agent_type, behavior_name.as_deref(), config.as_deref())?;

        agent.behavior_name = behavior_name;
        agent.config = config;
        agent.next_execution_time = None;
        agent.updated_at = self.now();
        self.store.update_agent(&agent).await?;
        self.sink.on_agent_updated(&agent);
        Ok(agent)
    }

    pub async fn pause_agent(&self, player_id: &str, agent_id: AgentId) -> Result<Agent> {
        let mut agent = self.owned_agent(player_id, agent_id).await?;
        agent.state = AgentState::Paused;
        agent.updated_at = self.now();
        self.store.update_agent(&agent).await?;
        self.sink.on_agent_updated(&agent);
        Ok(agent)
    }

    /// Reactivate an agent and clear its timers so it runs on the next tick.
    pub async fn resume_agent(&self, player_id: &str, agent_id: AgentId) -> Result<Agent> {
        let mut agent = self.owned_agent(player_id, agent_id).await?;
        agent.state = AgentState::Active;
        agent.last_execution_time = None;
        agent.next_execution_time = None;
        agent.updated_at = self.now();
        self.store.update_agent(&agent).await?;
        self.sink.on_agent_updated(&agent);
        Ok(agent)
    }

    pub async fn delete_agent(&self, player_id: &str, agent_id: AgentId) -> Result<()> {
        self.owned_agent(player_id, agent_id).await?;
        self.store.delete_agent(agent_id).await?;
        log::info!("Deleted agent {} for player {}", agent_id, player_id);
        Ok(())
    }

    /// Newest first, at most [`MAX_LOG_PAGE`] entries.
    pub async fn agent_logs(
        &self,
        player_id: &str,
        agent_id: AgentId,
        limit: usize,
    ) -> Result<Vec<AgentLog>> {
        self.owned_agent(player_id, agent_id).await?;
        self.store
            .list_logs(agent_id, limit.min(MAX_LOG_PAGE))
            .await
    }

    async fn owned_agent(&self, player_id: &str, agent_id: AgentId) -> Result<Agent> {
        self.store
            .get_agent(agent_id)
            .await?
            .filter(|a| a.player_id == player_id)
            .ok_or_else(|| SimError::not_found("Agent", agent_id))
    }
}
