//! One-time world creation: persisting a generated galaxy and planet grids,
//! and bootstrapping a new game with its players.
//!
//! Nothing here runs inside the tick loop. Grids are generated once per
//! planet and never regenerated.

use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::model::*;
use crate::repository::Store;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use starforge_logic::galaxy::generate_galaxy;
use starforge_logic::grid::generate_grid;
use std::collections::HashSet;

/// What was written for one galaxy.
#[derive(Debug, Clone)]
pub struct GalaxySummary {
    pub galaxy: Galaxy,
    pub systems: Vec<StarSystem>,
    pub wormhole_count: usize,
    pub planets: Vec<Planet>,
}

/// Generate and persist a galaxy (systems, wormholes, planets and their
/// grids) for `game_id`.
pub async fn create_galaxy(
    store: &dyn Store,
    config: &SimulationConfig,
    rng: &mut StdRng,
    game_id: GameId,
    name: &str,
) -> Result<GalaxySummary> {
    if store.galaxy_for_game(game_id).await?.is_some() {
        return Err(SimError::Validation(format!(
            "game {} already has a galaxy",
            game_id
        )));
    }

    let layout = generate_galaxy(&config.galaxy_params(), rng);
    let galaxy = store
        .add_galaxy(Galaxy {
            id: 0,
            game_id,
            name: name.to_string(),
            system_count: layout.systems.len(),
        })
        .await?;

    let mut systems = Vec::with_capacity(layout.systems.len());
    let mut planets = Vec::new();
    for seed in &layout.systems {
        let system = store
            .add_system(StarSystem {
                id: 0,
                galaxy_id: galaxy.id,
                name: seed.name.clone(),
                position: seed.position,
            })
            .await?;
        for planet_seed in &seed.planets {
            let planet = store
                .add_planet(Planet {
                    id: 0,
                    system_id: system.id,
                    name: planet_seed.name.clone(),
                    size: planet_seed.size,
                    planet_type: planet_seed.planet_type,
                })
                .await?;
            create_planet_grid(store, &planet, rng).await?;
            planets.push(planet);
        }
        systems.push(system);
    }

    for &(a, b) in &layout.wormholes {
        store
            .add_wormhole(Wormhole {
                id: 0,
                galaxy_id: galaxy.id,
                system_a: systems[a].id,
                system_b: systems[b].id,
            })
            .await?;
    }

    log::info!(
        "Generated galaxy '{}' for game {}: {} systems, {} wormholes ({} spanning), {} planets",
        galaxy.name,
        game_id,
        systems.len(),
        layout.wormholes.len(),
        layout.spanning_edges,
        planets.len()
    );

    Ok(GalaxySummary {
        galaxy,
        systems,
        wormhole_count: layout.wormholes.len(),
        planets,
    })
}

/// Generate and persist the mining grid for a planet. Returns the existing
/// grid if the planet already has one.
pub async fn create_planet_grid(
    store: &dyn Store,
    planet: &Planet,
    rng: &mut StdRng,
) -> Result<PlanetGrid> {
    if let Some(existing) = store.grid_for_planet(planet.id).await? {
        return Ok(existing);
    }
    let layout = generate_grid(planet.size, planet.planet_type, rng);
    let squares = layout
        .cells
        .iter()
        .map(|c| GridSquare {
            id: 0,
            grid_id: 0,
            x: c.x,
            y: c.y,
            iron: c.iron,
            copper: c.copper,
            fuel: c.fuel,
            soil: c.soil,
        })
        .collect();
    store
        .add_grid(
            PlanetGrid {
                id: 0,
                planet_id: planet.id,
                width: layout.dimension,
                height: layout.dimension,
            },
            squares,
        )
        .await
}

/// Reject a roster that could fail part-way through bootstrapping.
fn validate_players(players: &[PlayerId]) -> Result<()> {
    let mut seen = HashSet::new();
    for player_id in players {
        if player_id.trim().is_empty() {
            return Err(SimError::Validation("player id must not be blank".into()));
        }
        if player_id == NPC_PLAYER_ID {
            return Err(SimError::Validation(format!(
                "player id '{}' is reserved",
                NPC_PLAYER_ID
            )));
        }
        if !seen.insert(player_id.as_str()) {
            return Err(SimError::Validation(format!(
                "player {} is listed twice",
                player_id
            )));
        }
    }
    Ok(())
}

/// A player's starting position in a new game.
#[derive(Debug, Clone)]
pub struct PlayerStart {
    pub player_id: PlayerId,
    pub planet: Planet,
    pub station: SpaceStation,
    pub shipyard: Shipyard,
    pub builders: Vec<Builder>,
}

#[derive(Debug, Clone)]
pub struct NewGame {
    pub game: Game,
    pub galaxy: GalaxySummary,
    pub players: Vec<PlayerStart>,
}

/// Create an active game with a fresh galaxy, and give each player a home
/// planet with a stocked station, a shipyard and a crew of builders.
///
/// Home planets are spread over distinct systems while enough exist.
pub async fn create_game(
    store: &dyn Store,
    config: &SimulationConfig,
    rng: &mut StdRng,
    now: DateTime<Utc>,
    name: &str,
    players: &[PlayerId],
) -> Result<NewGame> {
    validate_players(players)?;

    let game = store
        .add_game(Game {
            id: 0,
            name: name.to_string(),
            is_active: true,
            players: players.to_vec(),
            created_at: now,
        })
        .await?;
    let galaxy = create_galaxy(store, config, rng, game.id, &format!("{} Galaxy", name)).await?;

    let mut systems: Vec<&StarSystem> = galaxy.systems.iter().collect();
    systems.shuffle(rng);

    let mut starts = Vec::with_capacity(players.len());
    for (i, player_id) in players.iter().enumerate() {
        let system = systems[i % systems.len()];
        let planet = galaxy
            .planets
            .iter()
            .find(|p| p.system_id == system.id)
            .cloned()
            .ok_or_else(|| SimError::not_found("Planet in system", system.id))?;

        let station = store
            .add_station(SpaceStation {
                id: 0,
                game_id: game.id,
                system_id: system.id,
                player_id: player_id.clone(),
                name: SpaceStation::default_name(player_id),
                resources: config.starting_resources,
            })
            .await?;
        let shipyard = store
            .add_shipyard(Shipyard {
                id: 0,
                game_id: game.id,
                station_id: station.id,
                name: format!("{} Shipyard", station.name),
                max_concurrent_builds: 1,
            })
            .await?;

        let mut builders = Vec::new();
        for n in 1..=config.starting_builders_per_planet {
            builders.push(
                store
                    .add_builder(Builder {
                        id: 0,
                        game_id: game.id,
                        planet_id: planet.id,
                        player_id: player_id.clone(),
                        name: format!("Builder {} #{}", planet.name, n),
                        assigned_building_id: None,
                        is_available: true,
                    })
                    .await?,
            );
        }

        log::info!(
            "Player {} starts on {} in system {}",
            player_id,
            planet.name,
            system.name
        );
        starts.push(PlayerStart {
            player_id: player_id.clone(),
            planet,
            station,
            shipyard,
            builders,
        });
    }

    Ok(NewGame {
        game,
        galaxy,
        players: starts,
    })
}
