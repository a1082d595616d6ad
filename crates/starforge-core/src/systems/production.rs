//! Production stage - moves resources from grid squares into stations

use crate::context::TickContext;
use crate::error::Result;
use crate::model::*;
use crate::repository::Store;
use starforge_logic::production::extract;
use starforge_logic::resources::Resources;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ProductionReport {
    pub buildings_producing: usize,
    pub stations_created: usize,
    pub total_extracted: f64,
}

/// Where a grid square sits, resolved through explicit lookups.
#[derive(Debug, Clone)]
pub struct SquareLocation {
    pub square: GridSquare,
    pub planet: Planet,
    pub system_id: SystemId,
    pub game_id: GameId,
}

/// Follow square → grid → planet → system → galaxy → game. `None` if any
/// link is missing.
pub async fn resolve_square(store: &dyn Store, square_id: SquareId) -> Result<Option<SquareLocation>> {
    let Some(square) = store.get_square(square_id).await? else {
        return Ok(None);
    };
    let Some(grid) = store.get_grid(square.grid_id).await? else {
        return Ok(None);
    };
    let Some(planet) = store.get_planet(grid.planet_id).await? else {
        return Ok(None);
    };
    let Some(system) = store.get_system(planet.system_id).await? else {
        return Ok(None);
    };
    let Some(galaxy) = store.get_galaxy(system.galaxy_id).await? else {
        return Ok(None);
    };
    Ok(Some(SquareLocation {
        square,
        planet,
        system_id: system.id,
        game_id: galaxy.game_id,
    }))
}

/// Fetch the player's station in a system, creating an empty one if absent.
/// The flag is true when a station was created.
pub async fn ensure_station(
    store: &dyn Store,
    game_id: GameId,
    player_id: &str,
    system_id: SystemId,
) -> Result<(SpaceStation, bool)> {
    if let Some(station) = store.find_station(player_id, system_id).await? {
        return Ok((station, false));
    }
    let station = store
        .add_station(SpaceStation {
            id: 0,
            game_id,
            system_id,
            player_id: player_id.to_string(),
            name: SpaceStation::default_name(player_id),
            resources: Resources::default(),
        })
        .await?;
    log::debug!("Created station {} for {} in system {}", station.id, player_id, system_id);
    Ok((station, true))
}

/// Every completed building extracts its resource into its owner's station
/// in the building's system.
pub async fn production_system(ctx: &mut TickContext) -> Result<ProductionReport> {
    let mut report = ProductionReport::default();
    let rate = ctx.config.production_rate_per_tick;
    let store = ctx.store.as_ref();

    for building in store.list_buildings(ctx.game_id).await? {
        if !building.is_complete {
            continue;
        }
        let Some(location) = resolve_square(store, building.grid_square_id).await? else {
            log::warn!(
                "Building {} sits on unresolvable square {}",
                building.id,
                building.grid_square_id
            );
            continue;
        };
        if location.game_id != ctx.game_id {
            continue;
        }

        let (mut station, created) =
            ensure_station(store, ctx.game_id, &building.player_id, location.system_id).await?;
        if created {
            report.stations_created += 1;
        }

        let kind = building.building_type.resource();
        let mut square = location.square;
        let taken = extract(square.deposit_mut(kind), rate);
        if taken <= 0.0 {
            continue;
        }
        station.resources.add(kind, taken);
        store.update_square(&square).await?;
        store.update_station(&station).await?;
        report.buildings_producing += 1;
        report.total_extracted += taken;
    }

    Ok(report)
}
