//! Construction stage - advances buildings and ships from elapsed time

use crate::clock::seconds_between;
use crate::context::TickContext;
use crate::error::Result;
use starforge_logic::construction::advance;
use starforge_logic::ships::ShipState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionReport {
    pub buildings_advanced: usize,
    pub buildings_completed: usize,
    pub ships_advanced: usize,
    pub ships_completed: usize,
}

/// Recompute progress for every started, incomplete building and ship in the
/// game. Completed buildings release their builder; completed ships become
/// Idle.
pub async fn construction_system(ctx: &mut TickContext) -> Result<ConstructionReport> {
    let mut report = ConstructionReport::default();
    let building_seconds = ctx.config.building_construction_seconds;

    for mut building in ctx.store.list_buildings(ctx.game_id).await? {
        if building.is_complete {
            continue;
        }
        let Some(started) = building.construction_start_time else {
            continue;
        };
        let update = advance(
            building.construction_progress,
            seconds_between(started, ctx.now),
            building_seconds,
        );
        if update.progress <= building.construction_progress && !update.just_completed {
            continue;
        }
        building.construction_progress = update.progress;
        report.buildings_advanced += 1;

        if update.just_completed {
            building.is_complete = true;
            building.completed_at = Some(ctx.now);
            let builder = match building.assigned_builder_id {
                Some(id) => ctx.store.get_builder(id).await?,
                None => ctx.store.builder_for_building(building.id).await?,
            };
            if let Some(mut builder) = builder {
                builder.release();
                ctx.store.update_builder(&builder).await?;
            }
            building.assigned_builder_id = None;
            report.buildings_completed += 1;
            log::debug!(
                "Building {} ({}) completed for {}",
                building.id,
                building.building_type.name(),
                building.player_id
            );
        }
        ctx.store.update_building(&building).await?;
    }

    for mut ship in ctx.store.list_ships(ctx.game_id).await? {
        if ship.state != ShipState::UnderConstruction {
            continue;
        }
        let Some(started) = ship.construction_start_time else {
            continue;
        };
        let update = advance(
            ship.construction_progress,
            seconds_between(started, ctx.now),
            ship.construction_seconds,
        );
        if update.progress <= ship.construction_progress && !update.just_completed {
            continue;
        }
        ship.construction_progress = update.progress;
        report.ships_advanced += 1;

        if update.just_completed {
            ship.state = ShipState::Idle;
            ship.completed_at = Some(ctx.now);
            report.ships_completed += 1;
            log::debug!("Ship {} ({}) launched for {}", ship.id, ship.name, ship.player_id);
        }
        ctx.store.update_ship(&ship).await?;
        ctx.sink.on_ship_updated(&ship);

        if update.just_completed {
            if let Some(yard_id) = ship.shipyard_id {
                if let Some(yard) = ctx.store.get_shipyard(yard_id).await? {
                    ctx.sink.on_shipyard_updated(&yard);
                }
            }
        }
    }

    Ok(report)
}
