//! Movement stage - issues move orders and lands ships whose ETA has passed

use crate::clock::add_seconds;
use crate::context::TickContext;
use crate::error::{Result, SimError};
use crate::events::EventSink;
use crate::model::*;
use crate::repository::Store;
use chrono::{DateTime, Utc};
use starforge_logic::geometry::Point;
use starforge_logic::movement::{travel_distance, travel_seconds};
use starforge_logic::ships::ShipState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MovementReport {
    pub in_flight: usize,
    pub arrived: usize,
    /// Player ships that fled a battle and are back to Idle.
    pub regrouped: usize,
}

/// Order a ship to `destination` in `destination_system` (or its current
/// system when `None`).
///
/// Rejected without mutation if the ship is not free to move, or if the
/// target system is not joined to the current one by a wormhole.
pub async fn move_ship(
    store: &dyn Store,
    sink: &dyn EventSink,
    now: DateTime<Utc>,
    ship_id: ShipId,
    destination_system: Option<SystemId>,
    destination: Point,
) -> Result<Spaceship> {
    let mut ship = store
        .get_ship(ship_id)
        .await?
        .ok_or_else(|| SimError::not_found("Spaceship", ship_id))?;

    match ship.state {
        ShipState::UnderConstruction => {
            return Err(SimError::Validation("Ship is still under construction".into()))
        }
        ShipState::Moving => return Err(SimError::Validation("Ship is already moving".into())),
        ShipState::Destroyed => return Err(SimError::Validation("Ship has been destroyed".into())),
        ShipState::InCombat => return Err(SimError::Validation("Ship is in combat".into())),
        ShipState::Colonizing => return Err(SimError::Validation("Ship is colonizing".into())),
        ShipState::Idle | ShipState::Fleeing => {}
    }

    let target_system = destination_system.unwrap_or(ship.system_id);
    let crosses = target_system != ship.system_id;
    if crosses {
        if store.get_system(target_system).await?.is_none() {
            return Err(SimError::not_found("StarSystem", target_system));
        }
        let linked = store
            .wormholes_for_system(ship.system_id)
            .await?
            .iter()
            .any(|w| w.connects(ship.system_id, target_system));
        if !linked {
            return Err(SimError::NoWormhole {
                from: ship.system_id,
                to: target_system,
            });
        }
    }

    let distance = travel_distance(crosses, ship.position, destination);
    let seconds = travel_seconds(distance, ship.speed)
        .ok_or_else(|| SimError::Validation(format!("Ship {} cannot move", ship.id)))?;

    ship.destination_system_id = Some(target_system);
    ship.destination = Some(destination);
    ship.eta = Some(add_seconds(now, seconds));
    ship.state = ShipState::Moving;
    store.update_ship(&ship).await?;
    sink.on_ship_updated(&ship);

    log::debug!(
        "Ship {} moving to system {} ({:.0}, {:.0}), {:.1}s",
        ship.id,
        target_system,
        destination.x,
        destination.y,
        seconds
    );
    Ok(ship)
}

/// Land every moving ship whose ETA has passed, and return player ships
/// that fled a battle on an earlier tick to Idle. NPCs regroup in the NPC
/// stage instead.
pub async fn movement_system(ctx: &mut TickContext) -> Result<MovementReport> {
    let mut report = MovementReport::default();

    for mut ship in ctx.store.list_ships(ctx.game_id).await? {
        if ship.state == ShipState::Fleeing && !ship.is_npc() {
            ship.state = ShipState::Idle;
            ctx.store.update_ship(&ship).await?;
            ctx.sink.on_ship_updated(&ship);
            report.regrouped += 1;
            continue;
        }
        if ship.state != ShipState::Moving {
            continue;
        }
        match ship.eta {
            Some(eta) if eta > ctx.now => {
                report.in_flight += 1;
                continue;
            }
            Some(_) => {
                if let Some(system_id) = ship.destination_system_id {
                    ship.system_id = system_id;
                }
                if let Some(destination) = ship.destination {
                    ship.position = destination;
                }
                report.arrived += 1;
            }
            None => {
                log::warn!("Ship {} was moving without an ETA; stopping it", ship.id);
            }
        }
        ship.clear_movement();
        ship.state = ShipState::Idle;
        ctx.store.update_ship(&ship).await?;
        ctx.sink.on_ship_updated(&ship);
    }

    Ok(report)
}
