//! NPC stage - keeps the pirate population topped up and steers each NPC
//! according to its behavior.

use crate::clock::seconds_between;
use crate::context::TickContext;
use crate::error::{Result, SimError};
use crate::model::*;
use rand::seq::SliceRandom;
use rand::Rng;
use starforge_logic::geometry::{point_along, step_toward, Point};
use starforge_logic::names::pirate_name;
use starforge_logic::npc::{
    ambush_point, choose_behavior, patrol_waypoint, random_difficulty, ship_type_for_difficulty,
    spawn_position, stat_multiplier, LootTable, NpcBehavior, NpcHull, MAX_DIFFICULTY,
    MIN_DIFFICULTY, WAYPOINT_ARRIVAL_DISTANCE, WORMHOLE_MOUTH_RADIUS,
};
use starforge_logic::ships::ShipState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NpcReport {
    pub spawned: usize,
    pub acted: usize,
    pub failed: usize,
}

pub async fn npc_system(ctx: &mut TickContext) -> Result<NpcReport> {
    let mut report = NpcReport {
        spawned: maintain_population(ctx).await?,
        ..Default::default()
    };

    for npc in ctx.store.list_npcs(ctx.game_id).await? {
        let (id, ship_id) = (npc.id, npc.spaceship_id);
        match drive_npc(ctx, npc).await {
            Ok(true) => report.acted += 1,
            Ok(false) => {}
            Err(e) => {
                report.failed += 1;
                log::warn!("NPC {} behavior failed: {}; resetting it", id, e);
                if let Err(e) = reset_npc(ctx, ship_id).await {
                    log::error!("Failed to reset NPC {}: {}", id, e);
                }
            }
        }
    }
    Ok(report)
}

/// Park a misbehaving NPC: Idle, no movement, no target. It retries after
/// the usual behavior interval.
async fn reset_npc(ctx: &mut TickContext, ship_id: ShipId) -> Result<()> {
    if let Some(mut npc) = ctx.store.npc_for_ship(ship_id).await? {
        npc.target = None;
        npc.target_ship_id = None;
        npc.last_behavior_at = Some(ctx.now);
        ctx.store.update_npc(&npc).await?;
    }
    let Some(mut ship) = ctx.store.get_ship(ship_id).await? else {
        return Ok(());
    };
    if !ship.is_alive() || ship.state == ShipState::InCombat {
        return Ok(());
    }
    ship.state = ShipState::Idle;
    ship.clear_movement();
    ctx.store.update_ship(&ship).await?;
    ctx.sink.on_ship_updated(&ship);
    Ok(())
}

/// Spawn NPCs up to the configured minimum, and occasionally one more while
/// below the maximum. Returns how many were spawned.
pub async fn maintain_population(ctx: &mut TickContext) -> Result<usize> {
    let Some(galaxy) = ctx.store.galaxy_for_game(ctx.game_id).await? else {
        return Ok(0);
    };
    let systems = ctx.store.list_systems(galaxy.id).await?;
    if systems.is_empty() {
        return Ok(0);
    }

    let living = ctx
        .store
        .list_ships(ctx.game_id)
        .await?
        .iter()
        .filter(|s| s.is_npc() && s.is_alive())
        .count() as u32;

    let min = ctx.config.npc_min_count;
    let max = ctx.config.npc_max_count;
    let wanted = if living < min {
        min - living
    } else if living < max && ctx.rng.gen::<f64>() < ctx.config.npc_spawn_chance {
        1
    } else {
        0
    };

    let mut spawned = 0;
    for _ in 0..wanted {
        let Some(system) = systems.choose(&mut ctx.rng) else {
            break;
        };
        let system_id = system.id;
        match spawn_npc(ctx, system_id, None).await {
            Ok(_) => spawned += 1,
            Err(e) => log::warn!("Failed to spawn NPC in system {}: {}", system_id, e),
        }
    }
    if spawned > 0 {
        log::info!(
            "Spawned {} NPC(s) in game {} ({} were alive)",
            spawned,
            ctx.game_id,
            living
        );
    }
    Ok(spawned)
}

/// Create an NPC ship and its metadata. Difficulty defaults to a random
/// value in 1..=5 and is clamped to 1..=10.
pub async fn spawn_npc(
    ctx: &mut TickContext,
    system_id: SystemId,
    difficulty: Option<u32>,
) -> Result<(Spaceship, NpcShip)> {
    if ctx.store.get_system(system_id).await?.is_none() {
        return Err(SimError::not_found("StarSystem", system_id));
    }
    let difficulty = difficulty
        .unwrap_or_else(|| random_difficulty(&mut ctx.rng))
        .clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    let ship_type = ship_type_for_difficulty(difficulty);
    let hull = NpcHull::base(ship_type)
        .scaled(stat_multiplier(difficulty, ctx.config.npc_difficulty_multiplier));

    let ship = ctx
        .store
        .add_ship(Spaceship {
            id: 0,
            game_id: ctx.game_id,
            player_id: NPC_PLAYER_ID.to_string(),
            name: pirate_name(&mut ctx.rng),
            ship_type,
            state: ShipState::Idle,
            health: hull.max_health,
            max_health: hull.max_health,
            attack: hull.attack,
            defense: hull.defense,
            speed: hull.speed,
            cargo_capacity: 0,
            experience: 0,
            system_id,
            position: spawn_position(&mut ctx.rng),
            destination_system_id: None,
            destination: None,
            eta: None,
            shipyard_id: None,
            construction_progress: 100.0,
            construction_start_time: None,
            construction_seconds: 0.0,
            completed_at: Some(ctx.now),
        })
        .await?;

    let npc = ctx
        .store
        .add_npc(NpcShip {
            id: 0,
            game_id: ctx.game_id,
            spaceship_id: ship.id,
            behavior: choose_behavior(difficulty, &mut ctx.rng),
            difficulty,
            loot: LootTable::for_difficulty(difficulty),
            target: None,
            target_ship_id: None,
            last_behavior_at: None,
        })
        .await?;

    ctx.sink.on_ship_updated(&ship);
    log::debug!(
        "Spawned NPC {} '{}' ({:?}, difficulty {}, {:?}) in system {}",
        ship.id,
        ship.name,
        ship.ship_type,
        difficulty,
        npc.behavior,
        system_id
    );
    Ok((ship, npc))
}

/// Run one NPC's behavior if its throttle allows. Returns true if it acted.
async fn drive_npc(ctx: &mut TickContext, mut npc: NpcShip) -> Result<bool> {
    let Some(mut ship) = ctx.store.get_ship(npc.spaceship_id).await? else {
        return Ok(false);
    };
    if !ship.is_alive() || !matches!(ship.state, ShipState::Idle | ShipState::Fleeing) {
        return Ok(false);
    }
    if let Some(last) = npc.last_behavior_at {
        if seconds_between(last, ctx.now) < ctx.config.npc_behavior_interval_seconds {
            return Ok(false);
        }
    }
    if !ship.speed.is_finite() || ship.speed < 0.0 {
        return Err(SimError::Validation(format!(
            "Ship {} cannot move at speed {}",
            ship.id, ship.speed
        )));
    }
    npc.last_behavior_at = Some(ctx.now);
    // A fled pirate regroups on its next turn.
    ship.state = ShipState::Idle;

    let target = match npc.behavior {
        NpcBehavior::Patrol => Some(patrol_target(ctx, &mut npc, &ship)),
        NpcBehavior::Ambush => Some(ambush_target(ctx, &mut npc, &ship).await?),
        NpcBehavior::Aggressive => match nearest_enemy(ctx, &ship).await? {
            Some(enemy) => {
                npc.target_ship_id = Some(enemy.id);
                Some(enemy.position)
            }
            None => {
                npc.target_ship_id = None;
                Some(patrol_target(ctx, &mut npc, &ship))
            }
        },
        NpcBehavior::Passive => None,
    };

    if let Some(target) = target {
        let step = ship.speed * ctx.config.tick_interval_seconds as f64;
        let (position, _) = step_toward(ship.position, target, step);
        ship.position = position;
    }

    ctx.store.update_npc(&npc).await?;
    ctx.store.update_ship(&ship).await?;
    ctx.sink.on_ship_updated(&ship);
    Ok(true)
}

fn patrol_target(ctx: &mut TickContext, npc: &mut NpcShip, ship: &Spaceship) -> Point {
    match npc.target {
        Some(t) if ship.position.distance_to(t) > WAYPOINT_ARRIVAL_DISTANCE => t,
        _ => {
            let waypoint = patrol_waypoint(&mut ctx.rng);
            npc.target = Some(waypoint);
            waypoint
        }
    }
}

/// Hold near a wormhole mouth. The mouth lies on the line from this system
/// toward the linked one; with no wormholes the system centre is used.
async fn ambush_target(ctx: &mut TickContext, npc: &mut NpcShip, ship: &Spaceship) -> Result<Point> {
    if let Some(t) = npc.target {
        return Ok(t);
    }
    let wormholes = ctx.store.wormholes_for_system(ship.system_id).await?;
    let mut mouth = Point::ORIGIN;
    if let Some(far) = wormholes
        .choose(&mut ctx.rng)
        .and_then(|w| w.other_end(ship.system_id))
    {
        let here = ctx.store.get_system(ship.system_id).await?;
        let there = ctx.store.get_system(far).await?;
        if let (Some(here), Some(there)) = (here, there) {
            let direction = Point::new(
                there.position.x - here.position.x,
                there.position.y - here.position.y,
            );
            mouth = point_along(Point::ORIGIN, direction, WORMHOLE_MOUTH_RADIUS);
        }
    }
    let point = ambush_point(mouth, &mut ctx.rng);
    npc.target = Some(point);
    Ok(point)
}

async fn nearest_enemy(ctx: &TickContext, ship: &Spaceship) -> Result<Option<Spaceship>> {
    let candidates = ctx.store.list_ships_in_system(ship.system_id).await?;
    Ok(candidates
        .into_iter()
        .filter(|s| {
            !s.is_npc()
                && s.is_alive()
                && s.game_id == ship.game_id
                && s.state != ShipState::UnderConstruction
        })
        .min_by(|a, b| {
            ship.position
                .distance_to(a.position)
                .total_cmp(&ship.position.distance_to(b.position))
        }))
}
