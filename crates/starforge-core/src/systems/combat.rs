//! Combat stage - proximity detection and round-by-round battle resolution
//!
//! Detection runs first each tick, so a battle started this tick also
//! resolves its first round this tick.

use crate::context::TickContext;
use crate::error::Result;
use crate::model::*;
use starforge_logic::combat::{
    in_detection_range, resolve_round, BattleOutcome, CombatAction, Combatant, EndReason,
};
use starforge_logic::npc::LootTable;
use starforge_logic::resources::ResourceKind;
use starforge_logic::ships::ShipState;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CombatReport {
    pub battles_started: usize,
    pub rounds_resolved: usize,
    pub battles_ended: usize,
    pub ships_destroyed: usize,
}

pub async fn combat_system(ctx: &mut TickContext) -> Result<CombatReport> {
    let mut report = CombatReport {
        battles_started: detect_engagements(ctx).await?,
        ..Default::default()
    };
    resolve_battles(ctx, &mut report).await?;
    Ok(report)
}

/// Start a battle for every pair of hostile, free ships within detection
/// range of each other. A ship joins at most one battle.
pub async fn detect_engagements(ctx: &mut TickContext) -> Result<usize> {
    let range = ctx.config.combat_detection_range;

    let mut engaged: HashSet<ShipId> = ctx
        .store
        .list_battles(ctx.game_id, Some(BattleState::InProgress))
        .await?
        .iter()
        .flat_map(|b| b.participants.iter().map(|p| p.spaceship_id))
        .collect();

    let mut by_system: BTreeMap<SystemId, Vec<Spaceship>> = BTreeMap::new();
    for ship in ctx.store.list_ships(ctx.game_id).await? {
        if ship.state.can_engage() && ship.health > 0 && !engaged.contains(&ship.id) {
            by_system.entry(ship.system_id).or_default().push(ship);
        }
    }

    let mut started = 0;
    for (system_id, ships) in by_system {
        for i in 0..ships.len() {
            for j in (i + 1)..ships.len() {
                let (a, b) = (&ships[i], &ships[j]);
                if a.player_id == b.player_id
                    || engaged.contains(&a.id)
                    || engaged.contains(&b.id)
                    || !in_detection_range(a.position, b.position, range)
                {
                    continue;
                }
                engaged.insert(a.id);
                engaged.insert(b.id);
                start_battle(ctx, system_id, a.clone(), b.clone()).await?;
                started += 1;
            }
        }
    }
    Ok(started)
}

fn snapshot(ship: &Spaceship) -> BattleParticipant {
    BattleParticipant {
        spaceship_id: ship.id,
        player_id: ship.player_id.clone(),
        is_npc: ship.is_npc(),
        initial_health: ship.health,
        final_health: ship.health,
        max_health: ship.max_health,
        attack: ship.attack,
        defense: ship.defense,
        damage_dealt: 0,
        damage_taken: 0,
        survived: true,
        fled: false,
        experience_gained: 0,
        loot: Loot::default(),
    }
}

async fn start_battle(
    ctx: &mut TickContext,
    system_id: SystemId,
    mut a: Spaceship,
    mut b: Spaceship,
) -> Result<Battle> {
    let battle = ctx
        .store
        .add_battle(Battle {
            id: 0,
            game_id: ctx.game_id,
            system_id,
            position: a.position.midpoint(b.position),
            state: BattleState::InProgress,
            rounds_elapsed: 0,
            started_at: ctx.now,
            ended_at: None,
            winner_player_id: None,
            end_reason: None,
            participants: vec![snapshot(&a), snapshot(&b)],
            events: vec![BattleEvent {
                round: 0,
                event_type: BattleEventType::BattleStarted,
                attacker_ship_id: Some(a.id),
                target_ship_id: Some(b.id),
                damage: None,
                description: format!("Battle started between {} and {}", a.name, b.name),
                at: ctx.now,
            }],
        })
        .await?;

    for ship in [&mut a, &mut b] {
        ship.state = ShipState::InCombat;
        ship.clear_movement();
        ctx.store.update_ship(ship).await?;
        ctx.sink.on_ship_updated(ship);
    }
    ctx.sink.on_battle_updated(&battle);
    log::info!(
        "Battle {} started in system {}: {} ({}) vs {} ({})",
        battle.id,
        system_id,
        a.name,
        a.player_id,
        b.name,
        b.player_id
    );
    Ok(battle)
}

/// Resolve one round of every in-progress battle. A failure in one battle is
/// logged and does not stop the others.
pub async fn resolve_battles(ctx: &mut TickContext, report: &mut CombatReport) -> Result<()> {
    let battles = ctx
        .store
        .list_battles(ctx.game_id, Some(BattleState::InProgress))
        .await?;
    for battle in battles {
        let id = battle.id;
        match resolve_battle(ctx, battle).await {
            Ok(round) => {
                report.rounds_resolved += 1;
                report.ships_destroyed += round.destroyed;
                if round.ended {
                    report.battles_ended += 1;
                }
            }
            Err(e) => log::error!("Battle {} failed to resolve: {}", id, e),
        }
    }
    Ok(())
}

struct RoundSummary {
    destroyed: usize,
    ended: bool,
}

fn to_combatant(p: &BattleParticipant) -> Combatant {
    Combatant {
        player_id: p.player_id.clone(),
        health: p.final_health,
        max_health: p.max_health,
        attack: p.attack,
        defense: p.defense,
        damage_dealt: p.damage_dealt,
        damage_taken: p.damage_taken,
        fled: p.fled,
        destroyed: !p.survived,
    }
}

async fn resolve_battle(ctx: &mut TickContext, mut battle: Battle) -> Result<RoundSummary> {
    let rules = ctx.config.combat_rules();
    let mut combatants: Vec<Combatant> = battle.participants.iter().map(to_combatant).collect();
    let result = resolve_round(&mut combatants, &mut battle.rounds_elapsed, &rules, &mut ctx.rng);

    for (p, c) in battle.participants.iter_mut().zip(&combatants) {
        p.final_health = c.health;
        p.damage_dealt = c.damage_dealt;
        p.damage_taken = c.damage_taken;
        p.fled = c.fled;
        p.survived = !c.destroyed;
    }

    let mut destroyed = 0;
    for action in &result.actions {
        let event = match *action {
            CombatAction::Fled { combatant } => {
                let p = &battle.participants[combatant];
                BattleEvent {
                    round: result.round,
                    event_type: BattleEventType::ShipFled,
                    attacker_ship_id: None,
                    target_ship_id: Some(p.spaceship_id),
                    damage: None,
                    description: format!("Ship {} fled the battle", p.spaceship_id),
                    at: ctx.now,
                }
            }
            CombatAction::Attack {
                attacker,
                target,
                damage,
                target_health,
            } => {
                let (a, t) = (&battle.participants[attacker], &battle.participants[target]);
                BattleEvent {
                    round: result.round,
                    event_type: BattleEventType::Attack,
                    attacker_ship_id: Some(a.spaceship_id),
                    target_ship_id: Some(t.spaceship_id),
                    damage: Some(damage),
                    description: format!(
                        "Ship {} hit ship {} for {} damage ({} hp left)",
                        a.spaceship_id, t.spaceship_id, damage, target_health
                    ),
                    at: ctx.now,
                }
            }
            CombatAction::Destroyed { combatant, by } => {
                destroyed += 1;
                let (t, a) = (&battle.participants[combatant], &battle.participants[by]);
                BattleEvent {
                    round: result.round,
                    event_type: BattleEventType::ShipDestroyed,
                    attacker_ship_id: Some(a.spaceship_id),
                    target_ship_id: Some(t.spaceship_id),
                    damage: None,
                    description: format!("Ship {} was destroyed by ship {}", t.spaceship_id, a.spaceship_id),
                    at: ctx.now,
                }
            }
        };
        battle.events.push(event);
    }

    if let Some(outcome) = result.outcome {
        settle_battle(ctx, &mut battle, outcome).await?;
    }

    sync_ships(ctx, &battle).await?;
    ctx.store.update_battle(&battle).await?;
    ctx.sink.on_battle_updated(&battle);

    // Paid only once the ended battle is stored, so a retry cannot pay twice.
    let ended = battle.state.is_terminal();
    if ended {
        pay_loot(ctx, &battle).await?;
    }

    Ok(RoundSummary { destroyed, ended })
}

/// Settle the end of a battle: reason, winner, experience and loot rolls.
/// Nothing is written here.
async fn settle_battle(ctx: &mut TickContext, battle: &mut Battle, outcome: BattleOutcome) -> Result<()> {
    battle.state = match outcome.reason {
        EndReason::OneSideFled => BattleState::Fled,
        EndReason::AllEnemiesDestroyed | EndReason::Timeout => BattleState::Completed,
    };
    battle.end_reason = Some(outcome.reason);
    battle.ended_at = Some(ctx.now);
    battle.winner_player_id = outcome
        .winner
        .map(|i| battle.participants[i].player_id.clone());

    let mut loot_tables: HashMap<ShipId, LootTable> = HashMap::new();
    for p in battle.participants.iter().filter(|p| !p.survived && p.is_npc) {
        if let Some(npc) = ctx.store.npc_for_ship(p.spaceship_id).await? {
            loot_tables.insert(p.spaceship_id, npc.loot);
        }
    }

    let snapshot = battle.participants.clone();
    for survivor in battle
        .participants
        .iter_mut()
        .filter(|p| p.survived && !p.fled)
    {
        survivor.experience_gained = survivor.damage_dealt;
        for enemy in snapshot
            .iter()
            .filter(|e| !e.survived && e.player_id != survivor.player_id)
        {
            if let Some(table) = loot_tables.get(&enemy.spaceship_id) {
                let (iron, copper, fuel) = table.roll(&mut ctx.rng);
                survivor.loot.iron += iron;
                survivor.loot.copper += copper;
                survivor.loot.fuel += fuel;
            }
        }
    }

    let winner = battle.winner_player_id.as_deref().unwrap_or("Draw");
    battle.events.push(BattleEvent {
        round: battle.rounds_elapsed,
        event_type: BattleEventType::BattleEnded,
        attacker_ship_id: None,
        target_ship_id: None,
        damage: None,
        description: format!("Battle ended ({:?}). Winner: {}", outcome.reason, winner),
        at: ctx.now,
    });
    log::info!(
        "Battle {} ended after {} rounds ({:?}). Winner: {}",
        battle.id,
        battle.rounds_elapsed,
        outcome.reason,
        winner
    );
    Ok(())
}

/// Credit each surviving player ship's loot to its owner's station in the
/// battle system.
async fn pay_loot(ctx: &mut TickContext, battle: &Battle) -> Result<()> {
    for survivor in battle.participants.iter().filter(|p| p.survived && !p.fled && !p.is_npc) {
        let loot = survivor.loot;
        if loot == Loot::default() {
            continue;
        }
        if let Some(mut station) = ctx
            .store
            .find_station(&survivor.player_id, battle.system_id)
            .await?
        {
            station.resources.add(ResourceKind::Iron, loot.iron as f64);
            station.resources.add(ResourceKind::Copper, loot.copper as f64);
            station.resources.add(ResourceKind::Fuel, loot.fuel as f64);
            ctx.store.update_station(&station).await?;
        } else {
            log::debug!(
                "Ship {} has no station in system {}; loot dropped",
                survivor.spaceship_id,
                battle.system_id
            );
        }
    }
    Ok(())
}

/// Mirror participant state onto the ships themselves.
async fn sync_ships(ctx: &mut TickContext, battle: &Battle) -> Result<()> {
    let ended = battle.state.is_terminal();
    for p in &battle.participants {
        let Some(mut ship) = ctx.store.get_ship(p.spaceship_id).await? else {
            log::warn!("Battle {} references missing ship {}", battle.id, p.spaceship_id);
            continue;
        };
        let before = (ship.state, ship.health, ship.experience);

        ship.health = p.final_health.clamp(0, ship.max_health.max(0));
        if !p.survived {
            ship.state = ShipState::Destroyed;
            ship.health = 0;
        } else if p.fled {
            ship.state = ShipState::Fleeing;
        } else if ended {
            ship.state = ShipState::Idle;
            ship.experience += p.experience_gained;
        }

        if (ship.state, ship.health, ship.experience) == before {
            continue;
        }
        ctx.store.update_ship(&ship).await?;
        if ship.state == ShipState::Destroyed && before.0 != ShipState::Destroyed {
            ctx.sink.on_ship_destroyed(ship.id);
        } else {
            ctx.sink.on_ship_updated(&ship);
        }
    }
    Ok(())
}
