//! Round-by-round battle resolution.
//!
//! A round runs in a fixed order:
//! 1. Increment the round counter.
//! 2. Every active combatant rolls to flee, with odds rising as health drops.
//! 3. If one or no combatant is still active, or the round cap is reached,
//!    the battle ends.
//! 4. Otherwise each active combatant attacks one random enemy.
//!
//! "Active" means neither fled nor destroyed. Combatants are enemies when
//! their player ids differ.

use crate::geometry::Point;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tunables for detection and resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatRules {
    pub detection_range: f64,
    pub max_rounds: u32,
    pub base_flee_chance: f64,
    pub damage_min: f64,
    pub damage_max: f64,
    pub defense_efficiency: f64,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            detection_range: 50.0,
            max_rounds: 20,
            base_flee_chance: 0.15,
            damage_min: 0.8,
            damage_max: 1.2,
            defense_efficiency: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    AllEnemiesDestroyed,
    Timeout,
    OneSideFled,
}

/// A ship's mutable state for the duration of a battle.
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub player_id: String,
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub defense: i32,
    pub damage_dealt: i32,
    pub damage_taken: i32,
    pub fled: bool,
    pub destroyed: bool,
}

impl Combatant {
    pub fn new(player_id: impl Into<String>, health: i32, max_health: i32, attack: i32, defense: i32) -> Self {
        Self {
            player_id: player_id.into(),
            health,
            max_health,
            attack,
            defense,
            damage_dealt: 0,
            damage_taken: 0,
            fled: false,
            destroyed: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.fled && !self.destroyed && self.health > 0
    }
}

/// Something that happened during a round, by combatant index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatAction {
    Fled {
        combatant: usize,
    },
    Attack {
        attacker: usize,
        target: usize,
        damage: i32,
        target_health: i32,
    },
    Destroyed {
        combatant: usize,
        by: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleOutcome {
    pub reason: EndReason,
    /// Index of the sole remaining combatant, if any.
    pub winner: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub round: u32,
    pub actions: Vec<CombatAction>,
    pub outcome: Option<BattleOutcome>,
}

pub fn in_detection_range(a: Point, b: Point, range: f64) -> bool {
    a.distance_to(b) <= range
}

/// Chance to flee this round: zero at full health, `base` at zero health.
pub fn flee_probability(health: i32, max_health: i32, base_chance: f64) -> f64 {
    if max_health <= 0 {
        return base_chance.clamp(0.0, 1.0);
    }
    let fraction = (health as f64 / max_health as f64).clamp(0.0, 1.0);
    (base_chance * (1.0 - fraction)).clamp(0.0, 1.0)
}

/// Damage for one hit with a given random multiplier. Never below 1.
pub fn compute_damage(attack: i32, defense: i32, multiplier: f64, rules: &CombatRules) -> i32 {
    let raw = attack as f64 * multiplier - defense as f64 * rules.defense_efficiency;
    raw.max(1.0) as i32
}

pub fn roll_damage(attack: i32, defense: i32, rules: &CombatRules, rng: &mut impl Rng) -> i32 {
    let multiplier = if rules.damage_max > rules.damage_min {
        rng.gen_range(rules.damage_min..=rules.damage_max)
    } else {
        rules.damage_min
    };
    compute_damage(attack, defense, multiplier, rules)
}

/// How a battle ends given the current combatant state.
pub fn outcome(combatants: &[Combatant], rounds_elapsed: u32, max_rounds: u32) -> BattleOutcome {
    let active: Vec<usize> = (0..combatants.len())
        .filter(|&i| combatants[i].is_active())
        .collect();
    if active.len() == 1 {
        BattleOutcome {
            reason: EndReason::AllEnemiesDestroyed,
            winner: Some(active[0]),
        }
    } else if rounds_elapsed >= max_rounds {
        BattleOutcome {
            reason: EndReason::Timeout,
            winner: None,
        }
    } else {
        BattleOutcome {
            reason: EndReason::OneSideFled,
            winner: None,
        }
    }
}

/// Resolve one round in place.
pub fn resolve_round(
    combatants: &mut [Combatant],
    rounds_elapsed: &mut u32,
    rules: &CombatRules,
    rng: &mut impl Rng,
) -> RoundResult {
    *rounds_elapsed += 1;
    let round = *rounds_elapsed;
    let mut actions = Vec::new();

    for (i, c) in combatants.iter_mut().enumerate() {
        if !c.is_active() {
            continue;
        }
        let p = flee_probability(c.health, c.max_health, rules.base_flee_chance);
        if p > 0.0 && rng.gen::<f64>() < p {
            c.fled = true;
            actions.push(CombatAction::Fled { combatant: i });
        }
    }

    let active: Vec<usize> = (0..combatants.len())
        .filter(|&i| combatants[i].is_active())
        .collect();
    if active.len() <= 1 || round >= rules.max_rounds {
        return RoundResult {
            round,
            actions,
            outcome: Some(outcome(combatants, round, rules.max_rounds)),
        };
    }

    for &attacker in &active {
        if !combatants[attacker].is_active() || combatants[attacker].attack <= 0 {
            continue;
        }
        let enemies: Vec<usize> = active
            .iter()
            .copied()
            .filter(|&j| {
                combatants[j].is_active() && combatants[j].player_id != combatants[attacker].player_id
            })
            .collect();
        if enemies.is_empty() {
            continue;
        }
        let target = enemies[rng.gen_range(0..enemies.len())];
        let damage = roll_damage(
            combatants[attacker].attack,
            combatants[target].defense,
            rules,
            rng,
        );

        let t = &mut combatants[target];
        t.health = (t.health - damage).max(0);
        t.damage_taken += damage;
        let target_health = t.health;
        combatants[attacker].damage_dealt += damage;
        actions.push(CombatAction::Attack {
            attacker,
            target,
            damage,
            target_health,
        });

        if target_health == 0 {
            combatants[target].destroyed = true;
            actions.push(CombatAction::Destroyed {
                combatant: target,
                by: attacker,
            });
        }
    }

    RoundResult {
        round,
        actions,
        outcome: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn no_flee() -> CombatRules {
        CombatRules {
            base_flee_chance: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_damage_floor() {
        let rules = CombatRules::default();
        assert_eq!(compute_damage(1, 10_000, 1.2, &rules), 1);
        assert_eq!(compute_damage(100, 0, 1.0, &rules), 100);
        assert_eq!(compute_damage(100, 40, 1.0, &rules), 80);
    }

    #[test]
    fn test_flee_probability() {
        assert_eq!(flee_probability(100, 100, 0.15), 0.0);
        assert!((flee_probability(0, 100, 0.15) - 0.15).abs() < 1e-12);
        assert!((flee_probability(50, 100, 0.2) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_detection_range_inclusive() {
        assert!(in_detection_range(Point::ORIGIN, Point::new(50.0, 0.0), 50.0));
        assert!(!in_detection_range(Point::ORIGIN, Point::new(50.1, 0.0), 50.0));
    }

    #[test]
    fn test_lone_combatant_wins_immediately() {
        let mut cs = vec![
            Combatant::new("a", 100, 100, 10, 0),
            Combatant::new("b", 0, 100, 10, 0),
        ];
        cs[1].destroyed = true;
        let mut rounds = 0;
        let r = resolve_round(&mut cs, &mut rounds, &no_flee(), &mut StdRng::seed_from_u64(1));
        assert_eq!(rounds, 1);
        let outcome = r.outcome.unwrap();
        assert_eq!(outcome.reason, EndReason::AllEnemiesDestroyed);
        assert_eq!(outcome.winner, Some(0));
    }

    #[test]
    fn test_kill_ends_next_round() {
        let mut cs = vec![
            Combatant::new("a", 100, 100, 500, 0),
            Combatant::new("b", 10, 10, 0, 0),
        ];
        let mut rounds = 0;
        let mut rng = StdRng::seed_from_u64(7);
        let first = resolve_round(&mut cs, &mut rounds, &no_flee(), &mut rng);
        assert!(first.outcome.is_none());
        assert!(first
            .actions
            .iter()
            .any(|a| matches!(a, CombatAction::Destroyed { combatant: 1, by: 0 })));
        assert_eq!(cs[1].health, 0);

        let second = resolve_round(&mut cs, &mut rounds, &no_flee(), &mut rng);
        assert_eq!(second.outcome.unwrap().winner, Some(0));
        assert_eq!(cs[0].damage_dealt, cs[1].damage_taken);
        assert!(cs[0].damage_dealt >= 400);
    }

    #[test]
    fn test_same_player_never_targeted() {
        let mut cs = vec![
            Combatant::new("a", 100, 100, 10, 0),
            Combatant::new("a", 100, 100, 10, 0),
            Combatant::new("b", 1000, 1000, 0, 0),
        ];
        let mut rounds = 0;
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5 {
            resolve_round(&mut cs, &mut rounds, &no_flee(), &mut rng);
        }
        assert_eq!(cs[0].damage_taken, 0);
        assert_eq!(cs[1].damage_taken, 0);
        assert!(cs[2].damage_taken > 0);
    }

    #[test]
    fn test_certain_flee_ends_as_one_side_fled() {
        // Base above 1.0 saturates the clamped probability at certainty.
        let rules = CombatRules {
            base_flee_chance: 2.0,
            ..Default::default()
        };
        let mut cs = vec![
            Combatant::new("a", 1, 100, 10, 0),
            Combatant::new("b", 1, 100, 10, 0),
        ];
        let mut rounds = 0;
        let r = resolve_round(&mut cs, &mut rounds, &rules, &mut StdRng::seed_from_u64(2));
        let outcome = r.outcome.unwrap();
        assert!(cs[0].fled && cs[1].fled);
        assert_eq!(outcome.reason, EndReason::OneSideFled);
        assert_eq!(outcome.winner, None);
    }
}
