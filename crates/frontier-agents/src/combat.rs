//! Combat pairs and per-tick damage resolution.
//!
//! Each attacker holds at most one pair (the map is keyed by attacker). Once
//! per tick every active pair is resolved in attacker order:
//!
//! 1. If either side is missing or dead, or the sides are further apart than
//!    the attack range, the pair is deactivated without damage.
//! 2. Otherwise damage `max(1, attack - defense)` is applied, equipment
//!    bonuses included.
//! 3. A target at zero health dies (actors, NPCs) or is knocked out
//!    (behemoths).

use tracing::debug;

use frontier_types::{ActorId, ActorStatus, BehemothStatus, CombatPair, CombatantRef, GameEvent};
use frontier_world::WorldState;

use crate::behemoth;
use crate::config::RulesConfig;
use crate::death;
use crate::error::AgentError;

/// Damage dealt per tick for the given attack and defense values.
pub const fn damage(attack: u32, defense: u32) -> u32 {
    let raw = attack.saturating_sub(defense);
    if raw == 0 { 1 } else { raw }
}

/// Open (or replace) the attacker's combat pair.
pub fn start_attack(world: &mut WorldState, attacker: CombatantRef, target: CombatantRef) {
    let tick = world.tick();
    world.combat_pairs.insert(
        attacker,
        CombatPair {
            attacker,
            target,
            started_tick: tick,
            active: true,
        },
    );
    if let CombatantRef::Actor(id) = attacker
        && let Some(actor) = world.actors.get_mut(&id)
    {
        actor.status = ActorStatus::Fighting;
        actor.destination = None;
    }
}

/// Deactivate an attacker's own pair. Returns whether one was active.
pub fn end_attack(world: &mut WorldState, attacker: CombatantRef) -> bool {
    let Some(pair) = world.combat_pairs.get_mut(&attacker) else {
        return false;
    };
    let was_active = pair.active;
    pair.active = false;
    if let CombatantRef::Actor(id) = attacker {
        idle_if_fighting(world, id);
    }
    was_active
}

fn idle_if_fighting(world: &mut WorldState, id: ActorId) {
    if let Some(actor) = world.actors.get_mut(&id)
        && actor.status == ActorStatus::Fighting
    {
        actor.status = ActorStatus::Idle;
    }
}

/// Attack value of a living combatant.
fn attack_of(world: &WorldState, who: CombatantRef) -> Option<u32> {
    match who {
        CombatantRef::Actor(id) => world
            .actors
            .get(&id)
            .filter(|a| a.is_alive())
            .map(frontier_types::Actor::effective_attack),
        CombatantRef::Monster(id) => world
            .monsters
            .get(&id)
            .filter(|m| m.stats.is_alive())
            .map(|m| m.stats.attack),
        CombatantRef::Behemoth(_) => None,
    }
}

/// Defense value of a combatant that can currently take damage.
fn defense_of(world: &WorldState, who: CombatantRef, rules: &RulesConfig) -> Option<u32> {
    match who {
        CombatantRef::Actor(id) => world
            .actors
            .get(&id)
            .filter(|a| a.is_alive())
            .map(frontier_types::Actor::effective_defense),
        CombatantRef::Monster(id) => world
            .monsters
            .get(&id)
            .filter(|m| m.stats.is_alive())
            .map(|m| m.stats.defense),
        CombatantRef::Behemoth(id) => world
            .behemoths
            .get(&id)
            .filter(|b| b.status == BehemothStatus::Roaming)
            .map(|_| rules.behemoth.defense),
    }
}

/// Subtract `amount` from a target's health and return what remains.
fn apply_damage(world: &mut WorldState, who: CombatantRef, amount: u32) -> Option<u32> {
    let health = match who {
        CombatantRef::Actor(id) => &mut world.actors.get_mut(&id)?.stats.health,
        CombatantRef::Monster(id) => &mut world.monsters.get_mut(&id)?.stats.health,
        CombatantRef::Behemoth(id) => &mut world.behemoths.get_mut(&id)?.health,
    };
    *health = health.saturating_sub(amount);
    Some(*health)
}

/// Resolve every active combat pair for this tick.
pub fn resolve_combat(world: &mut WorldState, rules: &RulesConfig) -> Result<(), AgentError> {
    let attackers: Vec<CombatantRef> = world
        .combat_pairs
        .iter()
        .filter(|(_, p)| p.active)
        .map(|(k, _)| *k)
        .collect();

    for key in attackers {
        // an earlier death this tick may have ended the pair
        let Some(pair) = world.combat_pairs.get(&key).copied().filter(|p| p.active) else {
            continue;
        };
        let attack = attack_of(world, pair.attacker);
        let defense = defense_of(world, pair.target, rules);
        let in_range = match (
            world.combatant_position(pair.attacker),
            world.combatant_position(pair.target),
        ) {
            (Some(a), Some(t)) => a.distance_to(t) <= rules.ranges.attack,
            _ => false,
        };
        let (Some(attack), Some(defense), true) = (attack, defense, in_range) else {
            debug!(attacker = ?pair.attacker, target = ?pair.target, "combat pair ended");
            end_attack(world, key);
            continue;
        };

        let amount = damage(attack, defense);
        let Some(remaining) = apply_damage(world, pair.target, amount) else {
            end_attack(world, key);
            continue;
        };
        world.emit(GameEvent::Damage {
            attacker: pair.attacker,
            target: pair.target,
            amount,
            remaining_health: remaining,
        });
        if remaining > 0 {
            continue;
        }
        match pair.target {
            CombatantRef::Actor(id) => death::kill_actor(world, id, Some(pair.attacker), rules)?,
            CombatantRef::Monster(id) => {
                death::kill_monster(world, id, Some(pair.attacker), rules)?;
            }
            CombatantRef::Behemoth(id) => behemoth::knock_out(world, id, rules)?,
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_types::{Item, Role};

    use super::*;
    use crate::test_support::{make_world, put_actor, put_behemoth};

    fn tick(world: &mut WorldState, rules: &RulesConfig) {
        world.begin_tick().unwrap();
        resolve_combat(world, rules).unwrap();
    }

    #[test]
    fn damage_is_at_least_one() {
        assert_eq!(damage(12, 2), 10);
        assert_eq!(damage(3, 9), 1);
        assert_eq!(damage(5, 5), 1);
    }

    #[test]
    fn new_attack_replaces_old_pair() {
        let mut world = make_world();
        let me = put_actor(&mut world, Role::Monster, 100.0, 100.0);
        let a = put_actor(&mut world, Role::Miner, 110.0, 100.0);
        let b = put_actor(&mut world, Role::Miner, 90.0, 100.0);
        start_attack(&mut world, CombatantRef::Actor(me), CombatantRef::Actor(a));
        start_attack(&mut world, CombatantRef::Actor(me), CombatantRef::Actor(b));
        let active: Vec<_> = world.combat_pairs.values().filter(|p| p.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().unwrap().target, CombatantRef::Actor(b));
    }

    #[test]
    fn equipment_counts_toward_damage() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let atk = put_actor(&mut world, Role::Miner, 100.0, 100.0);
        let def = put_actor(&mut world, Role::Miner, 110.0, 100.0);
        world.actors.get_mut(&atk).unwrap().equipment.weapon = Some(Item::Sword);
        world.actors.get_mut(&def).unwrap().equipment.armor = Some(Item::Armor);
        start_attack(&mut world, CombatantRef::Actor(atk), CombatantRef::Actor(def));
        tick(&mut world, &rules);
        // (8 + 8) - (3 + 5)
        assert_eq!(world.actors[&def].stats.health, 102);
    }

    #[test]
    fn out_of_range_pair_ends_without_damage() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let atk = put_actor(&mut world, Role::Monster, 100.0, 100.0);
        let def = put_actor(&mut world, Role::Miner, 130.0, 100.0);
        start_attack(&mut world, CombatantRef::Actor(atk), CombatantRef::Actor(def));
        tick(&mut world, &rules);
        assert_eq!(world.actors[&def].stats.health, 110);
        assert!(!world.combat_pairs[&CombatantRef::Actor(atk)].active);
        assert_eq!(world.actors[&atk].status, ActorStatus::Idle);
    }

    #[test]
    fn fight_to_the_death() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let atk = put_actor(&mut world, Role::Monster, 100.0, 100.0);
        let def = put_actor(&mut world, Role::Woodcutter, 110.0, 100.0);
        world.actors.get_mut(&def).unwrap().gold = 9;
        start_attack(&mut world, CombatantRef::Actor(atk), CombatantRef::Actor(def));
        // 12 - 2 = 10 per tick against 100 health
        for _ in 0..10 {
            tick(&mut world, &rules);
        }
        let victim = &world.actors[&def];
        assert_eq!(victim.status, ActorStatus::Dead);
        assert_eq!(world.actors[&atk].gold, 9);
        assert_eq!(world.actors[&atk].kills, 1);
        assert_eq!(world.actors[&atk].status, ActorStatus::Idle);
    }

    #[test]
    fn behemoth_is_knocked_out_not_killed() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let b = put_behemoth(&mut world, 100.0, 100.0);
        world.behemoths.get_mut(&b).unwrap().health = 3;
        world.behemoths.get_mut(&b).unwrap().patrol_route.clear();
        let atk = put_actor(&mut world, Role::Miner, 110.0, 100.0);
        start_attack(&mut world, CombatantRef::Actor(atk), CombatantRef::Behemoth(b));
        tick(&mut world, &rules);
        let beh = &world.behemoths[&b];
        assert_eq!(beh.status, BehemothStatus::Unconscious);
        assert_eq!(beh.health, 0);
        assert!(!world.combat_pairs[&CombatantRef::Actor(atk)].active);
    }
}
