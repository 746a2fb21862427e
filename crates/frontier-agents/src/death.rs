//! Death, kill credit and respawning.
//!
//! When an actor dies:
//! 1. Health drops to zero and status becomes `dead`.
//! 2. Jobs (gather, climb) are released and every combat pair involving the
//!    actor is deactivated.
//! 3. Gold goes to the killer if the killer is an actor.
//! 4. Monster-role actors die permanently: no respawn tick, removed from the
//!    spatial index. Other roles get a respawn tick.
//!
//! NPC monsters are removed from the world on death; their `gold_drop` goes
//! to the killing actor.

use tracing::{debug, info};

use frontier_types::{ActorId, ActorStatus, CombatantRef, GameEvent, MonsterId};
use frontier_world::WorldState;

use crate::config::RulesConfig;
use crate::error::AgentError;
use crate::evolution;
use crate::inventory;

/// Deactivate every pair in which `who` is attacker or target.
pub fn end_pairs_involving(world: &mut WorldState, who: CombatantRef) {
    let mut freed = Vec::new();
    for (attacker, pair) in &mut world.combat_pairs {
        if pair.active && (*attacker == who || pair.target == who) {
            pair.active = false;
            if let CombatantRef::Actor(id) = *attacker {
                freed.push(id);
            }
        }
    }
    for id in freed {
        if let Some(actor) = world.actors.get_mut(&id)
            && actor.status == ActorStatus::Fighting
        {
            actor.status = ActorStatus::Idle;
        }
    }
}

/// Credit a kill to an actor and re-evaluate its evolution stage.
pub fn credit_kill(
    world: &mut WorldState,
    killer: ActorId,
    gold: u32,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let Some(actor) = world.actors.get_mut(&killer) else {
        return Ok(());
    };
    actor.kills = actor
        .kills
        .checked_add(1)
        .ok_or_else(|| AgentError::overflow("kill counter overflow"))?;
    inventory::add_gold(actor, gold)?;
    if let Some(stage) = evolution::evaluate(actor, &rules.evolution)? {
        info!(actor = %killer, stage, "actor evolved");
        world.emit(GameEvent::Evolved {
            actor: killer,
            stage,
        });
    }
    Ok(())
}

/// Kill an actor.
///
/// Idempotent for an actor that is already dead.
pub fn kill_actor(
    world: &mut WorldState,
    victim: ActorId,
    killer: Option<CombatantRef>,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let tick = world.tick();
    let respawn_at = tick
        .checked_add(rules.respawn_delay_ticks)
        .ok_or_else(|| AgentError::overflow("respawn tick overflow"))?;

    let Some(actor) = world.actors.get_mut(&victim) else {
        return Err(AgentError::ActorNotFound(victim));
    };
    if !actor.is_alive() {
        return Ok(());
    }
    actor.stats.health = 0;
    actor.status = ActorStatus::Dead;
    actor.destination = None;
    let permanent = actor.role.is_monster();
    actor.respawn_tick = if permanent { None } else { Some(respawn_at) };
    let loot = match killer {
        Some(CombatantRef::Actor(_)) => inventory::take_all_gold(actor),
        _ => 0,
    };

    world.release_jobs(victim);
    end_pairs_involving(world, CombatantRef::Actor(victim));
    if permanent {
        world.unindex_actor(victim);
    }

    info!(actor = %victim, ?killer, permanent, "actor died");
    world.emit(GameEvent::Death {
        victim: CombatantRef::Actor(victim),
        killer,
        gold: loot,
        permanent,
    });

    if let Some(CombatantRef::Actor(k)) = killer {
        credit_kill(world, k, loot, rules)?;
    }
    Ok(())
}

/// Kill an NPC monster and remove it from the world.
pub fn kill_monster(
    world: &mut WorldState,
    victim: MonsterId,
    killer: Option<CombatantRef>,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    end_pairs_involving(world, CombatantRef::Monster(victim));
    let Some(monster) = world.remove_monster(victim) else {
        return Ok(());
    };
    let gold = match killer {
        Some(CombatantRef::Actor(_)) => monster.gold_drop,
        _ => 0,
    };
    debug!(monster = %victim, kind = %monster.kind, ?killer, "npc killed");
    world.emit(GameEvent::Death {
        victim: CombatantRef::Monster(victim),
        killer,
        gold,
        permanent: true,
    });
    if let Some(CombatantRef::Actor(k)) = killer {
        credit_kill(world, k, gold, rules)?;
    }
    Ok(())
}

/// Respawn every dead non-monster actor whose respawn tick has arrived.
///
/// Respawned actors return at full health to the spawn point with cooldown,
/// destination and jobs cleared.
pub fn process_respawns(world: &mut WorldState) {
    let tick = world.tick();
    let spawn = world.settings().spawn_point;
    let due: Vec<ActorId> = world
        .actors
        .values()
        .filter(|a| {
            a.status == ActorStatus::Dead
                && !a.role.is_monster()
                && a.respawn_tick.is_some_and(|t| t <= tick)
        })
        .map(|a| a.id)
        .collect();

    for id in due {
        world.release_jobs(id);
        if let Some(actor) = world.actors.get_mut(&id) {
            actor.stats.health = actor.stats.max_health;
            actor.status = ActorStatus::Idle;
            actor.destination = None;
            actor.cooldown_until = 0;
            actor.respawn_tick = None;
            actor.eaten = false;
        }
        world.move_actor(id, spawn);
        debug!(actor = %id, "actor respawned");
        world.emit(GameEvent::Respawned { actor: id });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_types::{CombatPair, EntityRef, Monster, MonsterBehavior, Position, Role, Stats};

    use super::*;
    use crate::test_support::{make_world, put_actor};

    #[test]
    fn monster_role_death_is_permanent() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let id = put_actor(&mut world, Role::Monster, 100.0, 100.0);
        kill_actor(&mut world, id, None, &rules).unwrap();
        let actor = world.actors.get(&id).unwrap();
        assert_eq!(actor.status, ActorStatus::Dead);
        assert_eq!(actor.respawn_tick, None);
        assert!(!world.spatial().contains(EntityRef::Actor(id)));

        for _ in 0..50 {
            world.begin_tick().unwrap();
            process_respawns(&mut world);
        }
        assert_eq!(world.actors.get(&id).unwrap().status, ActorStatus::Dead);
    }

    #[test]
    fn other_roles_respawn_after_delay() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let id = put_actor(&mut world, Role::Woodcutter, 100.0, 100.0);
        kill_actor(&mut world, id, None, &rules).unwrap();
        assert_eq!(world.actors.get(&id).unwrap().respawn_tick, Some(11));
        assert!(world.spatial().contains(EntityRef::Actor(id)));

        for _ in 0..9 {
            world.begin_tick().unwrap();
            process_respawns(&mut world);
        }
        assert_eq!(world.actors.get(&id).unwrap().status, ActorStatus::Dead);
        world.begin_tick().unwrap();
        process_respawns(&mut world);
        let actor = world.actors.get(&id).unwrap();
        assert_eq!(actor.status, ActorStatus::Idle);
        assert_eq!(actor.stats.health, actor.stats.max_health);
        assert_eq!(actor.position, world.settings().spawn_point);
    }

    #[test]
    fn killer_takes_gold_and_counts_kill() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let killer = put_actor(&mut world, Role::Monster, 100.0, 100.0);
        let victim = put_actor(&mut world, Role::Miner, 110.0, 100.0);
        world.actors.get_mut(&victim).unwrap().gold = 40;
        kill_actor(&mut world, victim, Some(CombatantRef::Actor(killer)), &rules).unwrap();
        assert_eq!(world.actors.get(&killer).unwrap().gold, 40);
        assert_eq!(world.actors.get(&killer).unwrap().kills, 1);
        assert_eq!(world.actors.get(&victim).unwrap().gold, 0);
    }

    #[test]
    fn death_ends_pairs_both_ways() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let a = put_actor(&mut world, Role::Monster, 100.0, 100.0);
        let b = put_actor(&mut world, Role::Miner, 110.0, 100.0);
        for (x, y) in [(a, b), (b, a)] {
            world.combat_pairs.insert(
                CombatantRef::Actor(x),
                CombatPair {
                    attacker: CombatantRef::Actor(x),
                    target: CombatantRef::Actor(y),
                    started_tick: 1,
                    active: true,
                },
            );
            world.actors.get_mut(&x).unwrap().status = ActorStatus::Fighting;
        }
        kill_actor(&mut world, b, Some(CombatantRef::Actor(a)), &rules).unwrap();
        assert!(world.combat_pairs.values().all(|p| !p.active));
        assert_eq!(world.actors.get(&a).unwrap().status, ActorStatus::Idle);
    }

    #[test]
    fn killing_npc_removes_it_and_pays_drop() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let hunter = put_actor(&mut world, Role::Miner, 100.0, 100.0);
        let mid = MonsterId::new();
        world
            .add_monster(Monster {
                id: mid,
                kind: String::from("wolf"),
                position: Position::new(105.0, 100.0),
                stats: Stats::new(60, 8, 1),
                behavior: MonsterBehavior::Patrol,
                patrol_origin: Position::new(105.0, 100.0),
                patrol_radius: 50.0,
                waypoint: None,
                target: None,
                gold_drop: 6,
            })
            .unwrap();
        kill_monster(&mut world, mid, Some(CombatantRef::Actor(hunter)), &rules).unwrap();
        assert!(world.monsters.is_empty());
        assert_eq!(world.actors.get(&hunter).unwrap().gold, 6);
    }
}
