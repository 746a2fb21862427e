//! Behemoth lifecycle: knockout, feeding, climbing and patrol.
//!
//! A behemoth cycles `roaming -> unconscious -> waking -> roaming`. It can
//! only be damaged while roaming; at zero health it is knocked out rather
//! than killed. While it lies unconscious, climbers extract ore on a fixed
//! interval. When it wakes every climber is thrown off and hurt.

use tracing::{debug, info};

use frontier_types::{
    ActorId, ActorStatus, BehemothId, BehemothStatus, ClimbJob, CombatantRef, EntityRef,
    GameEvent, Item,
};
use frontier_world::WorldState;

use crate::config::RulesConfig;
use crate::death;
use crate::error::AgentError;
use crate::inventory;

/// Knock a behemoth unconscious and end every pair targeting it.
pub fn knock_out(
    world: &mut WorldState,
    id: BehemothId,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let until = world
        .tick()
        .checked_add(rules.behemoth.unconscious_ticks)
        .ok_or_else(|| AgentError::overflow("behemoth status tick overflow"))?;
    let behemoth = world
        .behemoths
        .get_mut(&id)
        .ok_or(AgentError::BehemothNotFound(id))?;
    behemoth.health = 0;
    behemoth.status = BehemothStatus::Unconscious;
    behemoth.status_until = Some(until);
    death::end_pairs_involving(world, CombatantRef::Behemoth(id));
    info!(behemoth = %id, until, "behemoth knocked out");
    world.emit(GameEvent::BehemothKnockedOut { behemoth: id });
    Ok(())
}

/// Feed `amount` logs from `actor` to a behemoth.
///
/// Every full `feed_threshold` of logs is digested into ore, capped at the
/// behemoth's `max_ore`; the remainder carries over.
pub fn feed(
    world: &mut WorldState,
    actor: ActorId,
    id: BehemothId,
    amount: u32,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let behemoth = world
        .behemoths
        .get(&id)
        .ok_or(AgentError::BehemothNotFound(id))?;
    if behemoth.status == BehemothStatus::Waking {
        return Err(AgentError::TargetVanished(format!("behemoth {id} is waking")));
    }
    let fed = behemoth
        .fed
        .checked_add(amount)
        .ok_or_else(|| AgentError::overflow("behemoth fed overflow"))?;
    let feeder = world
        .actors
        .get_mut(&actor)
        .ok_or(AgentError::ActorNotFound(actor))?;
    inventory::remove_item(&mut feeder.inventory, Item::Log, amount)?;

    let Some(behemoth) = world.behemoths.get_mut(&id) else {
        return Err(AgentError::BehemothNotFound(id));
    };
    let threshold = rules.behemoth.feed_threshold;
    let digestions = fed.checked_div(threshold).unwrap_or(0);
    behemoth.fed = fed.checked_rem(threshold).unwrap_or(fed);
    let digested = if digestions > 0 {
        let gained = rules.behemoth.digest_ore.saturating_mul(digestions);
        behemoth.ore = behemoth.ore.saturating_add(gained).min(behemoth.max_ore);
        Some(behemoth.ore)
    } else {
        None
    };

    world.emit(GameEvent::BehemothFed {
        actor,
        behemoth: id,
        amount,
    });
    if let Some(ore) = digested {
        debug!(behemoth = %id, ore, "behemoth digested");
        world.emit(GameEvent::BehemothDigested { behemoth: id, ore });
    }
    Ok(())
}

/// Start climbing an unconscious behemoth.
pub fn start_climb(
    world: &mut WorldState,
    actor: ActorId,
    id: BehemothId,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let behemoth = world
        .behemoths
        .get(&id)
        .ok_or(AgentError::BehemothNotFound(id))?;
    if behemoth.status != BehemothStatus::Unconscious {
        return Err(AgentError::TargetVanished(format!(
            "behemoth {id} is no longer unconscious"
        )));
    }
    world.release_jobs(actor);
    let climber = world
        .actors
        .get_mut(&actor)
        .ok_or(AgentError::ActorNotFound(actor))?;
    climber.status = ActorStatus::Climbing;
    climber.destination = None;
    world.climb_jobs.insert(
        actor,
        ClimbJob {
            actor,
            behemoth: id,
            countdown: rules.behemoth.extract_interval_ticks,
        },
    );
    Ok(())
}

/// Release a climber and put it back to idle.
fn drop_climber(world: &mut WorldState, actor: ActorId) {
    world.release_climb(actor);
    if let Some(a) = world.actors.get_mut(&actor)
        && a.status == ActorStatus::Climbing
    {
        a.status = ActorStatus::Idle;
    }
}

/// Advance every climb job by one tick.
fn process_climbers(world: &mut WorldState, rules: &RulesConfig) -> Result<(), AgentError> {
    let climbers: Vec<ActorId> = world.climb_jobs.keys().copied().collect();
    for actor in climbers {
        let Some(job) = world.climb_jobs.get(&actor).copied() else {
            continue;
        };
        let climber_pos = world
            .actors
            .get(&actor)
            .filter(|a| a.is_alive())
            .map(|a| a.position);
        let mount = world
            .behemoths
            .get(&job.behemoth)
            .filter(|b| b.status == BehemothStatus::Unconscious && b.ore > 0)
            .map(|b| b.position);
        let (Some(cp), Some(bp)) = (climber_pos, mount) else {
            drop_climber(world, actor);
            continue;
        };
        if cp.distance_to(bp) > rules.ranges.behemoth {
            drop_climber(world, actor);
            continue;
        }

        let countdown = job.countdown.saturating_sub(1);
        if countdown > 0 {
            if let Some(j) = world.climb_jobs.get_mut(&actor) {
                j.countdown = countdown;
            }
            continue;
        }

        let Some(behemoth) = world.behemoths.get_mut(&job.behemoth) else {
            continue;
        };
        let amount = rules.behemoth.ore_per_extract.min(behemoth.ore);
        behemoth.ore = behemoth.ore.saturating_sub(amount);
        let exhausted = behemoth.ore == 0;
        if let Some(a) = world.actors.get_mut(&actor) {
            inventory::add_item(&mut a.inventory, Item::Ore, amount)?;
        }
        world.emit(GameEvent::OreExtracted {
            actor,
            behemoth: job.behemoth,
            amount,
        });
        if exhausted {
            drop_climber(world, actor);
        } else if let Some(j) = world.climb_jobs.get_mut(&actor) {
            j.countdown = rules.behemoth.extract_interval_ticks;
        }
    }
    Ok(())
}

/// Throw every climber off a waking behemoth.
fn throw_climbers(
    world: &mut WorldState,
    id: BehemothId,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let thrown: Vec<ActorId> = world
        .climb_jobs
        .values()
        .filter(|j| j.behemoth == id)
        .map(|j| j.actor)
        .collect();
    for actor in thrown {
        drop_climber(world, actor);
        let Some(a) = world.actors.get_mut(&actor) else {
            continue;
        };
        if !a.is_alive() {
            continue;
        }
        let damage = a
            .stats
            .max_health
            .saturating_mul(rules.behemoth.throw_damage_pct)
            .checked_div(100)
            .unwrap_or(0)
            .max(1);
        a.stats.health = a.stats.health.saturating_sub(damage);
        let dead = a.stats.health == 0;
        debug!(actor = %actor, behemoth = %id, damage, "climber thrown");
        world.emit(GameEvent::ClimberThrown {
            actor,
            behemoth: id,
            damage,
        });
        if dead {
            death::kill_actor(world, actor, None, rules)?;
        }
    }
    Ok(())
}

/// Run one tick of behemoth behavior: climbers first, then status timers,
/// then patrol movement for roaming behemoths.
pub fn process_behemoths(world: &mut WorldState, rules: &RulesConfig) -> Result<(), AgentError> {
    process_climbers(world, rules)?;

    let tick = world.tick();
    let ids: Vec<BehemothId> = world.behemoths.keys().copied().collect();
    for id in ids {
        let Some(behemoth) = world.behemoths.get_mut(&id) else {
            continue;
        };
        let due = behemoth.status_until.is_some_and(|t| t <= tick);
        match behemoth.status {
            BehemothStatus::Unconscious if due => {
                behemoth.status = BehemothStatus::Waking;
                behemoth.status_until = Some(tick.saturating_add(rules.behemoth.waking_ticks));
                info!(behemoth = %id, "behemoth waking");
                world.emit(GameEvent::BehemothWaking { behemoth: id });
                throw_climbers(world, id, rules)?;
            }
            BehemothStatus::Waking if due => {
                behemoth.status = BehemothStatus::Roaming;
                behemoth.status_until = None;
                behemoth.health = behemoth.max_health;
                info!(behemoth = %id, "behemoth roaming");
                world.emit(GameEvent::BehemothRoaming { behemoth: id });
            }
            BehemothStatus::Roaming => {
                let Some(waypoint) = behemoth.patrol_route.get(behemoth.waypoint_index).copied()
                else {
                    continue;
                };
                let (next, arrived) = behemoth
                    .position
                    .step_toward(waypoint, rules.speeds.behemoth);
                if arrived {
                    let len = behemoth.patrol_route.len();
                    behemoth.waypoint_index = behemoth
                        .waypoint_index
                        .checked_add(1)
                        .and_then(|i| i.checked_rem(len))
                        .unwrap_or(0);
                }
                world.move_entity(EntityRef::Behemoth(id), next);
            }
            BehemothStatus::Unconscious | BehemothStatus::Waking => {}
        }
    }
    Ok(())
}
