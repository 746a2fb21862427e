//! NPC monster behavior and population balancing.
//!
//! Each NPC runs a small state machine once per tick:
//!
//! - **idle**: freshly spawned; becomes `patrol` on its first update.
//! - **patrol**: random walk between waypoints inside the patrol radius.
//!   Switches to `chase` when an eligible actor enters aggro range.
//! - **chase**: walks toward the target. Switches to `attack` within attack
//!   range, back to `patrol` if the target is lost or beyond chase range.
//! - **attack**: holds a combat pair on the target; the combat resolver
//!   deals the damage. Back to `chase` when the target steps out of range.
//! - **flee**: entered at low health; walks directly away from the threat
//!   and returns to `patrol` once outside chase range.
//!
//! An eligible target is a living, connected, non-monster actor. Randomness
//! comes from the caller's generator, which the tick pipeline seeds from the
//! world seed and tick.

use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use frontier_types::{
    ActorId, CombatantRef, EntityRef, GameEvent, Monster, MonsterBehavior, MonsterId, Position,
    Stats,
};
use frontier_world::WorldState;

use crate::combat;
use crate::error::AgentError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A circular region where NPCs may spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DangerZone {
    /// Zone centre.
    pub center: Position,
    /// Zone radius.
    pub radius: f64,
}

/// Stats for a kind of NPC monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    /// Kind name, e.g. `"wolf"`.
    pub kind: String,
    /// Starting and maximum health.
    pub max_health: u32,
    /// Attack value.
    pub attack: u32,
    /// Defense value.
    pub defense: u32,
    /// Gold awarded to the killer.
    pub gold_drop: u32,
    /// Radius of the patrol area around the spawn point.
    pub patrol_radius: f64,
}

/// NPC behavior and population settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// Distance at which a patrolling NPC notices an actor (default: 150).
    pub aggro_range: f64,
    /// Distance beyond which a chase is abandoned (default: 250).
    pub chase_range: f64,
    /// Distance at which a chasing NPC starts attacking (default: 25).
    pub attack_range: f64,
    /// Health percentage at or below which an NPC flees (default: 20).
    pub flee_health_pct: u32,
    /// Ticks between population checks (default: 20).
    pub balance_interval_ticks: u64,
    /// Target NPCs per eligible actor, in percent (default: 150).
    pub population_multiplier_pct: u32,
    /// Most NPCs spawned per check (default: 3).
    pub max_spawns_per_check: u32,
    /// No NPC spawns this close to the actor spawn point (default: 150).
    pub safe_zone_radius: f64,
    /// Placement attempts per spawn before giving up (default: 10).
    pub spawn_attempts: u32,
    /// Where NPCs spawn.
    pub danger_zones: Vec<DangerZone>,
    /// What spawns.
    pub templates: Vec<MonsterTemplate>,
}

impl Default for NpcConfig {
    fn default() -> Self {
        let zone = |x, y| DangerZone {
            center: Position::new(x, y),
            radius: 250.0,
        };
        Self {
            aggro_range: 150.0,
            chase_range: 250.0,
            attack_range: 25.0,
            flee_health_pct: 20,
            balance_interval_ticks: 20,
            population_multiplier_pct: 150,
            max_spawns_per_check: 3,
            safe_zone_radius: 150.0,
            spawn_attempts: 10,
            danger_zones: vec![
                zone(300.0, 300.0),
                zone(1700.0, 300.0),
                zone(300.0, 1700.0),
                zone(1700.0, 1700.0),
            ],
            templates: vec![
                MonsterTemplate {
                    kind: String::from("wolf"),
                    max_health: 60,
                    attack: 8,
                    defense: 1,
                    gold_drop: 5,
                    patrol_radius: 120.0,
                },
                MonsterTemplate {
                    kind: String::from("bear"),
                    max_health: 120,
                    attack: 14,
                    defense: 3,
                    gold_drop: 12,
                    patrol_radius: 80.0,
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A uniformly random angle and distance from `center`, up to `radius`.
fn random_point(rng: &mut impl Rng, center: Position, radius: f64) -> Position {
    if !radius.is_finite() || radius <= 0.0 {
        return center;
    }
    let angle = rng.random_range(0.0..TAU);
    let dist = rng.random_range(0.0..=radius);
    Position::new(
        dist.mul_add(angle.cos(), center.x),
        dist.mul_add(angle.sin(), center.y),
    )
}

/// Position of an actor that an NPC may pursue.
fn eligible_target(world: &WorldState, id: ActorId) -> Option<Position> {
    world
        .actors
        .get(&id)
        .filter(|a| a.is_alive() && a.connected && !a.role.is_monster())
        .map(|a| a.position)
}

/// Nearest eligible actor within `range`, ties broken by id.
fn nearest_target(world: &WorldState, from: Position, range: f64) -> Option<ActorId> {
    let mut best: Option<(ActorId, f64)> = None;
    for id in world.actors_near(from, range) {
        let Some(pos) = eligible_target(world, id) else {
            continue;
        };
        let dist = from.distance_to(pos);
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((id, dist));
        }
    }
    best.map(|(id, _)| id)
}

fn is_low_health(stats: &Stats, flee_pct: u32) -> bool {
    u64::from(stats.health).saturating_mul(100)
        <= u64::from(stats.max_health).saturating_mul(u64::from(flee_pct))
}

// ---------------------------------------------------------------------------
// Behavior machine
// ---------------------------------------------------------------------------

/// Run one step of the behavior machine for every NPC.
pub fn update_npcs(world: &mut WorldState, cfg: &NpcConfig, speed: f64, rng: &mut impl Rng) {
    let ids: Vec<MonsterId> = world.monsters.keys().copied().collect();
    for id in ids {
        let Some(monster) = world.monsters.get(&id).cloned() else {
            continue;
        };
        let (behavior, target, waypoint, next) = step(world, &monster, cfg, speed, rng);

        let me = CombatantRef::Monster(id);
        match (behavior, target) {
            (MonsterBehavior::Attack, Some(t)) => {
                let holding = world
                    .combat_pairs
                    .get(&me)
                    .is_some_and(|p| p.active && p.target == CombatantRef::Actor(t));
                if !holding {
                    combat::start_attack(world, me, CombatantRef::Actor(t));
                }
            }
            _ => {
                combat::end_attack(world, me);
            }
        }
        if behavior != monster.behavior {
            debug!(monster = %id, from = ?monster.behavior, to = ?behavior, "npc behavior changed");
        }
        if let Some(m) = world.monsters.get_mut(&id) {
            m.behavior = behavior;
            m.target = target;
            m.waypoint = waypoint;
        }
        if next != monster.position {
            world.move_entity(EntityRef::Monster(id), next);
        }
    }
}

/// Decide the next behavior, target, waypoint and position for one NPC.
fn step(
    world: &WorldState,
    monster: &Monster,
    cfg: &NpcConfig,
    speed: f64,
    rng: &mut impl Rng,
) -> (MonsterBehavior, Option<ActorId>, Option<Position>, Position) {
    let pos = monster.position;
    let low = is_low_health(&monster.stats, cfg.flee_health_pct);
    let locked = monster
        .target
        .and_then(|t| eligible_target(world, t).map(|p| (t, p)));

    // low health turns any engagement into a retreat
    if low
        && let Some((t, threat)) = locked
        && matches!(
            monster.behavior,
            MonsterBehavior::Chase | MonsterBehavior::Attack | MonsterBehavior::Flee
        )
    {
        if pos.distance_to(threat) > cfg.chase_range {
            return (MonsterBehavior::Patrol, None, None, pos);
        }
        let next = pos.step_away(threat, speed);
        return (MonsterBehavior::Flee, Some(t), monster.waypoint, next);
    }

    match monster.behavior {
        MonsterBehavior::Idle => (MonsterBehavior::Patrol, None, None, pos),
        MonsterBehavior::Patrol | MonsterBehavior::Flee => {
            if !low && let Some(t) = nearest_target(world, pos, cfg.aggro_range) {
                return (MonsterBehavior::Chase, Some(t), monster.waypoint, pos);
            }
            let waypoint = match monster.waypoint {
                Some(w) if pos.distance_to(w) > f64::EPSILON => w,
                _ => world.clamp(random_point(
                    rng,
                    monster.patrol_origin,
                    monster.patrol_radius,
                )),
            };
            let (next, _) = pos.step_toward(waypoint, speed);
            (MonsterBehavior::Patrol, None, Some(waypoint), next)
        }
        MonsterBehavior::Chase | MonsterBehavior::Attack => {
            let Some((t, tpos)) = locked else {
                return (MonsterBehavior::Patrol, None, None, pos);
            };
            let dist = pos.distance_to(tpos);
            if dist > cfg.chase_range {
                (MonsterBehavior::Patrol, None, None, pos)
            } else if dist <= cfg.attack_range {
                (MonsterBehavior::Attack, Some(t), monster.waypoint, pos)
            } else {
                let (next, _) = pos.step_toward(tpos, speed);
                (MonsterBehavior::Chase, Some(t), monster.waypoint, next)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Population balancing
// ---------------------------------------------------------------------------

/// Top the NPC population up toward its target on balancing ticks.
///
/// Target = ceil(eligible actors x multiplier). At most
/// `max_spawns_per_check` NPCs spawn per call, inside a random danger zone
/// and outside the safe zone. Returns the ids spawned.
pub fn balance_population(
    world: &mut WorldState,
    cfg: &NpcConfig,
    rng: &mut impl Rng,
) -> Result<Vec<MonsterId>, AgentError> {
    if !world.clock().is_interval(cfg.balance_interval_ticks)
        || cfg.danger_zones.is_empty()
        || cfg.templates.is_empty()
    {
        return Ok(Vec::new());
    }

    let eligible = world
        .actors
        .values()
        .filter(|a| a.is_alive() && a.connected && !a.role.is_monster())
        .count();
    let target = u64::try_from(eligible)
        .unwrap_or(u64::MAX)
        .saturating_mul(u64::from(cfg.population_multiplier_pct))
        .div_ceil(100);
    let current = u64::try_from(world.monsters.len()).unwrap_or(u64::MAX);
    let deficit = target
        .saturating_sub(current)
        .min(u64::from(cfg.max_spawns_per_check));

    let spawn_point = world.settings().spawn_point;
    let mut spawned = Vec::new();
    for _ in 0..deficit {
        let zone_idx = rng.random_range(0..cfg.danger_zones.len());
        let template_idx = rng.random_range(0..cfg.templates.len());
        let (Some(zone), Some(template)) = (
            cfg.danger_zones.get(zone_idx),
            cfg.templates.get(template_idx),
        ) else {
            continue;
        };
        let placed = (0..cfg.spawn_attempts)
            .map(|_| world.clamp(random_point(rng, zone.center, zone.radius)))
            .find(|p| p.distance_to(spawn_point) > cfg.safe_zone_radius);
        let Some(position) = placed else {
            debug!(zone = zone_idx, "no spawn position found outside safe zone");
            continue;
        };

        let id = MonsterId::new();
        world.add_monster(Monster {
            id,
            kind: template.kind.clone(),
            position,
            stats: Stats::new(template.max_health, template.attack, template.defense),
            behavior: MonsterBehavior::Idle,
            patrol_origin: position,
            patrol_radius: template.patrol_radius,
            waypoint: None,
            target: None,
            gold_drop: template.gold_drop,
        })?;
        debug!(monster = %id, kind = %template.kind, "npc spawned");
        world.emit(GameEvent::MonsterSpawned {
            monster: id,
            kind: template.kind.clone(),
        });
        spawned.push(id);
    }
    Ok(spawned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use frontier_types::Role;

    use super::*;
    use crate::test_support::{make_world, put_actor};

    fn put_wolf(world: &mut WorldState, x: f64, y: f64) -> MonsterId {
        let id = MonsterId::new();
        world
            .add_monster(Monster {
                id,
                kind: String::from("wolf"),
                position: Position::new(x, y),
                stats: Stats::new(60, 8, 1),
                behavior: MonsterBehavior::Patrol,
                patrol_origin: Position::new(x, y),
                patrol_radius: 50.0,
                waypoint: None,
                target: None,
                gold_drop: 5,
            })
            .unwrap();
        id
    }

    #[test]
    fn idle_becomes_patrol() {
        let cfg = NpcConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = make_world();
        let id = put_wolf(&mut world, 500.0, 500.0);
        world.monsters.get_mut(&id).unwrap().behavior = MonsterBehavior::Idle;
        update_npcs(&mut world, &cfg, 3.0, &mut rng);
        assert_eq!(world.monsters[&id].behavior, MonsterBehavior::Patrol);
    }

    #[test]
    fn patrol_stays_near_origin() {
        let cfg = NpcConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut world = make_world();
        let id = put_wolf(&mut world, 500.0, 500.0);
        for _ in 0..100 {
            update_npcs(&mut world, &cfg, 3.0, &mut rng);
        }
        let m = &world.monsters[&id];
        assert!(m.position.distance_to(m.patrol_origin) <= 50.0 + 1e-9);
    }

    #[test]
    fn chase_then_attack() {
        let cfg = NpcConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut world = make_world();
        let id = put_wolf(&mut world, 500.0, 500.0);
        let prey = put_actor(&mut world, Role::Miner, 540.0, 500.0);

        update_npcs(&mut world, &cfg, 3.0, &mut rng);
        assert_eq!(world.monsters[&id].behavior, MonsterBehavior::Chase);
        assert_eq!(world.monsters[&id].target, Some(prey));

        for _ in 0..6 {
            update_npcs(&mut world, &cfg, 3.0, &mut rng);
        }
        assert_eq!(world.monsters[&id].behavior, MonsterBehavior::Attack);
        let pair = world.combat_pairs[&CombatantRef::Monster(id)];
        assert!(pair.active);
        assert_eq!(pair.target, CombatantRef::Actor(prey));
    }

    #[test]
    fn ignores_monster_role_and_disconnected_actors() {
        let cfg = NpcConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut world = make_world();
        let id = put_wolf(&mut world, 500.0, 500.0);
        put_actor(&mut world, Role::Monster, 520.0, 500.0);
        let away = put_actor(&mut world, Role::Miner, 510.0, 500.0);
        world.set_connected(away, false).unwrap();
        update_npcs(&mut world, &cfg, 3.0, &mut rng);
        assert_eq!(world.monsters[&id].behavior, MonsterBehavior::Patrol);
    }

    #[test]
    fn low_health_flees() {
        let cfg = NpcConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut world = make_world();
        let id = put_wolf(&mut world, 500.0, 500.0);
        let prey = put_actor(&mut world, Role::Miner, 510.0, 500.0);
        {
            let m = world.monsters.get_mut(&id).unwrap();
            m.behavior = MonsterBehavior::Attack;
            m.target = Some(prey);
            m.stats.health = 12;
        }
        update_npcs(&mut world, &cfg, 3.0, &mut rng);
        let m = &world.monsters[&id];
        assert_eq!(m.behavior, MonsterBehavior::Flee);
        assert!(m.position.x < 500.0);
    }

    #[test]
    fn balancing_spawns_capped_outside_safe_zone() {
        let cfg = NpcConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut world = make_world();
        for _ in 0..4 {
            world.spawn_actor("p", Role::Woodcutter);
        }
        while !world.clock().is_interval(cfg.balance_interval_ticks) {
            world.begin_tick().unwrap();
        }
        // target ceil(4 * 1.5) = 6, capped at 3
        let spawned = balance_population(&mut world, &cfg, &mut rng).unwrap();
        assert_eq!(spawned.len(), 3);
        let spawn = world.settings().spawn_point;
        for m in world.monsters.values() {
            assert!(m.position.distance_to(spawn) > cfg.safe_zone_radius);
            assert_eq!(m.behavior, MonsterBehavior::Idle);
        }
    }

    #[test]
    fn balancing_waits_for_interval() {
        let cfg = NpcConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut world = make_world();
        world.spawn_actor("p", Role::Miner);
        assert!(balance_population(&mut world, &cfg, &mut rng).unwrap().is_empty());
    }
}
