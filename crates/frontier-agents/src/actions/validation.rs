//! Command validation pipeline.
//!
//! The pipeline runs these stages in order and stops at the first failure:
//! 1. Actor -- does the actor exist and is it alive?
//! 2. Cooldown -- has the actor's cooldown elapsed?
//! 3. Role -- may the actor's role issue this command?
//! 4. Target -- does the target exist and is it in a usable state?
//! 5. Range -- is the target within the per-command distance?
//! 6. Bounds -- are destination, plant and build coordinates in the world?
//! 7. Holdings -- does the actor hold what the command consumes?
//! 8. Uniqueness -- alliance name and membership rules.
//!
//! Validation never mutates. Each stage returns `Ok(())` or a [`Rejection`]
//! carrying a reason code and a readable message.

use frontier_types::{
    Actor, ActorId, ActorStatus, BehemothStatus, CombatantRef, Command, Position, Rejection,
    RejectionReason, ResourceKind, ResourceState, Role, TradeStatus,
};
use frontier_world::WorldState;

use crate::alliance;
use crate::config::RulesConfig;
use crate::crafting;
use crate::inventory;

use super::costs;

fn reject(reason: RejectionReason, message: impl Into<String>) -> Rejection {
    Rejection::new(reason, message)
}

/// Validate a command through the full pipeline.
pub fn validate(
    actor_id: ActorId,
    command: &Command,
    world: &WorldState,
    rules: &RulesConfig,
) -> Result<(), Rejection> {
    // Stage 1: Actor
    let actor = world.actors.get(&actor_id).ok_or_else(|| {
        reject(
            RejectionReason::UnknownActor,
            format!("actor {actor_id} does not exist"),
        )
    })?;
    if !actor.is_alive() {
        return Err(reject(RejectionReason::ActorDead, "actor is dead"));
    }

    // Stage 2: Cooldown
    if world.tick() < actor.cooldown_until {
        return Err(reject(
            RejectionReason::OnCooldown,
            format!("on cooldown until tick {}", actor.cooldown_until),
        ));
    }

    // Stage 3: Role
    let kind = command.kind();
    if !costs::role_allows(actor.role, kind) {
        return Err(reject(
            RejectionReason::RoleNotAllowed,
            format!("{:?} cannot {kind:?}", actor.role),
        ));
    }

    // Stage 4: Target
    let target_pos = validate_target(actor, command, world, rules)?;

    // Stage 5: Range
    if let (Some(pos), Some(range)) = (target_pos, costs::range_for(kind, rules))
        && actor.position.distance_to(pos) > range
    {
        return Err(reject(
            RejectionReason::OutOfRange,
            format!("target is further than {range}"),
        ));
    }

    // Stage 6: Bounds
    if let Some(pos) = command.coordinates()
        && !pos.in_bounds(world.world_size())
    {
        return Err(reject(
            RejectionReason::OutOfBounds,
            format!("({}, {}) is outside the world", pos.x, pos.y),
        ));
    }

    // Stage 7: Holdings
    validate_holdings(actor, command, rules)?;

    // Stage 8: Uniqueness
    validate_uniqueness(actor, command, world)
}

/// Check the command's target and return its position for the range stage.
fn validate_target(
    actor: &Actor,
    command: &Command,
    world: &WorldState,
    rules: &RulesConfig,
) -> Result<Option<Position>, Rejection> {
    let missing = |what: &str| reject(RejectionReason::InvalidTarget, format!("no such {what}"));
    let unavailable = |msg: &str| reject(RejectionReason::UnavailableTarget, msg);

    match command {
        Command::Gather { resource_id } => {
            let node = world
                .resources
                .get(resource_id)
                .ok_or_else(|| missing("resource"))?;
            if node.kind != ResourceKind::Sapling && !costs::can_gather(actor.role, node.kind) {
                return Err(reject(
                    RejectionReason::RoleNotAllowed,
                    format!("{:?} cannot gather {:?}", actor.role, node.kind),
                ));
            }
            if node.state != ResourceState::Available {
                return Err(unavailable("resource is not available"));
            }
            Ok(Some(node.position))
        }
        Command::Attack { target } => validate_attack_target(actor, *target, world),
        Command::Eat { target_id } => {
            if *target_id == actor.id {
                return Err(reject(RejectionReason::InvalidTarget, "cannot eat yourself"));
            }
            let corpse = world.actors.get(target_id).ok_or_else(|| missing("actor"))?;
            if corpse.status != ActorStatus::Dead || corpse.eaten {
                return Err(unavailable("target is not an uneaten corpse"));
            }
            Ok(Some(corpse.position))
        }
        Command::Craft { recipe_id } => {
            if crafting::recipe_for(recipe_id).is_none() {
                return Err(reject(
                    RejectionReason::InvalidParameters,
                    format!("unknown recipe {recipe_id}"),
                ));
            }
            Ok(None)
        }
        Command::TradePropose { target_id, .. } => {
            if *target_id == actor.id {
                return Err(reject(RejectionReason::InvalidTarget, "cannot trade with yourself"));
            }
            let partner = world.actors.get(target_id).ok_or_else(|| missing("actor"))?;
            if partner.role.is_monster() {
                return Err(reject(RejectionReason::InvalidTarget, "monsters do not trade"));
            }
            if !partner.is_alive() {
                return Err(unavailable("trade partner is dead"));
            }
            Ok(Some(partner.position))
        }
        Command::TradeRespond { trade_id, .. } => {
            let trade = world.trades.get(trade_id).ok_or_else(|| missing("trade"))?;
            if trade.target != actor.id {
                return Err(reject(
                    RejectionReason::InvalidTarget,
                    "trade is not addressed to this actor",
                ));
            }
            if trade.status != TradeStatus::Pending {
                return Err(unavailable("trade is no longer pending"));
            }
            Ok(None)
        }
        Command::Water { resource_id } => {
            let node = world
                .resources
                .get(resource_id)
                .ok_or_else(|| missing("resource"))?;
            if node.kind != ResourceKind::Sapling || node.state != ResourceState::Growing {
                return Err(unavailable("only growing saplings can be watered"));
            }
            Ok(Some(node.position))
        }
        Command::Feed { behemoth_id, .. } => {
            let b = world
                .behemoths
                .get(behemoth_id)
                .ok_or_else(|| missing("behemoth"))?;
            if b.status == BehemothStatus::Waking {
                return Err(unavailable("behemoth is waking"));
            }
            Ok(Some(b.position))
        }
        Command::Climb { behemoth_id } => {
            let b = world
                .behemoths
                .get(behemoth_id)
                .ok_or_else(|| missing("behemoth"))?;
            if b.status != BehemothStatus::Unconscious {
                return Err(unavailable("behemoth is not unconscious"));
            }
            Ok(Some(b.position))
        }
        Command::Equip { item } => {
            if item.slot().is_none() {
                return Err(reject(
                    RejectionReason::InvalidParameters,
                    format!("{item:?} cannot be equipped"),
                ));
            }
            Ok(None)
        }
        Command::AllianceCreate { name } => {
            let len = name.trim().chars().count();
            if len == 0 || len > rules.max_alliance_name_length {
                return Err(reject(
                    RejectionReason::InvalidParameters,
                    "alliance name is empty or too long",
                ));
            }
            Ok(None)
        }
        Command::AllianceJoin { alliance_id } => {
            if !world.alliances.contains_key(alliance_id) {
                return Err(missing("alliance"));
            }
            Ok(None)
        }
        Command::Chat { message } => {
            let len = message.trim().chars().count();
            if len == 0 || message.chars().count() > rules.max_chat_length {
                return Err(reject(
                    RejectionReason::InvalidParameters,
                    "chat message is empty or too long",
                ));
            }
            Ok(None)
        }
        Command::Plant { .. } | Command::Build { .. } => Ok(command.coordinates()),
        Command::Move { .. } | Command::AllianceLeave | Command::Stop => Ok(None),
    }
}

/// Attack targets: no self-attack, the target must be alive (behemoths
/// roaming), and a woodcutter can only be attacked by monster-role actors.
fn validate_attack_target(
    actor: &Actor,
    target: CombatantRef,
    world: &WorldState,
) -> Result<Option<Position>, Rejection> {
    let missing = || reject(RejectionReason::InvalidTarget, "no such target");
    match target {
        CombatantRef::Actor(id) => {
            if id == actor.id {
                return Err(reject(RejectionReason::InvalidTarget, "cannot attack yourself"));
            }
            let victim = world.actors.get(&id).ok_or_else(missing)?;
            if !victim.is_alive() {
                return Err(reject(RejectionReason::UnavailableTarget, "target is dead"));
            }
            if victim.role == Role::Woodcutter && !actor.role.is_monster() {
                return Err(reject(
                    RejectionReason::RoleNotAllowed,
                    "woodcutters can only be attacked by monsters",
                ));
            }
            Ok(Some(victim.position))
        }
        CombatantRef::Monster(id) => {
            let m = world.monsters.get(&id).ok_or_else(missing)?;
            if !m.stats.is_alive() {
                return Err(reject(RejectionReason::UnavailableTarget, "target is dead"));
            }
            Ok(Some(m.position))
        }
        CombatantRef::Behemoth(id) => {
            let b = world.behemoths.get(&id).ok_or_else(missing)?;
            if b.status != BehemothStatus::Roaming {
                return Err(reject(
                    RejectionReason::UnavailableTarget,
                    "behemoth is not roaming",
                ));
            }
            Ok(Some(b.position))
        }
    }
}

fn validate_holdings(
    actor: &Actor,
    command: &Command,
    rules: &RulesConfig,
) -> Result<(), Rejection> {
    let Some(cost) = costs::material_cost(command, rules) else {
        return Err(reject(RejectionReason::InvalidParameters, "unknown recipe"));
    };
    if !inventory::can_afford(actor, &cost) {
        return Err(reject(
            RejectionReason::InsufficientResources,
            format!("{:?} needs more materials or gold", command.kind()),
        ));
    }
    Ok(())
}

fn validate_uniqueness(
    actor: &Actor,
    command: &Command,
    world: &WorldState,
) -> Result<(), Rejection> {
    match command {
        Command::AllianceCreate { name } => {
            if actor.alliance.is_some() {
                return Err(reject(
                    RejectionReason::AlreadyExists,
                    "actor already belongs to an alliance",
                ));
            }
            if alliance::name_taken(world, name.trim()) {
                return Err(reject(
                    RejectionReason::AlreadyExists,
                    format!("alliance name {name} is taken"),
                ));
            }
            Ok(())
        }
        Command::AllianceJoin { .. } if actor.alliance.is_some() => Err(reject(
            RejectionReason::AlreadyExists,
            "actor already belongs to an alliance",
        )),
        Command::AllianceLeave if actor.alliance.is_none() => Err(reject(
            RejectionReason::NotInAlliance,
            "actor is not in an alliance",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_types::{Item, ResourceId, ResourceNode};

    use super::*;
    use crate::test_support::{make_world, put_actor, put_behemoth};

    fn reason(r: Result<(), Rejection>) -> RejectionReason {
        r.unwrap_err().reason
    }

    fn put_tree(world: &mut WorldState, x: f64, y: f64) -> ResourceId {
        let id = ResourceId::new();
        world
            .add_resource(ResourceNode {
                id,
                kind: ResourceKind::Tree,
                position: Position::new(x, y),
                remaining: 5,
                capacity: 5,
                state: ResourceState::Available,
                growth_complete_tick: None,
            })
            .unwrap();
        id
    }

    #[test]
    fn unknown_and_dead_actors() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        assert_eq!(
            reason(validate(ActorId::new(), &Command::Stop, &world, &rules)),
            RejectionReason::UnknownActor
        );
        let id = put_actor(&mut world, Role::Miner, 10.0, 10.0);
        world.actors.get_mut(&id).unwrap().status = ActorStatus::Dead;
        assert_eq!(
            reason(validate(id, &Command::Stop, &world, &rules)),
            RejectionReason::ActorDead
        );
    }

    #[test]
    fn cooldown_blocks_everything() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let id = put_actor(&mut world, Role::Miner, 10.0, 10.0);
        world.actors.get_mut(&id).unwrap().cooldown_until = 5;
        assert_eq!(
            reason(validate(id, &Command::Stop, &world, &rules)),
            RejectionReason::OnCooldown
        );
    }

    #[test]
    fn gather_role_and_range() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let tree = put_tree(&mut world, 100.0, 100.0);
        let miner = put_actor(&mut world, Role::Miner, 100.0, 110.0);
        let cutter = put_actor(&mut world, Role::Woodcutter, 100.0, 110.0);
        let far = put_actor(&mut world, Role::Woodcutter, 200.0, 200.0);
        let cmd = Command::Gather { resource_id: tree };
        assert_eq!(
            reason(validate(miner, &cmd, &world, &rules)),
            RejectionReason::RoleNotAllowed
        );
        assert!(validate(cutter, &cmd, &world, &rules).is_ok());
        assert_eq!(
            reason(validate(far, &cmd, &world, &rules)),
            RejectionReason::OutOfRange
        );
        world.resources.get_mut(&tree).unwrap().state = ResourceState::BeingGathered;
        assert_eq!(
            reason(validate(cutter, &cmd, &world, &rules)),
            RejectionReason::UnavailableTarget
        );
    }

    #[test]
    fn woodcutters_are_protected_from_players() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let cutter = put_actor(&mut world, Role::Woodcutter, 100.0, 100.0);
        let miner = put_actor(&mut world, Role::Miner, 110.0, 100.0);
        let monster = put_actor(&mut world, Role::Monster, 90.0, 100.0);
        let hit_cutter = Command::Attack {
            target: CombatantRef::Actor(cutter),
        };
        assert_eq!(
            reason(validate(miner, &hit_cutter, &world, &rules)),
            RejectionReason::RoleNotAllowed
        );
        assert!(validate(monster, &hit_cutter, &world, &rules).is_ok());
        assert_eq!(
            reason(validate(
                cutter,
                &Command::Attack {
                    target: CombatantRef::Actor(miner)
                },
                &world,
                &rules
            )),
            RejectionReason::RoleNotAllowed
        );
        assert_eq!(
            reason(validate(
                monster,
                &Command::Attack {
                    target: CombatantRef::Actor(monster)
                },
                &world,
                &rules
            )),
            RejectionReason::InvalidTarget
        );
    }

    #[test]
    fn climb_needs_unconscious_behemoth() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let b = put_behemoth(&mut world, 300.0, 300.0);
        let miner = put_actor(&mut world, Role::Miner, 310.0, 300.0);
        let cmd = Command::Climb { behemoth_id: b };
        assert_eq!(
            reason(validate(miner, &cmd, &world, &rules)),
            RejectionReason::UnavailableTarget
        );
        world.behemoths.get_mut(&b).unwrap().status = BehemothStatus::Unconscious;
        assert!(validate(miner, &cmd, &world, &rules).is_ok());
    }

    #[test]
    fn out_of_bounds_move() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let id = put_actor(&mut world, Role::Miner, 10.0, 10.0);
        let cmd = Command::Move { x: 2500.0, y: 10.0 };
        assert_eq!(
            reason(validate(id, &cmd, &world, &rules)),
            RejectionReason::OutOfBounds
        );
        assert!(validate(id, &Command::Move { x: 1999.0, y: 0.0 }, &world, &rules).is_ok());
    }

    #[test]
    fn craft_needs_ingredients() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let id = put_actor(&mut world, Role::Woodcutter, 10.0, 10.0);
        let cmd = Command::Craft {
            recipe_id: String::from("plank"),
        };
        assert_eq!(
            reason(validate(id, &cmd, &world, &rules)),
            RejectionReason::InsufficientResources
        );
        world
            .actors
            .get_mut(&id)
            .unwrap()
            .inventory
            .insert(Item::Log, 2);
        assert!(validate(id, &cmd, &world, &rules).is_ok());
        let bad = Command::Craft {
            recipe_id: String::from("castle"),
        };
        assert_eq!(
            reason(validate(id, &bad, &world, &rules)),
            RejectionReason::InvalidParameters
        );
    }

    #[test]
    fn alliance_uniqueness() {
        let rules = RulesConfig::default();
        let mut world = make_world();
        let a = put_actor(&mut world, Role::Miner, 10.0, 10.0);
        let b = put_actor(&mut world, Role::Miner, 20.0, 10.0);
        assert_eq!(
            reason(validate(a, &Command::AllianceLeave, &world, &rules)),
            RejectionReason::NotInAlliance
        );
        alliance::create_alliance(&mut world, a, "Deep").unwrap();
        let dup = Command::AllianceCreate {
            name: String::from("deep"),
        };
        assert_eq!(
            reason(validate(b, &dup, &world, &rules)),
            RejectionReason::AlreadyExists
        );
        assert_eq!(
            reason(validate(a, &dup, &world, &rules)),
            RejectionReason::AlreadyExists
        );
    }
}
