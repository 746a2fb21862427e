//! Execution handlers for validated commands.
//!
//! Each handler assumes the command has already passed the validation
//! pipeline against the state at the start of the phase. Commands are
//! executed in ascending actor order, so an earlier command can invalidate a
//! later one's target (two actors racing for the same tree). Every reference
//! and holding is re-checked read-only before anything is touched, so a
//! command that fails this way leaves the actor's jobs, status and cooldown
//! as they were. The tick pipeline reports the [`AgentError`] as a
//! `target_vanished` rejection and carries on.

use tracing::debug;

use frontier_types::{
    Actor, ActorId, ActorStatus, AllianceId, BehemothId, BehemothStatus, ChatMessage,
    CombatantRef, Command, GameEvent, Item, Position, ResourceId, ResourceKind, ResourceState,
    Structure, StructureId, StructureKind, TradeBundle, TradeId, TradeStatus,
};
use frontier_world::WorldState;
use frontier_world::resource as world_resource;

use crate::alliance;
use crate::behemoth;
use crate::combat;
use crate::config::RulesConfig;
use crate::crafting;
use crate::error::AgentError;
use crate::evolution;
use crate::inventory;
use crate::trade;

/// Dispatch a command to its handler and apply the command's cooldown.
pub fn execute_command(
    world: &mut WorldState,
    actor: ActorId,
    command: &Command,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    check_command(world, actor, command, rules)?;
    if !matches!(command, Command::Chat { .. }) {
        interrupt_jobs(world, actor);
    }

    match command {
        Command::Move { x, y } => execute_move(world, actor, Position::new(*x, *y))?,
        Command::Gather { resource_id } => execute_gather(world, actor, *resource_id, rules)?,
        Command::Attack { target } => execute_attack(world, actor, *target)?,
        Command::Eat { target_id } => execute_eat(world, actor, *target_id, rules)?,
        Command::Craft { recipe_id } => {
            crafting::start_craft(world, actor, recipe_id)?;
        }
        Command::TradePropose {
            target_id,
            offer_items,
            offer_gold,
            request_items,
            request_gold,
        } => {
            trade::propose_trade(
                world,
                actor,
                *target_id,
                TradeBundle::from_stacks(offer_items, *offer_gold),
                TradeBundle::from_stacks(request_items, *request_gold),
            )?;
        }
        Command::TradeRespond { trade_id, accept } => {
            execute_trade_respond(world, actor, *trade_id, *accept, rules)?;
        }
        Command::Plant { x, y } => execute_plant(world, actor, Position::new(*x, *y), rules)?,
        Command::Water { resource_id } => execute_water(world, actor, *resource_id, rules)?,
        Command::Feed {
            behemoth_id,
            amount,
        } => behemoth::feed(world, actor, *behemoth_id, *amount, rules)?,
        Command::Climb { behemoth_id } => execute_climb(world, actor, *behemoth_id, rules)?,
        Command::Equip { item } => execute_equip(world, actor, *item)?,
        Command::Build { kind, x, y } => {
            execute_build(world, actor, *kind, Position::new(*x, *y), rules)?;
        }
        Command::AllianceCreate { name } => {
            alliance::create_alliance(world, actor, name.trim())?;
        }
        Command::AllianceJoin { alliance_id } => execute_join(world, actor, *alliance_id)?,
        Command::AllianceLeave => alliance::leave_alliance(world, actor)?,
        Command::Chat { message } => execute_chat(world, actor, message)?,
        Command::Stop => execute_stop(world, actor)?,
    }

    let cooldown = rules.cooldown_for(command.kind());
    if cooldown > 0 {
        let until = world.tick().saturating_add(cooldown);
        if let Some(a) = world.actors.get_mut(&actor) {
            a.cooldown_until = until;
        }
    }
    Ok(())
}

/// Re-check everything `command` refers to against the current state
/// without mutating it.
fn check_command(
    world: &WorldState,
    actor: ActorId,
    command: &Command,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let me = world
        .actors
        .get(&actor)
        .ok_or(AgentError::ActorNotFound(actor))?;
    match command {
        Command::Gather { resource_id } => {
            let node = world.resources.get(resource_id).ok_or_else(|| {
                AgentError::TargetVanished(format!("resource {resource_id} is gone"))
            })?;
            let own_lock = world
                .gather_jobs
                .get(&actor)
                .is_some_and(|job| job.resource == *resource_id);
            ensure(node.state == ResourceState::Available || own_lock, || {
                format!("resource {resource_id} was taken")
            })
        }
        Command::Attack { target } => ensure(world.combatant_position(*target).is_some(), || {
            format!("{target:?} is gone")
        }),
        Command::Eat { target_id } => {
            let edible = world
                .actors
                .get(target_id)
                .is_some_and(|c| c.status == ActorStatus::Dead && !c.eaten);
            ensure(edible, || format!("corpse {target_id} is gone"))
        }
        Command::Craft { recipe_id } => {
            let recipe = crafting::recipe_for(recipe_id)
                .ok_or_else(|| AgentError::UnknownRecipe(recipe_id.clone()))?;
            ensure(inventory::can_afford(me, &recipe.cost()), || {
                format!("ingredients for {recipe_id} are gone")
            })
        }
        Command::TradePropose { target_id, .. } => {
            if world.actors.contains_key(target_id) {
                Ok(())
            } else {
                Err(AgentError::ActorNotFound(*target_id))
            }
        }
        Command::TradeRespond { trade_id, .. } => {
            let open = world
                .trades
                .get(trade_id)
                .is_some_and(|t| t.target == actor && t.status == TradeStatus::Pending);
            ensure(open, || format!("trade {trade_id} is no longer open to {actor}"))
        }
        Command::Plant { .. } => require_item(me, Item::Seed, 1),
        Command::Water { resource_id } => {
            let growing = world.resources.get(resource_id).is_some_and(|n| {
                n.kind == ResourceKind::Sapling && n.state == ResourceState::Growing
            });
            ensure(growing, || format!("sapling {resource_id} is gone"))
        }
        Command::Feed {
            behemoth_id,
            amount,
        } => {
            let behemoth = world
                .behemoths
                .get(behemoth_id)
                .ok_or(AgentError::BehemothNotFound(*behemoth_id))?;
            ensure(behemoth.status != BehemothStatus::Waking, || {
                format!("behemoth {behemoth_id} is waking")
            })?;
            require_item(me, Item::Log, *amount)
        }
        Command::Climb { behemoth_id } => {
            let unconscious = world
                .behemoths
                .get(behemoth_id)
                .is_some_and(|b| b.status == BehemothStatus::Unconscious);
            ensure(unconscious, || {
                format!("behemoth {behemoth_id} is no longer unconscious")
            })
        }
        Command::Equip { item } => {
            ensure(item.slot().is_some(), || format!("{item:?} cannot be equipped"))?;
            require_item(me, *item, 1)
        }
        Command::Build { kind, .. } => {
            let (item, qty) = rules.build.cost(*kind);
            require_item(me, item, qty)
        }
        Command::AllianceCreate { .. } | Command::AllianceJoin { .. } | Command::AllianceLeave => {
            check_membership(world, me, command)
        }
        Command::Move { .. } | Command::Chat { .. } | Command::Stop => Ok(()),
    }
}

/// Alliance commands depend on the actor's current membership.
fn check_membership(world: &WorldState, me: &Actor, command: &Command) -> Result<(), AgentError> {
    match command {
        Command::AllianceCreate { name } => {
            let name = name.trim();
            ensure(!alliance::name_taken(world, name), || {
                format!("alliance name {name} was taken")
            })?;
            ensure(me.alliance.is_none(), || {
                String::from("founder joined another alliance")
            })
        }
        Command::AllianceJoin { alliance_id } => {
            ensure(me.alliance.is_none(), || {
                String::from("actor already belongs to an alliance")
            })?;
            ensure(world.alliances.contains_key(alliance_id), || {
                format!("alliance {alliance_id} disbanded")
            })
        }
        Command::AllianceLeave => {
            ensure(me.alliance.is_some(), || String::from("actor has no alliance"))
        }
        _ => Ok(()),
    }
}

fn ensure(holds: bool, reason: impl FnOnce() -> String) -> Result<(), AgentError> {
    if holds {
        Ok(())
    } else {
        Err(AgentError::TargetVanished(reason()))
    }
}

fn require_item(actor: &Actor, item: Item, amount: u32) -> Result<(), AgentError> {
    let available = actor.item_count(item);
    if available < amount {
        return Err(AgentError::InsufficientItem {
            item,
            requested: amount,
            available,
        });
    }
    Ok(())
}

/// Release any gather or climb job and drop the matching status.
fn interrupt_jobs(world: &mut WorldState, actor: ActorId) {
    world.release_jobs(actor);
    if let Some(a) = world.actors.get_mut(&actor)
        && matches!(a.status, ActorStatus::Gathering | ActorStatus::Climbing)
    {
        a.status = ActorStatus::Idle;
    }
}

fn actor_mut(world: &mut WorldState, actor: ActorId) -> Result<&mut Actor, AgentError> {
    world
        .actors
        .get_mut(&actor)
        .ok_or(AgentError::ActorNotFound(actor))
}

/// Set a destination (clamped into bounds) and start moving. Walking away
/// ends the actor's own combat pair.
pub fn execute_move(
    world: &mut WorldState,
    actor: ActorId,
    target: Position,
) -> Result<(), AgentError> {
    let dest = world.clamp(target);
    combat::end_attack(world, CombatantRef::Actor(actor));
    let a = actor_mut(world, actor)?;
    a.destination = Some(dest);
    a.status = ActorStatus::Moving;
    Ok(())
}

/// Lock a resource and start the gather countdown.
pub fn execute_gather(
    world: &mut WorldState,
    actor: ActorId,
    resource: ResourceId,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let node = world
        .resources
        .get(&resource)
        .ok_or_else(|| AgentError::TargetVanished(format!("resource {resource} is gone")))?;
    if node.state != ResourceState::Available {
        return Err(AgentError::TargetVanished(format!(
            "resource {resource} was taken"
        )));
    }
    world_resource::start_gathering(world, actor, resource, &rules.resources)?;
    let a = actor_mut(world, actor)?;
    a.status = ActorStatus::Gathering;
    a.destination = None;
    Ok(())
}

/// Open a combat pair, replacing the actor's previous one.
pub fn execute_attack(
    world: &mut WorldState,
    actor: ActorId,
    target: CombatantRef,
) -> Result<(), AgentError> {
    if world.combatant_position(target).is_none() {
        return Err(AgentError::TargetVanished(format!("{target:?} is gone")));
    }
    combat::start_attack(world, CombatantRef::Actor(actor), target);
    Ok(())
}

/// Eat a corpse: grow base stats, count the eat and re-evaluate evolution.
pub fn execute_eat(
    world: &mut WorldState,
    actor: ActorId,
    target: ActorId,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let corpse = world
        .actors
        .get_mut(&target)
        .filter(|c| c.status == ActorStatus::Dead && !c.eaten)
        .ok_or_else(|| AgentError::TargetVanished(format!("corpse {target} is gone")))?;
    corpse.eaten = true;
    let (max_health, attack) = (corpse.stats.base_max_health, corpse.stats.base_attack);

    let eater = actor_mut(world, actor)?;
    evolution::apply_eat(eater, max_health, attack, &rules.evolution)?;
    let evolved = evolution::evaluate(eater, &rules.evolution)?;
    eater.destination = None;

    debug!(eater = %actor, eaten = %target, "corpse eaten");
    world.emit(GameEvent::Eaten {
        eater: actor,
        eaten: target,
    });
    if let Some(stage) = evolved {
        world.emit(GameEvent::Evolved { actor, stage });
    }
    Ok(())
}

/// Respond to a pending trade addressed to `actor`.
pub fn execute_trade_respond(
    world: &mut WorldState,
    actor: ActorId,
    trade_id: TradeId,
    accept: bool,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    if !world.trades.contains_key(&trade_id) {
        return Err(AgentError::TargetVanished(format!("trade {trade_id} is gone")));
    }
    trade::respond_trade(world, actor, trade_id, accept, rules)
}

/// Spend a seed to plant a sapling.
pub fn execute_plant(
    world: &mut WorldState,
    actor: ActorId,
    pos: Position,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    require_item(actor_mut(world, actor)?, Item::Seed, 1)?;
    let resource = world_resource::plant_sapling(world, pos, &rules.resources)?;
    let a = actor_mut(world, actor)?;
    inventory::remove_item(&mut a.inventory, Item::Seed, 1)?;
    world.emit(GameEvent::Planted { actor, resource });
    Ok(())
}

/// Water a growing sapling.
pub fn execute_water(
    world: &mut WorldState,
    actor: ActorId,
    resource: ResourceId,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let growth_complete_tick = world_resource::water_sapling(world, resource, &rules.resources)
        .map_err(|e| AgentError::TargetVanished(e.to_string()))?;
    world.emit(GameEvent::Watered {
        actor,
        resource,
        growth_complete_tick,
    });
    Ok(())
}

/// Start climbing an unconscious behemoth.
pub fn execute_climb(
    world: &mut WorldState,
    actor: ActorId,
    behemoth_id: BehemothId,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    if !world.behemoths.contains_key(&behemoth_id) {
        return Err(AgentError::TargetVanished(format!(
            "behemoth {behemoth_id} is gone"
        )));
    }
    behemoth::start_climb(world, actor, behemoth_id, rules)
}

/// Move an item from the inventory into its slot. A displaced item goes
/// back into the inventory.
pub fn execute_equip(world: &mut WorldState, actor: ActorId, item: Item) -> Result<(), AgentError> {
    let slot = item
        .slot()
        .ok_or_else(|| AgentError::TargetVanished(format!("{item:?} cannot be equipped")))?;
    let a = actor_mut(world, actor)?;
    inventory::remove_item(&mut a.inventory, item, 1)?;
    if let Some(previous) = a.equipment.replace(slot, item) {
        inventory::add_item(&mut a.inventory, previous, 1)?;
    }
    world.emit(GameEvent::Equipped { actor, item });
    Ok(())
}

/// Spend materials to place a structure.
pub fn execute_build(
    world: &mut WorldState,
    actor: ActorId,
    kind: StructureKind,
    pos: Position,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let (item, qty) = rules.build.cost(kind);
    let a = actor_mut(world, actor)?;
    inventory::remove_item(&mut a.inventory, item, qty)?;
    let alliance = a.alliance;
    let id = StructureId::new();
    world.add_structure(Structure {
        id,
        kind,
        position: pos,
        owner: actor,
        alliance,
    })?;
    debug!(structure = %id, ?kind, owner = %actor, "structure built");
    world.emit(GameEvent::StructureBuilt {
        structure: id,
        owner: actor,
        kind,
    });
    Ok(())
}

/// Join an alliance that still exists.
pub fn execute_join(
    world: &mut WorldState,
    actor: ActorId,
    alliance_id: AllianceId,
) -> Result<(), AgentError> {
    alliance::join_alliance(world, actor, alliance_id)
}

/// Append a message to this tick's chat buffer.
pub fn execute_chat(
    world: &mut WorldState,
    actor: ActorId,
    message: &str,
) -> Result<(), AgentError> {
    let tick = world.tick();
    let name = world
        .actors
        .get(&actor)
        .map(|a| a.name.clone())
        .ok_or(AgentError::ActorNotFound(actor))?;
    world.chat.push(ChatMessage {
        actor,
        name,
        message: String::from(message.trim()),
        tick,
    });
    Ok(())
}

/// Clear destination, jobs and the actor's own combat pair.
pub fn execute_stop(world: &mut WorldState, actor: ActorId) -> Result<(), AgentError> {
    combat::end_attack(world, CombatantRef::Actor(actor));
    let a = actor_mut(world, actor)?;
    a.destination = None;
    if a.status != ActorStatus::Dead {
        a.status = ActorStatus::Idle;
    }
    Ok(())
}
