//! Alliance membership.
//!
//! Both sides of the relation are kept in step: the alliance's member set
//! and each member's `alliance` field. An alliance whose last member leaves
//! is disbanded.

use std::collections::BTreeSet;

use tracing::info;

use frontier_types::{ActorId, Alliance, AllianceId, GameEvent};
use frontier_world::WorldState;

use crate::error::AgentError;

/// Whether an alliance with this name exists (case-insensitive).
pub fn name_taken(world: &WorldState, name: &str) -> bool {
    world
        .alliances
        .values()
        .any(|a| a.name.eq_ignore_ascii_case(name))
}

/// Found a new alliance with `founder` as its only member.
pub fn create_alliance(
    world: &mut WorldState,
    founder: ActorId,
    name: &str,
) -> Result<AllianceId, AgentError> {
    if name_taken(world, name) {
        return Err(AgentError::TargetVanished(format!(
            "alliance name {name} was taken"
        )));
    }
    let tick = world.tick();
    let actor = world
        .actors
        .get_mut(&founder)
        .ok_or(AgentError::ActorNotFound(founder))?;
    if actor.alliance.is_some() {
        return Err(AgentError::TargetVanished(String::from(
            "founder joined another alliance",
        )));
    }
    let id = AllianceId::new();
    actor.alliance = Some(id);
    world.alliances.insert(
        id,
        Alliance {
            id,
            name: String::from(name),
            founder,
            members: BTreeSet::from([founder]),
            created_tick: tick,
        },
    );
    info!(alliance = %id, name, founder = %founder, "alliance created");
    world.emit(GameEvent::AllianceCreated {
        alliance: id,
        founder,
        name: String::from(name),
    });
    Ok(id)
}

/// Add `actor` to an existing alliance.
pub fn join_alliance(
    world: &mut WorldState,
    actor: ActorId,
    alliance: AllianceId,
) -> Result<(), AgentError> {
    let member = world
        .actors
        .get_mut(&actor)
        .ok_or(AgentError::ActorNotFound(actor))?;
    if member.alliance.is_some() {
        return Err(AgentError::TargetVanished(String::from(
            "actor already belongs to an alliance",
        )));
    }
    let group = world
        .alliances
        .get_mut(&alliance)
        .ok_or_else(|| AgentError::TargetVanished(format!("alliance {alliance} disbanded")))?;
    group.members.insert(actor);
    member.alliance = Some(alliance);
    world.emit(GameEvent::AllianceJoined { alliance, actor });
    Ok(())
}

/// Remove `actor` from its alliance, disbanding it if it becomes empty.
pub fn leave_alliance(world: &mut WorldState, actor: ActorId) -> Result<(), AgentError> {
    let member = world
        .actors
        .get_mut(&actor)
        .ok_or(AgentError::ActorNotFound(actor))?;
    let alliance = member
        .alliance
        .take()
        .ok_or_else(|| AgentError::TargetVanished(String::from("actor has no alliance")))?;

    let empty = world.alliances.get_mut(&alliance).is_none_or(|group| {
        group.members.remove(&actor);
        group.members.is_empty()
    });
    world.emit(GameEvent::AllianceLeft { alliance, actor });
    if empty && world.alliances.remove(&alliance).is_some() {
        info!(alliance = %alliance, "alliance disbanded");
        world.emit(GameEvent::AllianceDisbanded { alliance });
    }
    Ok(())
}
