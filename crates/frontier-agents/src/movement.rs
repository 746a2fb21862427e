//! Continuous movement of actors toward their destinations.

use frontier_types::{ActorId, ActorStatus, Position};
use frontier_world::WorldState;

use crate::config::SpeedRules;

/// Advance every moving actor by its role speed.
///
/// An actor within one step of its destination snaps onto it, clears the
/// destination and becomes idle.
pub fn advance_movement(world: &mut WorldState, speeds: &SpeedRules) {
    let movers: Vec<(ActorId, Position, Position, f64)> = world
        .actors
        .values()
        .filter(|a| a.status == ActorStatus::Moving)
        .filter_map(|a| {
            a.destination
                .map(|dest| (a.id, a.position, dest, speeds.for_role(a.role)))
        })
        .collect();

    for (id, from, dest, speed) in movers {
        let (next, arrived) = from.step_toward(dest, speed);
        world.move_actor(id, next);
        if arrived && let Some(actor) = world.actors.get_mut(&id) {
            actor.destination = None;
            actor.status = ActorStatus::Idle;
        }
    }
}
