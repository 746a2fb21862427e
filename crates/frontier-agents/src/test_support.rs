//! Shared fixtures for unit tests in this crate.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use frontier_types::{
    Actor, ActorId, ActorStatus, Behemoth, BehemothId, BehemothStatus, Equipment, Position, Role,
};
use frontier_world::{WorldSettings, WorldState, starting_stats};

/// A living, connected actor at `pos` with an empty inventory.
pub fn make_actor(role: Role, pos: Position) -> Actor {
    Actor {
        id: ActorId::new(),
        name: String::from("test"),
        role,
        position: pos,
        destination: None,
        status: ActorStatus::Idle,
        stats: starting_stats(role),
        gold: 0,
        inventory: BTreeMap::new(),
        equipment: Equipment::default(),
        alliance: None,
        kills: 0,
        eats: 0,
        evolution_stage: 0,
        cooldown_until: 0,
        respawn_tick: None,
        connected: true,
        eaten: false,
    }
}

/// An empty default-sized world advanced to tick 1.
pub fn make_world() -> WorldState {
    let mut world = WorldState::new(42, WorldSettings::default()).unwrap();
    world.begin_tick().unwrap();
    world
}

/// Register a fresh actor at `(x, y)` and return its id.
pub fn put_actor(world: &mut WorldState, role: Role, x: f64, y: f64) -> ActorId {
    let actor = make_actor(role, Position::new(x, y));
    let id = actor.id;
    world.add_actor(actor).unwrap();
    id
}

/// Register a roaming behemoth at `(x, y)` with a two-point route.
pub fn put_behemoth(world: &mut WorldState, x: f64, y: f64) -> BehemothId {
    let id = BehemothId::new();
    world
        .add_behemoth(Behemoth {
            id,
            position: Position::new(x, y),
            status: BehemothStatus::Roaming,
            health: 200,
            max_health: 200,
            ore: 20,
            max_ore: 50,
            fed: 0,
            patrol_route: vec![Position::new(x, y), Position::new(x + 100.0, y)],
            waypoint_index: 1,
            status_until: None,
        })
        .unwrap();
    id
}
