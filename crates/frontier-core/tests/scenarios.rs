//! End-to-end tick pipeline scenarios.
#![allow(clippy::unwrap_used)]

use serde_json::{Value, json};

use frontier_agents::{NpcConfig, RulesConfig};
use frontier_core::{Simulation, run_tick};
use frontier_types::{
    ActorId, ActorStatus, EntityRef, GameEvent, Item, Position, RawCommand, RejectionReason,
    ResourceId, ResourceKind, ResourceNode, ResourceState, Role, TickResult, TradeStatus,
};
use frontier_world::{WorldSettings, WorldState};

struct Harness {
    sim: Simulation,
}

impl Harness {
    fn new(npc: NpcConfig) -> Self {
        let world = WorldState::new(11, WorldSettings::default()).unwrap();
        Self {
            sim: Simulation::new(world, RulesConfig::default(), npc, 5),
        }
    }

    fn quiet() -> Self {
        Self::new(NpcConfig {
            danger_zones: Vec::new(),
            ..NpcConfig::default()
        })
    }

    fn spawn(&mut self, role: Role) -> ActorId {
        self.sim.world.spawn_actor(format!("{role:?}"), role)
    }

    fn submit(&mut self, actor: ActorId, kind: &str, params: Value) {
        let tick = self.sim.world.tick();
        self.sim.queue.enqueue(
            actor,
            RawCommand {
                kind: String::from(kind),
                params,
                submitted_tick: tick,
            },
            tick,
        );
    }

    fn step(&mut self) -> TickResult {
        run_tick(&mut self.sim).unwrap()
    }

    fn run(&mut self, ticks: u64) -> Vec<TickResult> {
        (0..ticks).map(|_| self.step()).collect()
    }

    fn plant_tree(&mut self, x: f64, y: f64) -> ResourceId {
        let id = ResourceId::new();
        self.sim
            .world
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
}

#[test]
fn move_reaches_destination_in_five_ticks() {
    let mut h = Harness::quiet();
    let id = h.spawn(Role::Woodcutter);
    h.sim
        .world
        .move_actor(id, Position::new(100.0, 100.0))
        .unwrap();
    h.submit(id, "move", json!({"x": 120.0, "y": 100.0}));

    h.run(4);
    assert_eq!(h.sim.world.actors[&id].status, ActorStatus::Moving);

    h.step();
    let actor = &h.sim.world.actors[&id];
    assert!((actor.position.x - 120.0).abs() < f64::EPSILON);
    assert!((actor.position.y - 100.0).abs() < f64::EPSILON);
    assert_eq!(actor.status, ActorStatus::Idle);
    assert_eq!(actor.destination, None);
}

#[test]
fn tree_yields_five_logs_over_fifteen_ticks() {
    let mut h = Harness::quiet();
    let id = h.spawn(Role::Woodcutter);
    let tree = ResourceNode {
        id: ResourceId::new(),
        kind: ResourceKind::Tree,
        position: Position::new(1010.0, 1000.0),
        remaining: 5,
        capacity: 5,
        state: ResourceState::Available,
        growth_complete_tick: None,
    };
    let tree_id = tree.id;
    h.sim.world.add_resource(tree).unwrap();
    h.submit(id, "gather", json!({"resource_id": tree_id.to_string()}));

    h.run(14);
    assert_eq!(h.sim.world.actors[&id].item_count(Item::Log), 4);

    h.step();
    assert_eq!(h.sim.world.actors[&id].item_count(Item::Log), 5);
    let node = &h.sim.world.resources[&tree_id];
    assert_eq!(node.remaining, 0);
    assert_eq!(node.state, ResourceState::Depleted);
    assert!(!h.sim.world.gather_jobs.contains_key(&id));
}

#[test]
fn gather_race_loser_keeps_its_old_job() {
    let mut h = Harness::quiet();
    let a = h.spawn(Role::Woodcutter);
    let b = h.spawn(Role::Woodcutter);
    let own_a = h.plant_tree(1010.0, 1000.0);
    let own_b = h.plant_tree(990.0, 1000.0);
    let contested = h.plant_tree(1000.0, 1010.0);
    h.submit(a, "gather", json!({"resource_id": own_a.to_string()}));
    h.submit(b, "gather", json!({"resource_id": own_b.to_string()}));
    let first = h.step();
    assert_eq!(first.accepted.len(), 2);

    h.submit(a, "gather", json!({"resource_id": contested.to_string()}));
    h.submit(b, "gather", json!({"resource_id": contested.to_string()}));
    let result = h.step();

    assert_eq!(result.accepted.len(), 1);
    assert_eq!(result.rejected.len(), 1);
    let lost = result.rejected.first().unwrap();
    assert_eq!(lost.rejection.reason, RejectionReason::TargetVanished);
    let (winner, loser, loser_tree) = if lost.actor == a {
        (b, a, own_a)
    } else {
        (a, b, own_b)
    };

    let world = &h.sim.world;
    assert_eq!(world.gather_jobs[&winner].resource, contested);
    assert_eq!(world.gather_jobs[&loser].resource, loser_tree);
    assert_eq!(world.resources[&loser_tree].state, ResourceState::BeingGathered);
    assert_eq!(world.resources[&contested].state, ResourceState::BeingGathered);
    assert_eq!(world.actors[&loser].status, ActorStatus::Gathering);
}

#[test]
fn trade_expires_after_window() {
    let mut h = Harness::quiet();
    let a = h.spawn(Role::Woodcutter);
    let b = h.spawn(Role::Miner);
    h.sim
        .world
        .actors
        .get_mut(&a)
        .unwrap()
        .inventory
        .insert(Item::Log, 2);
    h.submit(
        a,
        "trade_propose",
        json!({
            "target_id": b.to_string(),
            "offer_items": [{"item": "log", "quantity": 2}],
            "request_gold": 3
        }),
    );

    let first = h.step();
    assert_eq!(first.tick, 1);
    let trade_id = first
        .events
        .iter()
        .find_map(|e| match e {
            GameEvent::TradeProposed { trade, .. } => Some(*trade),
            _ => None,
        })
        .unwrap();

    h.run(29);
    assert_eq!(h.sim.world.tick(), 30);
    assert_eq!(h.sim.world.trades[&trade_id].status, TradeStatus::Pending);

    let expiry = h.step();
    assert_eq!(h.sim.world.trades[&trade_id].status, TradeStatus::Expired);
    assert!(
        expiry
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::TradeExpired { trade } if *trade == trade_id))
    );
    // Offered logs were never taken.
    assert_eq!(h.sim.world.actors[&a].item_count(Item::Log), 2);

    h.step();
    assert!(!h.sim.world.trades.contains_key(&trade_id));
}

#[test]
fn accepted_trade_swaps_exactly_the_committed_goods() {
    let mut h = Harness::quiet();
    let a = h.spawn(Role::Woodcutter);
    let b = h.spawn(Role::Miner);
    h.sim.world.actors.get_mut(&a).unwrap().inventory.insert(Item::Log, 3);
    h.sim.world.actors.get_mut(&b).unwrap().gold = 10;
    h.submit(
        a,
        "trade_propose",
        json!({
            "target_id": b.to_string(),
            "offer_items": [{"item": "log", "quantity": 2}],
            "request_gold": 4
        }),
    );
    let trade_id = h
        .step()
        .events
        .iter()
        .find_map(|e| match e {
            GameEvent::TradeProposed { trade, .. } => Some(*trade),
            _ => None,
        })
        .unwrap();

    h.submit(
        b,
        "trade_respond",
        json!({"trade_id": trade_id.to_string(), "accept": true}),
    );
    let result = h.step();
    assert!(
        result
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::TradeAccepted { .. }))
    );

    let (pa, pb) = (&h.sim.world.actors[&a], &h.sim.world.actors[&b]);
    assert_eq!(pa.item_count(Item::Log), 1);
    assert_eq!(pb.item_count(Item::Log), 2);
    assert_eq!(pa.gold, 4);
    assert_eq!(pb.gold, 6);
    assert!(!h.sim.world.trades.contains_key(&trade_id));
}

#[test]
fn insufficient_craft_changes_nothing() {
    let mut h = Harness::quiet();
    let id = h.spawn(Role::Woodcutter);
    h.sim.world.actors.get_mut(&id).unwrap().inventory.insert(Item::Log, 1);
    h.submit(id, "craft", json!({"recipe_id": "plank"}));

    let result = h.step();
    assert_eq!(result.rejected.len(), 1);
    assert_eq!(h.sim.world.actors[&id].item_count(Item::Log), 1);
    assert!(h.sim.world.crafting_jobs.is_empty());
}

#[test]
fn monster_evolves_once_on_third_kill_and_stays_dead_forever() {
    let mut h = Harness::quiet();
    let monster = h.spawn(Role::Monster);
    let victim = h.spawn(Role::Woodcutter);
    h.sim.world.actors.get_mut(&monster).unwrap().kills = 2;
    h.sim.world.actors.get_mut(&victim).unwrap().stats.health = 5;

    h.submit(
        monster,
        "attack",
        json!({"target": {"actor": victim.to_string()}}),
    );
    let results = h.run(3);

    let evolutions = results
        .iter()
        .flat_map(|r| r.events.iter())
        .filter(|e| matches!(e, GameEvent::Evolved { actor, .. } if *actor == monster))
        .count();
    assert_eq!(evolutions, 1);

    let m = &h.sim.world.actors[&monster];
    assert_eq!(m.kills, 3);
    assert_eq!(m.evolution_stage, 1);
    assert_eq!(m.stats.health, m.stats.max_health);
    assert!(m.stats.max_health > m.stats.base_max_health);
    assert_eq!(h.sim.world.actors[&victim].status, ActorStatus::Dead);

    // A miner now kills the evolved monster; it never comes back.
    let miner = h.spawn(Role::Miner);
    h.sim.world.actors.get_mut(&monster).unwrap().stats.health = 1;
    h.submit(
        miner,
        "attack",
        json!({"target": {"actor": monster.to_string()}}),
    );
    h.run(60);

    let m = &h.sim.world.actors[&monster];
    assert_eq!(m.status, ActorStatus::Dead);
    assert_eq!(m.respawn_tick, None);
    assert_eq!(m.evolution_stage, 1);
    assert!(
        !h.sim
            .world
            .entities_near(m.position, 1.0)
            .contains(&EntityRef::Actor(monster))
    );
    // The woodcutter respawned long ago.
    assert_ne!(h.sim.world.actors[&victim].status, ActorStatus::Dead);
}

#[test]
fn long_run_keeps_world_invariants() {
    let mut h = Harness::new(NpcConfig::default());
    let ids: Vec<ActorId> = [Role::Woodcutter, Role::Miner, Role::Miner]
        .into_iter()
        .map(|role| h.spawn(role))
        .collect();
    for (n, id) in ids.iter().enumerate() {
        let x = if n % 2 == 0 { 1999.0 } else { 0.0 };
        h.submit(*id, "move", json!({"x": x, "y": 1999.0}));
    }

    let size = h.sim.world.world_size();
    for _ in 0..200 {
        h.step();
        for a in h.sim.world.actors.values() {
            assert!(a.position.in_bounds(size), "{a:?} out of bounds");
        }
        for m in h.sim.world.monsters.values() {
            assert!(m.position.in_bounds(size), "{m:?} out of bounds");
        }
        for r in h.sim.world.resources.values() {
            assert!(r.remaining <= r.capacity);
        }
        let attackers: Vec<_> = h
            .sim
            .world
            .combat_pairs
            .values()
            .filter(|p| p.active)
            .map(|p| p.attacker)
            .collect();
        let mut unique = attackers.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(attackers.len(), unique.len());
    }
    assert!(!h.sim.world.monsters.is_empty());
}
