//! Resource progression: gathering cycles, depletion, seed drops and
//! sapling growth.
//!
//! Each gathering actor holds one [`GatherJob`] with a countdown. The
//! countdown starts on the tick the gather command executes and is
//! decremented in that same tick's continuous phase, so a tree with a
//! 3-tick cycle first yields two ticks after the command.
//!
//! Yields per cycle:
//! - Tree: `tree_yield` logs (default 1) every `tree_cycle_ticks` (3)
//! - Gold vein: `min(vein_yield, remaining)` gold every `vein_cycle_ticks` (5)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use frontier_types::{
    ActorId, ActorStatus, GameEvent, GatherJob, Item, Position, ResourceId, ResourceKind,
    ResourceNode, ResourceState,
};

use crate::error::WorldError;
use crate::rng::resource_roll;
use crate::state::WorldState;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Tunable constants for resource progression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRules {
    /// Ticks per tree yield cycle.
    pub tree_cycle_ticks: u32,
    /// Logs per tree cycle.
    pub tree_yield: u32,
    /// Ticks per gold vein yield cycle.
    pub vein_cycle_ticks: u32,
    /// Maximum gold per vein cycle.
    pub vein_yield: u32,
    /// Maximum distance between a gatherer and its node.
    pub gather_range: f64,
    /// Percent chance a depleted tree drops a seed.
    pub seed_drop_percent: u32,
    /// Ticks from planting to a grown tree.
    pub sapling_growth_ticks: u64,
    /// Ticks one watering takes off the remaining growth time.
    pub water_bonus_ticks: u64,
    /// Capacity of a tree grown from a sapling.
    pub grown_tree_capacity: u32,
}

impl Default for ResourceRules {
    fn default() -> Self {
        Self {
            tree_cycle_ticks: 3,
            tree_yield: 1,
            vein_cycle_ticks: 5,
            vein_yield: 5,
            gather_range: 30.0,
            seed_drop_percent: 30,
            sapling_growth_ticks: 60,
            water_bonus_ticks: 10,
            grown_tree_capacity: 5,
        }
    }
}

impl ResourceRules {
    /// Ticks per yield cycle for a node kind. Saplings never yield.
    pub const fn cycle_ticks(&self, kind: ResourceKind) -> Option<u32> {
        match kind {
            ResourceKind::Tree => Some(self.tree_cycle_ticks),
            ResourceKind::GoldVein => Some(self.vein_cycle_ticks),
            ResourceKind::Sapling => None,
        }
    }

    /// Units one cycle yields from a node with `remaining` units left.
    pub fn cycle_yield(&self, kind: ResourceKind, remaining: u32) -> u32 {
        match kind {
            ResourceKind::Tree => self.tree_yield.min(remaining),
            ResourceKind::GoldVein => self.vein_yield.min(remaining),
            ResourceKind::Sapling => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Gathering
// ---------------------------------------------------------------------------

/// Lock `resource` for `actor` and start a yield countdown.
///
/// Releases any gather or climb job the actor already holds.
///
/// # Errors
///
/// Returns [`WorldError::ResourceNotFound`] if the node is gone and
/// [`WorldError::ActorNotFound`] if the actor is gone.
pub fn start_gathering(
    world: &mut WorldState,
    actor: ActorId,
    resource: ResourceId,
    rules: &ResourceRules,
) -> Result<(), WorldError> {
    if !world.actors.contains_key(&actor) {
        return Err(WorldError::ActorNotFound(actor));
    }
    world.release_jobs(actor);
    let node = world
        .resources
        .get_mut(&resource)
        .ok_or(WorldError::ResourceNotFound(resource))?;
    let countdown = rules.cycle_ticks(node.kind).unwrap_or(0).max(1);
    node.state = ResourceState::BeingGathered;
    world.gather_jobs.insert(
        actor,
        GatherJob {
            actor,
            resource,
            countdown,
        },
    );
    Ok(())
}

/// Why a gather job ended without yielding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interruption {
    ActorGone,
    ResourceGone,
    OutOfRange,
}

/// Advance every gather job by one tick.
///
/// Jobs are processed in gatherer id order. A gatherer that died, moved out
/// of range, or whose node vanished is released without yield.
pub fn process_gathering(world: &mut WorldState, rules: &ResourceRules) {
    let tick = world.tick();
    let seed = world.seed();
    let actors: Vec<ActorId> = world.gather_jobs.keys().copied().collect();

    for actor_id in actors {
        let Some(job) = world.gather_jobs.get(&actor_id).copied() else {
            continue;
        };

        if let Some(why) = check_gatherer(world, &job, rules) {
            debug!(actor = %actor_id, resource = %job.resource, ?why, "gather interrupted");
            world.release_gather(actor_id);
            if let Some(actor) = world.actors.get_mut(&actor_id)
                && actor.is_alive()
            {
                actor.status = ActorStatus::Idle;
            }
            continue;
        }

        let countdown = job.countdown.saturating_sub(1);
        if countdown > 0 {
            if let Some(j) = world.gather_jobs.get_mut(&actor_id) {
                j.countdown = countdown;
            }
            continue;
        }

        complete_cycle(world, job, rules, tick, seed);
    }
}

fn check_gatherer(
    world: &WorldState,
    job: &GatherJob,
    rules: &ResourceRules,
) -> Option<Interruption> {
    let Some(actor) = world.actors.get(&job.actor).filter(|a| a.is_alive()) else {
        return Some(Interruption::ActorGone);
    };
    let Some(node) = world.resources.get(&job.resource) else {
        return Some(Interruption::ResourceGone);
    };
    if node.state != ResourceState::BeingGathered {
        return Some(Interruption::ResourceGone);
    }
    if actor.position.distance_to(node.position) > rules.gather_range {
        return Some(Interruption::OutOfRange);
    }
    None
}

/// Yield one cycle to the gatherer; deplete and roll for a seed if empty.
fn complete_cycle(
    world: &mut WorldState,
    job: GatherJob,
    rules: &ResourceRules,
    tick: u64,
    seed: u64,
) {
    let Some(node) = world.resources.get_mut(&job.resource) else {
        return;
    };
    let kind = node.kind;
    let amount = rules.cycle_yield(kind, node.remaining);
    node.remaining = node.remaining.saturating_sub(amount);
    let depleted = node.remaining == 0;
    let next_countdown = rules.cycle_ticks(kind).unwrap_or(1).max(1);
    if depleted {
        node.state = ResourceState::Depleted;
    }

    let Some(actor) = world.actors.get_mut(&job.actor) else {
        warn!(actor = %job.actor, "gatherer vanished mid-cycle");
        return;
    };
    match kind {
        ResourceKind::Tree => add_item(&mut actor.inventory, Item::Log, amount),
        ResourceKind::GoldVein => actor.gold = actor.gold.saturating_add(amount),
        ResourceKind::Sapling => {}
    }
    world.emit(GameEvent::Gathered {
        actor: job.actor,
        resource: job.resource,
        kind,
        amount,
    });

    if !depleted {
        if let Some(j) = world.gather_jobs.get_mut(&job.actor) {
            j.countdown = next_countdown;
        }
        return;
    }

    world.gather_jobs.remove(&job.actor);
    if let Some(actor) = world.actors.get_mut(&job.actor) {
        actor.status = ActorStatus::Idle;
    }
    world.emit(GameEvent::ResourceDepleted {
        resource: job.resource,
    });

    let roll = resource_roll(job.resource, tick, seed);
    if kind == ResourceKind::Tree && roll < rules.seed_drop_percent {
        if let Some(actor) = world.actors.get_mut(&job.actor) {
            add_item(&mut actor.inventory, Item::Seed, 1);
        }
        world.emit(GameEvent::SeedDropped {
            actor: job.actor,
            resource: job.resource,
        });
    }
}

fn add_item(inventory: &mut BTreeMap<Item, u32>, item: Item, qty: u32) {
    if qty == 0 {
        return;
    }
    let entry = inventory.entry(item).or_insert(0);
    *entry = entry.saturating_add(qty);
}

// ---------------------------------------------------------------------------
// Saplings
// ---------------------------------------------------------------------------

/// Plant a sapling at `pos` that grows after the configured delay.
///
/// # Errors
///
/// Returns [`WorldError::ArithmeticOverflow`] if the growth tick overflows.
pub fn plant_sapling(
    world: &mut WorldState,
    pos: Position,
    rules: &ResourceRules,
) -> Result<ResourceId, WorldError> {
    let complete = world
        .tick()
        .checked_add(rules.sapling_growth_ticks)
        .ok_or(WorldError::ArithmeticOverflow)?;
    let id = ResourceId::new();
    world.add_resource(ResourceNode {
        id,
        kind: ResourceKind::Sapling,
        position: pos,
        remaining: 0,
        capacity: rules.grown_tree_capacity,
        state: ResourceState::Growing,
        growth_complete_tick: Some(complete),
    })?;
    Ok(id)
}

/// Pull a sapling's growth tick earlier by the water bonus, never earlier
/// than the next tick. Returns the new growth tick.
///
/// # Errors
///
/// Returns [`WorldError::ResourceNotFound`] if the node is missing or not a
/// growing sapling.
pub fn water_sapling(
    world: &mut WorldState,
    id: ResourceId,
    rules: &ResourceRules,
) -> Result<u64, WorldError> {
    let next_tick = world.tick().saturating_add(1);
    let node = world
        .resources
        .get_mut(&id)
        .filter(|n| n.kind == ResourceKind::Sapling && n.state == ResourceState::Growing)
        .ok_or(WorldError::ResourceNotFound(id))?;
    let current = node.growth_complete_tick.unwrap_or(next_tick);
    let pulled = current.saturating_sub(rules.water_bonus_ticks).max(next_tick);
    node.growth_complete_tick = Some(pulled);
    Ok(pulled)
}

/// Turn every sapling whose growth tick has arrived into an available tree.
pub fn process_saplings(world: &mut WorldState, rules: &ResourceRules) {
    let tick = world.tick();
    let mut grown = Vec::new();
    for node in world.resources.values_mut() {
        let ready = node.kind == ResourceKind::Sapling
            && node.state == ResourceState::Growing
            && node.growth_complete_tick.is_some_and(|t| t <= tick);
        if ready {
            node.kind = ResourceKind::Tree;
            node.state = ResourceState::Available;
            node.capacity = rules.grown_tree_capacity;
            node.remaining = rules.grown_tree_capacity;
            node.growth_complete_tick = None;
            grown.push(node.id);
        }
    }
    for resource in grown {
        world.emit(GameEvent::SaplingGrown { resource });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_types::Role;

    use super::*;
    use crate::state::WorldSettings;

    fn make_world() -> WorldState {
        WorldState::new(11, WorldSettings::default()).unwrap()
    }

    fn make_node(world: &mut WorldState, kind: ResourceKind, remaining: u32) -> ResourceId {
        let id = ResourceId::new();
        world
            .add_resource(ResourceNode {
                id,
                kind,
                position: Position::new(1005.0, 1000.0),
                remaining,
                capacity: remaining,
                state: ResourceState::Available,
                growth_complete_tick: None,
            })
            .unwrap();
        id
    }

    fn run_ticks(world: &mut WorldState, rules: &ResourceRules, n: u32) {
        for _ in 0..n {
            world.begin_tick().unwrap();
            process_gathering(world, rules);
        }
    }

    #[test]
    fn tree_yields_one_log_per_cycle() {
        let rules = ResourceRules::default();
        let mut world = make_world();
        let actor = world.spawn_actor("wood", Role::Woodcutter);
        let tree = make_node(&mut world, ResourceKind::Tree, 5);
        world.begin_tick().unwrap();
        start_gathering(&mut world, actor, tree, &rules).unwrap();
        process_gathering(&mut world, &rules);
        // tick 1 -> countdown 2; yields at ticks 3, 6, 9, 12, 15
        run_ticks(&mut world, &rules, 13);
        assert_eq!(world.actors.get(&actor).unwrap().item_count(Item::Log), 4);
        run_ticks(&mut world, &rules, 1);
        let node = world.resources.get(&tree).unwrap();
        assert_eq!(node.remaining, 0);
        assert_eq!(node.state, ResourceState::Depleted);
        assert_eq!(world.actors.get(&actor).unwrap().item_count(Item::Log), 5);
        assert!(world.gather_jobs.is_empty());
    }

    #[test]
    fn vein_yields_up_to_five_gold() {
        let rules = ResourceRules::default();
        let mut world = make_world();
        let actor = world.spawn_actor("dig", Role::Miner);
        let vein = make_node(&mut world, ResourceKind::GoldVein, 7);
        world.begin_tick().unwrap();
        start_gathering(&mut world, actor, vein, &rules).unwrap();
        process_gathering(&mut world, &rules);
        run_ticks(&mut world, &rules, 4);
        assert_eq!(world.actors.get(&actor).unwrap().gold, 5);
        run_ticks(&mut world, &rules, 5);
        assert_eq!(world.actors.get(&actor).unwrap().gold, 7);
        assert_eq!(
            world.resources.get(&vein).unwrap().state,
            ResourceState::Depleted
        );
    }

    #[test]
    fn out_of_range_gatherer_released_without_yield() {
        let rules = ResourceRules::default();
        let mut world = make_world();
        let actor = world.spawn_actor("roam", Role::Woodcutter);
        let tree = make_node(&mut world, ResourceKind::Tree, 5);
        world.begin_tick().unwrap();
        start_gathering(&mut world, actor, tree, &rules).unwrap();
        world.move_actor(actor, Position::new(1500.0, 1500.0));
        process_gathering(&mut world, &rules);
        assert!(world.gather_jobs.is_empty());
        assert_eq!(
            world.resources.get(&tree).unwrap().state,
            ResourceState::Available
        );
        assert_eq!(world.actors.get(&actor).unwrap().status, ActorStatus::Idle);
    }

    #[test]
    fn sapling_grows_into_tree() {
        let rules = ResourceRules::default();
        let mut world = make_world();
        world.begin_tick().unwrap();
        let id = plant_sapling(&mut world, Position::new(10.0, 10.0), &rules).unwrap();
        assert_eq!(
            world.resources.get(&id).unwrap().growth_complete_tick,
            Some(61)
        );
        for _ in 0..59 {
            world.begin_tick().unwrap();
            process_saplings(&mut world, &rules);
        }
        assert_eq!(world.resources.get(&id).unwrap().kind, ResourceKind::Sapling);
        world.begin_tick().unwrap();
        process_saplings(&mut world, &rules);
        let node = world.resources.get(&id).unwrap();
        assert_eq!(node.kind, ResourceKind::Tree);
        assert_eq!(node.state, ResourceState::Available);
        assert_eq!(node.remaining, 5);
        assert!(matches!(
            world.events.first(),
            Some(GameEvent::SaplingGrown { .. })
        ));
    }

    #[test]
    fn watering_never_pulls_before_next_tick() {
        let rules = ResourceRules::default();
        let mut world = make_world();
        world.begin_tick().unwrap();
        let id = plant_sapling(&mut world, Position::new(10.0, 10.0), &rules).unwrap();
        assert_eq!(water_sapling(&mut world, id, &rules).unwrap(), 51);
        for _ in 0..6 {
            water_sapling(&mut world, id, &rules).unwrap();
        }
        assert_eq!(
            world.resources.get(&id).unwrap().growth_complete_tick,
            Some(2)
        );
    }

    #[test]
    fn water_rejects_non_sapling() {
        let rules = ResourceRules::default();
        let mut world = make_world();
        let tree = make_node(&mut world, ResourceKind::Tree, 3);
        assert!(water_sapling(&mut world, tree, &rules).is_err());
    }

    #[test]
    fn remaining_never_exceeds_capacity() {
        let rules = ResourceRules::default();
        assert_eq!(rules.cycle_yield(ResourceKind::GoldVein, 3), 3);
        assert_eq!(rules.cycle_yield(ResourceKind::Tree, 0), 0);
        assert_eq!(rules.cycle_ticks(ResourceKind::Sapling), None);
    }
}
