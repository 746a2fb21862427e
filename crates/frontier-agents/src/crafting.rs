//! Crafting recipes and timed crafting jobs.
//!
//! Defines the static recipe table mapping recipe ids to their input
//! materials, gold cost, output item and duration. Starting a craft consumes
//! every input at once (or nothing); the output is delivered when the job's
//! completion tick arrives.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use frontier_types::{ActorId, ActorStatus, CraftJobId, CraftingJob, GameEvent, Item, TradeBundle};
use frontier_world::WorldState;

use crate::error::AgentError;
use crate::inventory;

// ---------------------------------------------------------------------------
// CraftRecipe
// ---------------------------------------------------------------------------

/// A single crafting recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftRecipe {
    /// Recipe identifier used by the `craft` command.
    pub id: &'static str,
    /// Input materials consumed (item -> quantity).
    pub inputs: BTreeMap<Item, u32>,
    /// Gold consumed.
    pub gold: u32,
    /// The item produced.
    pub output: Item,
    /// Ticks from start to completion.
    pub ticks: u64,
}

impl CraftRecipe {
    /// Everything the crafter pays, as a bundle.
    pub fn cost(&self) -> TradeBundle {
        TradeBundle {
            items: self.inputs.clone(),
            gold: self.gold,
        }
    }
}

// ---------------------------------------------------------------------------
// Recipe Table
// ---------------------------------------------------------------------------

/// Look up a recipe by id.
///
/// - `plank`: 2 log, 2 ticks
/// - `axe`: 2 plank + 1 log, 4 ticks
/// - `pickaxe`: 2 plank + 2 log, 4 ticks
/// - `sword`: 2 plank + 3 ore + 10 gold, 6 ticks
/// - `armor`: 4 plank + 5 ore + 20 gold, 8 ticks
pub fn recipe_for(id: &str) -> Option<CraftRecipe> {
    let (id, inputs, gold, output, ticks) = match id {
        "plank" => ("plank", vec![(Item::Log, 2)], 0, Item::Plank, 2),
        "axe" => ("axe", vec![(Item::Plank, 2), (Item::Log, 1)], 0, Item::Axe, 4),
        "pickaxe" => (
            "pickaxe",
            vec![(Item::Plank, 2), (Item::Log, 2)],
            0,
            Item::Pickaxe,
            4,
        ),
        "sword" => (
            "sword",
            vec![(Item::Plank, 2), (Item::Ore, 3)],
            10,
            Item::Sword,
            6,
        ),
        "armor" => (
            "armor",
            vec![(Item::Plank, 4), (Item::Ore, 5)],
            20,
            Item::Armor,
            8,
        ),
        _ => return None,
    };
    Some(CraftRecipe {
        id,
        inputs: inputs.into_iter().collect(),
        gold,
        output,
        ticks,
    })
}

/// Every valid recipe id.
pub const fn recipe_ids() -> &'static [&'static str] {
    &["plank", "axe", "pickaxe", "sword", "armor"]
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Consume the recipe inputs and enqueue a crafting job.
///
/// Ingredients are re-checked before anything is consumed; on a shortfall
/// the inventory is untouched and no job is created.
pub fn start_craft(
    world: &mut WorldState,
    actor: ActorId,
    recipe_id: &str,
) -> Result<CraftJobId, AgentError> {
    let recipe =
        recipe_for(recipe_id).ok_or_else(|| AgentError::UnknownRecipe(String::from(recipe_id)))?;
    let tick = world.tick();
    let complete_tick = tick
        .checked_add(recipe.ticks)
        .ok_or_else(|| AgentError::overflow("craft completion tick overflow"))?;

    let crafter = world
        .actors
        .get_mut(&actor)
        .ok_or(AgentError::ActorNotFound(actor))?;
    inventory::remove_bundle(crafter, &recipe.cost())?;
    crafter.status = ActorStatus::Crafting;
    crafter.destination = None;
    world.release_jobs(actor);

    let id = CraftJobId::new();
    world.crafting_jobs.insert(
        id,
        CraftingJob {
            id,
            owner: actor,
            recipe_id: String::from(recipe.id),
            start_tick: tick,
            complete_tick,
        },
    );
    debug!(actor = %actor, recipe = recipe.id, complete_tick, "craft started");
    world.emit(GameEvent::CraftStarted {
        actor,
        recipe_id: String::from(recipe.id),
        complete_tick,
    });
    Ok(id)
}

/// Deliver every job whose completion tick has arrived.
///
/// Jobs whose owner is gone or whose recipe is unknown are discarded.
pub fn process_crafting(world: &mut WorldState) -> Result<(), AgentError> {
    let tick = world.tick();
    let due: Vec<CraftJobId> = world
        .crafting_jobs
        .values()
        .filter(|j| j.complete_tick <= tick)
        .map(|j| j.id)
        .collect();

    for id in due {
        let Some(job) = world.crafting_jobs.remove(&id) else {
            continue;
        };
        let Some(recipe) = recipe_for(&job.recipe_id) else {
            warn!(job = %id, recipe = %job.recipe_id, "discarding job with unknown recipe");
            continue;
        };
        let busy = world
            .crafting_jobs
            .values()
            .any(|j| j.owner == job.owner);
        let Some(owner) = world.actors.get_mut(&job.owner) else {
            warn!(job = %id, owner = %job.owner, "discarding job with missing owner");
            continue;
        };
        inventory::add_item(&mut owner.inventory, recipe.output, 1)?;
        if !busy && owner.status == ActorStatus::Crafting {
            owner.status = ActorStatus::Idle;
        }
        world.emit(GameEvent::CraftCompleted {
            actor: job.owner,
            recipe_id: job.recipe_id,
            output: recipe.output,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
