//! Tick cycle: the fixed-order pipeline that drives the Frontier simulation.
//!
//! Each tick runs these phases in order:
//!
//! 1. **Wake** -- advance the clock, clear the event and chat buffers, purge
//!    finished trades and inactive combat pairs.
//! 2. **Intake** -- drain the [`CommandQueue`], decoding raw commands.
//! 3. **Validation** -- check every command against the state at the start
//!    of the phase.
//! 4. **Execution** -- apply accepted commands in ascending actor order. A
//!    command whose target vanished in the meantime is moved to the rejected
//!    list with `TargetVanished`.
//! 5. **Continuous effects** -- movement, gathering, sapling growth,
//!    crafting completion, trade expiry, NPC AI, behemoths, combat,
//!    respawns, population balancing.
//! 6. **Diff** -- compare tracked fields against the pre-tick capture.
//!
//! The cycle is deterministic given the same initial state and commands:
//! every random draw comes from a generator seeded by `(world seed, tick)`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use frontier_agents::{
    AgentError, NpcConfig, RulesConfig, actions, behemoth, combat, crafting, death, movement,
    npc, trade,
};
use frontier_types::{AcceptedCommand, RejectedCommand, Rejection, RejectionReason, TickResult};
use frontier_world::{WorldError, WorldState, resource, rng};

use crate::changes::TrackedState;
use crate::queue::{CommandQueue, QueuedCommand};

/// Errors that abort a tick.
///
/// Rule violations and vanished targets never surface here; they end up in
/// the tick's rejected list.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A world operation failed (in practice: the tick counter overflowed).
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A sub-processor hit an arithmetic failure.
    #[error("{phase} failed: {source}")]
    Phase {
        /// The phase that failed.
        phase: &'static str,
        /// The underlying agent error.
        source: AgentError,
    },
}

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug)]
pub struct Simulation {
    /// The authoritative world.
    pub world: WorldState,
    /// Commands waiting for the next tick.
    pub queue: CommandQueue,
    /// Game rules.
    pub rules: RulesConfig,
    /// NPC tuning.
    pub npc: NpcConfig,
}

impl Simulation {
    /// Bundle a world with its rules and an empty queue.
    pub const fn new(
        world: WorldState,
        rules: RulesConfig,
        npc: NpcConfig,
        max_command_age_ticks: u64,
    ) -> Self {
        Self {
            world,
            queue: CommandQueue::new(max_command_age_ticks),
            rules,
            npc,
        }
    }
}

/// Execute one complete tick of the simulation.
pub fn run_tick(sim: &mut Simulation) -> Result<TickResult, TickError> {
    let before = TrackedState::capture(&sim.world);

    // --- Wake ---
    let tick = sim.world.begin_tick()?;
    debug!(tick, "tick started");

    // --- Intake ---
    let commands = sim.queue.drain(tick);

    // --- Validation ---
    let (valid, mut rejected) = validate_all(&sim.world, &sim.rules, commands);

    // --- Execution ---
    let mut accepted = Vec::with_capacity(valid.len());
    for QueuedCommand { actor, command } in valid {
        let kind = command.kind();
        match actions::execute_command(&mut sim.world, actor, &command, &sim.rules) {
            Ok(()) => accepted.push(AcceptedCommand { actor, kind }),
            Err(err) => {
                warn!(tick, actor = %actor, ?kind, error = %err, "command target vanished");
                rejected.push(RejectedCommand {
                    actor,
                    kind,
                    rejection: Rejection::new(RejectionReason::TargetVanished, err.to_string()),
                });
            }
        }
    }

    // --- Continuous effects ---
    advance_continuous(sim)?;

    // --- Diff ---
    let changes = before.diff(&TrackedState::capture(&sim.world));

    info!(
        tick,
        accepted = accepted.len(),
        rejected = rejected.len(),
        events = sim.world.events.len(),
        changes = changes.len(),
        "tick complete"
    );

    Ok(TickResult {
        tick,
        accepted,
        rejected,
        events: sim.world.events.clone(),
        changes,
        chat: sim.world.chat.clone(),
    })
}

/// Split drained commands into those that pass validation and rejections.
fn validate_all(
    world: &WorldState,
    rules: &RulesConfig,
    commands: Vec<QueuedCommand>,
) -> (Vec<QueuedCommand>, Vec<RejectedCommand>) {
    let mut valid = Vec::with_capacity(commands.len());
    let mut rejected = Vec::new();
    for queued in commands {
        match actions::validate(queued.actor, &queued.command, world, rules) {
            Ok(()) => valid.push(queued),
            Err(rejection) => {
                debug!(
                    actor = %queued.actor,
                    kind = ?queued.command.kind(),
                    reason = ?rejection.reason,
                    message = %rejection.message,
                    "command rejected"
                );
                rejected.push(RejectedCommand {
                    actor: queued.actor,
                    kind: queued.command.kind(),
                    rejection,
                });
            }
        }
    }
    (valid, rejected)
}

/// Every per-tick sub-processor, in pipeline order.
fn advance_continuous(sim: &mut Simulation) -> Result<(), TickError> {
    let world = &mut sim.world;
    let rules = &sim.rules;
    let mut rng = StdRng::seed_from_u64(rng::tick_seed(world.seed(), world.tick()));

    movement::advance_movement(world, &rules.speeds);
    resource::process_gathering(world, &rules.resources);
    resource::process_saplings(world, &rules.resources);
    crafting::process_crafting(world).map_err(|source| TickError::Phase {
        phase: "crafting",
        source,
    })?;
    trade::expire_trades(world, rules);
    npc::update_npcs(world, &sim.npc, rules.speeds.npc, &mut rng);
    behemoth::process_behemoths(world, rules).map_err(|source| TickError::Phase {
        phase: "behemoths",
        source,
    })?;
    combat::resolve_combat(world, rules).map_err(|source| TickError::Phase {
        phase: "combat",
        source,
    })?;
    death::process_respawns(world);
    let spawned =
        npc::balance_population(world, &sim.npc, &mut rng).map_err(|source| TickError::Phase {
            phase: "population balancing",
            source,
        })?;
    if !spawned.is_empty() {
        info!(tick = world.tick(), count = spawned.len(), "monsters spawned");
    }
    Ok(())
}
