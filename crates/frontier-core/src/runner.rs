//! Simulation loop runner.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the tick loop:
//!
//! - **Fixed cadence**: one tick per `tick_interval_ms`, late ticks delayed
//!   rather than bunched
//! - **Asynchronous intake**: commands and registrations arrive on an
//!   unbounded channel and are applied only at tick start, so a mid-tick
//!   arrival takes effect next tick
//! - **Periodic snapshots**: every `snapshot_interval_ticks` a snapshot is
//!   offered to a [`SnapshotSink`], which must not block
//! - **Bounded runs and clean shutdown**: stop after `max_ticks` or when the
//!   shutdown signal flips
//!
//! The runner wraps the single-tick [`run_tick`] function and adds the
//! control plane around it.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use frontier_types::{ActorId, RawCommand, Role, TickResult, WorldSnapshot};
use frontier_world::WorldState;

use crate::tick::{self, Simulation, TickError};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Errors returned to callers of [`CommandSender`].
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The simulation loop has stopped.
    #[error("simulation is not running")]
    Closed,
}

// ---------------------------------------------------------------------------
// Inbound channel
// ---------------------------------------------------------------------------

/// Messages the transport layer sends to the tick loop.
#[derive(Debug)]
pub enum Inbound {
    /// A player command for the next tick.
    Command {
        /// Issuer.
        actor: ActorId,
        /// Undecoded command.
        raw: RawCommand,
    },
    /// Role selection: create an actor at the spawn point.
    Join {
        /// Display name.
        name: String,
        /// Chosen role.
        role: Role,
        /// Receives the new actor's id.
        reply: oneshot::Sender<ActorId>,
    },
    /// A client connected or disconnected.
    SetConnected {
        /// The actor.
        actor: ActorId,
        /// New connection state.
        connected: bool,
    },
}

/// Cloneable handle for submitting work to the tick loop.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Inbound>,
}

/// Receiving side of the inbound channel, owned by the tick loop.
#[derive(Debug)]
pub struct CommandInbox {
    rx: mpsc::UnboundedReceiver<Inbound>,
}

/// Create a connected sender/inbox pair.
pub fn command_channel() -> (CommandSender, CommandInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, CommandInbox { rx })
}

impl CommandSender {
    /// Submit a raw command for `actor`.
    pub fn submit(&self, actor: ActorId, raw: RawCommand) -> Result<(), SendError> {
        self.tx
            .send(Inbound::Command { actor, raw })
            .map_err(|_closed| SendError::Closed)
    }

    /// Create an actor and wait for its id (resolved at the next tick start).
    pub async fn join(&self, name: impl Into<String>, role: Role) -> Result<ActorId, SendError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Inbound::Join {
                name: name.into(),
                role,
                reply,
            })
            .map_err(|_closed| SendError::Closed)?;
        rx.await.map_err(|_dropped| SendError::Closed)
    }

    /// Mark an actor connected or disconnected.
    pub fn set_connected(&self, actor: ActorId, connected: bool) -> Result<(), SendError> {
        self.tx
            .send(Inbound::SetConnected { actor, connected })
            .map_err(|_closed| SendError::Closed)
    }
}

impl CommandInbox {
    /// Apply everything that arrived since the last call.
    fn drain_into(&mut self, sim: &mut Simulation) {
        let server_tick = sim.world.tick();
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                Inbound::Command { actor, raw } => sim.queue.enqueue(actor, raw, server_tick),
                Inbound::Join { name, role, reply } => {
                    let id = sim.world.spawn_actor(name, role);
                    info!(actor = %id, ?role, "actor joined");
                    if reply.send(id).is_err() {
                        debug!(actor = %id, "join requester went away");
                    }
                }
                Inbound::SetConnected { actor, connected } => {
                    if let Err(err) = sim.world.set_connected(actor, connected) {
                        warn!(actor = %actor, error = %err, "connection update ignored");
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Callback invoked after each tick completes.
///
/// Implementations fan the result out to clients. They run on the tick
/// loop and must return quickly.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, result: &TickResult, world: &WorldState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _result: &TickResult, _world: &WorldState) {}
}

/// Destination for periodic snapshots.
///
/// `offer` must never block the tick loop; an implementation that cannot
/// take the snapshot right now drops it.
pub trait SnapshotSink: Send {
    /// Hand over a snapshot.
    fn offer(&mut self, snapshot: WorldSnapshot);
}

/// Sink that discards every snapshot.
pub struct NoSnapshots;

impl SnapshotSink for NoSnapshots {
    fn offer(&mut self, _snapshot: WorldSnapshot) {}
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Cadence and bounds for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Real-time milliseconds per tick (0 = as fast as possible).
    pub tick_interval_ms: u64,
    /// Stop after this tick (0 = unbounded).
    pub max_ticks: u64,
    /// Offer a snapshot every N ticks (0 = never).
    pub snapshot_interval_ticks: u64,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_ticks` was reached.
    MaxTicksReached,
    /// The shutdown signal was raised (or its sender dropped).
    Shutdown,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub stop_reason: StopReason,
    /// Number of ticks executed by this run.
    pub total_ticks: u64,
    /// The world tick when the loop stopped.
    pub final_tick: u64,
}

/// Run the simulation loop until a termination condition is met.
///
/// A final snapshot is offered to the sink on the way out.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation(
    sim: &mut Simulation,
    inbox: &mut CommandInbox,
    mut shutdown: watch::Receiver<bool>,
    config: RunnerConfig,
    callback: &mut dyn TickCallback,
    sink: &mut dyn SnapshotSink,
) -> Result<SimulationResult, RunnerError> {
    let mut total_ticks: u64 = 0;
    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        start_tick = sim.world.tick(),
        tick_interval_ms = config.tick_interval_ms,
        max_ticks = config.max_ticks,
        "simulation starting"
    );

    let stop_reason = loop {
        if *shutdown.borrow() {
            break StopReason::Shutdown;
        }
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                // A dropped sender counts as a shutdown request.
                if changed.is_err() || *shutdown.borrow() {
                    break StopReason::Shutdown;
                }
                continue;
            }
            _ = interval.tick() => {}
        }

        inbox.drain_into(sim);
        let result = tick::run_tick(sim)?;
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&result, &sim.world);

        if config.snapshot_interval_ticks > 0
            && sim.world.clock().is_interval(config.snapshot_interval_ticks)
        {
            debug!(tick = result.tick, "offering snapshot");
            sink.offer(sim.world.snapshot());
        }

        if config.max_ticks > 0 && result.tick >= config.max_ticks {
            info!(tick = result.tick, max_ticks = config.max_ticks, "tick limit reached");
            break StopReason::MaxTicksReached;
        }
    };

    sink.offer(sim.world.snapshot());
    let result = SimulationResult {
        stop_reason,
        total_ticks,
        final_tick: sim.world.tick(),
    };
    log_simulation_end(&result);
    Ok(result)
}

/// Log the simulation end.
pub fn log_simulation_end(result: &SimulationResult) {
    if result.total_ticks == 0 {
        warn!(reason = ?result.stop_reason, "simulation ended with no ticks executed");
    } else {
        info!(
            reason = ?result.stop_reason,
            total_ticks = result.total_ticks,
            final_tick = result.final_tick,
            "simulation ended"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_agents::{NpcConfig, RulesConfig};
    use frontier_types::ActorStatus;
    use frontier_world::WorldSettings;

    use super::*;

    fn make_sim() -> Simulation {
        let world = WorldState::new(3, WorldSettings::default()).unwrap();
        Simulation::new(world, RulesConfig::default(), NpcConfig::default(), 5)
    }

    const fn fast(max_ticks: u64, snapshot_interval_ticks: u64) -> RunnerConfig {
        RunnerConfig {
            tick_interval_ms: 1,
            max_ticks,
            snapshot_interval_ticks,
        }
    }

    #[derive(Default)]
    struct CountingSink {
        ticks: Vec<u64>,
    }

    impl SnapshotSink for CountingSink {
        fn offer(&mut self, snapshot: WorldSnapshot) {
            self.ticks.push(snapshot.tick);
        }
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut sim = make_sim();
        let (_sender, mut inbox) = command_channel();
        let (_stop_tx, stop_rx) = watch::channel(false);

        let result = run_simulation(
            &mut sim,
            &mut inbox,
            stop_rx,
            fast(5, 0),
            &mut NoOpCallback,
            &mut NoSnapshots,
        )
        .await
        .unwrap();

        assert_eq!(result.stop_reason, StopReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(sim.world.tick(), 5);
    }

    #[tokio::test]
    async fn shutdown_before_first_tick() {
        let mut sim = make_sim();
        let (_sender, mut inbox) = command_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        stop_tx.send(true).unwrap();

        let result = run_simulation(
            &mut sim,
            &mut inbox,
            stop_rx,
            fast(0, 0),
            &mut NoOpCallback,
            &mut NoSnapshots,
        )
        .await
        .unwrap();

        assert_eq!(result.stop_reason, StopReason::Shutdown);
        assert_eq!(result.total_ticks, 0);
    }

    #[tokio::test]
    async fn snapshots_follow_interval_plus_final() {
        let mut sim = make_sim();
        let (_sender, mut inbox) = command_channel();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut sink = CountingSink::default();

        run_simulation(
            &mut sim,
            &mut inbox,
            stop_rx,
            fast(6, 3),
            &mut NoOpCallback,
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(sink.ticks, vec![3, 6, 6]);
    }

    #[tokio::test]
    async fn queued_commands_apply_at_tick_start() {
        let mut sim = make_sim();
        let actor = sim.world.spawn_actor("Ada", Role::Woodcutter);
        let (sender, mut inbox) = command_channel();
        let (_stop_tx, stop_rx) = watch::channel(false);

        sender
            .submit(
                actor,
                RawCommand {
                    kind: String::from("move"),
                    params: serde_json::json!({"x": 1100.0, "y": 1000.0}),
                    submitted_tick: 0,
                },
            )
            .unwrap();

        run_simulation(
            &mut sim,
            &mut inbox,
            stop_rx,
            fast(1, 0),
            &mut NoOpCallback,
            &mut NoSnapshots,
        )
        .await
        .unwrap();

        assert_eq!(sim.world.actors[&actor].status, ActorStatus::Moving);
    }

    #[tokio::test]
    async fn tick_callback_is_called() {
        struct CountCallback {
            count: u64,
        }
        impl TickCallback for CountCallback {
            fn on_tick(&mut self, _result: &TickResult, _world: &WorldState) {
                self.count = self.count.saturating_add(1);
            }
        }

        let mut sim = make_sim();
        let (_sender, mut inbox) = command_channel();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut cb = CountCallback { count: 0 };

        run_simulation(&mut sim, &mut inbox, stop_rx, fast(3, 0), &mut cb, &mut NoSnapshots)
            .await
            .unwrap();

        assert_eq!(cb.count, 3);
    }

    #[tokio::test]
    async fn sender_fails_after_loop_is_gone() {
        let (sender, inbox) = command_channel();
        drop(inbox);
        assert!(matches!(
            sender.set_connected(ActorId::new(), false),
            Err(SendError::Closed)
        ));
    }
}
