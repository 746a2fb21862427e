//! World engine binary for the Frontier simulation.
//!
//! This is the main entry point that wires together the tick loop, the
//! snapshot store, world generation and the result broadcaster. It loads
//! configuration, initializes all subsystems, and runs the simulation loop
//! until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `frontier-config.yaml`
//! 2. Initialize structured logging (tracing), plain or JSON
//! 3. Connect to `PostgreSQL` and run migrations (optional; failures
//!    downgrade to running without persistence)
//! 4. Restore the latest snapshot, or generate a fresh world
//! 5. Start the snapshot writer task
//! 6. Start the tick broadcaster and its log subscriber
//! 7. Install the Ctrl-C shutdown signal
//! 8. Run the simulation loop on its own task
//! 9. Join the seed actors (fresh worlds only)
//! 10. Wait for the loop, then for the writer to drain

mod broadcast;
mod error;
mod persistence;
mod spawner;
mod worldgen;

use std::path::Path;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use frontier_core::config::{LogFormat, LoggingConfig, PersistenceConfig};
use frontier_core::{
    NoSnapshots, RunnerConfig, Simulation, SimulationConfig, SimulationResult, SnapshotSink,
    command_channel, run_simulation,
};
use frontier_db::{PostgresPool, SnapshotStore};
use frontier_world::WorldState;

use crate::broadcast::BroadcastCallback;
use crate::error::EngineError;

/// Config file, relative to the working directory.
const CONFIG_PATH: &str = "frontier-config.yaml";

/// Unread tick results buffered per broadcast subscriber.
const BROADCAST_CAPACITY: usize = 64;

/// Application entry point for the world engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is configured from it, so this comes
    //    first.
    let config_path = Path::new(CONFIG_PATH);
    let config = SimulationConfig::load(config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        max_ticks = config.world.max_ticks,
        "frontier-engine starting"
    );

    let result = Box::pin(run(&config, config_path)).await?;

    info!(
        stop_reason = ?result.stop_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_tick,
        "frontier-engine shutdown complete"
    );
    Ok(())
}

/// Steps 3 to 10 of the startup sequence.
async fn run(
    config: &SimulationConfig,
    config_path: &Path,
) -> Result<SimulationResult, EngineError> {
    // 3. Connect to the database.
    let pool = connect_database(&config.persistence).await;

    // 4. Restore or generate the world.
    let (world, restored) = restore_or_generate(config, pool.as_ref()).await?;
    let mut sim = Simulation::new(
        world,
        config.rules.clone(),
        config.npc.clone(),
        config.world.max_command_age_ticks,
    );

    // 5. Snapshot writer.
    let (mut sink, writer): (Box<dyn SnapshotSink>, Option<JoinHandle<()>>) = match pool {
        Some(pool) => {
            let (sink, handle) =
                persistence::spawn_writer(pool, config.persistence.snapshot_queue_capacity);
            (Box::new(sink), Some(handle))
        }
        None => (Box::new(NoSnapshots), None),
    };

    // 6. Broadcaster.
    let mut callback = BroadcastCallback::new(BROADCAST_CAPACITY);
    let digest = tokio::spawn(broadcast::log_subscriber(callback.subscribe()));

    // 7. Shutdown signal.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            // Keep the sender alive: a dropped sender reads as a shutdown.
            warn!(error = %err, "cannot listen for Ctrl-C, stop the process externally");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
        if shutdown_tx.send(true).is_err() {
            info!("simulation already stopped");
        }
    });

    // 8. Tick loop. The sink and callback move into the task and are
    //    dropped when it ends, which lets the writer and subscriber finish.
    let (sender, mut inbox) = command_channel();
    let runner_config = RunnerConfig {
        tick_interval_ms: config.world.tick_interval_ms,
        max_ticks: config.world.max_ticks,
        snapshot_interval_ticks: if writer.is_some() {
            config.persistence.snapshot_interval_ticks
        } else {
            0
        },
    };
    let sim_task = tokio::spawn(async move {
        run_simulation(
            &mut sim,
            &mut inbox,
            shutdown_rx,
            runner_config,
            &mut callback,
            sink.as_mut(),
        )
        .await
    });

    // 9. Seed actors.
    if !restored {
        let spawner_config = spawner::load_spawner_config(config_path)?;
        spawner::spawn_seed_actors(&sender, &spawner_config).await;
    }
    // No transport is attached to this binary; clients would hold clones.
    drop(sender);

    // 10. Wait for everything to wind down.
    let result = sim_task.await??;
    if let Some(writer) = writer {
        writer.await?;
    }
    digest.await?;
    Ok(result)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Plain => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Open the snapshot database, or return `None` to run without persistence.
async fn connect_database(persistence: &PersistenceConfig) -> Option<PostgresPool> {
    if !persistence.enabled {
        info!("persistence disabled");
        return None;
    }
    match PostgresPool::open(&persistence.postgres_url).await {
        Ok(pool) => Some(pool),
        Err(err) => {
            warn!(error = %err, "database unavailable, running without persistence");
            None
        }
    }
}

/// Load the newest snapshot if there is one, otherwise build a new world.
///
/// Returns the world and whether it was restored.
async fn restore_or_generate(
    config: &SimulationConfig,
    pool: Option<&PostgresPool>,
) -> Result<(WorldState, bool), EngineError> {
    if let Some(pool) = pool
        && let Some(snapshot) = SnapshotStore::new(pool.pool()).load_latest().await?
    {
        if snapshot.seed != config.world.seed {
            warn!(
                snapshot_seed = snapshot.seed,
                config_seed = config.world.seed,
                "snapshot seed differs from config, keeping the snapshot's"
            );
        }
        let world = WorldState::restore(snapshot, config.world.settings())?;
        info!(
            tick = world.tick(),
            actors = world.actors.len(),
            resources = world.resources.len(),
            "world restored from snapshot"
        );
        return Ok((world, true));
    }

    let mut world = WorldState::new(config.world.seed, config.world.settings())?;
    worldgen::populate(&mut world, &config.generation)?;
    Ok((world, false))
}
