//! Seed actors for a freshly generated world.
//!
//! On first boot the engine registers a handful of actors listed under the
//! `actors` key of `frontier-config.yaml`. They join through the same
//! [`CommandSender::join`] path a connecting client uses, so they appear at
//! the spawn point at the next tick start. A restored world already has its
//! actors and skips this step.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use frontier_core::CommandSender;
use frontier_types::{ActorId, Role};

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// One actor to create on first boot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedActor {
    /// Display name.
    pub name: String,
    /// Chosen role.
    pub role: Role,
}

/// The `actors` section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SpawnerConfig {
    /// Actors to create when the world is generated.
    #[serde(default)]
    pub seed: Vec<SeedActor>,
}

/// Load spawner configuration from the config file at `path`.
///
/// A missing file or a file without an `actors` key yields no seed actors.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if the file exists but cannot be read
/// or parsed.
pub fn load_spawner_config(path: &Path) -> Result<SpawnerConfig, EngineError> {
    if !path.exists() {
        return Ok(SpawnerConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Spawner {
        message: format!("failed to read config file: {e}"),
    })?;
    parse_spawner_config(&contents)
}

fn parse_spawner_config(yaml: &str) -> Result<SpawnerConfig, EngineError> {
    if yaml.trim().is_empty() {
        return Ok(SpawnerConfig::default());
    }
    // Parse the full YAML and extract just the "actors" section.
    let raw: serde_yml::Value = serde_yml::from_str(yaml).map_err(|e| EngineError::Spawner {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    let Some(actors) = raw.get("actors") else {
        return Ok(SpawnerConfig::default());
    };
    serde_yml::from_value(actors.clone()).map_err(|e| EngineError::Spawner {
        message: format!("failed to parse actors config: {e}"),
    })
}

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Join every seed actor and return the ids that were assigned.
///
/// Stops early if the simulation loop goes away.
pub async fn spawn_seed_actors(sender: &CommandSender, config: &SpawnerConfig) -> Vec<ActorId> {
    let mut ids = Vec::with_capacity(config.seed.len());
    for seed in &config.seed {
        match sender.join(seed.name.clone(), seed.role).await {
            Ok(id) => ids.push(id),
            Err(err) => {
                warn!(name = %seed.name, error = %err, "seed actor not spawned");
                break;
            }
        }
    }
    if !ids.is_empty() {
        info!(count = ids.len(), "seed actors joined");
    }
    ids
}
