//! Error types for the Frontier engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: frontier_core::ConfigError,
    },

    /// World construction, generation or restore failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: frontier_world::WorldError,
    },

    /// Snapshot lookup at startup failed.
    #[error("database error: {source}")]
    Db {
        /// The underlying database error.
        #[from]
        source: frontier_db::DbError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: frontier_core::RunnerError,
    },

    /// The simulation task panicked or was cancelled.
    #[error("simulation task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// Seed actor configuration could not be read.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
