//! Snapshot persistence for the Frontier simulation (`PostgreSQL`).
//!
//! The simulation keeps all state in memory. Every
//! `snapshot_interval_ticks` the engine hands a full [`WorldSnapshot`] to a
//! writer task, which stores it here as one JSONB row. On boot the engine
//! restores from the newest row, or generates a fresh world when the table
//! is empty.
//!
//! ```text
//! Tick loop --try_send--> snapshot writer task
//!                              |
//!                              +-- SnapshotStore::save --> world_state_snapshots
//!
//! Engine boot --> SnapshotStore::load_latest --> WorldState::restore
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool with startup retries and migrations
//! - [`snapshot_store`] -- World snapshot save, load and pruning
//! - [`error`] -- Shared error types
//!
//! [`WorldSnapshot`]: frontier_types::WorldSnapshot

pub mod error;
pub mod postgres;
pub mod snapshot_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::{PoolSettings, PostgresPool};
pub use snapshot_store::{SnapshotStore, WorldSnapshotRow};
