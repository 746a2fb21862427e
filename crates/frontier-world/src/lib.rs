//! World state, spatial indexing and resource progression for the Frontier
//! simulation.
//!
//! This crate owns the authoritative in-memory world: one ordered store per
//! entity kind, a uniform-grid spatial index kept consistent with those
//! stores, the tick clock and the resource sub-processor.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic tick counter with interval helpers.
//! - [`error`] -- Error types for world-state operations.
//! - [`resource`] -- Gathering cycles, depletion, seed drops, saplings.
//! - [`rng`] -- Deterministic randomness derived from `(seed, tick)`.
//! - [`spatial`] -- Uniform grid index with inclusive radius queries.
//! - [`state`] -- [`WorldState`] and registration operations.

pub mod clock;
pub mod error;
pub mod resource;
pub mod rng;
pub mod spatial;
pub mod state;

// Re-export primary types at crate root.
pub use clock::{ClockError, WorldClock};
pub use error::WorldError;
pub use resource::ResourceRules;
pub use spatial::SpatialIndex;
pub use state::{WorldSettings, WorldState, starting_stats};
