//! Tick orchestration, command intake and configuration for the Frontier
//! simulation.
//!
//! This crate owns the fixed-order tick pipeline that drives the world:
//! wake, intake, validation, execution, continuous effects and diffing.
//! It also owns the YAML configuration and the async loop that feeds the
//! pipeline from the transport layer.
//!
//! # Modules
//!
//! - [`changes`] -- Tracked-field capture and state-change diffing.
//! - [`config`] -- Configuration loading from `frontier-config.yaml` into
//!   strongly-typed structs.
//! - [`queue`] -- [`CommandQueue`]: last-write-wins intake and decoding.
//! - [`runner`] -- The async tick loop, inbound channel and sink traits.
//! - [`tick`] -- One pass of the tick pipeline ([`run_tick`]).
//!
//! [`CommandQueue`]: queue::CommandQueue
//! [`run_tick`]: tick::run_tick

pub mod changes;
pub mod config;
pub mod queue;
pub mod runner;
pub mod tick;

pub use config::{ConfigError, SimulationConfig};
pub use queue::{CommandQueue, DecodeError, QueuedCommand};
pub use runner::{
    CommandInbox, CommandSender, NoOpCallback, NoSnapshots, RunnerConfig, RunnerError,
    SimulationResult, SnapshotSink, StopReason, TickCallback, command_channel, run_simulation,
};
pub use tick::{Simulation, TickError, run_tick};
