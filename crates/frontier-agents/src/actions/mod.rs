//! Command validation and execution.
//!
//! A tick handles commands in two passes. Every decoded command is first
//! checked by [`validation::validate`] against the state at the start of the
//! phase; the accepted ones are then applied by
//! [`handlers::execute_command`] in ascending actor order, where a target
//! that disappeared in the meantime surfaces as an error for the caller to
//! turn into a rejection.
//!
//! # Submodules
//!
//! - [`costs`] -- Ranges, role eligibility and material costs per command.
//! - [`handlers`] -- Execution logic for each command kind.
//! - [`validation`] -- The staged validation pipeline.

pub mod costs;
pub mod handlers;
pub mod validation;

pub use handlers::execute_command;
pub use validation::validate;
