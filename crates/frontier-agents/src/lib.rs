//! Command rules, combat, economy, NPC and behemoth mechanics for the
//! Frontier simulation.
//!
//! This crate contains the game logic layer -- everything that operates on
//! the world without touching I/O. It sits between `frontier-world` (which
//! owns the state and its indexes) and `frontier-core` (which sequences the
//! tick and handles the command queue).
//!
//! # Modules
//!
//! - [`actions`] -- Command validation, execution and costs.
//! - [`alliance`] -- Alliance creation, membership and disbanding
//! - [`behemoth`] -- Feeding, knock-out, climbing and patrols
//! - [`combat`] -- Combat pairs and per-tick damage resolution
//! - [`config`] -- Tunable game rules ([`RulesConfig`])
//! - [`crafting`] -- Recipes and timed craft jobs
//! - [`death`] -- Deaths, loot, kill credit and respawns
//! - [`error`] -- Error types for all agent operations ([`AgentError`])
//! - [`evolution`] -- Monster-role evolution stages and stat scaling
//! - [`inventory`] -- Inventory and gold operations
//! - [`movement`] -- Per-tick movement toward destinations
//! - [`npc`] -- NPC monster state machine and population balancing
//! - [`trade`] -- Trade proposals, settlement and expiry

pub mod actions;
pub mod alliance;
pub mod behemoth;
pub mod combat;
pub mod config;
pub mod crafting;
pub mod death;
pub mod error;
pub mod evolution;
pub mod inventory;
pub mod movement;
pub mod npc;
pub mod trade;

#[cfg(test)]
mod test_support;

// Re-export primary types at crate root for convenience.
pub use actions::{execute_command, validate};
pub use config::{
    BehemothRules, BuildRules, CooldownRules, EvolutionRules, RangeRules, RulesConfig, SpeedRules,
};
pub use crafting::{CraftRecipe, recipe_for};
pub use error::AgentError;
pub use npc::{DangerZone, MonsterTemplate, NpcConfig};
pub use trade::TradeResolution;
