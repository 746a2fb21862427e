//! Error types for the frontier-agents crate.
//!
//! Rule violations are not errors: they are returned as
//! [`Rejection`](frontier_types::Rejection) values by the validator. The
//! errors here cover the executor's view of the world shifting under it
//! (a reference vanished, holdings changed) and arithmetic failures.

use frontier_types::{ActorId, BehemothId, Item, TradeId};
use frontier_world::WorldError;

/// Errors that can occur while executing commands and sub-processors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Attempted to remove more of an item than the actor holds.
    #[error("insufficient item: wanted {requested} of {item:?} but only have {available}")]
    InsufficientItem {
        /// The item being removed.
        item: Item,
        /// The quantity the caller attempted to remove.
        requested: u32,
        /// The quantity the actor actually holds.
        available: u32,
    },

    /// Attempted to spend more gold than the actor holds.
    #[error("insufficient gold: wanted {requested} but only have {available}")]
    InsufficientGold {
        /// Gold requested.
        requested: u32,
        /// Gold held.
        available: u32,
    },

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },

    /// Actor with the given ID was not found.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// Trade with the given ID was not found.
    #[error("trade not found: {0}")]
    TradeNotFound(TradeId),

    /// Behemoth with the given ID was not found.
    #[error("behemoth not found: {0}")]
    BehemothNotFound(BehemothId),

    /// A referenced target no longer exists or changed state.
    #[error("target vanished: {0}")]
    TargetVanished(String),

    /// Recipe id not in the recipe table.
    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),

    /// World-state operation failed.
    #[error(transparent)]
    World(#[from] WorldError),
}

impl AgentError {
    /// Shorthand for an overflow error with a static context string.
    pub fn overflow(context: &str) -> Self {
        Self::ArithmeticOverflow {
            context: String::from(context),
        }
    }
}
