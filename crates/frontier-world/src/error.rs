//! Error types for the `frontier-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use frontier_types::{ActorId, BehemothId, MonsterId, ResourceId, StructureId};

use crate::clock::ClockError;

/// Errors that can occur during world-state operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An actor id was not found.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// A resource id was not found.
    #[error("resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// An entity with this id is already registered.
    #[error("duplicate entity id: {0}")]
    DuplicateId(String),

    /// The spatial cell size must be a positive finite number.
    #[error("invalid cell size: {0}")]
    InvalidCellSize(f64),

    /// The world size must be a positive finite number.
    #[error("invalid world size: {0}")]
    InvalidWorldSize(f64),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,

    /// Clock failure.
    #[error(transparent)]
    Clock(#[from] ClockError),
}

impl WorldError {
    /// Duplicate-id error for a monster.
    pub fn duplicate_monster(id: MonsterId) -> Self {
        Self::DuplicateId(format!("monster {id}"))
    }

    /// Duplicate-id error for a behemoth.
    pub fn duplicate_behemoth(id: BehemothId) -> Self {
        Self::DuplicateId(format!("behemoth {id}"))
    }

    /// Duplicate-id error for a structure.
    pub fn duplicate_structure(id: StructureId) -> Self {
        Self::DuplicateId(format!("structure {id}"))
    }
}
