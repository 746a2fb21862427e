//! Shared type definitions for the Frontier world simulation.
//!
//! This crate is the single source of truth for the data model used across
//! the Frontier workspace: identifiers, enums, entity structs, the command
//! union and everything a tick emits.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Roles, statuses, items and rejection codes
//! - [`structs`] -- Entities, jobs, combat pairs and the world snapshot
//! - [`commands`] -- Raw and decoded player commands
//! - [`events`] -- Game events, state changes and the tick result

pub mod commands;
pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use commands::{Command, RawCommand};
pub use enums::{
    ActorStatus, BehemothStatus, CommandKind, EquipSlot, Item, MonsterBehavior, RejectionReason,
    ResourceKind, ResourceState, Role, StructureKind, TradeStatus,
};
pub use events::{
    AcceptedCommand, ChangedEntity, ChatMessage, GameEvent, RejectedCommand, Rejection,
    StateChange, TickResult,
};
pub use ids::{
    ActorId, AllianceId, BehemothId, CraftJobId, MonsterId, ResourceId, StructureId, TradeId,
};
pub use structs::{
    Actor, Alliance, Behemoth, ClimbJob, CombatPair, CombatantRef, CraftingJob, EntityRef,
    Equipment, GatherJob, ItemStack, Monster, Position, ResourceNode, Stats, Structure, Trade,
    TradeBundle, WorldSnapshot,
};
