//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the world has a strongly-typed ID so that an actor id can
//! never be passed where a resource id is expected. IDs use UUID v7
//! (time-ordered), which keeps `BTreeMap` iteration close to creation order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player-controlled actor.
    ActorId
}

define_id! {
    /// Unique identifier for an environment-spawned NPC monster.
    MonsterId
}

define_id! {
    /// Unique identifier for a gatherable resource node.
    ResourceId
}

define_id! {
    /// Unique identifier for a behemoth.
    BehemothId
}

define_id! {
    /// Unique identifier for a placed structure.
    StructureId
}

define_id! {
    /// Unique identifier for an alliance.
    AllianceId
}

define_id! {
    /// Unique identifier for a trade between two actors.
    TradeId
}

define_id! {
    /// Unique identifier for an in-progress crafting job.
    CraftJobId
}
