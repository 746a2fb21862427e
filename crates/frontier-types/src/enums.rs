//! Enumeration types for the Frontier simulation.
//!
//! Every finite state machine in the data model (actor status, NPC behavior,
//! resource lifecycle, behemoth cycle, trade status) is a closed enum here so
//! that downstream crates can match exhaustively.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// The fixed archetype an actor picks on role selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Peaceful lumber specialist. Never attacks; cannot work gold veins.
    Woodcutter,
    /// Ore and gold specialist. Cannot fell trees.
    Miner,
    /// Player-controlled monster. No economy, evolves by killing and eating,
    /// and dies permanently.
    Monster,
}

impl Role {
    /// Whether this is the monster archetype (permadeath, evolution).
    pub const fn is_monster(self) -> bool {
        matches!(self, Self::Monster)
    }

    /// Whether this archetype refuses to initiate attacks.
    pub const fn is_peaceful(self) -> bool {
        matches!(self, Self::Woodcutter)
    }
}

// ---------------------------------------------------------------------------
// Actor status
// ---------------------------------------------------------------------------

/// What an actor is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorStatus {
    /// Standing still, free to act.
    Idle,
    /// Walking toward a destination.
    Moving,
    /// Working a resource node.
    Gathering,
    /// Waiting on a crafting job.
    Crafting,
    /// Holding an active combat pair.
    Fighting,
    /// Dead; waiting for respawn (or forever, for monsters).
    Dead,
    /// Mining ore from an unconscious behemoth.
    Climbing,
    /// Waiting on a proposed trade.
    Trading,
}

// ---------------------------------------------------------------------------
// NPC behavior
// ---------------------------------------------------------------------------

/// Behavior state of an environment-spawned NPC monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterBehavior {
    /// Just spawned; begins patrolling on its next update.
    Idle,
    /// Random walk around the patrol origin.
    Patrol,
    /// Closing in on a locked target.
    Chase,
    /// In range and holding a combat pair against the target.
    Attack,
    /// Badly hurt and running from the threat.
    Flee,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Kind of gatherable resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Yields logs, one per cycle. May drop a seed when depleted.
    Tree,
    /// Yields gold, up to five per cycle.
    GoldVein,
    /// A planted seed growing into a tree.
    Sapling,
}

/// Lifecycle state of a resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Free to be gathered.
    Available,
    /// Locked by exactly one gatherer.
    BeingGathered,
    /// Remaining stock is zero.
    Depleted,
    /// A sapling waiting for its growth tick.
    Growing,
}

// ---------------------------------------------------------------------------
// Behemoths
// ---------------------------------------------------------------------------

/// Status cycle of a behemoth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehemothStatus {
    /// Walking its patrol route. Can be attacked and fed.
    Roaming,
    /// Knocked out. Can be climbed for ore and fed.
    Unconscious,
    /// Shaking off climbers before it roams again.
    Waking,
}

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

/// Kind of placed construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// A defensive wall segment.
    Wall,
    /// A campfire marking a camp.
    Campfire,
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Status of a proposed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Waiting for the target's response.
    Pending,
    /// Swapped successfully.
    Accepted,
    /// Declined, or failed re-validation.
    Rejected,
    /// Nobody responded within the window.
    Expired,
}

// ---------------------------------------------------------------------------
// Items and equipment
// ---------------------------------------------------------------------------

/// An inventory item. Gold is tracked separately as a plain counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    /// Raw lumber from trees.
    Log,
    /// Plantable tree seed.
    Seed,
    /// Rare ore from behemoths.
    Ore,
    /// Processed lumber.
    Plank,
    /// Woodcutting tool.
    Axe,
    /// Mining tool.
    Pickaxe,
    /// Weapon.
    Sword,
    /// Body armor.
    Armor,
}

impl Item {
    /// The equipment slot this item occupies, if it can be equipped.
    pub const fn slot(self) -> Option<EquipSlot> {
        match self {
            Self::Sword => Some(EquipSlot::Weapon),
            Self::Armor => Some(EquipSlot::Armor),
            Self::Axe | Self::Pickaxe => Some(EquipSlot::Tool),
            Self::Log | Self::Seed | Self::Ore | Self::Plank => None,
        }
    }

    /// Flat attack bonus while equipped.
    pub const fn attack_bonus(self) -> u32 {
        match self {
            Self::Sword => 8,
            Self::Axe | Self::Pickaxe => 2,
            _ => 0,
        }
    }

    /// Flat defense bonus while equipped.
    pub const fn defense_bonus(self) -> u32 {
        match self {
            Self::Armor => 5,
            _ => 0,
        }
    }
}

/// An equipment slot on an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    /// Weapon hand.
    Weapon,
    /// Body.
    Armor,
    /// Off hand tool.
    Tool,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Discriminant of a [`Command`](crate::commands::Command), used in tick
/// results and cooldown tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Walk to a point.
    Move,
    /// Start gathering a resource node.
    Gather,
    /// Lock onto a combat target.
    Attack,
    /// Eat a dead actor (monsters only).
    Eat,
    /// Start a crafting job.
    Craft,
    /// Propose a trade.
    TradePropose,
    /// Accept or reject a trade.
    TradeRespond,
    /// Plant a seed.
    Plant,
    /// Water a sapling.
    Water,
    /// Feed logs to a behemoth.
    Feed,
    /// Climb an unconscious behemoth.
    Climb,
    /// Equip an item.
    Equip,
    /// Place a structure.
    Build,
    /// Found an alliance.
    AllianceCreate,
    /// Join an alliance.
    AllianceJoin,
    /// Leave the current alliance.
    AllianceLeave,
    /// Say something.
    Chat,
    /// Stop moving and drop any job.
    Stop,
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Machine-readable reason a command was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The acting actor does not exist.
    UnknownActor,
    /// The acting actor is dead.
    ActorDead,
    /// The acting actor is still on cooldown.
    OnCooldown,
    /// The actor's role may not perform this command.
    RoleNotAllowed,
    /// The referenced target does not exist.
    InvalidTarget,
    /// The target exists but is in the wrong state.
    UnavailableTarget,
    /// The target is farther than the action's range.
    OutOfRange,
    /// Coordinates outside the world.
    OutOfBounds,
    /// Not enough items or gold.
    InsufficientResources,
    /// Name or membership conflict.
    AlreadyExists,
    /// The actor is not in an alliance.
    NotInAlliance,
    /// Parameters are structurally valid but semantically nonsensical.
    InvalidParameters,
    /// The target vanished between validation and execution.
    TargetVanished,
}
