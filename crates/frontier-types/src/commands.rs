//! Player command types.
//!
//! A client submits a [`RawCommand`] (kind string plus loose JSON params).
//! The command queue decodes it into the closed [`Command`] union; nothing
//! past the queue ever handles untyped parameters.

use serde::{Deserialize, Serialize};

use crate::enums::{CommandKind, Item, StructureKind};
use crate::ids::{ActorId, AllianceId, BehemothId, ResourceId, TradeId};
use crate::structs::{CombatantRef, ItemStack, Position};

/// A command as received from the transport layer, not yet decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCommand {
    /// Command kind, e.g. `"move"`.
    pub kind: String,
    /// Kind-specific parameters.
    #[serde(default)]
    pub params: serde_json::Value,
    /// Tick the client believed was current when it sent the command.
    pub submitted_tick: u64,
}

/// A decoded, structurally valid command.
///
/// The wire form is adjacently tagged: `{"kind": "move", "params": {"x": 1.0,
/// "y": 2.0}}`. Parameterless kinds omit `params`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum Command {
    /// Walk to a point.
    Move {
        /// Destination x.
        x: f64,
        /// Destination y.
        y: f64,
    },
    /// Start gathering a resource node.
    Gather {
        /// The node.
        resource_id: ResourceId,
    },
    /// Lock onto a combat target.
    Attack {
        /// Actor, monster or behemoth.
        target: CombatantRef,
    },
    /// Eat a dead actor.
    Eat {
        /// The corpse.
        target_id: ActorId,
    },
    /// Start a crafting job.
    Craft {
        /// Recipe identifier.
        recipe_id: String,
    },
    /// Propose a trade to another actor.
    TradePropose {
        /// Counterparty.
        target_id: ActorId,
        /// Items offered.
        #[serde(default)]
        offer_items: Vec<ItemStack>,
        /// Gold offered.
        #[serde(default)]
        offer_gold: u32,
        /// Items requested.
        #[serde(default)]
        request_items: Vec<ItemStack>,
        /// Gold requested.
        #[serde(default)]
        request_gold: u32,
    },
    /// Accept or reject a pending trade.
    TradeRespond {
        /// The trade.
        trade_id: TradeId,
        /// `true` to accept.
        accept: bool,
    },
    /// Plant a seed.
    Plant {
        /// Sapling x.
        x: f64,
        /// Sapling y.
        y: f64,
    },
    /// Water a sapling.
    Water {
        /// The sapling.
        resource_id: ResourceId,
    },
    /// Feed logs to a behemoth.
    Feed {
        /// The behemoth.
        behemoth_id: BehemothId,
        /// Logs to hand over.
        amount: u32,
    },
    /// Climb an unconscious behemoth.
    Climb {
        /// The behemoth.
        behemoth_id: BehemothId,
    },
    /// Equip an item from the inventory.
    Equip {
        /// The item.
        item: Item,
    },
    /// Place a structure.
    Build {
        /// What to build.
        kind: StructureKind,
        /// Structure x.
        x: f64,
        /// Structure y.
        y: f64,
    },
    /// Found a new alliance.
    AllianceCreate {
        /// Unique name.
        name: String,
    },
    /// Join an alliance.
    AllianceJoin {
        /// The alliance.
        alliance_id: AllianceId,
    },
    /// Leave the current alliance.
    AllianceLeave,
    /// Broadcast a chat line.
    Chat {
        /// Message text.
        message: String,
    },
    /// Stop moving and drop any job.
    Stop,
}

impl Command {
    /// The command's discriminant.
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Move { .. } => CommandKind::Move,
            Self::Gather { .. } => CommandKind::Gather,
            Self::Attack { .. } => CommandKind::Attack,
            Self::Eat { .. } => CommandKind::Eat,
            Self::Craft { .. } => CommandKind::Craft,
            Self::TradePropose { .. } => CommandKind::TradePropose,
            Self::TradeRespond { .. } => CommandKind::TradeRespond,
            Self::Plant { .. } => CommandKind::Plant,
            Self::Water { .. } => CommandKind::Water,
            Self::Feed { .. } => CommandKind::Feed,
            Self::Climb { .. } => CommandKind::Climb,
            Self::Equip { .. } => CommandKind::Equip,
            Self::Build { .. } => CommandKind::Build,
            Self::AllianceCreate { .. } => CommandKind::AllianceCreate,
            Self::AllianceJoin { .. } => CommandKind::AllianceJoin,
            Self::AllianceLeave => CommandKind::AllianceLeave,
            Self::Chat { .. } => CommandKind::Chat,
            Self::Stop => CommandKind::Stop,
        }
    }

    /// The target point for commands that carry coordinates.
    pub const fn coordinates(&self) -> Option<Position> {
        match self {
            Self::Move { x, y } | Self::Plant { x, y } | Self::Build { x, y, .. } => {
                Some(Position::new(*x, *y))
            }
            _ => None,
        }
    }
}
