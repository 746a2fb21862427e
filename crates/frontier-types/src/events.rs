//! Tick output: game events, state changes, chat and the per-tick result.
//!
//! Everything a broadcaster needs to fan a tick out to clients lives in
//! [`TickResult`]. Events are a closed, internally tagged enum so consumers
//! can match exhaustively.

use serde::{Deserialize, Serialize};

use crate::enums::{CommandKind, Item, RejectionReason, ResourceKind, StructureKind};
use crate::ids::{
    ActorId, AllianceId, BehemothId, MonsterId, ResourceId, StructureId, TradeId,
};
use crate::structs::CombatantRef;

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a command was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Machine-readable code.
    pub reason: RejectionReason,
    /// Human-readable explanation.
    pub message: String,
}

impl Rejection {
    /// Build a rejection from a code and message.
    pub fn new(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// A command that passed validation and was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedCommand {
    /// Submitting actor.
    pub actor: ActorId,
    /// Command kind.
    pub kind: CommandKind,
}

/// A command that was refused, or whose target vanished before execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedCommand {
    /// Submitting actor.
    pub actor: ActorId,
    /// Command kind.
    pub kind: CommandKind,
    /// Why.
    pub rejection: Rejection,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Something noteworthy that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A gather cycle completed.
    Gathered {
        /// Gatherer.
        actor: ActorId,
        /// Node.
        resource: ResourceId,
        /// Node kind (trees yield logs, veins yield gold).
        kind: ResourceKind,
        /// Units yielded.
        amount: u32,
    },
    /// A node ran out.
    ResourceDepleted {
        /// Node.
        resource: ResourceId,
    },
    /// A depleted tree dropped a seed.
    SeedDropped {
        /// Recipient.
        actor: ActorId,
        /// The tree.
        resource: ResourceId,
    },
    /// A seed was planted.
    Planted {
        /// Planter.
        actor: ActorId,
        /// New sapling.
        resource: ResourceId,
    },
    /// A sapling was watered.
    Watered {
        /// Waterer.
        actor: ActorId,
        /// Sapling.
        resource: ResourceId,
        /// New growth tick.
        growth_complete_tick: u64,
    },
    /// A sapling became a tree.
    SaplingGrown {
        /// Node.
        resource: ResourceId,
    },
    /// A crafting job started.
    CraftStarted {
        /// Crafter.
        actor: ActorId,
        /// Recipe.
        recipe_id: String,
        /// Completion tick.
        complete_tick: u64,
    },
    /// A crafting job finished.
    CraftCompleted {
        /// Crafter.
        actor: ActorId,
        /// Recipe.
        recipe_id: String,
        /// Item produced.
        output: Item,
    },
    /// A trade was proposed.
    TradeProposed {
        /// Trade.
        trade: TradeId,
        /// Proposer.
        proposer: ActorId,
        /// Target.
        target: ActorId,
    },
    /// A trade swapped successfully.
    TradeAccepted {
        /// Trade.
        trade: TradeId,
    },
    /// A trade was declined or failed re-validation.
    TradeRejected {
        /// Trade.
        trade: TradeId,
        /// Set when the trade failed re-validation rather than being declined.
        failure: Option<RejectionReason>,
    },
    /// A trade timed out.
    TradeExpired {
        /// Trade.
        trade: TradeId,
    },
    /// A combat pair dealt damage.
    Damage {
        /// Attacker.
        attacker: CombatantRef,
        /// Target.
        target: CombatantRef,
        /// Damage dealt.
        amount: u32,
        /// Target health afterwards.
        remaining_health: u32,
    },
    /// An actor or NPC died.
    Death {
        /// Victim.
        victim: CombatantRef,
        /// Killer, if any.
        killer: Option<CombatantRef>,
        /// Gold transferred to the killer.
        gold: u32,
        /// Whether the victim will never respawn.
        permanent: bool,
    },
    /// A dead actor respawned.
    Respawned {
        /// Actor.
        actor: ActorId,
    },
    /// A monster-role actor ate a corpse.
    Eaten {
        /// Eater.
        eater: ActorId,
        /// Corpse.
        eaten: ActorId,
    },
    /// A monster-role actor reached a new evolution stage.
    Evolved {
        /// Actor.
        actor: ActorId,
        /// New stage.
        stage: u8,
    },
    /// An item was equipped.
    Equipped {
        /// Actor.
        actor: ActorId,
        /// Item.
        item: Item,
    },
    /// A structure was placed.
    StructureBuilt {
        /// Structure.
        structure: StructureId,
        /// Builder.
        owner: ActorId,
        /// Kind.
        kind: StructureKind,
    },
    /// An alliance was founded.
    AllianceCreated {
        /// Alliance.
        alliance: AllianceId,
        /// Founder.
        founder: ActorId,
        /// Name.
        name: String,
    },
    /// An actor joined an alliance.
    AllianceJoined {
        /// Alliance.
        alliance: AllianceId,
        /// Actor.
        actor: ActorId,
    },
    /// An actor left an alliance.
    AllianceLeft {
        /// Alliance.
        alliance: AllianceId,
        /// Actor.
        actor: ActorId,
    },
    /// The last member left.
    AllianceDisbanded {
        /// Alliance.
        alliance: AllianceId,
    },
    /// An NPC monster spawned.
    MonsterSpawned {
        /// Monster.
        monster: MonsterId,
        /// Kind name.
        kind: String,
    },
    /// A behemoth was knocked out.
    BehemothKnockedOut {
        /// Behemoth.
        behemoth: BehemothId,
    },
    /// A behemoth started waking up.
    BehemothWaking {
        /// Behemoth.
        behemoth: BehemothId,
    },
    /// A behemoth is roaming again.
    BehemothRoaming {
        /// Behemoth.
        behemoth: BehemothId,
    },
    /// A behemoth digested enough logs to grow ore.
    BehemothDigested {
        /// Behemoth.
        behemoth: BehemothId,
        /// Ore after digestion.
        ore: u32,
    },
    /// Logs were fed to a behemoth.
    BehemothFed {
        /// Feeder.
        actor: ActorId,
        /// Behemoth.
        behemoth: BehemothId,
        /// Logs fed.
        amount: u32,
    },
    /// A climber extracted ore.
    OreExtracted {
        /// Climber.
        actor: ActorId,
        /// Behemoth.
        behemoth: BehemothId,
        /// Ore gained.
        amount: u32,
    },
    /// A climber was shaken off a waking behemoth.
    ClimberThrown {
        /// Climber.
        actor: ActorId,
        /// Behemoth.
        behemoth: BehemothId,
        /// Damage taken.
        damage: u32,
    },
}

// ---------------------------------------------------------------------------
// Chat and state changes
// ---------------------------------------------------------------------------

/// One chat line from the tick's chat buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker.
    pub actor: ActorId,
    /// Speaker's name at send time.
    pub name: String,
    /// Text.
    pub message: String,
    /// Tick it was sent in.
    pub tick: u64,
}

/// Which entity a [`StateChange`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedEntity {
    /// An actor.
    Actor(ActorId),
    /// An NPC monster.
    Monster(MonsterId),
    /// A resource node.
    Resource(ResourceId),
    /// A behemoth.
    Behemoth(BehemothId),
    /// A structure.
    Structure(StructureId),
    /// An alliance.
    Alliance(AllianceId),
    /// A trade.
    Trade(TradeId),
}

/// One tracked field that differs between the start and end of a tick.
///
/// Creation and removal use the field name `"exists"` with boolean values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// The entity.
    pub entity: ChangedEntity,
    /// Field name.
    pub field: String,
    /// Value before the tick.
    pub old: serde_json::Value,
    /// Value after the tick.
    pub new: serde_json::Value,
}

// ---------------------------------------------------------------------------
// TickResult
// ---------------------------------------------------------------------------

/// Everything that happened in one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickResult {
    /// The tick number.
    pub tick: u64,
    /// Executed commands.
    pub accepted: Vec<AcceptedCommand>,
    /// Refused commands.
    pub rejected: Vec<RejectedCommand>,
    /// Events in emission order.
    pub events: Vec<GameEvent>,
    /// Field-level state changes.
    pub changes: Vec<StateChange>,
    /// Chat lines.
    pub chat: Vec<ChatMessage>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_are_internally_tagged() {
        let ev = GameEvent::Evolved {
            actor: ActorId::new(),
            stage: 1,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "evolved");
        assert_eq!(json["stage"], 1);
    }

    #[test]
    fn rejection_serializes_reason_code() {
        let r = Rejection::new(RejectionReason::OutOfRange, "too far");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["reason"], "out_of_range");
        assert_eq!(json["message"], "too far");
    }
}
