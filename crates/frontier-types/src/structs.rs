//! Core entity structs for the Frontier simulation.
//!
//! Covers positions, stats, the seven stored entity kinds (actors, NPC
//! monsters, resource nodes, behemoths, structures, alliances, trades), the
//! job records the tick pipeline advances (crafting, gathering, climbing,
//! combat pairs) and the serializable [`WorldSnapshot`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::enums::{
    ActorStatus, BehemothStatus, EquipSlot, Item, MonsterBehavior, ResourceKind, ResourceState,
    Role, StructureKind, TradeStatus,
};
use crate::ids::{
    ActorId, AllianceId, BehemothId, CraftJobId, MonsterId, ResourceId, StructureId, TradeId,
};

/// Distance kept between a clamped coordinate and the exclusive world edge.
pub const EDGE_MARGIN: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in the square world. Both coordinates live in `[0, world_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Construct a position without clamping.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Whether both coordinates are finite numbers.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Whether the position lies inside `[0, world_size)` on both axes.
    pub fn in_bounds(self, world_size: f64) -> bool {
        self.is_finite()
            && self.x >= 0.0
            && self.y >= 0.0
            && self.x < world_size
            && self.y < world_size
    }

    /// Clamp both coordinates into `[0, world_size)`.
    ///
    /// Non-finite coordinates collapse to `0.0`.
    pub fn clamped(self, world_size: f64) -> Self {
        let upper = (world_size - EDGE_MARGIN).max(0.0);
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, upper) } else { 0.0 };
        Self {
            x: clamp(self.x),
            y: clamp(self.y),
        }
    }

    /// Step at most `max_step` units toward `target`.
    ///
    /// Returns the new position and whether the target was reached. When the
    /// remaining distance is within `max_step` the result snaps exactly onto
    /// the target.
    pub fn step_toward(self, target: Self, max_step: f64) -> (Self, bool) {
        let dist = self.distance_to(target);
        if dist <= max_step {
            return (target, true);
        }
        let ratio = max_step / dist;
        let next = Self {
            x: (target.x - self.x).mul_add(ratio, self.x),
            y: (target.y - self.y).mul_add(ratio, self.y),
        };
        (next, false)
    }

    /// Step `max_step` units directly away from `threat`.
    ///
    /// When standing exactly on the threat the step goes along +x.
    pub fn step_away(self, threat: Self, max_step: f64) -> Self {
        let dist = self.distance_to(threat);
        if dist <= f64::EPSILON {
            return Self {
                x: self.x + max_step,
                y: self.y,
            };
        }
        let ratio = max_step / dist;
        Self {
            x: (self.x - threat.x).mul_add(ratio, self.x),
            y: (self.y - threat.y).mul_add(ratio, self.y),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats and equipment
// ---------------------------------------------------------------------------

/// Combat statistics shared by actors and NPC monsters.
///
/// `attack` and `max_health` are derived from the `base_*` values (and the
/// evolution multiplier for monster-role actors). `defense` is flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Current health. Zero means dead.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Effective attack before equipment.
    pub attack: u32,
    /// Effective defense before equipment.
    pub defense: u32,
    /// Attack before evolution multipliers.
    pub base_attack: u32,
    /// Maximum health before evolution multipliers.
    pub base_max_health: u32,
}

impl Stats {
    /// Full-health stats where effective values equal the base values.
    pub const fn new(max_health: u32, attack: u32, defense: u32) -> Self {
        Self {
            health: max_health,
            max_health,
            attack,
            defense,
            base_attack: attack,
            base_max_health: max_health,
        }
    }

    /// Whether health is above zero.
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Items currently equipped, one per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Equipment {
    /// Weapon slot.
    pub weapon: Option<Item>,
    /// Armor slot.
    pub armor: Option<Item>,
    /// Tool slot.
    pub tool: Option<Item>,
}

impl Equipment {
    /// The item in a given slot.
    pub const fn get(&self, slot: EquipSlot) -> Option<Item> {
        match slot {
            EquipSlot::Weapon => self.weapon,
            EquipSlot::Armor => self.armor,
            EquipSlot::Tool => self.tool,
        }
    }

    /// Put `item` into `slot`, returning whatever was there before.
    pub const fn replace(&mut self, slot: EquipSlot, item: Item) -> Option<Item> {
        let target = match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
            EquipSlot::Tool => &mut self.tool,
        };
        target.replace(item)
    }

    fn items(&self) -> [Option<Item>; 3] {
        [self.weapon, self.armor, self.tool]
    }

    /// Sum of attack bonuses across all slots.
    pub fn attack_bonus(&self) -> u32 {
        self.items()
            .into_iter()
            .flatten()
            .fold(0_u32, |acc, i| acc.saturating_add(i.attack_bonus()))
    }

    /// Sum of defense bonuses across all slots.
    pub fn defense_bonus(&self) -> u32 {
        self.items()
            .into_iter()
            .flatten()
            .fold(0_u32, |acc, i| acc.saturating_add(i.defense_bonus()))
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// A player-controlled character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique identifier.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Chosen archetype.
    pub role: Role,
    /// Current position.
    pub position: Position,
    /// Where the actor is walking, if anywhere.
    pub destination: Option<Position>,
    /// Current activity.
    pub status: ActorStatus,
    /// Combat statistics.
    pub stats: Stats,
    /// Gold carried.
    pub gold: u32,
    /// Item counts. Entries with zero quantity are removed.
    pub inventory: BTreeMap<Item, u32>,
    /// Equipped items.
    pub equipment: Equipment,
    /// Alliance membership.
    pub alliance: Option<AllianceId>,
    /// Kills credited to this actor.
    pub kills: u32,
    /// Corpses eaten (monster role only).
    pub eats: u32,
    /// Evolution stage index, 0 to 3. Never decreases.
    pub evolution_stage: u8,
    /// First tick on which the actor may act again.
    pub cooldown_until: u64,
    /// Tick at which a dead actor respawns. Always `None` for monster role.
    pub respawn_tick: Option<u64>,
    /// Whether a client is currently attached.
    pub connected: bool,
    /// Whether this corpse has already been eaten.
    pub eaten: bool,
}

impl Actor {
    /// Whether the actor is alive.
    pub const fn is_alive(&self) -> bool {
        !matches!(self.status, ActorStatus::Dead)
    }

    /// Attack including equipment bonuses.
    pub fn effective_attack(&self) -> u32 {
        self.stats
            .attack
            .saturating_add(self.equipment.attack_bonus())
    }

    /// Defense including equipment bonuses.
    pub fn effective_defense(&self) -> u32 {
        self.stats
            .defense
            .saturating_add(self.equipment.defense_bonus())
    }

    /// Quantity of `item` held (0 if absent).
    pub fn item_count(&self, item: Item) -> u32 {
        self.inventory.get(&item).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// NPC monster
// ---------------------------------------------------------------------------

/// An environment-spawned monster driven by the NPC behavior machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    /// Unique identifier.
    pub id: MonsterId,
    /// Kind name, e.g. `"wolf"`.
    pub kind: String,
    /// Current position.
    pub position: Position,
    /// Combat statistics.
    pub stats: Stats,
    /// Behavior state.
    pub behavior: MonsterBehavior,
    /// Centre of the patrol area.
    pub patrol_origin: Position,
    /// Radius of the patrol area.
    pub patrol_radius: f64,
    /// Current patrol waypoint.
    pub waypoint: Option<Position>,
    /// Locked target while chasing, attacking or fleeing.
    pub target: Option<ActorId>,
    /// Gold awarded to the actor that kills it.
    pub gold_drop: u32,
}

// ---------------------------------------------------------------------------
// Resource node
// ---------------------------------------------------------------------------

/// A gatherable resource: tree, gold vein or growing sapling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Unique identifier.
    pub id: ResourceId,
    /// Node kind.
    pub kind: ResourceKind,
    /// Position.
    pub position: Position,
    /// Units left. Always `<= capacity`.
    pub remaining: u32,
    /// Units when full.
    pub capacity: u32,
    /// Lifecycle state.
    pub state: ResourceState,
    /// Tick at which a sapling becomes a tree.
    pub growth_complete_tick: Option<u64>,
}

// ---------------------------------------------------------------------------
// Behemoth
// ---------------------------------------------------------------------------

/// A huge roaming creature that can be knocked out, climbed and fed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behemoth {
    /// Unique identifier.
    pub id: BehemothId,
    /// Current position.
    pub position: Position,
    /// Current status.
    pub status: BehemothStatus,
    /// Current health.
    pub health: u32,
    /// Health restored on returning to roaming.
    pub max_health: u32,
    /// Ore available to climbers.
    pub ore: u32,
    /// Ore cap.
    pub max_ore: u32,
    /// Logs fed since the last digestion.
    pub fed: u32,
    /// Closed patrol loop.
    pub patrol_route: Vec<Position>,
    /// Index into `patrol_route` of the next waypoint.
    pub waypoint_index: usize,
    /// Tick at which the current unconscious or waking status ends.
    pub status_until: Option<u64>,
}

// ---------------------------------------------------------------------------
// Structures and alliances
// ---------------------------------------------------------------------------

/// A placed construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Unique identifier.
    pub id: StructureId,
    /// What was built.
    pub kind: StructureKind,
    /// Position.
    pub position: Position,
    /// Builder.
    pub owner: ActorId,
    /// Builder's alliance at build time.
    pub alliance: Option<AllianceId>,
}

/// A named group of actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliance {
    /// Unique identifier.
    pub id: AllianceId,
    /// Unique display name.
    pub name: String,
    /// Founding actor.
    pub founder: ActorId,
    /// Current members. Never empty while the alliance exists.
    pub members: BTreeSet<ActorId>,
    /// Tick of creation.
    pub created_tick: u64,
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// One line of an item list in a command or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// The item.
    pub item: Item,
    /// How many.
    pub quantity: u32,
}

/// Items plus gold committed by one side of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TradeBundle {
    /// Item counts.
    pub items: BTreeMap<Item, u32>,
    /// Gold amount.
    pub gold: u32,
}

impl TradeBundle {
    /// Build a bundle from an item list and gold, merging duplicate lines.
    pub fn from_stacks(stacks: &[ItemStack], gold: u32) -> Self {
        let mut items = BTreeMap::new();
        for stack in stacks {
            let entry: &mut u32 = items.entry(stack.item).or_insert(0);
            *entry = entry.saturating_add(stack.quantity);
        }
        Self { items, gold }
    }

    /// Whether the bundle carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.gold == 0 && self.items.values().all(|q| *q == 0)
    }
}

/// A proposed exchange between two actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique identifier.
    pub id: TradeId,
    /// Actor who proposed.
    pub proposer: ActorId,
    /// Actor who must respond.
    pub target: ActorId,
    /// What the proposer gives.
    pub offer: TradeBundle,
    /// What the proposer asks for.
    pub request: TradeBundle,
    /// Current status.
    pub status: TradeStatus,
    /// Tick of proposal.
    pub created_tick: u64,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// An in-progress crafting job. Ingredients are already consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingJob {
    /// Unique identifier.
    pub id: CraftJobId,
    /// Actor who receives the output.
    pub owner: ActorId,
    /// Recipe identifier.
    pub recipe_id: String,
    /// Tick the job started.
    pub start_tick: u64,
    /// Tick the job completes.
    pub complete_tick: u64,
}

/// A gatherer's lock on a resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherJob {
    /// The gatherer.
    pub actor: ActorId,
    /// The locked node.
    pub resource: ResourceId,
    /// Ticks left in the current yield cycle.
    pub countdown: u32,
}

/// A climber mining ore from an unconscious behemoth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimbJob {
    /// The climber.
    pub actor: ActorId,
    /// The behemoth being climbed.
    pub behemoth: BehemothId,
    /// Ticks left until the next extraction.
    pub countdown: u32,
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Either side of a combat pair.
///
/// Serializes externally tagged: `{"actor": "<uuid>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantRef {
    /// A player actor.
    Actor(ActorId),
    /// An NPC monster.
    Monster(MonsterId),
    /// A behemoth. Only ever a target.
    Behemoth(BehemothId),
}

/// An attacker locked onto a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatPair {
    /// Who deals damage.
    pub attacker: CombatantRef,
    /// Who takes it.
    pub target: CombatantRef,
    /// Tick the pair was created.
    pub started_tick: u64,
    /// Cleared on death, range loss or re-attack.
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Spatial references
// ---------------------------------------------------------------------------

/// A typed reference to any positioned entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// A player actor.
    Actor(ActorId),
    /// An NPC monster.
    Monster(MonsterId),
    /// A resource node.
    Resource(ResourceId),
    /// A behemoth.
    Behemoth(BehemothId),
    /// A structure.
    Structure(StructureId),
}

impl From<CombatantRef> for EntityRef {
    fn from(c: CombatantRef) -> Self {
        match c {
            CombatantRef::Actor(id) => Self::Actor(id),
            CombatantRef::Monster(id) => Self::Monster(id),
            CombatantRef::Behemoth(id) => Self::Behemoth(id),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Every persistent collection of the world at one tick.
///
/// Collections are plain vectors so the JSON form needs no map-key encoding.
/// Transient per-tick buffers (events, chat) are not included.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// World seed.
    pub seed: u64,
    /// All actors, dead ones included.
    pub actors: Vec<Actor>,
    /// All NPC monsters.
    pub monsters: Vec<Monster>,
    /// All resource nodes.
    pub resources: Vec<ResourceNode>,
    /// All behemoths.
    pub behemoths: Vec<Behemoth>,
    /// All structures.
    pub structures: Vec<Structure>,
    /// All alliances.
    pub alliances: Vec<Alliance>,
    /// Pending and just-resolved trades.
    pub trades: Vec<Trade>,
    /// In-progress crafting jobs.
    pub crafting_jobs: Vec<CraftingJob>,
    /// Gather locks.
    pub gather_jobs: Vec<GatherJob>,
    /// Climb locks.
    pub climb_jobs: Vec<ClimbJob>,
    /// Combat pairs.
    pub combat_pairs: Vec<CombatPair>,
}
