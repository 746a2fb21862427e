//! Tunable game rules.
//!
//! [`RulesConfig`] bundles every constant the validator, executor and
//! sub-processors consult. The engine builds it from the `rules` key of
//! `frontier-config.yaml`; every field has a default so a partial file (or
//! no file) works.

use serde::{Deserialize, Serialize};

use frontier_types::{CommandKind, Item, Role, StructureKind};
use frontier_world::ResourceRules;

// ---------------------------------------------------------------------------
// Speeds and ranges
// ---------------------------------------------------------------------------

/// Movement speed in world units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedRules {
    /// Woodcutter speed (default: 4).
    pub woodcutter: f64,
    /// Miner speed (default: 3).
    pub miner: f64,
    /// Monster-role actor speed (default: 5).
    pub monster: f64,
    /// NPC monster speed (default: 3).
    pub npc: f64,
    /// Behemoth patrol speed (default: 1).
    pub behemoth: f64,
}

impl Default for SpeedRules {
    fn default() -> Self {
        Self {
            woodcutter: 4.0,
            miner: 3.0,
            monster: 5.0,
            npc: 3.0,
            behemoth: 1.0,
        }
    }
}

impl SpeedRules {
    /// Speed for an actor of `role`.
    pub const fn for_role(&self, role: Role) -> f64 {
        match role {
            Role::Woodcutter => self.woodcutter,
            Role::Miner => self.miner,
            Role::Monster => self.monster,
        }
    }
}

/// Maximum interaction distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeRules {
    /// Eat, water, plant and build (default: 30).
    pub interact: f64,
    /// Combat pairs deal damage only within this distance (default: 25).
    pub attack: f64,
    /// Proposing and settling trades (default: 50).
    pub trade: f64,
    /// Feeding and climbing behemoths (default: 40).
    pub behemoth: f64,
}

impl Default for RangeRules {
    fn default() -> Self {
        Self {
            interact: 30.0,
            attack: 25.0,
            trade: 50.0,
            behemoth: 40.0,
        }
    }
}

/// Ticks an actor must wait after certain commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownRules {
    /// After an attack (default: 3).
    pub attack: u64,
    /// After eating (default: 5).
    pub eat: u64,
}

impl Default for CooldownRules {
    fn default() -> Self {
        Self { attack: 3, eat: 5 }
    }
}

// ---------------------------------------------------------------------------
// Evolution and behemoths
// ---------------------------------------------------------------------------

/// Monster-role evolution thresholds.
///
/// Stage `i + 1` is reached when kills reach `kill_thresholds[i]` or eats
/// reach `eat_thresholds[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionRules {
    /// Kills needed for stages 1, 2, 3 (default: 3, 8, 15).
    pub kill_thresholds: [u32; 3],
    /// Eats needed for stages 1, 2, 3 (default: 2, 5, 10).
    pub eat_thresholds: [u32; 3],
    /// Percent multiplier on base stats for stages 0 to 3
    /// (default: 100, 150, 200, 300).
    pub multipliers_pct: [u32; 4],
    /// Percent of the eaten actor's max health and attack gained
    /// (default: 10).
    pub eat_gain_pct: u32,
}

impl Default for EvolutionRules {
    fn default() -> Self {
        Self {
            kill_thresholds: [3, 8, 15],
            eat_thresholds: [2, 5, 10],
            multipliers_pct: [100, 150, 200, 300],
            eat_gain_pct: 10,
        }
    }
}

/// Behemoth mechanics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehemothRules {
    /// Flat defense against attackers (default: 5).
    pub defense: u32,
    /// Ticks spent unconscious after a knockout (default: 30).
    pub unconscious_ticks: u64,
    /// Ticks spent waking before roaming again (default: 5).
    pub waking_ticks: u64,
    /// Ore per extraction (default: 2).
    pub ore_per_extract: u32,
    /// Ticks between extractions (default: 4).
    pub extract_interval_ticks: u32,
    /// Logs fed before a digestion (default: 20).
    pub feed_threshold: u32,
    /// Ore added per digestion (default: 10).
    pub digest_ore: u32,
    /// Percent of max health dealt to thrown climbers (default: 25).
    pub throw_damage_pct: u32,
}

impl Default for BehemothRules {
    fn default() -> Self {
        Self {
            defense: 5,
            unconscious_ticks: 30,
            waking_ticks: 5,
            ore_per_extract: 2,
            extract_interval_ticks: 4,
            feed_threshold: 20,
            digest_ore: 10,
            throw_damage_pct: 25,
        }
    }
}

/// Planks needed per structure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildRules {
    /// Planks per wall (default: 3).
    pub wall_planks: u32,
    /// Planks per campfire (default: 1).
    pub campfire_planks: u32,
}

impl Default for BuildRules {
    fn default() -> Self {
        Self {
            wall_planks: 3,
            campfire_planks: 1,
        }
    }
}

impl BuildRules {
    /// Material cost of a structure.
    pub const fn cost(&self, kind: StructureKind) -> (Item, u32) {
        match kind {
            StructureKind::Wall => (Item::Plank, self.wall_planks),
            StructureKind::Campfire => (Item::Plank, self.campfire_planks),
        }
    }
}

// ---------------------------------------------------------------------------
// RulesConfig
// ---------------------------------------------------------------------------

/// Every rule constant, grouped by concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Movement speeds.
    pub speeds: SpeedRules,
    /// Interaction distances.
    pub ranges: RangeRules,
    /// Command cooldowns.
    pub cooldowns: CooldownRules,
    /// Resource progression.
    pub resources: ResourceRules,
    /// Evolution thresholds.
    pub evolution: EvolutionRules,
    /// Behemoth mechanics.
    pub behemoth: BehemothRules,
    /// Structure costs.
    pub build: BuildRules,
    /// Ticks a trade stays pending (default: 30).
    pub trade_window_ticks: u64,
    /// Ticks a dead non-monster actor waits before respawning (default: 10).
    pub respawn_delay_ticks: u64,
    /// Longest accepted chat message in characters (default: 280).
    pub max_chat_length: usize,
    /// Longest accepted alliance name in characters (default: 32).
    pub max_alliance_name_length: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            speeds: SpeedRules::default(),
            ranges: RangeRules::default(),
            cooldowns: CooldownRules::default(),
            resources: ResourceRules::default(),
            evolution: EvolutionRules::default(),
            behemoth: BehemothRules::default(),
            build: BuildRules::default(),
            trade_window_ticks: 30,
            respawn_delay_ticks: 10,
            max_chat_length: 280,
            max_alliance_name_length: 32,
        }
    }
}

impl RulesConfig {
    /// Cooldown applied after executing a command of `kind`.
    pub const fn cooldown_for(&self, kind: CommandKind) -> u64 {
        match kind {
            CommandKind::Attack => self.cooldowns.attack,
            CommandKind::Eat => self.cooldowns.eat,
            _ => 0,
        }
    }
}
