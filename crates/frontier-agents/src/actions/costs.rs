//! Per-command ranges, role eligibility and material costs.
//!
//! All lookups are pure functions of the command and the rules; the
//! validator combines them with world state.

use std::collections::BTreeMap;

use frontier_types::{Command, CommandKind, Item, ResourceKind, Role, TradeBundle};

use crate::config::RulesConfig;
use crate::crafting;

/// Maximum distance between the actor and the command's target, if the
/// command has a target position.
pub const fn range_for(kind: CommandKind, rules: &RulesConfig) -> Option<f64> {
    match kind {
        CommandKind::Gather => Some(rules.resources.gather_range),
        CommandKind::Eat | CommandKind::Water | CommandKind::Plant | CommandKind::Build => {
            Some(rules.ranges.interact)
        }
        CommandKind::Attack => Some(rules.ranges.attack),
        CommandKind::TradePropose => Some(rules.ranges.trade),
        CommandKind::Feed | CommandKind::Climb => Some(rules.ranges.behemoth),
        CommandKind::Move
        | CommandKind::Craft
        | CommandKind::TradeRespond
        | CommandKind::Equip
        | CommandKind::AllianceCreate
        | CommandKind::AllianceJoin
        | CommandKind::AllianceLeave
        | CommandKind::Chat
        | CommandKind::Stop => None,
    }
}

/// Whether a role may issue a command kind at all.
///
/// - Monsters cannot gather, craft, trade, plant, water, feed, climb or
///   build.
/// - Only monsters eat.
/// - Woodcutters never attack.
pub const fn role_allows(role: Role, kind: CommandKind) -> bool {
    match role {
        Role::Monster => !matches!(
            kind,
            CommandKind::Gather
                | CommandKind::Craft
                | CommandKind::TradePropose
                | CommandKind::TradeRespond
                | CommandKind::Plant
                | CommandKind::Water
                | CommandKind::Feed
                | CommandKind::Climb
                | CommandKind::Build
        ),
        Role::Woodcutter => !matches!(kind, CommandKind::Eat | CommandKind::Attack),
        Role::Miner => !matches!(kind, CommandKind::Eat),
    }
}

/// Whether a role may gather from a node kind.
///
/// Woodcutters cut trees, miners work gold veins; saplings are never
/// gatherable.
pub const fn can_gather(role: Role, kind: ResourceKind) -> bool {
    matches!(
        (role, kind),
        (Role::Woodcutter, ResourceKind::Tree) | (Role::Miner, ResourceKind::GoldVein)
    )
}

/// Everything a command consumes from the actor, as a bundle.
///
/// `None` for a craft with an unknown recipe.
pub fn material_cost(command: &Command, rules: &RulesConfig) -> Option<TradeBundle> {
    let single = |item: Item, qty: u32| TradeBundle {
        items: BTreeMap::from([(item, qty)]),
        gold: 0,
    };
    match command {
        Command::Craft { recipe_id } => crafting::recipe_for(recipe_id).map(|r| r.cost()),
        Command::TradePropose {
            offer_items,
            offer_gold,
            ..
        } => Some(TradeBundle::from_stacks(offer_items, *offer_gold)),
        Command::Plant { .. } => Some(single(Item::Seed, 1)),
        Command::Feed { amount, .. } => Some(single(Item::Log, *amount)),
        Command::Build { kind, .. } => {
            let (item, qty) = rules.build.cost(*kind);
            Some(single(item, qty))
        }
        Command::Equip { item } => Some(single(*item, 1)),
        _ => Some(TradeBundle::default()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_types::StructureKind;

    use super::*;

    #[test]
    fn role_table() {
        assert!(!role_allows(Role::Woodcutter, CommandKind::Attack));
        assert!(role_allows(Role::Miner, CommandKind::Attack));
        assert!(role_allows(Role::Monster, CommandKind::Eat));
        assert!(!role_allows(Role::Miner, CommandKind::Eat));
        assert!(!role_allows(Role::Monster, CommandKind::Build));
        assert!(role_allows(Role::Monster, CommandKind::Chat));
    }

    #[test]
    fn gather_kinds_by_role() {
        assert!(can_gather(Role::Woodcutter, ResourceKind::Tree));
        assert!(!can_gather(Role::Woodcutter, ResourceKind::GoldVein));
        assert!(!can_gather(Role::Miner, ResourceKind::Tree));
        assert!(!can_gather(Role::Miner, ResourceKind::Sapling));
    }

    #[test]
    fn ranges_follow_rules() {
        let rules = RulesConfig::default();
        let attack = range_for(CommandKind::Attack, &rules).unwrap();
        assert!((attack - 25.0).abs() < f64::EPSILON);
        let trade = range_for(CommandKind::TradePropose, &rules).unwrap();
        assert!((trade - 50.0).abs() < f64::EPSILON);
        assert!(range_for(CommandKind::Move, &rules).is_none());
    }

    #[test]
    fn build_cost_uses_planks() {
        let rules = RulesConfig::default();
        let cmd = Command::Build {
            kind: StructureKind::Wall,
            x: 1.0,
            y: 1.0,
        };
        let cost = material_cost(&cmd, &rules).unwrap();
        assert_eq!(cost.items.get(&Item::Plank), Some(&3));
    }
}
