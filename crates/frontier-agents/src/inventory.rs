//! Inventory and gold operations for actors.
//!
//! Items are counted in a `BTreeMap<Item, u32>`; entries that reach zero are
//! removed. Gold is a plain counter on the actor. Every operation uses
//! checked arithmetic and leaves the inventory untouched on failure, so
//! multi-item consumption (crafting, trades, building) is all-or-nothing
//! when it goes through [`remove_bundle`].

use std::collections::BTreeMap;

use frontier_types::{Actor, Item, TradeBundle};

use crate::error::AgentError;

/// Check whether the inventory contains at least `amount` of `item`.
pub fn has_item(inventory: &BTreeMap<Item, u32>, item: Item, amount: u32) -> bool {
    inventory.get(&item).copied().unwrap_or(0) >= amount
}

/// Check whether the inventory holds every line of `items`.
pub fn has_items(inventory: &BTreeMap<Item, u32>, items: &BTreeMap<Item, u32>) -> bool {
    items
        .iter()
        .all(|(item, qty)| has_item(inventory, *item, *qty))
}

/// Add `amount` units of `item`.
pub fn add_item(
    inventory: &mut BTreeMap<Item, u32>,
    item: Item,
    amount: u32,
) -> Result<(), AgentError> {
    if amount == 0 {
        return Ok(());
    }
    let entry = inventory.entry(item).or_insert(0);
    *entry = entry
        .checked_add(amount)
        .ok_or_else(|| AgentError::overflow("item quantity overflow in add_item"))?;
    Ok(())
}

/// Remove `amount` units of `item`.
///
/// Fails without mutating if the actor holds fewer. Removes the key when the
/// quantity reaches zero.
pub fn remove_item(
    inventory: &mut BTreeMap<Item, u32>,
    item: Item,
    amount: u32,
) -> Result<(), AgentError> {
    let current = inventory.get(&item).copied().unwrap_or(0);
    let remaining = current
        .checked_sub(amount)
        .ok_or(AgentError::InsufficientItem {
            item,
            requested: amount,
            available: current,
        })?;
    if remaining == 0 {
        inventory.remove(&item);
    } else {
        inventory.insert(item, remaining);
    }
    Ok(())
}

/// Whether the actor holds everything in `bundle`, gold included.
pub fn can_afford(actor: &Actor, bundle: &TradeBundle) -> bool {
    actor.gold >= bundle.gold && has_items(&actor.inventory, &bundle.items)
}

/// Remove every item and the gold in `bundle` from the actor.
///
/// Checks all lines first; on any shortfall nothing is removed.
pub fn remove_bundle(actor: &mut Actor, bundle: &TradeBundle) -> Result<(), AgentError> {
    if actor.gold < bundle.gold {
        return Err(AgentError::InsufficientGold {
            requested: bundle.gold,
            available: actor.gold,
        });
    }
    for (item, qty) in &bundle.items {
        let available = actor.item_count(*item);
        if available < *qty {
            return Err(AgentError::InsufficientItem {
                item: *item,
                requested: *qty,
                available,
            });
        }
    }
    for (item, qty) in &bundle.items {
        remove_item(&mut actor.inventory, *item, *qty)?;
    }
    actor.gold = actor
        .gold
        .checked_sub(bundle.gold)
        .ok_or_else(|| AgentError::overflow("gold underflow in remove_bundle"))?;
    Ok(())
}

/// Credit every item and the gold in `bundle` to the actor.
pub fn add_bundle(actor: &mut Actor, bundle: &TradeBundle) -> Result<(), AgentError> {
    for (item, qty) in &bundle.items {
        add_item(&mut actor.inventory, *item, *qty)?;
    }
    add_gold(actor, bundle.gold)
}

/// Credit gold to the actor.
pub fn add_gold(actor: &mut Actor, amount: u32) -> Result<(), AgentError> {
    actor.gold = actor
        .gold
        .checked_add(amount)
        .ok_or_else(|| AgentError::overflow("gold overflow in add_gold"))?;
    Ok(())
}

/// Take all of the actor's gold, leaving zero.
pub const fn take_all_gold(actor: &mut Actor) -> u32 {
    let gold = actor.gold;
    actor.gold = 0;
    gold
}
