//! Trading between actors.
//!
//! Implements the trade lifecycle:
//!
//! 1. [`propose_trade`] -- An actor offers items and gold in exchange for
//!    items and gold from a nearby actor. Nothing is escrowed.
//! 2. [`resolve_trade`] -- Pure decision on a response: on accept both
//!    parties are re-checked (present, alive, in range, still holding their
//!    side) and a swap plan is returned; otherwise a release.
//! 3. [`apply_resolution`] -- Applies the plan atomically and removes the
//!    trade.
//! 4. [`expire_trades`] -- Marks pending trades past the window as expired.
//!
//! Every unit debited from one actor is credited to the other, so a swap
//! never creates or destroys items or gold.

use tracing::debug;

use frontier_types::{
    ActorId, ActorStatus, GameEvent, RejectionReason, Trade, TradeBundle, TradeId, TradeStatus,
};
use frontier_world::WorldState;

use crate::config::RulesConfig;
use crate::error::AgentError;
use crate::inventory;

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

/// Create a pending trade from `proposer` to `target`.
pub fn propose_trade(
    world: &mut WorldState,
    proposer: ActorId,
    target: ActorId,
    offer: TradeBundle,
    request: TradeBundle,
) -> Result<TradeId, AgentError> {
    if !world.actors.contains_key(&target) {
        return Err(AgentError::ActorNotFound(target));
    }
    let tick = world.tick();
    let actor = world
        .actors
        .get_mut(&proposer)
        .ok_or(AgentError::ActorNotFound(proposer))?;
    actor.status = ActorStatus::Trading;
    actor.destination = None;

    let id = TradeId::new();
    world.trades.insert(
        id,
        Trade {
            id,
            proposer,
            target,
            offer,
            request,
            status: TradeStatus::Pending,
            created_tick: tick,
        },
    );
    debug!(trade = %id, proposer = %proposer, target = %target, "trade proposed");
    world.emit(GameEvent::TradeProposed {
        trade: id,
        proposer,
        target,
    });
    Ok(id)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The outcome of a trade response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeResolution {
    /// Swap the bundles.
    Swap {
        /// Trade being settled.
        trade: TradeId,
        /// Gives `offer`, receives `request`.
        proposer: ActorId,
        /// Gives `request`, receives `offer`.
        target: ActorId,
        /// Proposer's side.
        offer: TradeBundle,
        /// Target's side.
        request: TradeBundle,
    },
    /// Drop the trade without moving anything.
    Release {
        /// Trade being dropped.
        trade: TradeId,
        /// Why re-validation failed; `None` for a plain decline.
        failure: Option<RejectionReason>,
    },
}

/// Decide the outcome of a response to `trade`. Never mutates.
pub fn resolve_trade(
    trade: &Trade,
    accept: bool,
    world: &WorldState,
    rules: &RulesConfig,
) -> TradeResolution {
    let release = |failure| TradeResolution::Release {
        trade: trade.id,
        failure,
    };
    if !accept {
        return release(None);
    }
    if trade.status != TradeStatus::Pending {
        return release(Some(RejectionReason::UnavailableTarget));
    }
    let (Some(proposer), Some(target)) = (
        world.actors.get(&trade.proposer),
        world.actors.get(&trade.target),
    ) else {
        return release(Some(RejectionReason::UnknownActor));
    };
    if !proposer.is_alive() || !target.is_alive() {
        return release(Some(RejectionReason::ActorDead));
    }
    if proposer.position.distance_to(target.position) > rules.ranges.trade {
        return release(Some(RejectionReason::OutOfRange));
    }
    if !inventory::can_afford(proposer, &trade.offer)
        || !inventory::can_afford(target, &trade.request)
    {
        return release(Some(RejectionReason::InsufficientResources));
    }
    TradeResolution::Swap {
        trade: trade.id,
        proposer: trade.proposer,
        target: trade.target,
        offer: trade.offer.clone(),
        request: trade.request.clone(),
    }
}

/// Put a proposer back to idle once it has no pending proposals left.
fn settle_proposer(world: &mut WorldState, proposer: ActorId) {
    let still_waiting = world
        .trades
        .values()
        .any(|t| t.proposer == proposer && t.status == TradeStatus::Pending);
    if !still_waiting
        && let Some(actor) = world.actors.get_mut(&proposer)
        && actor.status == ActorStatus::Trading
    {
        actor.status = ActorStatus::Idle;
    }
}

/// Move both bundles between the two parties.
fn swap(
    world: &mut WorldState,
    proposer: ActorId,
    target: ActorId,
    offer: &TradeBundle,
    request: &TradeBundle,
) -> Result<(), AgentError> {
    let p = world
        .actors
        .get(&proposer)
        .ok_or(AgentError::ActorNotFound(proposer))?;
    let t = world
        .actors
        .get(&target)
        .ok_or(AgentError::ActorNotFound(target))?;
    if !inventory::can_afford(p, offer) || !inventory::can_afford(t, request) {
        return Err(AgentError::TargetVanished(String::from(
            "trade holdings changed before settlement",
        )));
    }
    if let Some(p) = world.actors.get_mut(&proposer) {
        inventory::remove_bundle(p, offer)?;
        inventory::add_bundle(p, request)?;
    }
    if let Some(t) = world.actors.get_mut(&target) {
        inventory::remove_bundle(t, request)?;
        inventory::add_bundle(t, offer)?;
    }
    Ok(())
}

/// Apply a resolution: swap (if planned), remove the trade, emit the event.
pub fn apply_resolution(
    world: &mut WorldState,
    resolution: TradeResolution,
) -> Result<(), AgentError> {
    match resolution {
        TradeResolution::Swap {
            trade,
            proposer,
            target,
            offer,
            request,
        } => {
            let outcome = swap(world, proposer, target, &offer, &request);
            world.trades.remove(&trade);
            settle_proposer(world, proposer);
            match outcome {
                Ok(()) => {
                    debug!(trade = %trade, "trade accepted");
                    world.emit(GameEvent::TradeAccepted { trade });
                }
                Err(e) => {
                    world.emit(GameEvent::TradeRejected {
                        trade,
                        failure: Some(RejectionReason::InsufficientResources),
                    });
                    return Err(e);
                }
            }
        }
        TradeResolution::Release { trade, failure } => {
            if let Some(t) = world.trades.remove(&trade) {
                settle_proposer(world, t.proposer);
            }
            debug!(trade = %trade, ?failure, "trade rejected");
            world.emit(GameEvent::TradeRejected { trade, failure });
        }
    }
    Ok(())
}

/// Handle a `trade_respond` command from `responder`.
pub fn respond_trade(
    world: &mut WorldState,
    responder: ActorId,
    trade_id: TradeId,
    accept: bool,
    rules: &RulesConfig,
) -> Result<(), AgentError> {
    let trade = world
        .trades
        .get(&trade_id)
        .ok_or(AgentError::TradeNotFound(trade_id))?;
    if trade.target != responder || trade.status != TradeStatus::Pending {
        return Err(AgentError::TargetVanished(format!(
            "trade {trade_id} is no longer open to {responder}"
        )));
    }
    let resolution = resolve_trade(trade, accept, world, rules);
    apply_resolution(world, resolution)
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// Mark every pending trade at least `trade_window_ticks` old as expired.
///
/// Expired trades keep their status until the next tick start purges them.
pub fn expire_trades(world: &mut WorldState, rules: &RulesConfig) {
    let tick = world.tick();
    let expired: Vec<(TradeId, ActorId)> = world
        .trades
        .values()
        .filter(|t| {
            t.status == TradeStatus::Pending
                && tick.saturating_sub(t.created_tick) >= rules.trade_window_ticks
        })
        .map(|t| (t.id, t.proposer))
        .collect();
    for (id, proposer) in expired {
        if let Some(t) = world.trades.get_mut(&id) {
            t.status = TradeStatus::Expired;
        }
        settle_proposer(world, proposer);
        debug!(trade = %id, "trade expired");
        world.emit(GameEvent::TradeExpired { trade: id });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use frontier_types::{Item, Role};

    use super::*;
    use crate::test_support::{make_world, put_actor};

    fn setup() -> (WorldState, ActorId, ActorId) {
        let mut world = make_world();
        let a = put_actor(&mut world, Role::Woodcutter, 100.0, 100.0);
        let b = put_actor(&mut world, Role::Miner, 130.0, 100.0);
        world.actors.get_mut(&a).unwrap().inventory.insert(Item::Log, 5);
        world.actors.get_mut(&b).unwrap().gold = 20;
        (world, a, b)
    }

    fn logs_for_gold() -> (TradeBundle, TradeBundle) {
        (
            TradeBundle {
                items: BTreeMap::from([(Item::Log, 3)]),
                gold: 0,
            },
            TradeBundle {
                items: BTreeMap::new(),
                gold: 15,
            },
        )
    }

    #[test]
    fn accepted_trade_swaps_exactly() {
        let rules = RulesConfig::default();
        let (mut world, a, b) = setup();
        let (offer, request) = logs_for_gold();
        let id = propose_trade(&mut world, a, b, offer, request).unwrap();
        assert_eq!(world.actors[&a].status, ActorStatus::Trading);

        respond_trade(&mut world, b, id, true, &rules).unwrap();
        assert!(world.trades.is_empty());
        assert_eq!(world.actors[&a].item_count(Item::Log), 2);
        assert_eq!(world.actors[&a].gold, 15);
        assert_eq!(world.actors[&b].item_count(Item::Log), 3);
        assert_eq!(world.actors[&b].gold, 5);
        assert_eq!(world.actors[&a].status, ActorStatus::Idle);
    }

    #[test]
    fn declined_trade_moves_nothing() {
        let rules = RulesConfig::default();
        let (mut world, a, b) = setup();
        let (offer, request) = logs_for_gold();
        let id = propose_trade(&mut world, a, b, offer, request).unwrap();
        respond_trade(&mut world, b, id, false, &rules).unwrap();
        assert!(world.trades.is_empty());
        assert_eq!(world.actors[&a].item_count(Item::Log), 5);
        assert_eq!(world.actors[&b].gold, 20);
    }

    #[test]
    fn accept_fails_when_proposer_spent_the_offer() {
        let rules = RulesConfig::default();
        let (mut world, a, b) = setup();
        let (offer, request) = logs_for_gold();
        let id = propose_trade(&mut world, a, b, offer, request).unwrap();
        world.actors.get_mut(&a).unwrap().inventory.insert(Item::Log, 1);

        let trade = world.trades[&id].clone();
        assert_eq!(
            resolve_trade(&trade, true, &world, &rules),
            TradeResolution::Release {
                trade: id,
                failure: Some(RejectionReason::InsufficientResources),
            }
        );
        respond_trade(&mut world, b, id, true, &rules).unwrap();
        assert_eq!(world.actors[&b].gold, 20);
        assert!(world.trades.is_empty());
    }

    #[test]
    fn accept_fails_out_of_range() {
        let rules = RulesConfig::default();
        let (mut world, a, b) = setup();
        let (offer, request) = logs_for_gold();
        let id = propose_trade(&mut world, a, b, offer, request).unwrap();
        world.move_actor(b, frontier_types::Position::new(400.0, 100.0));
        let trade = world.trades[&id].clone();
        assert!(matches!(
            resolve_trade(&trade, true, &world, &rules),
            TradeResolution::Release {
                failure: Some(RejectionReason::OutOfRange),
                ..
            }
        ));
    }

    #[test]
    fn only_the_target_may_respond() {
        let rules = RulesConfig::default();
        let (mut world, a, b) = setup();
        let (offer, request) = logs_for_gold();
        let id = propose_trade(&mut world, a, b, offer, request).unwrap();
        assert!(respond_trade(&mut world, a, id, true, &rules).is_err());
        assert_eq!(world.trades.len(), 1);
    }

    #[test]
    fn trade_expires_at_window() {
        let rules = RulesConfig::default();
        let (mut world, a, b) = setup();
        let (offer, request) = logs_for_gold();
        let id = propose_trade(&mut world, a, b, offer, request).unwrap();
        while world.tick() < 30 {
            world.begin_tick().unwrap();
            expire_trades(&mut world, &rules);
        }
        assert_eq!(world.trades[&id].status, TradeStatus::Pending);
        world.begin_tick().unwrap();
        expire_trades(&mut world, &rules);
        assert_eq!(world.trades[&id].status, TradeStatus::Expired);
        assert_eq!(world.actors[&a].status, ActorStatus::Idle);
        world.begin_tick().unwrap();
        assert!(world.trades.is_empty());
    }
}
