//! Command intake and decoding.
//!
//! The transport layer hands every actor's latest [`RawCommand`] to the
//! [`CommandQueue`]; at most one command per actor survives until the next
//! drain (last write wins). [`CommandQueue::drain`] decodes each raw
//! command into the closed [`Command`] union and returns them in ascending
//! actor order. Anything malformed or stale is dropped and logged at debug
//! level; clients learn nothing about dropped input.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use tracing::debug;

use frontier_types::{ActorId, Command, ItemStack, RawCommand};

/// Why a raw command was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The kind or its parameters did not match any command shape.
    #[error("malformed command: {0}")]
    Malformed(String),

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate")]
    NonFinite,

    /// An item list names the same item twice.
    #[error("duplicate item in list")]
    DuplicateItem,

    /// An item stack or feed amount is zero.
    #[error("zero quantity")]
    ZeroQuantity,

    /// A trade that neither offers nor requests anything.
    #[error("empty trade")]
    EmptyTrade,

    /// Submitted for a tick that has not happened yet.
    #[error("submitted for future tick {submitted} (server at {server})")]
    FromFuture {
        /// Client tick.
        submitted: u64,
        /// Server tick at drain.
        server: u64,
    },

    /// Submitted too long ago.
    #[error("stale command from tick {submitted} (server at {server})")]
    Stale {
        /// Client tick.
        submitted: u64,
        /// Server tick at drain.
        server: u64,
    },
}

/// A decoded command paired with the actor that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCommand {
    /// Issuer.
    pub actor: ActorId,
    /// The decoded command.
    pub command: Command,
}

/// Latest raw command per actor, waiting for the next tick.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    pending: BTreeMap<ActorId, RawCommand>,
    max_age_ticks: u64,
}

impl CommandQueue {
    /// Create an empty queue that drops commands older than `max_age_ticks`.
    pub const fn new(max_age_ticks: u64) -> Self {
        Self {
            pending: BTreeMap::new(),
            max_age_ticks,
        }
    }

    /// Store `raw` as `actor`'s command for the upcoming tick, replacing
    /// any earlier one.
    pub fn enqueue(&mut self, actor: ActorId, raw: RawCommand, server_tick: u64) {
        if let Some(previous) = self.pending.insert(actor, raw) {
            debug!(
                actor = %actor,
                replaced = %previous.kind,
                server_tick,
                "command replaced by a later submission"
            );
        }
    }

    /// Number of actors with a pending command.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending command, decode it and return the survivors in
    /// ascending actor order.
    pub fn drain(&mut self, server_tick: u64) -> Vec<QueuedCommand> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .filter_map(|(actor, raw)| {
                match decode(&raw, server_tick, self.max_age_ticks) {
                    Ok(command) => Some(QueuedCommand { actor, command }),
                    Err(err) => {
                        debug!(actor = %actor, kind = %raw.kind, error = %err, "dropped command");
                        None
                    }
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one raw command.
///
/// The kind string and params are reassembled into the adjacently tagged
/// wire form of [`Command`]; parameterless kinds may send `null` or `{}`.
pub fn decode(
    raw: &RawCommand,
    server_tick: u64,
    max_age_ticks: u64,
) -> Result<Command, DecodeError> {
    if raw.submitted_tick > server_tick {
        return Err(DecodeError::FromFuture {
            submitted: raw.submitted_tick,
            server: server_tick,
        });
    }
    if server_tick.saturating_sub(raw.submitted_tick) > max_age_ticks {
        return Err(DecodeError::Stale {
            submitted: raw.submitted_tick,
            server: server_tick,
        });
    }

    let mut wire = Map::new();
    wire.insert(String::from("kind"), Value::String(raw.kind.clone()));
    let empty = match &raw.params {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if !empty {
        wire.insert(String::from("params"), raw.params.clone());
    }

    let command: Command = serde_json::from_value(Value::Object(wire))
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    check_shape(&command)?;
    Ok(command)
}

/// Checks serde cannot express: finite coordinates, positive quantities,
/// unique items and non-empty trades.
fn check_shape(command: &Command) -> Result<(), DecodeError> {
    if let Some(pos) = command.coordinates()
        && !pos.is_finite()
    {
        return Err(DecodeError::NonFinite);
    }
    match command {
        Command::TradePropose {
            offer_items,
            offer_gold,
            request_items,
            request_gold,
            ..
        } => {
            check_stacks(offer_items)?;
            check_stacks(request_items)?;
            if offer_items.is_empty()
                && request_items.is_empty()
                && *offer_gold == 0
                && *request_gold == 0
            {
                return Err(DecodeError::EmptyTrade);
            }
            Ok(())
        }
        Command::Feed { amount: 0, .. } => Err(DecodeError::ZeroQuantity),
        _ => Ok(()),
    }
}

fn check_stacks(stacks: &[ItemStack]) -> Result<(), DecodeError> {
    let mut seen = BTreeSet::new();
    for stack in stacks {
        if stack.quantity == 0 {
            return Err(DecodeError::ZeroQuantity);
        }
        if !seen.insert(stack.item) {
            return Err(DecodeError::DuplicateItem);
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use frontier_types::{CombatantRef, Item, MonsterId};

    use super::*;

    fn raw(kind: &str, params: Value, submitted_tick: u64) -> RawCommand {
        RawCommand {
            kind: String::from(kind),
            params,
            submitted_tick,
        }
    }

    #[test]
    fn last_write_wins_per_actor() {
        let mut queue = CommandQueue::new(5);
        let a = ActorId::new();
        queue.enqueue(a, raw("move", json!({"x": 1.0, "y": 1.0}), 3), 3);
        queue.enqueue(a, raw("stop", Value::Null, 3), 3);
        assert_eq!(queue.len(), 1);

        let drained = queue.drain(3);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained.first().unwrap().command, Command::Stop);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_orders_by_actor_id() {
        let mut queue = CommandQueue::new(5);
        let mut ids: Vec<ActorId> = (0..4).map(|_| ActorId::new()).collect();
        for id in ids.iter().rev() {
            queue.enqueue(*id, raw("stop", json!({}), 1), 1);
        }
        ids.sort();
        let drained: Vec<ActorId> = queue.drain(1).into_iter().map(|q| q.actor).collect();
        assert_eq!(drained, ids);
    }

    #[test]
    fn parameterless_kinds_accept_empty_params() {
        assert_eq!(decode(&raw("stop", json!({}), 1), 1, 5), Ok(Command::Stop));
        assert_eq!(
            decode(&raw("alliance_leave", Value::Null, 1), 1, 5),
            Ok(Command::AllianceLeave)
        );
    }

    #[test]
    fn attack_target_decodes() {
        let id = MonsterId::new();
        let cmd = decode(
            &raw("attack", json!({"target": {"monster": id.to_string()}}), 2),
            2,
            5,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Attack {
                target: CombatantRef::Monster(id)
            }
        );
    }

    #[test]
    fn malformed_input_is_dropped() {
        let cases = [
            raw("teleport", json!({"x": 1.0}), 1),
            raw("move", json!({"x": 1.0}), 1),
            raw("move", json!({"x": "far", "y": 1.0}), 1),
            raw("gather", json!({"resource_id": 7}), 1),
            raw("move", Value::Null, 1),
        ];
        for case in cases {
            assert!(
                matches!(decode(&case, 1, 5), Err(DecodeError::Malformed(_))),
                "{case:?} should be malformed"
            );
        }
    }

    #[test]
    fn zero_and_duplicate_items_are_dropped() {
        let target = ActorId::new().to_string();
        let zero = raw(
            "trade_propose",
            json!({"target_id": target, "offer_items": [{"item": "log", "quantity": 0}]}),
            1,
        );
        assert_eq!(decode(&zero, 1, 5), Err(DecodeError::ZeroQuantity));

        let dup = raw(
            "trade_propose",
            json!({
                "target_id": target,
                "offer_items": [{"item": "log", "quantity": 1}, {"item": "log", "quantity": 2}]
            }),
            1,
        );
        assert_eq!(decode(&dup, 1, 5), Err(DecodeError::DuplicateItem));

        let empty = raw("trade_propose", json!({"target_id": target}), 1);
        assert_eq!(decode(&empty, 1, 5), Err(DecodeError::EmptyTrade));
    }

    #[test]
    fn gold_only_trade_is_kept() {
        let target = ActorId::new();
        let cmd = decode(
            &raw(
                "trade_propose",
                json!({"target_id": target.to_string(), "offer_gold": 5,
                       "request_items": [{"item": "plank", "quantity": 2}]}),
                1,
            ),
            1,
            5,
        )
        .unwrap();
        let wanted = vec![ItemStack {
            item: Item::Plank,
            quantity: 2,
        }];
        assert!(matches!(
            cmd,
            Command::TradePropose { ref request_items, offer_gold: 5, .. } if *request_items == wanted
        ));
    }

    #[test]
    fn zero_feed_is_dropped() {
        let cmd = raw(
            "feed",
            json!({"behemoth_id": frontier_types::BehemothId::new().to_string(), "amount": 0}),
            1,
        );
        assert_eq!(decode(&cmd, 1, 5), Err(DecodeError::ZeroQuantity));
    }

    #[test]
    fn future_and_stale_commands_are_dropped() {
        let future = raw("stop", Value::Null, 11);
        assert!(matches!(
            decode(&future, 10, 5),
            Err(DecodeError::FromFuture { .. })
        ));
        let stale = raw("stop", Value::Null, 4);
        assert!(matches!(decode(&stale, 10, 5), Err(DecodeError::Stale { .. })));
        let oldest_allowed = raw("stop", Value::Null, 5);
        assert!(decode(&oldest_allowed, 10, 5).is_ok());
    }
}
