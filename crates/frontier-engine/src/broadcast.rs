//! Tick callback that fans tick results out to subscribers.
//!
//! Each completed tick is published on a `tokio::sync::broadcast` channel as
//! a shared [`TickResult`]. A transport layer subscribes to forward results
//! to clients; the engine itself subscribes an event logger. Milestone
//! events (deaths, evolutions, knockouts) are also logged directly from the
//! tick loop.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use frontier_core::TickCallback;
use frontier_types::{GameEvent, TickResult};
use frontier_world::WorldState;

/// Callback that bridges the tick loop to broadcast subscribers.
pub struct BroadcastCallback {
    tx: broadcast::Sender<Arc<TickResult>>,
}

impl BroadcastCallback {
    /// Create a callback with room for `capacity` unread results per
    /// subscriber. Slow subscribers skip ahead rather than stall the loop.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to future tick results.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TickResult>> {
        self.tx.subscribe()
    }
}

impl TickCallback for BroadcastCallback {
    fn on_tick(&mut self, result: &TickResult, world: &WorldState) {
        for event in &result.events {
            log_milestone(result.tick, event);
        }

        // `send` only fails when nobody is subscribed.
        let receivers = self.tx.send(Arc::new(result.clone())).unwrap_or(0);
        debug!(
            tick = result.tick,
            receivers,
            actors = world.actors.len(),
            monsters = world.monsters.len(),
            "tick broadcast sent"
        );
    }
}

fn log_milestone(tick: u64, event: &GameEvent) {
    match event {
        GameEvent::Death {
            victim,
            killer,
            permanent,
            ..
        } => info!(tick, ?victim, ?killer, permanent, "death"),
        GameEvent::Evolved { actor, stage } => info!(tick, actor = %actor, stage, "evolved"),
        GameEvent::BehemothKnockedOut { behemoth } => {
            info!(tick, behemoth = %behemoth, "behemoth knocked out");
        }
        GameEvent::AllianceCreated { .. } | GameEvent::AllianceDisbanded { .. } => {
            info!(tick, ?event, "alliance change");
        }
        _ => {}
    }
}

/// Drain a subscription, logging a one-line digest per tick at debug level.
///
/// Returns when the callback (and with it the sender) is dropped.
pub async fn log_subscriber(mut rx: broadcast::Receiver<Arc<TickResult>>) {
    loop {
        match rx.recv().await {
            Ok(result) => debug!(
                tick = result.tick,
                accepted = result.accepted.len(),
                rejected = result.rejected.len(),
                events = result.events.len(),
                changes = result.changes.len(),
                chat = result.chat.len(),
                "tick digest"
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "tick subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_world::WorldSettings;

    use super::*;

    fn result(tick: u64) -> TickResult {
        TickResult {
            tick,
            ..TickResult::default()
        }
    }

    #[test]
    fn subscribers_receive_each_tick() {
        let world = WorldState::new(1, WorldSettings::default()).unwrap();
        let mut callback = BroadcastCallback::new(8);
        let mut rx = callback.subscribe();

        callback.on_tick(&result(1), &world);
        callback.on_tick(&result(2), &world);

        assert_eq!(rx.try_recv().unwrap().tick, 1);
        assert_eq!(rx.try_recv().unwrap().tick, 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let world = WorldState::new(1, WorldSettings::default()).unwrap();
        let mut callback = BroadcastCallback::new(1);
        callback.on_tick(&result(1), &world);
        let mut rx = callback.subscribe();
        callback.on_tick(&result(2), &world);
        assert_eq!(rx.try_recv().unwrap().tick, 2);
    }

    #[tokio::test]
    async fn log_subscriber_stops_when_sender_drops() {
        let callback = BroadcastCallback::new(4);
        let rx = callback.subscribe();
        drop(callback);
        log_subscriber(rx).await;
    }
}
