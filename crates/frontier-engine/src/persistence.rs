//! Background snapshot writer.
//!
//! The tick loop hands snapshots to a [`ChannelSink`], which pushes them into
//! a bounded channel without waiting. A separate task owns the database pool
//! and writes them one at a time. When the writer falls behind the channel
//! fills up and further snapshots are dropped with a warning; the tick loop
//! never waits on the database.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use frontier_core::SnapshotSink;
use frontier_db::{PostgresPool, SnapshotStore};
use frontier_types::WorldSnapshot;

/// Non-blocking sink feeding the writer task.
pub struct ChannelSink {
    tx: mpsc::Sender<WorldSnapshot>,
}

impl SnapshotSink for ChannelSink {
    fn offer(&mut self, snapshot: WorldSnapshot) {
        match self.tx.try_send(snapshot) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(tick = dropped.tick, "snapshot writer is behind, snapshot dropped");
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!(tick = dropped.tick, "snapshot writer has stopped, snapshot dropped");
            }
        }
    }
}

/// Start the writer task. Dropping the returned sink lets the task finish
/// after it has written everything still queued.
pub fn spawn_writer(pool: PostgresPool, capacity: usize) -> (ChannelSink, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(write_snapshots(pool, rx));
    (ChannelSink { tx }, handle)
}

async fn write_snapshots(pool: PostgresPool, mut rx: mpsc::Receiver<WorldSnapshot>) {
    let store = SnapshotStore::new(pool.pool());
    let mut written: u64 = 0;
    while let Some(snapshot) = rx.recv().await {
        match store.save(&snapshot).await {
            Ok(()) => {
                written = written.saturating_add(1);
                debug!(tick = snapshot.tick, "snapshot persisted");
            }
            Err(err) => warn!(tick = snapshot.tick, error = %err, "snapshot write failed"),
        }
    }
    info!(written, "snapshot writer finished");
    pool.close().await;
}
