//! World snapshot persistence.
//!
//! Each snapshot is one row of `world_state_snapshots`: the tick as primary
//! key, the world seed, and the full [`WorldSnapshot`] as JSONB. Writes are
//! idempotent per tick, so a retried save simply replaces the row.

use sqlx::PgPool;

use frontier_types::WorldSnapshot;

use crate::error::DbError;

/// Operations on the `world_state_snapshots` table.
pub struct SnapshotStore<'a> {
    pool: &'a PgPool,
}

impl<'a> SnapshotStore<'a> {
    /// Create a new snapshot store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a snapshot, replacing any existing row for the same tick.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if the snapshot cannot be encoded,
    /// [`DbError::OutOfRange`] if the tick does not fit a `BIGINT`, or
    /// [`DbError::Postgres`] if the insert fails.
    pub async fn save(&self, snapshot: &WorldSnapshot) -> Result<(), DbError> {
        let tick = i64::try_from(snapshot.tick)
            .map_err(|e| DbError::OutOfRange(format!("tick {}: {e}", snapshot.tick)))?;
        // The seed is stored bit-for-bit; the JSON copy stays authoritative.
        let seed = i64::from_ne_bytes(snapshot.seed.to_ne_bytes());
        let state = serde_json::to_value(snapshot)?;

        sqlx::query(
            r"INSERT INTO world_state_snapshots (tick, seed, state)
              VALUES ($1, $2, $3)
              ON CONFLICT (tick) DO UPDATE SET
                seed = EXCLUDED.seed,
                state = EXCLUDED.state,
                created_at = now()",
        )
        .bind(tick)
        .bind(seed)
        .bind(&state)
        .execute(self.pool)
        .await?;

        tracing::debug!(tick = snapshot.tick, "saved world snapshot");
        Ok(())
    }

    /// Load the snapshot with the highest tick, or `None` on an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Serialization`] if the stored state does not decode.
    pub async fn load_latest(&self) -> Result<Option<WorldSnapshot>, DbError> {
        let row = sqlx::query_as::<_, WorldSnapshotRow>(
            r"SELECT tick, seed, state, created_at
              FROM world_state_snapshots
              ORDER BY tick DESC
              LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?;

        row.map(WorldSnapshotRow::into_snapshot).transpose()
    }

    /// Metadata of the most recent snapshots (newest first), without
    /// decoding their state.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn recent(&self, count: i64) -> Result<Vec<WorldSnapshotRow>, DbError> {
        let rows = sqlx::query_as::<_, WorldSnapshotRow>(
            r"SELECT tick, seed, state, created_at
              FROM world_state_snapshots
              ORDER BY tick DESC
              LIMIT $1",
        )
        .bind(count)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete all but the newest `keep` snapshots. Returns the rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn prune(&self, keep: i64) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"DELETE FROM world_state_snapshots
              WHERE tick NOT IN (
                SELECT tick FROM world_state_snapshots ORDER BY tick DESC LIMIT $1
              )",
        )
        .bind(keep)
        .execute(self.pool)
        .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            tracing::info!(removed, keep, "pruned old world snapshots");
        }
        Ok(removed)
    }
}

/// A row from the `world_state_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorldSnapshotRow {
    /// Tick the snapshot was taken at.
    pub tick: i64,
    /// World seed, bit-cast to a signed integer.
    pub seed: i64,
    /// The full snapshot as JSON.
    pub state: serde_json::Value,
    /// When the row was written.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl WorldSnapshotRow {
    /// Decode the stored state.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if the JSON is not a snapshot.
    pub fn into_snapshot(self) -> Result<WorldSnapshot, DbError> {
        Ok(serde_json::from_value(self.state)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(state: serde_json::Value) -> WorldSnapshotRow {
        WorldSnapshotRow {
            tick: 5,
            seed: 42,
            state,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_decodes_stored_snapshot() {
        let snapshot = WorldSnapshot {
            tick: 5,
            seed: 42,
            ..WorldSnapshot::default()
        };
        let decoded = row(serde_json::to_value(&snapshot).unwrap())
            .into_snapshot()
            .unwrap();
        assert_eq!(decoded.tick, 5);
        assert_eq!(decoded.seed, 42);
    }

    #[test]
    fn garbage_state_is_a_serialization_error() {
        let result = row(serde_json::json!({"tick": "five"})).into_snapshot();
        assert!(matches!(result, Err(DbError::Serialization(_))));
    }

    #[test]
    fn seed_bit_cast_round_trips() {
        let seed = u64::MAX - 3;
        let stored = i64::from_ne_bytes(seed.to_ne_bytes());
        assert_eq!(u64::from_ne_bytes(stored.to_ne_bytes()), seed);
    }
}
