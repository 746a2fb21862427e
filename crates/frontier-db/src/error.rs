//! Data layer errors.

/// Everything that can go wrong talking to the snapshot database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A query or connection failed.
    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Applying the embedded migrations failed.
    #[error("migration: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A snapshot did not encode to, or decode from, JSON.
    #[error("snapshot encoding: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A tick number does not fit the `BIGINT` column.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// The connection settings are unusable.
    #[error("bad database settings: {0}")]
    Config(String),
}
