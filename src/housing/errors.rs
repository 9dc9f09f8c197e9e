use thiserror::Error;

/// Errors that can arise while reading the house catalog or a player's lease ledger.
///
/// "Player does not own this house" is deliberately absent: ledger queries report it
/// through `Option`/result enums because triggers probe ownership routinely.
#[derive(Debug, Error)]
pub enum LeaseError {
    /// Wrapper around sled's error type. The record store is unavailable.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// The owned house list stored in a player record is not valid JSON.
    #[error("house list encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when looking up a house id that is not in the catalog.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Catalog configuration rejected at construction time.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// A stored expiry cannot be represented as a calendar date.
    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),
}
