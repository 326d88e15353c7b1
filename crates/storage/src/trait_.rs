//! Backup store abstraction.

use async_trait::async_trait;
use fueltrack_core::{Cruise, CruiseId};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backup database error
    #[error("Database error: {0}")]
    Database(String),

    /// Directory or item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// File name that would resolve outside the voyage directory
    #[error("Unsafe file name: {0:?}")]
    UnsafeName(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

/// Local store of voyage snapshots, one per cruise id.
///
/// Independent of the voyage directory, so a draft survives even when the
/// directory is gone.
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Write a snapshot. The last write for an id wins.
    async fn put(&self, cruise: &Cruise) -> Result<()>;

    /// Snapshot for an id.
    async fn get(&self, id: CruiseId) -> Result<Option<Cruise>>;

    /// All snapshots, most recently modified first.
    async fn list(&self) -> Result<Vec<Cruise>>;

    /// Remove a snapshot. Removing a missing id is not an error.
    async fn delete(&self, id: CruiseId) -> Result<()>;
}
