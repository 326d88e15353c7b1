//! SQLite backup store.
//!
//! One row per cruise id holding the full snapshot as JSON, indexed by its
//! last-modified time for the recovery scan.

use std::path::Path;

use async_trait::async_trait;
use chrono::SecondsFormat;
use fueltrack_core::{Cruise, CruiseId};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::Row;
use tracing::warn;

use super::trait_::{BackupStore, Result};

/// SQLite backup store.
#[derive(Clone)]
pub struct SqliteBackupStore {
    /// Database connection pool
    pool: sqlx::SqlitePool,
}

impl SqliteBackupStore {
    /// Open (or create) a backup database file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// A single connection that is never recycled, since every SQLite
    /// connection to `:memory:` gets its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS backups (
                id TEXT PRIMARY KEY,
                last_modified TEXT NOT NULL,
                data TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_backups_last_modified ON backups(last_modified)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Close all connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Cruise> {
        let data: String = row.try_get("data")?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Fixed-width UTC text, so string order is time order.
fn sort_key(cruise: &Cruise) -> String {
    cruise
        .last_modified
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl BackupStore for SqliteBackupStore {
    async fn put(&self, cruise: &Cruise) -> Result<()> {
        let data = serde_json::to_string(cruise)?;

        sqlx::query("INSERT OR REPLACE INTO backups (id, last_modified, data) VALUES (?, ?, ?)")
            .bind(cruise.id.to_string())
            .bind(sort_key(cruise))
            .bind(data)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get(&self, id: CruiseId) -> Result<Option<Cruise>> {
        let row = sqlx::query("SELECT data FROM backups WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn list(&self) -> Result<Vec<Cruise>> {
        let rows = sqlx::query("SELECT id, data FROM backups ORDER BY last_modified DESC")
            .fetch_all(&self.pool)
            .await?;

        let mut backups = Vec::with_capacity(rows.len());
        for row in &rows {
            match Self::decode(row) {
                Ok(cruise) => backups.push(cruise),
                Err(e) => {
                    let id: String = row.try_get("id").unwrap_or_default();
                    warn!(%id, error = %e, "skipping unreadable backup");
                }
            }
        }
        Ok(backups)
    }

    async fn delete(&self, id: CruiseId) -> Result<()> {
        sqlx::query("DELETE FROM backups WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(minutes: i64) -> Cruise {
        let mut cruise = Cruise::new();
        cruise.last_modified = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
            + Duration::minutes(minutes);
        cruise
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = SqliteBackupStore::in_memory().await.unwrap();
        let cruise = at(0);

        store.put(&cruise).await.unwrap();
        assert_eq!(store.get(cruise.id).await.unwrap(), Some(cruise.clone()));

        store.delete(cruise.id).await.unwrap();
        assert_eq!(store.get(cruise.id).await.unwrap(), None);
        store.delete(cruise.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = SqliteBackupStore::in_memory().await.unwrap();
        let mut cruise = at(0);
        store.put(&cruise).await.unwrap();

        cruise.name = "Renamed".into();
        cruise.last_modified = cruise.last_modified + Duration::seconds(30);
        store.put(&cruise).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Renamed");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = SqliteBackupStore::in_memory().await.unwrap();
        let old = at(-120);
        let new = at(-10);
        let mid = at(-60);
        for c in [&old, &new, &mid] {
            store.put(c).await.unwrap();
        }
        let ids: Vec<_> = store.list().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![new.id, mid.id, old.id]);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("backups.db");
        let cruise = at(0);
        {
            let store = SqliteBackupStore::open(&path).await.unwrap();
            store.put(&cruise).await.unwrap();
            store.close().await;
        }
        let store = SqliteBackupStore::open(&path).await.unwrap();
        assert!(store.health_check().await);
        assert_eq!(store.get(cruise.id).await.unwrap().map(|c| c.id), Some(cruise.id));
    }
}
