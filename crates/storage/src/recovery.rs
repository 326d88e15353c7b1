//! Crash recovery: picking the draft to offer on launch.

use chrono::Duration;
use fueltrack_core::{Cruise, Time};
use tracing::info;

use super::trait_::{BackupStore, Result};

/// Backups modified at most this long ago are offered.
pub const RECOVERY_WINDOW_MINUTES: i64 = 60;

/// Default recovery window.
pub fn default_window() -> Duration {
    Duration::minutes(RECOVERY_WINDOW_MINUTES)
}

/// The most recently modified backup within `window` of `now`, if any.
pub fn select_recoverable(backups: &[Cruise], now: Time, window: Duration) -> Option<&Cruise> {
    backups
        .iter()
        .filter(|cruise| now - cruise.last_modified <= window)
        .max_by_key(|cruise| cruise.last_modified)
}

/// Scan a store for a recoverable draft.
pub async fn find_recoverable(
    store: &dyn BackupStore,
    now: Time,
    window: Duration,
) -> Result<Option<Cruise>> {
    let backups = store.list().await?;
    let found = select_recoverable(&backups, now, window).cloned();
    if let Some(cruise) = &found {
        info!(cruise = %cruise.id, name = %cruise.name, "recoverable draft found");
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackupStore;
    use chrono::{TimeZone, Utc};

    fn now() -> Time {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn modified(ago: Duration) -> Cruise {
        Cruise {
            last_modified: now() - ago,
            ..Cruise::new()
        }
    }

    #[test]
    fn test_recent_backup_offered() {
        let recent = modified(Duration::minutes(10));
        let stale = modified(Duration::hours(2));
        let backups = vec![stale, recent.clone()];

        let offered = select_recoverable(&backups, now(), default_window());
        assert_eq!(offered.map(|c| c.id), Some(recent.id));
    }

    #[test]
    fn test_only_stale_backup_offers_nothing() {
        let backups = vec![modified(Duration::hours(2))];
        assert!(select_recoverable(&backups, now(), default_window()).is_none());
        assert!(select_recoverable(&[], now(), default_window()).is_none());
    }

    #[test]
    fn test_newest_of_several_recent() {
        let a = modified(Duration::minutes(50));
        let b = modified(Duration::minutes(5));
        let backups = vec![b.clone(), a];
        let offered = select_recoverable(&backups, now(), default_window());
        assert_eq!(offered.map(|c| c.id), Some(b.id));
    }

    #[tokio::test]
    async fn test_find_in_store() {
        let store = MemoryBackupStore::new();
        let recent = modified(Duration::minutes(10));
        store.put(&recent).await.unwrap();
        store.put(&modified(Duration::hours(2))).await.unwrap();

        let found = find_recoverable(&store, now(), default_window()).await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(recent.id));
    }
}
