//! In-process backup store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fueltrack_core::{Cruise, CruiseId};
use tokio::sync::RwLock;

use super::trait_::{BackupStore, Result};

/// Backup store held in memory. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackupStore {
    backups: Arc<RwLock<HashMap<CruiseId, Cruise>>>,
}

impl MemoryBackupStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots held.
    pub async fn len(&self) -> usize {
        self.backups.read().await.len()
    }

    /// Whether no snapshot is held.
    pub async fn is_empty(&self) -> bool {
        self.backups.read().await.is_empty()
    }
}

#[async_trait]
impl BackupStore for MemoryBackupStore {
    async fn put(&self, cruise: &Cruise) -> Result<()> {
        self.backups.write().await.insert(cruise.id, cruise.clone());
        Ok(())
    }

    async fn get(&self, id: CruiseId) -> Result<Option<Cruise>> {
        Ok(self.backups.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Cruise>> {
        let mut all: Vec<Cruise> = self.backups.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(all)
    }

    async fn delete(&self, id: CruiseId) -> Result<()> {
        self.backups.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryBackupStore::new();
        let other = store.clone();
        let cruise = Cruise::new();

        store.put(&cruise).await.unwrap();
        assert_eq!(other.get(cruise.id).await.unwrap(), Some(cruise.clone()));
        assert_eq!(other.len().await, 1);

        other.delete(cruise.id).await.unwrap();
        assert!(store.is_empty().await);
    }
}
