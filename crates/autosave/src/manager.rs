//! Persistence manager: debounced autosave, periodic backup, and recovery.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use fueltrack_core::{voyage_filename, Cruise, CruiseId, Time, FORMAT_VERSION};
use fueltrack_storage::{find_recoverable, BackupStore, StorageError, VoyageDirectory};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::AutosaveConfig;
use crate::scheduler::{Debouncer, IntervalTask};

/// Errors from persisting a voyage. None of them end the editing session.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The voyage file has nowhere to go
    #[error("No voyage directory chosen")]
    NoDirectory,

    /// `save_now` without a voyage open
    #[error("No voyage is being edited")]
    NothingToSave,

    /// Writing the voyage file failed
    #[error("Could not write voyage file: {0}")]
    File(#[source] StorageError),

    /// Writing or reading the backup store failed
    #[error("Backup store failed: {0}")]
    Backup(#[source] StorageError),
}

/// Latest outcome of a write.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    /// Nothing written yet
    Idle,
    /// A write is in progress
    Saving,
    /// The last write succeeded
    Saved {
        /// Save time stamped on the voyage
        at: Time,
        /// Written by "save now" rather than the debounce
        manual: bool,
    },
    /// The last write failed
    Error(String),
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Idle => Ok(()),
            SaveStatus::Saving => write!(f, "Saving..."),
            SaveStatus::Saved { manual: true, .. } => write!(f, "Saved manually"),
            SaveStatus::Saved { at, .. } => write!(f, "Saved at {}", at.format("%H:%M:%S")),
            SaveStatus::Error(message) => write!(f, "Save failed: {}", message),
        }
    }
}

/// A successful write.
#[derive(Debug, Clone)]
pub struct SavedVoyage {
    /// The cruise as written, stamped with the save time and format version
    pub cruise: Cruise,
    /// Voyage file written
    pub path: PathBuf,
}

/// State shared with the timer tasks.
struct Shared {
    directory: RwLock<Option<VoyageDirectory>>,
    store: Arc<dyn BackupStore>,
    current: watch::Sender<Option<Cruise>>,
    status: watch::Sender<SaveStatus>,
    /// One write at a time, in the order they were started
    writing: Mutex<()>,
}

impl Shared {
    /// The cruise being edited, if it is still `id`.
    fn snapshot_for(&self, id: CruiseId) -> Option<Cruise> {
        self.current.borrow().as_ref().filter(|c| c.id == id).cloned()
    }

    /// Write the voyage file, then the backup.
    ///
    /// The backup is attempted even when the file write fails; the first
    /// failure is returned.
    async fn persist(&self, cruise: Cruise, manual: bool) -> Result<SavedVoyage, PersistenceError> {
        self.status.send_replace(SaveStatus::Saving);
        let _writing = self.writing.lock().await;

        let mut stamped = cruise.committed(Utc::now());
        stamped.version = FORMAT_VERSION.to_string();
        if stamped.filename.is_none() {
            stamped.filename = Some(voyage_filename(&stamped));
        }

        let file = match self.directory.read().await.as_ref() {
            Some(dir) => dir.save(&stamped).await.map_err(PersistenceError::File),
            None => Err(PersistenceError::NoDirectory),
        };
        let backup = self.store.put(&stamped).await.map_err(PersistenceError::Backup);

        match file.and_then(|path| backup.map(|()| path)) {
            Ok(path) => {
                debug!(cruise = %stamped.id, path = %path.display(), manual, "voyage saved");
                self.status.send_replace(SaveStatus::Saved {
                    at: stamped.last_modified,
                    manual,
                });
                Ok(SavedVoyage {
                    cruise: stamped,
                    path,
                })
            }
            Err(e) => {
                error!(cruise = %stamped.id, error = %e, "voyage save failed");
                self.status.send_replace(SaveStatus::Error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn autosave(&self, id: CruiseId) {
        let Some(cruise) = self.snapshot_for(id) else {
            debug!(cruise = %id, "autosave skipped for inactive voyage");
            return;
        };
        // Failure is already on the status channel; the next edit retries.
        let _ = self.persist(cruise, false).await;
    }

    async fn periodic_backup(&self, id: CruiseId) {
        let Some(cruise) = self.snapshot_for(id) else {
            return;
        };
        match self.store.put(&cruise).await {
            Ok(()) => debug!(cruise = %id, "periodic backup written"),
            Err(e) => {
                warn!(cruise = %id, error = %e, "periodic backup failed");
                self.status
                    .send_replace(SaveStatus::Error(PersistenceError::Backup(e).to_string()));
            }
        }
    }
}

/// Keeps the voyage directory and the backup store in step with the voyage
/// being edited.
///
/// Every change restarts the autosave debounce. While a voyage is being
/// edited a backup snapshot is also written on a fixed period. Switching to
/// another voyage or stopping cancels both timers, so an abandoned voyage is
/// never written over a newer one.
pub struct PersistenceManager {
    shared: Arc<Shared>,
    config: AutosaveConfig,
    debounce: Debouncer,
    backup: IntervalTask,
}

impl PersistenceManager {
    /// Create a manager with no voyage directory.
    pub fn new(store: Arc<dyn BackupStore>, config: AutosaveConfig) -> Self {
        let (current, _) = watch::channel(None);
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                directory: RwLock::new(None),
                store,
                current,
                status,
                writing: Mutex::new(()),
            }),
            debounce: Debouncer::new(config.debounce),
            backup: IntervalTask::new(config.backup_interval),
            config,
        }
    }

    /// Set the voyage directory.
    pub fn with_directory(self, directory: VoyageDirectory) -> Self {
        if let Ok(mut slot) = self.shared.directory.try_write() {
            *slot = Some(directory);
        }
        self
    }

    /// Replace the voyage directory.
    pub async fn set_directory(&self, directory: VoyageDirectory) {
        info!(root = %directory.root().display(), "voyage directory set");
        *self.shared.directory.write().await = Some(directory);
    }

    /// Timer settings.
    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    /// The backup store.
    pub fn store(&self) -> &Arc<dyn BackupStore> {
        &self.shared.store
    }

    /// Subscribe to save status updates.
    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.shared.status.subscribe()
    }

    /// The voyage being edited.
    pub fn current(&self) -> Option<Cruise> {
        self.shared.current.borrow().clone()
    }

    /// Begin editing `cruise`.
    ///
    /// Timers for any previous voyage are cancelled before the backup
    /// interval starts for this one.
    pub fn start_editing(&mut self, cruise: Cruise) {
        self.cancel_timers();
        let id = cruise.id;
        self.shared.current.send_replace(Some(cruise));

        let shared = Arc::clone(&self.shared);
        self.backup.start(move || {
            let shared = Arc::clone(&shared);
            async move { shared.periodic_backup(id).await }
        });
        debug!(cruise = %id, "editing started");
    }

    /// Record a committed change and restart the autosave debounce.
    ///
    /// A change to a different voyage than the one being edited starts
    /// editing that voyage.
    pub fn cruise_changed(&mut self, cruise: Cruise) {
        let id = cruise.id;
        let same = self.shared.current.borrow().as_ref().map(|c| c.id) == Some(id);
        if same {
            self.shared.current.send_replace(Some(cruise));
        } else {
            self.start_editing(cruise);
        }

        let shared = Arc::clone(&self.shared);
        self.debounce.schedule(async move { shared.autosave(id).await });
    }

    /// Stop editing and cancel both timers.
    ///
    /// A debounced change that is still waiting is not written. A save that
    /// has already started finishes writing the file and the backup.
    pub fn stop(&mut self) {
        self.cancel_timers();
        if let Some(cruise) = self.shared.current.send_replace(None) {
            debug!(cruise = %cruise.id, "editing stopped");
        }
    }

    /// Whether an autosave is waiting for the debounce.
    pub fn save_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Write the voyage being edited now, bypassing the debounce.
    pub async fn save_now(&mut self) -> Result<SavedVoyage, PersistenceError> {
        self.debounce.cancel();
        let cruise = self.current().ok_or(PersistenceError::NothingToSave)?;
        let saved = self.shared.persist(cruise, true).await?;
        info!(path = %saved.path.display(), "Saved manually");
        Ok(saved)
    }

    /// The draft to offer on launch: the newest backup inside the
    /// recovery window.
    pub async fn recoverable(&self, now: Time) -> Result<Option<Cruise>, PersistenceError> {
        find_recoverable(self.shared.store.as_ref(), now, self.config.recovery_window)
            .await
            .map_err(PersistenceError::Backup)
    }

    /// Delete a dismissed draft from the backup store.
    pub async fn discard_backup(&self, id: CruiseId) -> Result<(), PersistenceError> {
        self.shared
            .store
            .delete(id)
            .await
            .map_err(PersistenceError::Backup)?;
        info!(cruise = %id, "backup discarded");
        Ok(())
    }

    /// Every backup, most recently modified first.
    pub async fn backups(&self) -> Result<Vec<Cruise>, PersistenceError> {
        self.shared.store.list().await.map_err(PersistenceError::Backup)
    }

    fn cancel_timers(&mut self) {
        self.debounce.cancel();
        self.backup.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use fueltrack_storage::MemoryBackupStore;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn named(cruise: &Cruise, name: &str) -> Cruise {
        Cruise {
            name: name.into(),
            ..cruise.clone()
        }
    }

    fn voyage(name: &str) -> Cruise {
        Cruise {
            name: name.into(),
            start_date: "2025-06-01".into(),
            ..Cruise::new()
        }
    }

    async fn manager(store: &MemoryBackupStore) -> (PersistenceManager, VoyageDirectory, TempDir) {
        let tmp = TempDir::new().unwrap();
        let dir = VoyageDirectory::open(tmp.path()).await.unwrap();
        let manager = PersistenceManager::new(Arc::new(store.clone()), AutosaveConfig::default())
            .with_directory(dir.clone());
        (manager, dir, tmp)
    }

    struct FailingStore;

    #[async_trait]
    impl BackupStore for FailingStore {
        async fn put(&self, _: &Cruise) -> fueltrack_storage::Result<()> {
            Err(StorageError::Other("disk full".into()))
        }
        async fn get(&self, _: CruiseId) -> fueltrack_storage::Result<Option<Cruise>> {
            Ok(None)
        }
        async fn list(&self) -> fueltrack_storage::Result<Vec<Cruise>> {
            Ok(Vec::new())
        }
        async fn delete(&self, _: CruiseId) -> fueltrack_storage::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_writes_latest_change_once() {
        let store = MemoryBackupStore::new();
        let (mut manager, dir, _tmp) = manager(&store).await;
        let mut status = manager.status();
        let cruise = voyage("First");

        manager.start_editing(cruise.clone());
        manager.cruise_changed(cruise.clone());
        time::advance(Duration::from_millis(500)).await;
        manager.cruise_changed(named(&cruise, "Second"));
        time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert!(store.is_empty().await, "first change must not be written");
        assert!(manager.save_pending());

        time::advance(Duration::from_millis(500)).await;
        status
            .wait_for(|s| matches!(s, SaveStatus::Saved { manual: false, .. }))
            .await
            .unwrap();

        let load = dir.load_all().await.unwrap();
        assert_eq!(load.voyages.len(), 1);
        assert_eq!(load.voyages[0].cruise.name, "Second");
        assert_eq!(load.voyages[0].file, "2025-06-01_Second.json");

        let backup = store.get(cruise.id).await.unwrap().unwrap();
        assert_eq!(backup.name, "Second");
        assert_eq!(backup.version, FORMAT_VERSION);
        assert!(backup.last_modified > cruise.last_modified);
    }

    /// Backup store whose writes take a while.
    #[derive(Clone)]
    struct SlowStore(MemoryBackupStore);

    #[async_trait]
    impl BackupStore for SlowStore {
        async fn put(&self, cruise: &Cruise) -> fueltrack_storage::Result<()> {
            time::sleep(Duration::from_millis(200)).await;
            self.0.put(cruise).await
        }
        async fn get(&self, id: CruiseId) -> fueltrack_storage::Result<Option<Cruise>> {
            self.0.get(id).await
        }
        async fn list(&self) -> fueltrack_storage::Result<Vec<Cruise>> {
            self.0.list().await
        }
        async fn delete(&self, id: CruiseId) -> fueltrack_storage::Result<()> {
            self.0.delete(id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_a_running_save_finish() {
        let inner = MemoryBackupStore::new();
        let tmp = TempDir::new().unwrap();
        let dir = VoyageDirectory::open(tmp.path()).await.unwrap();
        let config = AutosaveConfig::default().with_debounce(Duration::from_millis(50));
        let mut manager = PersistenceManager::new(Arc::new(SlowStore(inner.clone())), config)
            .with_directory(dir.clone());
        let mut status = manager.status();
        let cruise = voyage("Slow");

        manager.cruise_changed(cruise.clone());
        time::advance(Duration::from_millis(60)).await;
        status.wait_for(|s| *s == SaveStatus::Saving).await.unwrap();

        manager.stop();
        status
            .wait_for(|s| !matches!(s, SaveStatus::Saving))
            .await
            .unwrap();
        assert!(matches!(*status.borrow(), SaveStatus::Saved { manual: false, .. }));

        assert_eq!(inner.get(cruise.id).await.unwrap().map(|c| c.name), Some("Slow".into()));
        let load = dir.load_all().await.unwrap();
        assert_eq!(load.voyages.len(), 1);

        let mut entries = tokio::fs::read_dir(tmp.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name();
            assert!(!name.to_string_lossy().ends_with(".tmp"), "{:?} left behind", name);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_voyage_cancels_stale_timers() {
        let store = MemoryBackupStore::new();
        let (mut manager, dir, _tmp) = manager(&store).await;
        let abandoned = voyage("Abandoned");

        manager.start_editing(abandoned.clone());
        manager.cruise_changed(named(&abandoned, "Abandoned Edit"));
        manager.start_editing(voyage("Other"));

        time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert!(dir.load_all().await.unwrap().voyages.is_empty());
        assert_eq!(store.get(abandoned.id).await.unwrap(), None);

        manager.stop();
        assert!(manager.current().is_none());
        time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_backup_while_editing() {
        let store = MemoryBackupStore::new();
        let (mut manager, dir, _tmp) = manager(&store).await;
        let cruise = voyage("Periodic");
        manager.start_editing(cruise.clone());

        time::advance(Duration::from_secs(29)).await;
        settle().await;
        assert!(store.is_empty().await);

        time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(store.get(cruise.id).await.unwrap(), Some(cruise.clone()));

        let edited = named(&cruise, "Periodic Edit");
        manager.start_editing(edited.clone());
        time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(store.get(cruise.id).await.unwrap(), Some(edited));
        assert!(dir.load_all().await.unwrap().voyages.is_empty());
    }

    #[tokio::test]
    async fn test_save_now_reports_manual() {
        let store = MemoryBackupStore::new();
        let (mut manager, _dir, _tmp) = manager(&store).await;
        let cruise = voyage("Manual");
        manager.cruise_changed(cruise.clone());

        let saved = manager.save_now().await.unwrap();
        assert!(!manager.save_pending());
        assert!(saved.path.is_file());
        assert_eq!(saved.cruise.filename.as_deref(), Some("2025-06-01_Manual.json"));
        assert_eq!(manager.status().borrow().to_string(), "Saved manually");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_backup_failure_is_status_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let dir = VoyageDirectory::open(tmp.path()).await.unwrap();
        let mut manager = PersistenceManager::new(Arc::new(FailingStore), AutosaveConfig::default())
            .with_directory(dir.clone());
        let cruise = voyage("Unlucky");
        manager.start_editing(cruise.clone());

        let err = manager.save_now().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Backup(_)));
        assert!(matches!(&*manager.status().borrow(), SaveStatus::Error(m) if m.contains("disk full")));

        // The file was still written and the voyage is still being edited.
        assert_eq!(dir.load_all().await.unwrap().voyages.len(), 1);
        assert_eq!(manager.current().map(|c| c.id), Some(cruise.id));
    }

    #[tokio::test]
    async fn test_without_directory_backup_still_written() {
        let store = MemoryBackupStore::new();
        let mut manager = PersistenceManager::new(Arc::new(store.clone()), AutosaveConfig::default());

        assert!(matches!(
            manager.save_now().await,
            Err(PersistenceError::NothingToSave)
        ));

        let cruise = voyage("Draft");
        manager.start_editing(cruise.clone());
        assert!(matches!(
            manager.save_now().await,
            Err(PersistenceError::NoDirectory)
        ));
        assert!(store.get(cruise.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_recover_and_discard() {
        let store = MemoryBackupStore::new();
        let manager = PersistenceManager::new(Arc::new(store.clone()), AutosaveConfig::default());
        let now = Utc::now();

        let recent = Cruise {
            last_modified: now - ChronoDuration::minutes(10),
            ..voyage("Recent")
        };
        let stale = Cruise {
            last_modified: now - ChronoDuration::hours(2),
            ..voyage("Stale")
        };
        store.put(&recent).await.unwrap();
        store.put(&stale).await.unwrap();

        let offered = manager.recoverable(now).await.unwrap();
        assert_eq!(offered.map(|c| c.id), Some(recent.id));

        manager.discard_backup(recent.id).await.unwrap();
        assert!(manager.recoverable(now).await.unwrap().is_none());
        assert_eq!(manager.backups().await.unwrap().len(), 1);
    }
}
