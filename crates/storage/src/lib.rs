//! Storage for voyages.
//!
//! The voyage directory holds one JSON file per voyage. The backup store
//! keeps a snapshot of every voyage being edited, keyed by cruise id, for
//! crash recovery.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;
pub mod recovery;
#[cfg(feature = "sqlite")]
pub mod sqlite_storage;

pub use trait_::{BackupStore, StorageError, Result};
pub use json_storage::{DirectoryLoad, LoadFailure, LoadedVoyage, VoyageDirectory};
pub use memory::MemoryBackupStore;
pub use recovery::{default_window, find_recoverable, select_recoverable, RECOVERY_WINDOW_MINUTES};
#[cfg(feature = "sqlite")]
pub use sqlite_storage::SqliteBackupStore;
