//! Voyage directory: one JSON file per voyage.
//!
//! Every file is loaded on its own. Structural problems are repaired by
//! validation and reported per file; a file that is not JSON is reported as a
//! failure and the rest of the directory still loads.

use std::path::{Path, PathBuf};

use fueltrack_core::{is_safe_filename, validate_cruise, voyage_filename, Cruise, ValidationIssue};
use tokio::fs;
use tracing::{debug, warn};

use super::{Result, StorageError};

/// A voyage read from the directory.
#[derive(Debug, Clone)]
pub struct LoadedVoyage {
    /// File name within the directory
    pub file: String,
    /// The repaired voyage
    pub cruise: Cruise,
    /// What validation repaired
    pub fixes: Vec<ValidationIssue>,
}

/// A file that could not be read as a voyage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// File name within the directory
    pub file: String,
    /// Why it was skipped
    pub reason: String,
}

/// Result of reading the whole directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryLoad {
    /// Voyages by start date, newest first; undated last
    pub voyages: Vec<LoadedVoyage>,
    /// Files that could not be read, by name
    pub failures: Vec<LoadFailure>,
}

impl DirectoryLoad {
    /// Just the cruises.
    pub fn cruises(&self) -> Vec<Cruise> {
        self.voyages.iter().map(|v| v.cruise.clone()).collect()
    }
}

/// Directory of voyage files.
#[derive(Debug, Clone)]
pub struct VoyageDirectory {
    root: PathBuf,
}

impl VoyageDirectory {
    /// Open an existing directory.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            Ok(_) => Err(StorageError::NotFound(format!(
                "{} is not a directory",
                root.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(root.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open a directory, creating it when missing.
    pub async fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a cruise is saved under.
    pub fn path_for(&self, cruise: &Cruise) -> Result<PathBuf> {
        self.file_path(&voyage_filename(cruise))
    }

    /// Resolve a bare file name inside the directory.
    fn file_path(&self, file: &str) -> Result<PathBuf> {
        if !is_safe_filename(file) {
            return Err(StorageError::UnsafeName(file.to_string()));
        }
        Ok(self.root.join(file))
    }

    /// Read one voyage file.
    ///
    /// `Err` only for I/O problems and non-JSON content; structural problems
    /// come back as fixes.
    pub async fn load(&self, file: &str) -> Result<LoadedVoyage> {
        let text = fs::read_to_string(self.file_path(file)?).await?;
        let raw: serde_json::Value = serde_json::from_str(&text)?;
        let validated =
            validate_cruise(&raw).map_err(|issue| StorageError::Other(issue.to_string()))?;

        let mut cruise = validated.cruise;
        if cruise.filename.is_none() {
            cruise.filename = Some(file.to_string());
        }
        if !validated.issues.is_empty() {
            warn!(%file, fixes = validated.issues.len(), "voyage repaired on load");
        }
        Ok(LoadedVoyage {
            file: file.to_string(),
            cruise,
            fixes: validated.issues,
        })
    }

    /// Read every `*.json` file.
    pub async fn load_all(&self) -> Result<DirectoryLoad> {
        let mut load = DirectoryLoad::default();
        let mut rd = fs::read_dir(&self.root).await?;
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(file) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_safe_filename(file) {
                debug!(%file, "skipping hidden or oddly named file");
                continue;
            }
            match self.load(file).await {
                Ok(voyage) => load.voyages.push(voyage),
                Err(e) => {
                    warn!(%file, error = %e, "skipping unreadable voyage file");
                    load.failures.push(LoadFailure {
                        file: file.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        load.voyages
            .sort_by(|a, b| b.cruise.start_date.trim().cmp(a.cruise.start_date.trim()));
        load.failures.sort_by(|a, b| a.file.cmp(&b.file));
        debug!(
            voyages = load.voyages.len(),
            failures = load.failures.len(),
            "voyage directory loaded"
        );
        Ok(load)
    }

    /// Write a cruise as pretty JSON under its voyage filename.
    ///
    /// The file is replaced atomically so a crash mid-write leaves the previous
    /// version in place.
    pub async fn save(&self, cruise: &Cruise) -> Result<PathBuf> {
        let path = self.path_for(cruise)?;
        let json = serde_json::to_string_pretty(cruise)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), "voyage written");
        Ok(path)
    }

    /// Remove a voyage file.
    pub async fn delete(&self, file: &str) -> Result<()> {
        fs::remove_file(self.file_path(file)?).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(e)
            }
        })?;
        Ok(())
    }
}
