//! Autosave for the voyage being edited.
//!
//! Two timers run while a voyage is open:
//! ```text
//! edit ──► debounce (1 s quiet) ──► voyage file ──► backup store
//! every 30 s ─────────────────────────────────────► backup store
//! ```
//! Results are published as a [`SaveStatus`] and never block editing.

#![warn(missing_docs)]

pub mod config;
pub mod manager;
pub mod scheduler;

pub use config::AutosaveConfig;
pub use manager::{PersistenceError, PersistenceManager, SaveStatus, SavedVoyage};
pub use scheduler::{Debouncer, IntervalTask};
