//! Command errors.

use fueltrack_core::ModelError;

/// Why a command was refused. The cruise is left as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// Invalid edit on the model
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Edits on a completed voyage
    #[error("voyage is completed; reopen it to edit")]
    ReadOnly,

    /// Completing twice
    #[error("voyage is already completed")]
    AlreadyCompleted,

    /// Reopening a draft
    #[error("voyage is not completed")]
    NotCompleted,

    /// Editing with no voyage open
    #[error("no voyage is open")]
    NoActiveVoyage,

    /// Unknown voyage in the list
    #[error("voyage not found: {0}")]
    NotFound(String),
}
