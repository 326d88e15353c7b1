//! Voyage editing.
//!
//! Pure commands over a [`fueltrack_core::Cruise`], the counter carry-over
//! resolver, the draft/completed lifecycle, and the session state a front end
//! keeps around them.

#![warn(missing_docs)]

pub mod carry_over;
pub mod commands;
pub mod lifecycle;
pub mod session;
mod error;

pub use carry_over::{
    find_phase, next_phase, resolve, CarryOverTarget, PhaseEndSnapshot, PhaseRef,
    ResolutionFailure,
};
pub use commands::{apply, Command, Effect, Notice, NoticeLevel, Outcome};
pub use error::CommandError;
pub use lifecycle::{complete, reopen, Completion};
pub use session::{DirectoryChoice, NewVoyage, NewVoyageStep, Session, View};
