//! Fuel tracker core data models.
//!
//! This crate defines the voyage hierarchy
//! (Cruise → Leg → Report → Phase → equipment counter), the density table,
//! file naming, and the structural validation applied when a voyage is
//! loaded from disk.

#![warn(missing_docs)]

// Core identities
mod id;
mod error;

// Voyage hierarchy
mod fuel;
mod equipment;
mod phase;
mod report;
mod leg;
mod cruise;

// Persistence helpers
pub mod filename;
pub mod validation;

// Re-exports
pub use id::*;
pub use error::ModelError;

pub use fuel::{is_sane_density, DensityTable, FuelType, MAX_DENSITY};
pub use equipment::{
    is_blank, EquipmentCounter, EquipmentKey, EquipmentSet, EquipmentValues, ReadingSide,
};
pub use phase::{arrival_phases, departure_phases, Phase, PhaseKind, PhaseList, ADDED_PHASE_NAME};
pub use report::{
    AepRegister, FreshWater, FuelQuantities, LubeOil, Report, ReportKind, TimeEvents,
};
pub use leg::{average_speed, ArrivalNav, DepartureNav, Leg, PassageNav, Stretch, VoyageReport};
pub use cruise::{
    sort_newest_first, Cruise, VoyageEnd, VoyageStatus, VoyageTotals, DEFAULT_VESSEL,
    FORMAT_VERSION,
};
pub use filename::{is_safe_filename, route_filename, safe_name, voyage_filename};
pub use validation::{validate_cruise, Validated, ValidationIssue};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
