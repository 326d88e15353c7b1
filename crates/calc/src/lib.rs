//! Consumption and aggregation.
//!
//! Turns counter readings into mass and rolls it up through phases, reports,
//! legs, and the whole cruise.

#![warn(missing_docs)]

pub mod consumption;
pub mod totals;
pub mod view;
pub mod summary;

pub use consumption::{
    consumption, counter_consumption, format_mass, reading_status, round2, ReadingStatus, NO_VALUE,
};
pub use totals::{cruise_totals, leg_totals, phase_totals, report_totals, FuelTotals, PhaseTotals};
pub use view::{report_view, PhaseView};
pub use summary::{cruise_summary, parse_hours, voyage_totals, CruiseSummary, LastRob};
