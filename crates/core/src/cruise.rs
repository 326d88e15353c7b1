//! Cruise model - the voyage aggregate and its completion summary.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::fuel::DensityTable;
use crate::id::CruiseId;
use crate::leg::Leg;
use crate::Time;

/// Schema version written into voyage files.
pub const FORMAT_VERSION: &str = "6.0.0";

/// Vessel assigned to new voyages.
pub const DEFAULT_VESSEL: &str = "Celebrity Solstice";

/// A multi-leg voyage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cruise {
    /// Unique identifier
    pub id: CruiseId,

    /// Voyage name
    pub name: String,

    /// Vessel name
    pub vessel: String,

    /// First day (YYYY-MM-DD), blank if unknown
    pub start_date: String,

    /// Last day (YYYY-MM-DD), blank if unknown
    pub end_date: String,

    /// Legs in voyage order
    pub legs: Vec<Leg>,

    /// Densities for this voyage
    pub densities: DensityTable,

    /// Completion summary; present once the voyage is completed
    pub voyage_end: Option<VoyageEnd>,

    /// Voyage file name in the voyage directory
    pub filename: Option<String>,

    /// Last committed change
    pub last_modified: Time,

    /// Schema version
    pub version: String,
}

/// Lifecycle state of a cruise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoyageStatus {
    /// Editable
    Draft,
    /// Closed with a voyage-end summary
    Completed,
}

impl Cruise {
    /// Create an empty voyage with default densities and no legs.
    pub fn new() -> Self {
        Self {
            id: CruiseId::new(),
            name: String::new(),
            vessel: DEFAULT_VESSEL.to_string(),
            start_date: String::new(),
            end_date: String::new(),
            legs: Vec::new(),
            densities: DensityTable::default(),
            voyage_end: None,
            filename: None,
            last_modified: chrono::Utc::now(),
            version: FORMAT_VERSION.to_string(),
        }
    }

    /// Lifecycle state.
    pub fn status(&self) -> VoyageStatus {
        if self.voyage_end.is_some() {
            VoyageStatus::Completed
        } else {
            VoyageStatus::Draft
        }
    }

    /// Whether a voyage-end summary exists.
    pub fn is_completed(&self) -> bool {
        self.status() == VoyageStatus::Completed
    }

    /// Stamp a committed change. `last_modified` always moves forward, even
    /// when two commits land within the clock's resolution.
    pub fn touch(&mut self, now: Time) {
        self.last_modified = if now > self.last_modified {
            now
        } else {
            self.last_modified + Duration::milliseconds(1)
        };
    }

    /// Consume and return the stamped value.
    pub fn committed(mut self, now: Time) -> Self {
        self.touch(now);
        self
    }

    /// Leg at an index.
    pub fn leg(&self, index: usize) -> Result<&Leg, ModelError> {
        self.legs.get(index).ok_or(ModelError::LegOutOfRange(index))
    }

    /// Copy with one leg replaced by `f`. Other legs are shared by value.
    pub fn with_leg(
        &self,
        index: usize,
        f: impl FnOnce(&Leg) -> Result<Leg, ModelError>,
    ) -> Result<Self, ModelError> {
        let replaced = f(self.leg(index)?)?;
        let mut next = self.clone();
        next.legs[index] = replaced;
        Ok(next)
    }
}

impl Default for Cruise {
    fn default() -> Self {
        Self::new()
    }
}

/// Order voyages by start date, newest first. Blank dates sort as earliest.
pub fn sort_newest_first(voyages: &mut [Cruise]) {
    voyages.sort_by(|a, b| b.start_date.trim().cmp(a.start_date.trim()));
}

/// Completion summary frozen when the voyage is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoyageEnd {
    /// When the voyage was completed
    pub timestamp: Time,

    /// Engine lube-oil consumption, litres
    #[serde(default)]
    pub lube_oil_cons: String,

    /// Engine lube-oil remaining on board, litres
    #[serde(default, rename = "lubeOilROB")]
    pub lube_oil_rob: String,

    /// Signing engineer
    #[serde(default)]
    pub engineer: String,

    /// Free-text notes
    #[serde(default)]
    pub notes: String,

    /// Totals at completion
    #[serde(default)]
    pub totals: VoyageTotals,
}

/// Aggregates over a whole voyage.
///
/// Fuel figures are tonnes, water tonnes, loop times hours, NaOH litres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoyageTotals {
    /// HFO burned
    pub hfo: f64,
    /// MGO burned
    pub mgo: f64,
    /// LSFO burned
    pub lsfo: f64,
    /// Fresh water produced
    pub fw_prod: f64,
    /// Fresh water consumed
    pub fw_cons: f64,
    /// Fresh water bunkered
    pub fw_bunkered: f64,
    /// Scrubber open-loop hours
    pub open_loop: f64,
    /// Scrubber closed-loop hours
    pub closed_loop: f64,
    /// Alkali consumed
    pub naoh_cons: f64,
}

impl VoyageTotals {
    /// All fuels together.
    pub fn total_fuel(&self) -> f64 {
        self.hfo + self.mgo + self.lsfo
    }
}
