//! Report model - the departure or arrival log of a leg.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::id::ReportId;
use crate::phase::{arrival_phases, departure_phases, Phase, PhaseKind, PhaseList, ADDED_PHASE_NAME};

/// Which end of a leg a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Leaving port
    #[default]
    Departure,
    /// Reaching port
    Arrival,
}

impl ReportKind {
    /// Lowercase name as stored in files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Departure => "departure",
            ReportKind::Arrival => "arrival",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "departure" | "dep" => Ok(ReportKind::Departure),
            "arrival" | "arr" => Ok(ReportKind::Arrival),
            other => Err(format!("unknown report kind: {}", other)),
        }
    }
}

/// Engine-room time events (HH:MM text).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeEvents {
    /// Stand-by engines
    pub sbe: String,
    /// Finished with engines
    pub fwe: String,
    /// Full away
    pub fa: String,
}

/// Fuel quantities in tonnes, as entered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelQuantities {
    /// Heavy fuel oil
    pub hfo: String,
    /// Marine gas oil
    pub mgo: String,
    /// Low-sulphur fuel oil
    pub lsfo: String,
}

/// Fresh-water register.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshWater {
    /// Remaining on board
    pub rob: String,
    /// Taken on in port
    pub bunkered: String,
    /// Made by the evaporators
    pub production: String,
    /// Used on board
    pub consumption: String,
}

/// Auxiliary exhaust purification (scrubber) register.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AepRegister {
    /// Open-loop running hours, `HH:MM`
    pub open_loop_hrs: String,
    /// Closed-loop running hours, `HH:MM`
    pub closed_loop_hrs: String,
    /// Alkali (NaOH) consumed, litres
    pub alkali_cons: String,
    /// Alkali remaining on board, litres
    pub alkali_rob: String,
}

/// Lube-oil register.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LubeOil {
    /// Main-engine consumption
    pub me_cons: String,
    /// LO 13S/14S remaining
    #[serde(rename = "lo13s14s")]
    pub lo13s14s: String,
    /// Used LO 13C
    #[serde(rename = "usedLo13c")]
    pub used_lo13c: String,
}

/// A departure or arrival report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique identifier
    #[serde(default)]
    pub id: ReportId,

    /// Departure or arrival
    #[serde(rename = "type", default)]
    pub kind: ReportKind,

    /// Report date (YYYY-MM-DD)
    #[serde(default)]
    pub date: String,

    /// Port name
    #[serde(default)]
    pub port: String,

    /// Time events
    #[serde(default)]
    pub time_events: TimeEvents,

    /// Phases, operational first then standby
    #[serde(default)]
    pub phases: PhaseList,

    /// Fuel remaining on board
    #[serde(default)]
    pub rob: FuelQuantities,

    /// Fuel bunkered
    #[serde(default)]
    pub bunkered: FuelQuantities,

    /// Fresh water
    #[serde(default)]
    pub fresh_water: FreshWater,

    /// Scrubber and alkali
    #[serde(default)]
    pub aep: AepRegister,

    /// Lube oil
    #[serde(default)]
    pub lube_oil: LubeOil,

    /// Signing engineer
    #[serde(default)]
    pub engineer: String,
}

impl Report {
    /// Create a report seeded with the two default phases for its kind.
    pub fn new(kind: ReportKind) -> Self {
        Self {
            id: ReportId::new(),
            kind,
            date: String::new(),
            port: String::new(),
            time_events: TimeEvents::default(),
            phases: Self::seed_phases(kind),
            rob: FuelQuantities::default(),
            bunkered: FuelQuantities::default(),
            fresh_water: FreshWater::default(),
            aep: AepRegister::default(),
            lube_oil: LubeOil::default(),
            engineer: String::new(),
        }
    }

    /// The default phases for a report kind.
    pub fn seed_phases(kind: ReportKind) -> PhaseList {
        match kind {
            ReportKind::Departure => departure_phases(),
            ReportKind::Arrival => arrival_phases(),
        }
    }

    /// Kind of phase the engineer adds to this report.
    pub fn added_phase_kind(&self) -> PhaseKind {
        match self.kind {
            ReportKind::Departure => PhaseKind::Port,
            ReportKind::Arrival => PhaseKind::Sea,
        }
    }

    /// Copy with a new operational phase inserted before standby.
    pub fn with_added_phase(&self) -> (Self, Phase) {
        let phase = Phase::new(self.added_phase_kind(), ADDED_PHASE_NAME);
        let mut next = self.clone();
        next.phases.push(phase.clone());
        (next, phase)
    }

    /// Copy with one phase edited.
    pub fn with_phase(
        &self,
        index: usize,
        f: impl FnOnce(&mut Phase),
    ) -> Result<Self, ModelError> {
        Ok(Self {
            phases: self.phases.with_phase(index, f)?,
            ..self.clone()
        })
    }

    /// Copy with one operational phase removed.
    pub fn without_phase(&self, index: usize) -> Result<Self, ModelError> {
        let mut next = self.clone();
        next.phases.remove(index)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_seeds_two_phases() {
        let dep = Report::new(ReportKind::Departure);
        assert_eq!(dep.phases.len(), 2);
        assert_eq!(dep.phases.get(0).unwrap().kind, PhaseKind::Port);
        assert!(dep.phases.get(1).unwrap().is_standby());

        let arr = Report::new(ReportKind::Arrival);
        assert_eq!(arr.phases.get(0).unwrap().kind, PhaseKind::Sea);
    }

    #[test]
    fn test_added_phase_goes_before_standby() {
        let report = Report::new(ReportKind::Arrival);
        let (report, added) = report.with_added_phase();
        assert_eq!(report.phases.len(), 3);
        assert_eq!(report.phases.get(1).unwrap().id, added.id);
        assert_eq!(added.kind, PhaseKind::Sea);
        assert_eq!(added.name, ADDED_PHASE_NAME);
        assert!(report.phases.get(2).unwrap().is_standby());
    }

    #[test]
    fn test_camel_case_fields() {
        let json = serde_json::to_value(Report::new(ReportKind::Arrival)).unwrap();
        assert_eq!(json["type"], "arrival");
        assert!(json.get("timeEvents").is_some());
        assert!(json.get("freshWater").is_some());
        assert!(json["aep"].get("openLoopHrs").is_some());
        assert!(json["lubeOil"].get("usedLo13c").is_some());
        assert_eq!(json["phases"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("Arrival".parse::<ReportKind>().unwrap(), ReportKind::Arrival);
        assert_eq!("dep".parse::<ReportKind>().unwrap(), ReportKind::Departure);
        assert!("transit".parse::<ReportKind>().is_err());
    }
}
