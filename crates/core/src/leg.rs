//! Leg model - one port-to-port passage.

use serde::{Deserialize, Serialize};

use crate::equipment::{is_blank, EquipmentValues, ReadingSide};
use crate::error::ModelError;
use crate::id::LegId;
use crate::report::{Report, ReportKind};

/// A port-to-port passage with its departure and arrival reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    /// Unique identifier
    #[serde(default)]
    pub id: LegId,

    /// Departure report
    #[serde(default = "Leg::default_departure")]
    pub departure: Report,

    /// Arrival report
    #[serde(default = "Leg::default_arrival")]
    pub arrival: Report,

    /// Navigation data
    #[serde(default)]
    pub voyage_report: Option<VoyageReport>,
}

impl Leg {
    fn default_departure() -> Report {
        Report::new(ReportKind::Departure)
    }

    fn default_arrival() -> Report {
        Report::new(ReportKind::Arrival)
    }

    /// Create a leg with freshly seeded reports.
    pub fn new() -> Self {
        Self {
            id: LegId::new(),
            departure: Self::default_departure(),
            arrival: Self::default_arrival(),
            voyage_report: None,
        }
    }

    /// Create the leg that follows `previous`.
    ///
    /// The first departure phase starts where the previous leg's arrival
    /// stopped (see [`Leg::closing_counters`]).
    pub fn following(previous: Option<&Leg>) -> Self {
        let leg = Self::new();
        match previous.map(Leg::closing_counters) {
            Some(ends) => leg.with_opening_counters(&ends),
            None => leg,
        }
    }

    /// Report of the given kind.
    pub fn report(&self, kind: ReportKind) -> &Report {
        match kind {
            ReportKind::Departure => &self.departure,
            ReportKind::Arrival => &self.arrival,
        }
    }

    /// Copy with one report replaced by `f`.
    pub fn with_report(
        &self,
        kind: ReportKind,
        f: impl FnOnce(&Report) -> Result<Report, ModelError>,
    ) -> Result<Self, ModelError> {
        let mut next = self.clone();
        match kind {
            ReportKind::Departure => next.departure = f(&self.departure)?,
            ReportKind::Arrival => next.arrival = f(&self.arrival)?,
        }
        Ok(next)
    }

    /// END values of the arrival standby phase, or of the last arrival phase
    /// when there is no standby.
    pub fn closing_counters(&self) -> EquipmentValues {
        let phases = &self.arrival.phases;
        phases
            .standby()
            .or_else(|| phases.iter().last())
            .map(|phase| phase.equipment.values(ReadingSide::End))
            .unwrap_or_default()
    }

    /// Copy whose first departure phase takes `starts` as START values.
    /// Blank values are ignored.
    pub fn with_opening_counters(&self, starts: &EquipmentValues) -> Self {
        let mut next = self.clone();
        if let Some(first) = next.departure.phases.get_mut(0) {
            for (key, value) in starts {
                if !is_blank(value) {
                    first.equipment.set_reading(*key, ReadingSide::Start, value.clone());
                }
            }
        }
        next
    }
}

impl Default for Leg {
    fn default() -> Self {
        Self::new()
    }
}

/// Distance (nm) and time (h) over a stretch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stretch {
    /// Nautical miles
    pub distance: String,
    /// Hours
    pub time: String,
}

impl Stretch {
    /// Average speed in knots.
    pub fn average_speed(&self) -> Option<f64> {
        average_speed(&self.distance, &self.time)
    }
}

/// Departure side of the navigation data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartureNav {
    /// Stand-by engines, `HH:MM`
    pub sbe: String,
    /// Full away, `HH:MM`
    pub fa: String,
    /// Pier to full away
    #[serde(rename = "pierToFA")]
    pub pier_to_fa: Stretch,
}

/// Sea-passage totals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PassageNav {
    /// Nautical miles
    pub total_miles: String,
    /// Hours
    pub steaming_time: String,
}

impl PassageNav {
    /// Average passage speed in knots.
    pub fn average_speed(&self) -> Option<f64> {
        average_speed(&self.total_miles, &self.steaming_time)
    }
}

/// Arrival side of the navigation data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrivalNav {
    /// Stand-by engines, `HH:MM`
    pub sbe: String,
    /// Finished with engines, `HH:MM`
    pub fwe: String,
    /// Stand-by to berth
    pub sbe_to_berth: Stretch,
}

/// Navigation data of a leg.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoyageReport {
    /// Leaving port
    pub departure: DepartureNav,
    /// At sea
    pub voyage: PassageNav,
    /// Reaching port
    pub arrival: ArrivalNav,
}

/// `distance / time`, defined only when both are positive numbers.
pub fn average_speed(distance: &str, time: &str) -> Option<f64> {
    let d: f64 = distance.trim().parse().ok()?;
    let t: f64 = time.trim().parse().ok()?;
    (d > 0.0 && t > 0.0).then(|| d / t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::EquipmentKey;

    #[test]
    fn test_following_leg_takes_closing_counters() {
        let mut previous = Leg::new();
        let standby = previous.arrival.phases.get_mut(1).unwrap();
        standby.equipment.set_reading(EquipmentKey::Dg12, ReadingSide::End, "1500.0");
        standby.equipment.set_reading(EquipmentKey::Boiler1, ReadingSide::End, "88");

        let next = Leg::following(Some(&previous));
        let first = next.departure.phases.get(0).unwrap();
        assert_eq!(first.equipment.dg12.start, "1500.0");
        assert_eq!(first.equipment.boiler1.start, "88");
        assert_eq!(first.equipment.dg4.start, "");
    }

    #[test]
    fn test_first_leg_is_blank() {
        let leg = Leg::following(None);
        assert!(leg
            .departure
            .phases
            .iter()
            .all(|p| p.equipment.iter().all(|(_, c)| !c.has_start())));
    }

    #[test]
    fn test_average_speed() {
        assert_eq!(average_speed("240", "12"), Some(20.0));
        assert_eq!(average_speed("240", "0"), None);
        assert_eq!(average_speed("", "12"), None);

        let nav = VoyageReport::default();
        assert_eq!(nav.voyage.average_speed(), None);
    }

    #[test]
    fn test_pier_to_fa_field_name() {
        let json = serde_json::to_value(VoyageReport::default()).unwrap();
        assert!(json["departure"].get("pierToFA").is_some());
        assert!(json["arrival"].get("sbeToBerth").is_some());
        assert!(json["voyage"].get("totalMiles").is_some());
    }
}
