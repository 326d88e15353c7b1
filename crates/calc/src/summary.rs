//! Voyage-end totals and the cruise summary.

use serde::Serialize;

use fueltrack_core::{is_blank, Cruise, FuelType, Report, ReportKind, VoyageTotals};

use crate::totals::{cruise_totals, FuelTotals};

/// Parse `HH:MM` into decimal hours. Anything else is `None`.
pub fn parse_hours(value: &str) -> Option<f64> {
    let (hours, minutes) = value.trim().split_once(':')?;
    if minutes.contains(':') {
        return None;
    }
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    Some(hours as f64 + minutes as f64 / 60.0)
}

fn number(value: &str) -> Option<f64> {
    if is_blank(value) {
        return None;
    }
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn arrivals(cruise: &Cruise) -> impl Iterator<Item = &Report> {
    cruise.legs.iter().map(|leg| leg.report(ReportKind::Arrival))
}

/// Totals frozen into a voyage-end summary.
///
/// Fuel comes from every counter. Fresh water, scrubber hours and NaOH come
/// from arrival reports only; unreadable entries are skipped.
pub fn voyage_totals(cruise: &Cruise) -> VoyageTotals {
    let fuel = cruise_totals(cruise);
    let mut totals = VoyageTotals {
        hfo: fuel.hfo,
        mgo: fuel.mgo,
        lsfo: fuel.lsfo,
        ..VoyageTotals::default()
    };

    for report in arrivals(cruise) {
        let fw = &report.fresh_water;
        totals.fw_prod += number(&fw.production).unwrap_or(0.0);
        totals.fw_cons += number(&fw.consumption).unwrap_or(0.0);
        totals.fw_bunkered += number(&fw.bunkered).unwrap_or(0.0);
        totals.open_loop += parse_hours(&report.aep.open_loop_hrs).unwrap_or(0.0);
        totals.closed_loop += parse_hours(&report.aep.closed_loop_hrs).unwrap_or(0.0);
        totals.naoh_cons += number(&report.aep.alkali_cons).unwrap_or(0.0);
    }

    totals
}

/// Latest remaining-on-board figures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LastRob {
    /// HFO, tonnes
    pub hfo: Option<f64>,
    /// MGO, tonnes
    pub mgo: Option<f64>,
    /// LSFO, tonnes
    pub lsfo: Option<f64>,
    /// Fresh water, tonnes
    pub fresh_water: Option<f64>,
    /// Alkali, litres
    pub naoh: Option<f64>,
}

impl LastRob {
    /// Fuel ROB for one type.
    pub fn fuel(&self, fuel: FuelType) -> Option<f64> {
        match fuel {
            FuelType::Hfo => self.hfo,
            FuelType::Mgo => self.mgo,
            FuelType::Lsfo => self.lsfo,
        }
    }
}

/// Cruise-wide figures for the summary panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CruiseSummary {
    /// Fuel burned over all legs
    pub fuel: FuelTotals,
    /// Fresh water produced, tonnes
    pub fw_production: f64,
    /// Fresh water consumed, tonnes
    pub fw_consumption: f64,
    /// Litres
    pub naoh_consumption: f64,
    /// Latest arrival figures
    pub last_rob: LastRob,
    /// From the voyage-end summary, when completed
    pub lube_oil_cons: Option<String>,
    /// From the voyage-end summary, when completed
    pub lube_oil_rob: Option<String>,
    /// Whether the voyage is closed
    pub completed: bool,
}

/// Build the summary. Each ROB is the last non-blank value among arrival
/// reports in voyage order.
pub fn cruise_summary(cruise: &Cruise) -> CruiseSummary {
    let totals = voyage_totals(cruise);
    let mut last_rob = LastRob::default();

    for report in arrivals(cruise) {
        let latest = |slot: &mut Option<f64>, value: &str| {
            if let Some(v) = number(value) {
                *slot = Some(v);
            }
        };
        latest(&mut last_rob.hfo, &report.rob.hfo);
        latest(&mut last_rob.mgo, &report.rob.mgo);
        latest(&mut last_rob.lsfo, &report.rob.lsfo);
        latest(&mut last_rob.fresh_water, &report.fresh_water.rob);
        latest(&mut last_rob.naoh, &report.aep.alkali_rob);
    }

    let end = cruise.voyage_end.as_ref();
    let non_blank = |s: &String| (!is_blank(s)).then(|| s.clone());

    CruiseSummary {
        fuel: FuelTotals {
            hfo: totals.hfo,
            mgo: totals.mgo,
            lsfo: totals.lsfo,
        },
        fw_production: totals.fw_prod,
        fw_consumption: totals.fw_cons,
        naoh_consumption: totals.naoh_cons,
        last_rob,
        lube_oil_cons: end.and_then(|e| non_blank(&e.lube_oil_cons)),
        lube_oil_rob: end.and_then(|e| non_blank(&e.lube_oil_rob)),
        completed: end.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totals::tests::{approx, read};
    use fueltrack_core::{EquipmentKey, Leg};

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_hours("12:30"), Some(12.5));
        assert_eq!(parse_hours("0:45"), Some(0.75));
        assert_eq!(parse_hours("12"), None);
        assert_eq!(parse_hours("ab:cd"), None);
        assert_eq!(parse_hours("1:2:3"), None);
        assert_eq!(parse_hours(""), None);
    }

    fn two_leg_cruise() -> Cruise {
        let mut cruise = Cruise::new();
        for (prod, cons, open, rob) in [("100", "80", "10:30", "500"), ("50", "x", "bad", "")] {
            let mut leg = Leg::new();
            leg.arrival.fresh_water.production = prod.into();
            leg.arrival.fresh_water.consumption = cons.into();
            leg.arrival.fresh_water.bunkered = "20".into();
            leg.arrival.aep.open_loop_hrs = open.into();
            leg.arrival.aep.closed_loop_hrs = "1:15".into();
            leg.arrival.aep.alkali_cons = "3.5".into();
            leg.arrival.rob.hfo = rob.into();
            // departure registers never count
            leg.departure.fresh_water.production = "999".into();
            read(leg.arrival.phases.get_mut(0).unwrap(), EquipmentKey::Dg12, "0", "10");
            cruise.legs.push(leg);
        }
        cruise
    }

    #[test]
    fn test_voyage_totals_arrival_only() {
        let totals = voyage_totals(&two_leg_cruise());
        assert!(approx(totals.hfo, 18.4));
        assert!(approx(totals.fw_prod, 150.0));
        assert!(approx(totals.fw_cons, 80.0));
        assert!(approx(totals.fw_bunkered, 40.0));
        assert!(approx(totals.open_loop, 10.5));
        assert!(approx(totals.closed_loop, 2.5));
        assert!(approx(totals.naoh_cons, 7.0));
    }

    #[test]
    fn test_summary_last_rob() {
        let cruise = two_leg_cruise();
        let summary = cruise_summary(&cruise);
        // second leg's ROB is blank, so the first one stands
        assert_eq!(summary.last_rob.hfo, Some(500.0));
        assert_eq!(summary.last_rob.fuel(FuelType::Mgo), None);
        assert!(!summary.completed);
        assert_eq!(summary.lube_oil_rob, None);
    }
}
