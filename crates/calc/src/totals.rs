//! Roll-ups from counters to phase, report, leg, and cruise.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::Serialize;

use fueltrack_core::{Cruise, DensityTable, FuelType, Leg, Phase, Report};

use crate::consumption::counter_consumption;

/// Mass per fuel type, in tonnes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FuelTotals {
    /// Heavy fuel oil
    pub hfo: f64,
    /// Marine gas oil
    pub mgo: f64,
    /// Low-sulphur fuel oil
    pub lsfo: f64,
}

impl FuelTotals {
    /// Mass for one fuel type.
    pub fn get(&self, fuel: FuelType) -> f64 {
        match fuel {
            FuelType::Hfo => self.hfo,
            FuelType::Mgo => self.mgo,
            FuelType::Lsfo => self.lsfo,
        }
    }

    /// Add mass to one fuel type.
    pub fn add_mass(&mut self, fuel: FuelType, mass: f64) {
        match fuel {
            FuelType::Hfo => self.hfo += mass,
            FuelType::Mgo => self.mgo += mass,
            FuelType::Lsfo => self.lsfo += mass,
        }
    }

    /// Sum over all fuel types.
    pub fn total(&self) -> f64 {
        self.hfo + self.mgo + self.lsfo
    }

    /// Per-fuel pairs in display order.
    pub fn by_fuel(&self) -> [(FuelType, f64); 3] {
        FuelType::ALL.map(|fuel| (fuel, self.get(fuel)))
    }
}

impl Add for FuelTotals {
    type Output = FuelTotals;

    fn add(self, rhs: FuelTotals) -> FuelTotals {
        FuelTotals {
            hfo: self.hfo + rhs.hfo,
            mgo: self.mgo + rhs.mgo,
            lsfo: self.lsfo + rhs.lsfo,
        }
    }
}

impl AddAssign for FuelTotals {
    fn add_assign(&mut self, rhs: FuelTotals) {
        *self = *self + rhs;
    }
}

impl Sum for FuelTotals {
    fn sum<I: Iterator<Item = FuelTotals>>(iter: I) -> Self {
        iter.fold(FuelTotals::default(), Add::add)
    }
}

/// Totals of one phase, split by consumer group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PhaseTotals {
    /// Diesel generators
    pub engine: FuelTotals,
    /// Boilers
    pub boiler: FuelTotals,
}

impl PhaseTotals {
    /// Engine plus boiler.
    pub fn combined(&self) -> FuelTotals {
        self.engine + self.boiler
    }
}

impl Add for PhaseTotals {
    type Output = PhaseTotals;

    fn add(self, rhs: PhaseTotals) -> PhaseTotals {
        PhaseTotals {
            engine: self.engine + rhs.engine,
            boiler: self.boiler + rhs.boiler,
        }
    }
}

impl Sum for PhaseTotals {
    fn sum<I: Iterator<Item = PhaseTotals>>(iter: I) -> Self {
        iter.fold(PhaseTotals::default(), Add::add)
    }
}

/// Consumption of every counter in a phase.
pub fn phase_totals(phase: &Phase, densities: &DensityTable) -> PhaseTotals {
    let mut totals = PhaseTotals::default();
    for (key, counter) in phase.equipment.iter() {
        let Some(mass) = counter_consumption(counter, densities) else {
            continue;
        };
        if key.is_engine() {
            totals.engine.add_mass(counter.fuel, mass);
        } else {
            totals.boiler.add_mass(counter.fuel, mass);
        }
    }
    totals
}

/// Every phase of a report, standby included.
pub fn report_totals(report: &Report, densities: &DensityTable) -> FuelTotals {
    report
        .phases
        .iter()
        .map(|phase| phase_totals(phase, densities).combined())
        .sum()
}

/// Departure plus arrival.
pub fn leg_totals(leg: &Leg, densities: &DensityTable) -> FuelTotals {
    report_totals(&leg.departure, densities) + report_totals(&leg.arrival, densities)
}

/// All legs, with the cruise's own density table.
pub fn cruise_totals(cruise: &Cruise) -> FuelTotals {
    cruise
        .legs
        .iter()
        .map(|leg| leg_totals(leg, &cruise.densities))
        .sum()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fueltrack_core::{EquipmentKey, ReadingSide, ReportKind};

    pub(crate) fn read(phase: &mut Phase, key: EquipmentKey, start: &str, end: &str) {
        phase.equipment.set_reading(key, ReadingSide::Start, start);
        phase.equipment.set_reading(key, ReadingSide::End, end);
    }

    pub(crate) fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sample_cruise() -> Cruise {
        let mut cruise = Cruise::new();
        for n in 0..2 {
            let mut leg = Leg::new();
            let base = 1000.0 * (n as f64 + 1.0);
            let dep = leg.departure.phases.get_mut(0).unwrap();
            read(dep, EquipmentKey::Dg12, &base.to_string(), &(base + 10.0).to_string());
            read(dep, EquipmentKey::Boiler1, "50", "51.5");
            let sb = leg.departure.phases.get_mut(1).unwrap();
            read(sb, EquipmentKey::Dg4, "300", "302");
            let sea = leg.arrival.phases.get_mut(0).unwrap();
            read(sea, EquipmentKey::Dg3, "7", "9.25");
            read(sea, EquipmentKey::Dg12, "10", "5");
            cruise.legs.push(leg);
        }
        cruise
    }

    #[test]
    fn test_phase_split() {
        let mut phase = Phase::new(fueltrack_core::PhaseKind::Sea, "sea");
        read(&mut phase, EquipmentKey::Dg12, "0", "10");
        read(&mut phase, EquipmentKey::Boiler2, "0", "1");
        let totals = phase_totals(&phase, &DensityTable::default());
        assert!(approx(totals.engine.hfo, 9.2));
        assert!(approx(totals.boiler.mgo, 0.83));
        assert!(approx(totals.combined().total(), 10.03));
    }

    #[test]
    fn test_partial_and_negative_ignored() {
        let mut phase = Phase::new(fueltrack_core::PhaseKind::Port, "port");
        read(&mut phase, EquipmentKey::Dg12, "100", "");
        read(&mut phase, EquipmentKey::Dg4, "100", "90");
        let totals = phase_totals(&phase, &DensityTable::default());
        assert_eq!(totals, PhaseTotals::default());
    }

    #[test]
    fn test_levels_agree() {
        let cruise = sample_cruise();
        let d = &cruise.densities;

        let by_cruise = cruise_totals(&cruise);
        let by_legs: FuelTotals = cruise.legs.iter().map(|l| leg_totals(l, d)).sum();
        let by_reports: FuelTotals = cruise
            .legs
            .iter()
            .flat_map(|l| [ReportKind::Departure, ReportKind::Arrival].map(|k| l.report(k)))
            .map(|r| report_totals(r, d))
            .sum();
        let by_phases: FuelTotals = cruise
            .legs
            .iter()
            .flat_map(|l| l.departure.phases.iter().chain(l.arrival.phases.iter()))
            .map(|p| phase_totals(p, d).combined())
            .sum();

        for (fuel, total) in by_cruise.by_fuel() {
            assert!(approx(total, by_legs.get(fuel)));
            assert!(approx(total, by_reports.get(fuel)));
            assert!(approx(total, by_phases.get(fuel)));
        }
        // 2 legs x (10 HFO m3 + 2 HFO m3 standby)
        assert!(approx(by_cruise.hfo, 24.0 * 0.92));
        // 2 legs x (1.5 boiler + 2.25 dg3) MGO m3
        assert!(approx(by_cruise.mgo, 7.5 * 0.83));
        assert!(approx(by_cruise.lsfo, 0.0));
    }

    #[test]
    fn test_standby_counts_in_report() {
        let mut report = Report::new(ReportKind::Departure);
        read(report.phases.get_mut(1).unwrap(), EquipmentKey::Dg4, "0", "1");
        let totals = report_totals(&report, &DensityTable::default());
        assert!(approx(totals.hfo, 0.92));
    }
}
