//! Per-phase figures as a report displays them.

use serde::Serialize;

use fueltrack_core::{DensityTable, PhaseId, PhaseKind, Report};

use crate::totals::{phase_totals, FuelTotals, PhaseTotals};

/// Figures shown for one phase of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseView {
    /// Flat index in the report
    pub index: usize,
    /// Phase id
    pub id: PhaseId,
    /// Phase kind
    pub kind: PhaseKind,
    /// Phase name
    pub name: String,

    /// Displayed engine and boiler figures. Running sums when `cumulative`.
    pub shown: PhaseTotals,

    /// Phase grand-total tile. Never present for standby.
    pub grand_total: Option<FuelTotals>,

    /// Whether `shown` covers every operational phase up to this one
    pub cumulative: bool,
}

/// Phase figures of a report, with the cumulative rule applied.
///
/// With two or more operational phases, the last operational phase shows the
/// running engine and boiler sums of all operational phases. Every other phase
/// shows its own figures.
pub fn report_view(report: &Report, densities: &DensityTable) -> Vec<PhaseView> {
    let operational = report.phases.operational();
    let raw: Vec<PhaseTotals> = report
        .phases
        .iter()
        .map(|phase| phase_totals(phase, densities))
        .collect();

    let last_operational = operational.len().checked_sub(1);
    let running: PhaseTotals = raw.iter().take(operational.len()).copied().sum();

    report
        .phases
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(index, (phase, own))| {
            let cumulative = operational.len() >= 2 && Some(index) == last_operational;
            let shown = if cumulative { running } else { own };
            PhaseView {
                index,
                id: phase.id,
                kind: phase.kind,
                name: phase.name.clone(),
                shown,
                grand_total: (!phase.is_standby()).then(|| shown.combined()),
                cumulative,
            }
        })
        .collect()
}
