//! Carrying END readings forward as the next phase's START readings.

use serde::Serialize;

use fueltrack_core::{
    is_blank, Cruise, EquipmentKey, EquipmentValues, ModelError, PhaseId, ReadingSide, ReportKind,
};

/// Address of a phase within a cruise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseRef {
    /// Leg index
    pub leg: usize,
    /// Departure or arrival
    pub report: ReportKind,
    /// Index in the report's phase list
    pub phase: usize,
}

impl PhaseRef {
    /// Build an address.
    pub fn new(leg: usize, report: ReportKind, phase: usize) -> Self {
        Self { leg, report, phase }
    }
}

impl std::fmt::Display for PhaseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "leg {} {} phase {}", self.leg + 1, self.report, self.phase + 1)
    }
}

/// Why there is nothing to carry over.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionFailure {
    /// No phase has END readings yet
    #[error("Edit END values in a phase first")]
    NothingEdited,

    /// The edited phase is the last one of the voyage
    #[error("No next phase found to carry over to")]
    NoNextPhase,
}

/// Locate a phase by id.
pub fn find_phase(cruise: &Cruise, id: PhaseId) -> Option<PhaseRef> {
    cruise.legs.iter().enumerate().find_map(|(leg_index, leg)| {
        [ReportKind::Departure, ReportKind::Arrival]
            .into_iter()
            .find_map(|kind| {
                leg.report(kind)
                    .phases
                    .position(id)
                    .map(|phase| PhaseRef::new(leg_index, kind, phase))
            })
    })
}

/// END readings of the most recently edited phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseEndSnapshot {
    /// Where the phase was when captured
    pub at: PhaseRef,
    /// Survives phase insertions and deletions
    pub phase_id: PhaseId,
    /// Phase name
    pub name: String,
    /// END readings by counter
    pub ends: EquipmentValues,
}

impl PhaseEndSnapshot {
    /// Snapshot a phase, if it has at least one END reading.
    pub fn capture(cruise: &Cruise, at: PhaseRef) -> Option<Self> {
        let phase = cruise
            .legs
            .get(at.leg)?
            .report(at.report)
            .phases
            .get(at.phase)?;
        if !phase.equipment.has_any_end() {
            return None;
        }
        let name = if is_blank(&phase.name) {
            "Phase".to_string()
        } else {
            phase.name.clone()
        };
        Some(Self {
            at,
            phase_id: phase.id,
            name,
            ends: phase.equipment.values(ReadingSide::End),
        })
    }

    /// Re-read the same phase after the cruise changed. Follows the phase when
    /// legs or phases before it were removed; `None` once it is gone or has no
    /// END readings left.
    pub fn refresh(&self, cruise: &Cruise) -> Option<Self> {
        Self::capture(cruise, find_phase(cruise, self.phase_id)?)
    }

    /// Keys with a non-blank END reading.
    pub fn carried_keys(&self) -> impl Iterator<Item = EquipmentKey> + '_ {
        self.ends
            .iter()
            .filter(|(_, value)| !is_blank(value))
            .map(|(key, _)| *key)
    }
}

/// The phase that would receive the carried readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarryOverTarget {
    /// Target address
    pub at: PhaseRef,
    /// Target phase name
    pub name: String,
    /// START readings the target holds now; selected keys overwrite these
    pub current_starts: EquipmentValues,
}

/// Next phase in voyage order.
///
/// Phases follow each other within a report, then departure leads into the
/// same leg's arrival, then arrival leads into the next leg's departure.
pub fn next_phase(cruise: &Cruise, at: PhaseRef) -> Option<PhaseRef> {
    let leg = cruise.legs.get(at.leg)?;
    let phases = &leg.report(at.report).phases;

    if at.phase + 1 < phases.len() {
        return Some(PhaseRef::new(at.leg, at.report, at.phase + 1));
    }
    match at.report {
        ReportKind::Departure if !leg.arrival.phases.is_empty() => {
            Some(PhaseRef::new(at.leg, ReportKind::Arrival, 0))
        }
        ReportKind::Arrival => {
            let next = cruise.legs.get(at.leg + 1)?;
            (!next.departure.phases.is_empty())
                .then(|| PhaseRef::new(at.leg + 1, ReportKind::Departure, 0))
        }
        ReportKind::Departure => None,
    }
}

/// Find the target for carrying `source` forward.
pub fn resolve(
    cruise: &Cruise,
    source: Option<&PhaseEndSnapshot>,
) -> Result<CarryOverTarget, ResolutionFailure> {
    let source = source.ok_or(ResolutionFailure::NothingEdited)?;
    let at = next_phase(cruise, source.at).ok_or(ResolutionFailure::NoNextPhase)?;
    let phase = cruise
        .legs
        .get(at.leg)
        .and_then(|leg| leg.report(at.report).phases.get(at.phase))
        .ok_or(ResolutionFailure::NoNextPhase)?;

    let name = if !is_blank(&phase.name) {
        phase.name.clone()
    } else if at.leg != source.at.leg {
        "Next Leg First Phase".to_string()
    } else if at.report != source.at.report {
        "First Arrival Phase".to_string()
    } else {
        "Next Phase".to_string()
    };

    Ok(CarryOverTarget {
        at,
        name,
        current_starts: phase.equipment.values(ReadingSide::Start),
    })
}

/// Write the selected END readings as START readings of `target`.
///
/// Keys whose source END is blank are skipped. Returns the new cruise and the
/// number of readings written. Only the target phase changes.
pub fn apply(
    cruise: &Cruise,
    source: &PhaseEndSnapshot,
    target: PhaseRef,
    selection: &[EquipmentKey],
) -> Result<(Cruise, usize), ModelError> {
    let carried: Vec<(EquipmentKey, String)> = selection
        .iter()
        .filter_map(|key| {
            source
                .ends
                .get(key)
                .filter(|value| !is_blank(value))
                .map(|value| (*key, value.clone()))
        })
        .collect();
    let written = carried.len();

    let next = cruise.with_leg(target.leg, |leg| {
        leg.with_report(target.report, |report| {
            report.with_phase(target.phase, |phase| {
                for (key, value) in carried {
                    phase.equipment.set_reading(key, ReadingSide::Start, value);
                }
            })
        })
    })?;

    Ok((next, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fueltrack_core::Leg;

    fn cruise_with_legs(n: usize) -> Cruise {
        let mut cruise = Cruise::new();
        cruise.legs = (0..n).map(|_| Leg::new()).collect();
        cruise
    }

    fn set_end(cruise: &mut Cruise, at: PhaseRef, key: EquipmentKey, value: &str) {
        let leg = &mut cruise.legs[at.leg];
        let report = match at.report {
            ReportKind::Departure => &mut leg.departure,
            ReportKind::Arrival => &mut leg.arrival,
        };
        report
            .phases
            .get_mut(at.phase)
            .unwrap()
            .equipment
            .set_reading(key, ReadingSide::End, value);
    }

    #[test]
    fn test_next_within_report() {
        let cruise = cruise_with_legs(1);
        let at = PhaseRef::new(0, ReportKind::Departure, 0);
        assert_eq!(
            next_phase(&cruise, at),
            Some(PhaseRef::new(0, ReportKind::Departure, 1))
        );
    }

    #[test]
    fn test_departure_leads_into_arrival() {
        let mut cruise = cruise_with_legs(1);
        // a departure with a single phase
        cruise.legs[0].departure.phases = fueltrack_core::PhaseList::new(
            vec![fueltrack_core::Phase::new(fueltrack_core::PhaseKind::Port, "only")],
            None,
        );
        let at = PhaseRef::new(0, ReportKind::Departure, 0);
        assert_eq!(
            next_phase(&cruise, at),
            Some(PhaseRef::new(0, ReportKind::Arrival, 0))
        );
    }

    #[test]
    fn test_arrival_leads_into_next_leg() {
        let cruise = cruise_with_legs(2);
        let last = PhaseRef::new(0, ReportKind::Arrival, 1);
        assert_eq!(
            next_phase(&cruise, last),
            Some(PhaseRef::new(1, ReportKind::Departure, 0))
        );

        let single = cruise_with_legs(1);
        assert_eq!(next_phase(&single, last), None);
    }

    #[test]
    fn test_resolve_failures() {
        let cruise = cruise_with_legs(1);
        assert_eq!(resolve(&cruise, None), Err(ResolutionFailure::NothingEdited));

        let mut cruise = cruise;
        let last = PhaseRef::new(0, ReportKind::Arrival, 1);
        set_end(&mut cruise, last, EquipmentKey::Dg12, "900");
        let snapshot = PhaseEndSnapshot::capture(&cruise, last).unwrap();
        assert_eq!(
            resolve(&cruise, Some(&snapshot)),
            Err(ResolutionFailure::NoNextPhase)
        );
    }

    #[test]
    fn test_capture_requires_an_end() {
        let cruise = cruise_with_legs(1);
        let at = PhaseRef::new(0, ReportKind::Departure, 0);
        assert!(PhaseEndSnapshot::capture(&cruise, at).is_none());
        assert!(PhaseEndSnapshot::capture(&cruise, PhaseRef::new(3, ReportKind::Departure, 0)).is_none());
    }

    #[test]
    fn test_apply_selected_keys_only() {
        let mut cruise = cruise_with_legs(2);
        let source_at = PhaseRef::new(0, ReportKind::Arrival, 1);
        set_end(&mut cruise, source_at, EquipmentKey::Dg12, "1200");
        set_end(&mut cruise, source_at, EquipmentKey::Dg4, "800");
        cruise.legs[1]
            .departure
            .phases
            .get_mut(0)
            .unwrap()
            .equipment
            .set_reading(EquipmentKey::Dg4, ReadingSide::Start, "777");

        let source = PhaseEndSnapshot::capture(&cruise, source_at).unwrap();
        let target = resolve(&cruise, Some(&source)).unwrap();
        assert_eq!(target.at, PhaseRef::new(1, ReportKind::Departure, 0));
        assert_eq!(target.current_starts[&EquipmentKey::Dg4], "777");

        // dg3 has no source END and is skipped; dg4 is not selected
        let (next, written) = apply(
            &cruise,
            &source,
            target.at,
            &[EquipmentKey::Dg12, EquipmentKey::Dg3],
        )
        .unwrap();
        assert_eq!(written, 1);

        let phase = next.legs[1].departure.phases.get(0).unwrap();
        assert_eq!(phase.equipment.dg12.start, "1200");
        assert_eq!(phase.equipment.dg4.start, "777");
        assert_eq!(phase.equipment.dg3.start, "");

        // nothing else moved
        assert_eq!(next.legs[0], cruise.legs[0]);
        assert_eq!(next.legs[1].arrival, cruise.legs[1].arrival);
    }

    #[test]
    fn test_refresh_follows_phase() {
        let mut cruise = cruise_with_legs(2);
        let at = PhaseRef::new(1, ReportKind::Arrival, 0);
        set_end(&mut cruise, at, EquipmentKey::Boiler1, "42");
        let snapshot = PhaseEndSnapshot::capture(&cruise, at).unwrap();

        cruise.legs.remove(0);
        let moved = snapshot.refresh(&cruise).unwrap();
        assert_eq!(moved.at, PhaseRef::new(0, ReportKind::Arrival, 0));
        assert_eq!(moved.ends[&EquipmentKey::Boiler1], "42");

        cruise.legs.clear();
        assert!(snapshot.refresh(&cruise).is_none());
    }

    #[test]
    fn test_default_target_names() {
        let mut cruise = cruise_with_legs(2);
        let source_at = PhaseRef::new(0, ReportKind::Arrival, 1);
        set_end(&mut cruise, source_at, EquipmentKey::Dg12, "1");
        cruise.legs[1].departure.phases.get_mut(0).unwrap().name.clear();
        let source = PhaseEndSnapshot::capture(&cruise, source_at).unwrap();
        assert_eq!(
            resolve(&cruise, Some(&source)).unwrap().name,
            "Next Leg First Phase"
        );
    }
}
