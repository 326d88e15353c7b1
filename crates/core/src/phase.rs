//! Phase model - an operating period of a report with its counters.

use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentSet;
use crate::error::ModelError;
use crate::id::PhaseId;

/// Kind of operating period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    /// Alongside
    Port,
    /// Sea passage
    Sea,
    /// Manoeuvring with engines on stand-by
    Standby,
}

impl PhaseKind {
    /// Lowercase name as stored in files.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Port => "port",
            PhaseKind::Sea => "sea",
            PhaseKind::Standby => "standby",
        }
    }

    /// Whether the phase is a regular (non-standby) segment.
    pub fn is_operational(&self) -> bool {
        !matches!(self, PhaseKind::Standby)
    }
}

/// An operating period within a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Unique identifier
    #[serde(default)]
    pub id: PhaseId,

    /// Phase kind
    #[serde(rename = "type")]
    pub kind: PhaseKind,

    /// Free-text name, e.g. "FA → SBE (Sea Passage)"
    #[serde(default)]
    pub name: String,

    /// Counters
    #[serde(default)]
    pub equipment: EquipmentSet,

    /// Free-text remarks
    #[serde(default)]
    pub remarks: String,
}

impl Phase {
    /// Create a phase with blank counters.
    pub fn new(kind: PhaseKind, name: impl Into<String>) -> Self {
        Self {
            id: PhaseId::new(),
            kind,
            name: name.into(),
            equipment: EquipmentSet::default(),
            remarks: String::new(),
        }
    }

    /// Whether this is the standby phase.
    pub fn is_standby(&self) -> bool {
        self.kind == PhaseKind::Standby
    }
}

/// Name given to phases added by the engineer.
pub const ADDED_PHASE_NAME: &str = "C/O (From \u{2192} To)";

/// Phases of a report: operational segments in entry order, then at most one
/// standby phase.
///
/// Stored in files as a flat `phases` array. Reading a flat array keeps the
/// first standby phase and drops any further ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Phase>", into = "Vec<Phase>")]
pub struct PhaseList {
    operational: Vec<Phase>,
    standby: Option<Phase>,
}

impl PhaseList {
    /// Build from parts.
    pub fn new(operational: Vec<Phase>, standby: Option<Phase>) -> Self {
        let mut list = Self::default();
        for phase in operational {
            list.push(phase);
        }
        if let Some(standby) = standby {
            list.push(standby);
        }
        list
    }

    /// Operational phases in entry order.
    pub fn operational(&self) -> &[Phase] {
        &self.operational
    }

    /// The standby phase, if any.
    pub fn standby(&self) -> Option<&Phase> {
        self.standby.as_ref()
    }

    /// Total number of phases.
    pub fn len(&self) -> usize {
        self.operational.len() + usize::from(self.standby.is_some())
    }

    /// Whether there are no phases at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Phase at a flat index (operational first, standby last).
    pub fn get(&self, index: usize) -> Option<&Phase> {
        if index < self.operational.len() {
            self.operational.get(index)
        } else if index == self.operational.len() {
            self.standby.as_ref()
        } else {
            None
        }
    }

    /// Mutable phase at a flat index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Phase> {
        if index < self.operational.len() {
            self.operational.get_mut(index)
        } else if index == self.operational.len() {
            self.standby.as_mut()
        } else {
            None
        }
    }

    /// Phases in flat order.
    pub fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.operational.iter().chain(self.standby.iter())
    }

    /// Flat index of a phase id.
    pub fn position(&self, id: PhaseId) -> Option<usize> {
        self.iter().position(|phase| phase.id == id)
    }

    /// Append a phase in its slot. Operational phases go before standby; a
    /// standby phase replaces the existing one.
    pub fn push(&mut self, phase: Phase) {
        if phase.is_standby() {
            self.standby = Some(phase);
        } else {
            self.operational.push(phase);
        }
    }

    /// Remove an operational phase by flat index.
    ///
    /// The standby phase and the last operational phase stay.
    pub fn remove(&mut self, index: usize) -> Result<Phase, ModelError> {
        if index == self.operational.len() && self.standby.is_some() {
            return Err(ModelError::StandbyNotDeletable);
        }
        if index >= self.operational.len() {
            return Err(ModelError::PhaseOutOfRange(index));
        }
        if self.operational.len() < 2 {
            return Err(ModelError::LastOperationalPhase);
        }
        Ok(self.operational.remove(index))
    }

    /// Copy with one phase replaced by `f`.
    pub fn with_phase(
        &self,
        index: usize,
        f: impl FnOnce(&mut Phase),
    ) -> Result<Self, ModelError> {
        let mut next = self.clone();
        let phase = next
            .get_mut(index)
            .ok_or(ModelError::PhaseOutOfRange(index))?;
        let kind = phase.kind;
        f(&mut *phase);
        // kind decides the slot; keep it stable under in-place edits
        phase.kind = kind;
        Ok(next)
    }
}

impl From<Vec<Phase>> for PhaseList {
    fn from(phases: Vec<Phase>) -> Self {
        let mut list = Self::default();
        for phase in phases {
            if phase.is_standby() && list.standby.is_some() {
                continue;
            }
            list.push(phase);
        }
        list
    }
}

impl From<PhaseList> for Vec<Phase> {
    fn from(list: PhaseList) -> Self {
        let mut phases = list.operational;
        phases.extend(list.standby);
        phases
    }
}

/// Phases seeded on a new departure report.
pub fn departure_phases() -> PhaseList {
    PhaseList::new(
        vec![Phase::new(PhaseKind::Port, "FWE \u{2192} SBE (In Port)")],
        Some(Phase::new(
            PhaseKind::Standby,
            "SBE \u{2192} FA (Stand By Departure)",
        )),
    )
}

/// Phases seeded on a new arrival report.
pub fn arrival_phases() -> PhaseList {
    PhaseList::new(
        vec![Phase::new(PhaseKind::Sea, "FA \u{2192} SBE (Sea Passage)")],
        Some(Phase::new(
            PhaseKind::Standby,
            "SBE \u{2192} FWE (Stand By Arrival)",
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str) -> Phase {
        Phase::new(PhaseKind::Sea, name)
    }

    #[test]
    fn test_standby_always_last() {
        let mut list = PhaseList::default();
        list.push(Phase::new(PhaseKind::Standby, "sb"));
        list.push(op("a"));
        list.push(op("b"));

        let names: Vec<_> = list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "sb"]);
        assert_eq!(list.get(2).unwrap().name, "sb");
        assert!(list.get(3).is_none());
    }

    #[test]
    fn test_flat_array_normalized() {
        let raw = vec![
            Phase::new(PhaseKind::Standby, "sb1"),
            op("a"),
            Phase::new(PhaseKind::Standby, "sb2"),
            op("b"),
        ];
        let list = PhaseList::from(raw);
        assert_eq!(list.len(), 3);
        assert_eq!(list.standby().unwrap().name, "sb1");

        let flat: Vec<Phase> = list.into();
        assert_eq!(flat.last().unwrap().name, "sb1");
    }

    #[test]
    fn test_remove_rules() {
        let mut list = departure_phases();
        assert_eq!(list.remove(1), Err(ModelError::StandbyNotDeletable));
        assert_eq!(list.remove(0), Err(ModelError::LastOperationalPhase));

        list.push(op("extra"));
        let removed = list.remove(0).unwrap();
        assert_eq!(removed.kind, PhaseKind::Port);
        assert_eq!(list.len(), 2);
        assert_eq!(list.remove(5), Err(ModelError::PhaseOutOfRange(5)));
    }

    #[test]
    fn test_with_phase_copies() {
        let list = arrival_phases();
        let edited = list
            .with_phase(0, |p| p.remarks = "slow steaming".into())
            .unwrap();
        assert_eq!(edited.get(0).unwrap().remarks, "slow steaming");
        assert_eq!(list.get(0).unwrap().remarks, "");
        assert!(list.with_phase(9, |_| {}).is_err());
    }

    #[test]
    fn test_serializes_flat() {
        let json = serde_json::to_value(departure_phases()).unwrap();
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["type"], "port");
        assert_eq!(arr[1]["type"], "standby");
    }
}
