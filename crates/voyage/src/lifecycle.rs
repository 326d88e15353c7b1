//! Draft and completed voyages.

use fueltrack_calc::voyage_totals;
use fueltrack_core::{Cruise, Time, VoyageEnd};

use crate::error::CommandError;

/// What the engineer signs off with when closing a voyage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Lube oil used over the voyage
    pub lube_oil_cons: String,
    /// Lube oil remaining
    pub lube_oil_rob: String,
    /// Signing engineer
    pub engineer: String,
    /// Free text
    pub notes: String,
}

/// Close a draft voyage, freezing the totals as they are now.
pub fn complete(cruise: &Cruise, completion: Completion, now: Time) -> Result<Cruise, CommandError> {
    if cruise.is_completed() {
        return Err(CommandError::AlreadyCompleted);
    }
    let voyage_end = VoyageEnd {
        timestamp: now,
        lube_oil_cons: completion.lube_oil_cons,
        lube_oil_rob: completion.lube_oil_rob,
        engineer: completion.engineer,
        notes: completion.notes,
        totals: voyage_totals(cruise),
    };
    Ok(Cruise {
        voyage_end: Some(voyage_end),
        ..cruise.clone()
    })
}

/// Back to draft. The voyage-end summary is discarded for good.
pub fn reopen(cruise: &Cruise) -> Result<Cruise, CommandError> {
    if !cruise.is_completed() {
        return Err(CommandError::NotCompleted);
    }
    Ok(Cruise {
        voyage_end: None,
        ..cruise.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fueltrack_core::{EquipmentKey, Leg, ReadingSide, VoyageStatus};

    fn burning(start: &str, end: &str) -> Cruise {
        let mut cruise = Cruise::new();
        let mut leg = Leg::new();
        let phase = leg.arrival.phases.get_mut(0).unwrap();
        phase.equipment.set_reading(EquipmentKey::Dg12, ReadingSide::Start, start);
        phase.equipment.set_reading(EquipmentKey::Dg12, ReadingSide::End, end);
        cruise.legs.push(leg);
        cruise
    }

    #[test]
    fn test_complete_freezes_totals() {
        let cruise = burning("0", "10");
        let done = complete(&cruise, Completion::default(), chrono::Utc::now()).unwrap();
        assert_eq!(done.status(), VoyageStatus::Completed);
        let totals = done.voyage_end.as_ref().unwrap().totals;
        assert!((totals.hfo - 9.2).abs() < 1e-9);

        assert_eq!(
            complete(&done, Completion::default(), chrono::Utc::now()),
            Err(CommandError::AlreadyCompleted)
        );
    }

    #[test]
    fn test_reopen_then_complete_recomputes() {
        let cruise = burning("0", "10");
        let done = complete(&cruise, Completion::default(), chrono::Utc::now()).unwrap();
        let mut draft = reopen(&done).unwrap();
        assert!(draft.voyage_end.is_none());
        assert_eq!(reopen(&draft), Err(CommandError::NotCompleted));

        draft.legs[0]
            .arrival
            .phases
            .get_mut(0)
            .unwrap()
            .equipment
            .set_reading(EquipmentKey::Dg12, ReadingSide::End, "20");
        let again = complete(&draft, Completion::default(), chrono::Utc::now()).unwrap();
        let totals = again.voyage_end.unwrap().totals;
        assert!((totals.hfo - 18.4).abs() < 1e-9);
    }
}
