//! Errors raised by model operations.

use thiserror::Error;

use crate::equipment::EquipmentKey;
use crate::fuel::FuelType;

/// Error type for edits that would break a model invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Fuel name not recognised
    #[error("unknown fuel type: {0}")]
    UnknownFuel(String),

    /// Equipment key not recognised
    #[error("unknown equipment key: {0}")]
    UnknownEquipment(String),

    /// Fuel outside the consumer's allowed set
    #[error("{key} cannot burn {fuel}")]
    FuelNotAllowed {
        /// Consumer
        key: EquipmentKey,
        /// Fuel requested
        fuel: FuelType,
    },

    /// Boilers always burn MGO
    #[error("fuel type of {0} is fixed")]
    FuelLocked(EquipmentKey),

    /// Density outside (0, 2]
    #[error("density for {fuel} must be in (0, 2], got {density}")]
    InvalidDensity {
        /// Fuel overridden
        fuel: FuelType,
        /// Value requested
        density: f64,
    },

    /// No leg at that index
    #[error("no leg at index {0}")]
    LegOutOfRange(usize),

    /// No phase at that index
    #[error("no phase at index {0}")]
    PhaseOutOfRange(usize),

    /// Standby is fixed
    #[error("the standby phase cannot be deleted")]
    StandbyNotDeletable,

    /// Deleting would leave only standby
    #[error("a report keeps at least one operational phase")]
    LastOperationalPhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_display() {
        let err = ModelError::FuelNotAllowed {
            key: EquipmentKey::Dg3,
            fuel: FuelType::Hfo,
        };
        assert_eq!(err.to_string(), "DG 3 cannot burn HFO");

        let err = ModelError::InvalidDensity {
            fuel: FuelType::Mgo,
            density: 3.0,
        };
        assert_eq!(err.to_string(), "density for MGO must be in (0, 2], got 3");

        let err = ModelError::LegOutOfRange(4);
        assert_eq!(err.to_string(), "no leg at index 4");
    }
}
