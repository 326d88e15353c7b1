//! Unique identifiers for voyage entities.

use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

/// Unique identifier for a Cruise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CruiseId(Ulid);

impl CruiseId {
    /// Generate a new CruiseId
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Stable id for a voyage saved with a numeric (millisecond timestamp) id.
    ///
    /// The same number always maps to the same id, so reloading an old file
    /// before it is re-saved keeps its identity.
    pub fn from_legacy(number: u64) -> Self {
        Self(Ulid::from_parts(number, u128::from(number)))
    }
}

impl Default for CruiseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CruiseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for CruiseId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a Leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LegId(Ulid);

impl LegId {
    /// Generate a new LegId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl<'de> Deserialize<'de> for LegId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_ulid(deserializer).map(Self)
    }
}

impl Default for LegId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LegId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a Report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ReportId(Ulid);

impl ReportId {
    /// Generate a new ReportId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl<'de> Deserialize<'de> for ReportId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_ulid(deserializer).map(Self)
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a Phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PhaseId(Ulid);

impl PhaseId {
    /// Generate a new PhaseId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl<'de> Deserialize<'de> for PhaseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_ulid(deserializer).map(Self)
    }
}

impl Default for PhaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PhaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Read a ULID, or mint a fresh one for anything else.
///
/// Older voyage files carry numeric timestamps as leg, report and phase ids.
/// Nothing outside the file refers to those, so they are replaced silently.
fn lenient_ulid<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Ulid, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    #[allow(dead_code)]
    enum Raw {
        Id(Ulid),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Id(id) => id,
        Raw::Other(_) => Ulid::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_ids_tolerate_legacy_numbers() {
        let id = PhaseId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(serde_json::from_value::<PhaseId>(json).unwrap(), id);

        assert!(serde_json::from_value::<LegId>(serde_json::json!(1717171717)).is_ok());
        assert!(serde_json::from_value::<ReportId>(serde_json::json!(null)).is_ok());
    }

    #[test]
    fn test_legacy_cruise_id_is_stable() {
        assert_eq!(CruiseId::from_legacy(1717171717000), CruiseId::from_legacy(1717171717000));
        assert_ne!(CruiseId::from_legacy(1), CruiseId::from_legacy(2));
    }

    #[test]
    fn test_cruise_id_is_strict() {
        assert!(serde_json::from_value::<CruiseId>(serde_json::json!(42)).is_err());
        assert!("not-a-ulid".parse::<CruiseId>().is_err());
    }
}
