//! Equipment counters - the meter readings a phase is built from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::fuel::FuelType;

/// The fixed set of metered consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentKey {
    /// Diesel generators 1 and 2 (shared meter)
    Dg12,
    /// Diesel generator 4
    Dg4,
    /// Diesel generator 3
    Dg3,
    /// Boiler 1
    Boiler1,
    /// Boiler 2
    Boiler2,
}

impl EquipmentKey {
    /// All keys in display order.
    pub const ALL: [EquipmentKey; 5] = [
        EquipmentKey::Dg12,
        EquipmentKey::Dg4,
        EquipmentKey::Dg3,
        EquipmentKey::Boiler1,
        EquipmentKey::Boiler2,
    ];

    /// Key as written in voyage files.
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentKey::Dg12 => "dg12",
            EquipmentKey::Dg4 => "dg4",
            EquipmentKey::Dg3 => "dg3",
            EquipmentKey::Boiler1 => "boiler1",
            EquipmentKey::Boiler2 => "boiler2",
        }
    }

    /// Human label.
    pub fn label(&self) -> &'static str {
        match self {
            EquipmentKey::Dg12 => "DG 1-2",
            EquipmentKey::Dg4 => "DG 4",
            EquipmentKey::Dg3 => "DG 3",
            EquipmentKey::Boiler1 => "Boiler 1",
            EquipmentKey::Boiler2 => "Boiler 2",
        }
    }

    /// Diesel generator keys count towards the engine subtotal.
    pub fn is_engine(&self) -> bool {
        matches!(self, EquipmentKey::Dg12 | EquipmentKey::Dg4 | EquipmentKey::Dg3)
    }

    /// Boiler keys count towards the boiler subtotal.
    pub fn is_boiler(&self) -> bool {
        matches!(self, EquipmentKey::Boiler1 | EquipmentKey::Boiler2)
    }

    /// Fuel assigned by the factory.
    pub fn default_fuel(&self) -> FuelType {
        match self {
            EquipmentKey::Dg12 | EquipmentKey::Dg4 => FuelType::Hfo,
            EquipmentKey::Dg3 | EquipmentKey::Boiler1 | EquipmentKey::Boiler2 => FuelType::Mgo,
        }
    }

    /// Fuels this consumer may be switched to.
    pub fn allowed_fuels(&self) -> &'static [FuelType] {
        match self {
            EquipmentKey::Dg12 | EquipmentKey::Dg4 => &FuelType::ALL,
            EquipmentKey::Dg3 => &[FuelType::Mgo, FuelType::Lsfo],
            EquipmentKey::Boiler1 | EquipmentKey::Boiler2 => &[FuelType::Mgo],
        }
    }

    /// Whether the engineer may change the fuel type at all.
    pub fn fuel_editable(&self) -> bool {
        !self.is_boiler()
    }
}

impl std::fmt::Display for EquipmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for EquipmentKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EquipmentKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownEquipment(s.to_string()))
    }
}

/// Which side of a counter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingSide {
    /// Reading at the start of the phase
    Start,
    /// Reading at the end of the phase
    End,
}

/// A start/end meter pair for one consumer.
///
/// Readings are kept as entered (m3, numeric text); an empty string means
/// "not read yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCounter {
    /// Start reading
    #[serde(default)]
    pub start: String,

    /// End reading
    #[serde(default)]
    pub end: String,

    /// Fuel burned through this meter
    pub fuel: FuelType,
}

impl EquipmentCounter {
    /// Blank counter for a key.
    pub fn for_key(key: EquipmentKey) -> Self {
        Self {
            start: String::new(),
            end: String::new(),
            fuel: key.default_fuel(),
        }
    }

    /// Reading on one side.
    pub fn reading(&self, side: ReadingSide) -> &str {
        match side {
            ReadingSide::Start => &self.start,
            ReadingSide::End => &self.end,
        }
    }

    /// Whether an end value has been entered.
    pub fn has_end(&self) -> bool {
        !is_blank(&self.end)
    }

    /// Whether a start value has been entered.
    pub fn has_start(&self) -> bool {
        !is_blank(&self.start)
    }
}

/// Whether a reading is missing.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Per-key reading values, e.g. the END values of a phase.
pub type EquipmentValues = BTreeMap<EquipmentKey, String>;

/// The five counters of a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSet {
    /// Diesel generators 1 and 2
    #[serde(default = "EquipmentSet::default_dg12")]
    pub dg12: EquipmentCounter,
    /// Diesel generator 4
    #[serde(default = "EquipmentSet::default_dg4")]
    pub dg4: EquipmentCounter,
    /// Diesel generator 3
    #[serde(default = "EquipmentSet::default_dg3")]
    pub dg3: EquipmentCounter,
    /// Boiler 1
    #[serde(default = "EquipmentSet::default_boiler1")]
    pub boiler1: EquipmentCounter,
    /// Boiler 2
    #[serde(default = "EquipmentSet::default_boiler2")]
    pub boiler2: EquipmentCounter,
}

impl EquipmentSet {
    fn default_dg12() -> EquipmentCounter {
        EquipmentCounter::for_key(EquipmentKey::Dg12)
    }
    fn default_dg4() -> EquipmentCounter {
        EquipmentCounter::for_key(EquipmentKey::Dg4)
    }
    fn default_dg3() -> EquipmentCounter {
        EquipmentCounter::for_key(EquipmentKey::Dg3)
    }
    fn default_boiler1() -> EquipmentCounter {
        EquipmentCounter::for_key(EquipmentKey::Boiler1)
    }
    fn default_boiler2() -> EquipmentCounter {
        EquipmentCounter::for_key(EquipmentKey::Boiler2)
    }

    /// Counter for a key.
    pub fn get(&self, key: EquipmentKey) -> &EquipmentCounter {
        match key {
            EquipmentKey::Dg12 => &self.dg12,
            EquipmentKey::Dg4 => &self.dg4,
            EquipmentKey::Dg3 => &self.dg3,
            EquipmentKey::Boiler1 => &self.boiler1,
            EquipmentKey::Boiler2 => &self.boiler2,
        }
    }

    /// Mutable counter for a key.
    pub fn get_mut(&mut self, key: EquipmentKey) -> &mut EquipmentCounter {
        match key {
            EquipmentKey::Dg12 => &mut self.dg12,
            EquipmentKey::Dg4 => &mut self.dg4,
            EquipmentKey::Dg3 => &mut self.dg3,
            EquipmentKey::Boiler1 => &mut self.boiler1,
            EquipmentKey::Boiler2 => &mut self.boiler2,
        }
    }

    /// Counters in display order.
    pub fn iter(&self) -> impl Iterator<Item = (EquipmentKey, &EquipmentCounter)> {
        EquipmentKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }

    /// Set one reading.
    pub fn set_reading(&mut self, key: EquipmentKey, side: ReadingSide, value: impl Into<String>) {
        let counter = self.get_mut(key);
        match side {
            ReadingSide::Start => counter.start = value.into(),
            ReadingSide::End => counter.end = value.into(),
        }
    }

    /// Switch the fuel of a consumer, honouring the per-key restrictions.
    pub fn set_fuel(&mut self, key: EquipmentKey, fuel: FuelType) -> Result<(), ModelError> {
        if !key.fuel_editable() {
            return Err(ModelError::FuelLocked(key));
        }
        if !key.allowed_fuels().contains(&fuel) {
            return Err(ModelError::FuelNotAllowed { key, fuel });
        }
        self.get_mut(key).fuel = fuel;
        Ok(())
    }

    /// All readings on one side, keyed by equipment.
    pub fn values(&self, side: ReadingSide) -> EquipmentValues {
        self.iter()
            .map(|(key, counter)| (key, counter.reading(side).to_string()))
            .collect()
    }

    /// Whether any END reading is present.
    pub fn has_any_end(&self) -> bool {
        self.iter().any(|(_, counter)| counter.has_end())
    }
}

impl Default for EquipmentSet {
    fn default() -> Self {
        Self {
            dg12: Self::default_dg12(),
            dg4: Self::default_dg4(),
            dg3: Self::default_dg3(),
            boiler1: Self::default_boiler1(),
            boiler2: Self::default_boiler2(),
        }
    }
}
