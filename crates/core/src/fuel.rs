//! Fuel types and the per-voyage density table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Fuel grades burned on board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FuelType {
    /// Heavy fuel oil
    #[serde(rename = "HFO")]
    Hfo,
    /// Marine gas oil
    #[serde(rename = "MGO")]
    Mgo,
    /// Low-sulphur fuel oil
    #[serde(rename = "LSFO")]
    Lsfo,
}

impl FuelType {
    /// All fuel types in display order.
    pub const ALL: [FuelType; 3] = [FuelType::Hfo, FuelType::Mgo, FuelType::Lsfo];

    /// Short label used in files and reports.
    pub fn label(&self) -> &'static str {
        match self {
            FuelType::Hfo => "HFO",
            FuelType::Mgo => "MGO",
            FuelType::Lsfo => "LSFO",
        }
    }

    /// Built-in density in t/m3.
    pub fn default_density(&self) -> f64 {
        match self {
            FuelType::Hfo => 0.92,
            FuelType::Mgo => 0.83,
            FuelType::Lsfo => 0.92,
        }
    }
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for FuelType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HFO" => Ok(FuelType::Hfo),
            "MGO" => Ok(FuelType::Mgo),
            "LSFO" => Ok(FuelType::Lsfo),
            _ => Err(ModelError::UnknownFuel(s.to_string())),
        }
    }
}

/// Upper bound accepted for a density override, in t/m3.
pub const MAX_DENSITY: f64 = 2.0;

/// Densities used to turn counter volumes into mass.
///
/// Fuel types missing from the table fall back to [`FuelType::default_density`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DensityTable(BTreeMap<FuelType, f64>);

impl DensityTable {
    /// An empty table; every lookup uses the built-in default.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Density for a fuel type.
    pub fn density(&self, fuel: FuelType) -> f64 {
        self.0
            .get(&fuel)
            .copied()
            .unwrap_or_else(|| fuel.default_density())
    }

    /// Override the density for one fuel type.
    ///
    /// Rejects values outside `(0, MAX_DENSITY]`.
    pub fn set(&mut self, fuel: FuelType, density: f64) -> Result<(), ModelError> {
        if !is_sane_density(density) {
            return Err(ModelError::InvalidDensity { fuel, density });
        }
        self.0.insert(fuel, density);
        Ok(())
    }

    /// Builder form of [`DensityTable::set`].
    pub fn with(mut self, fuel: FuelType, density: f64) -> Result<Self, ModelError> {
        self.set(fuel, density)?;
        Ok(self)
    }

    /// Explicit entries in the table.
    pub fn entries(&self) -> impl Iterator<Item = (FuelType, f64)> + '_ {
        self.0.iter().map(|(fuel, density)| (*fuel, *density))
    }
}

impl Default for DensityTable {
    fn default() -> Self {
        Self(
            FuelType::ALL
                .iter()
                .map(|fuel| (*fuel, fuel.default_density()))
                .collect(),
        )
    }
}

/// Whether a density is usable for mass conversion.
pub fn is_sane_density(density: f64) -> bool {
    density.is_finite() && density > 0.0 && density <= MAX_DENSITY
}
