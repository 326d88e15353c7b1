//! Structural validation and repair of persisted voyages.
//!
//! Loading never rejects a voyage for content problems: missing or broken
//! fields are replaced with defaults and every repair is reported as a
//! [`ValidationIssue`]. Only input that is not a JSON object at all fails.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::cruise::{Cruise, VoyageEnd, DEFAULT_VESSEL, FORMAT_VERSION};
use crate::equipment::EquipmentKey;
use crate::fuel::{is_sane_density, DensityTable, FuelType};
use crate::filename::is_safe_filename;
use crate::id::{CruiseId, LegId};
use crate::leg::{Leg, VoyageReport};
use crate::phase::{Phase, PhaseKind, PhaseList};
use crate::report::{Report, ReportKind};
use crate::Time;

/// A problem found (and fixed) while loading a voyage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    /// The input is not a JSON object
    #[error("invalid data format")]
    InvalidFormat,

    /// No cruise id; a new one was assigned
    #[error("missing cruise ID")]
    MissingId,

    /// The cruise id could not be read; a new one was assigned
    #[error("unusable cruise ID {0}, assigned a new one")]
    InvalidId(String),

    /// A numeric id from an older file was converted to a stable ULID
    #[error("legacy cruise ID {0} converted")]
    LegacyId(u64),

    /// `legs` is missing or not an array
    #[error("invalid legs array")]
    InvalidLegs,

    /// A leg entry is not an object and was dropped
    #[error("leg {index} is unreadable and was skipped: {reason}")]
    UnreadableLeg {
        /// Position in the file
        index: usize,
        /// What was found
        reason: String,
    },

    /// A report or the navigation block was reset to its default
    #[error("leg {leg} {part} is unreadable and was reset: {reason}")]
    UnreadablePart {
        /// Leg position
        leg: usize,
        /// `departure`, `arrival` or `voyageReport`
        part: String,
        /// Parse error
        reason: String,
    },

    /// A phase entry could not be read and was dropped
    #[error("leg {leg} {report} phase {phase} is unreadable and was skipped: {reason}")]
    UnreadablePhase {
        /// Leg position
        leg: usize,
        /// Report the phase belongs to
        report: ReportKind,
        /// Phase position in the file
        phase: usize,
        /// Parse error
        reason: String,
    },

    /// A phase had no usable `type`
    #[error("leg {leg} {report} phase {phase} had no usable type, set to {kind:?}")]
    PhaseKindDefaulted {
        /// Leg position
        leg: usize,
        /// Report the phase belongs to
        report: ReportKind,
        /// Phase position in the file
        phase: usize,
        /// Kind assigned
        kind: PhaseKind,
    },

    /// A counter had no usable fuel type
    #[error("leg {leg} {report} phase {phase}: {key} had no usable fuel, set to {fuel}")]
    FuelDefaulted {
        /// Leg position
        leg: usize,
        /// Report the phase belongs to
        report: ReportKind,
        /// Phase position in the file
        phase: usize,
        /// Consumer
        key: EquipmentKey,
        /// Raw value found, if any
        found: Option<String>,
        /// Fuel assigned
        fuel: FuelType,
    },

    /// A value of the wrong JSON type was converted or dropped
    #[error("leg {leg} {path}: replaced unusable value {found}")]
    ReplacedValue {
        /// Leg position
        leg: usize,
        /// Dotted path inside the leg
        path: String,
        /// Raw value found
        found: String,
    },

    /// A density entry is not a sane number
    #[error("invalid {fuel} density: {value}")]
    InvalidDensity {
        /// Fuel label
        fuel: String,
        /// Raw value found
        value: String,
    },

    /// A density entry names an unknown fuel
    #[error("unknown fuel type in densities: {0}")]
    UnknownDensityFuel(String),

    /// A report had no phases; the defaults were seeded
    #[error("leg {leg} {report} report had no phases, seeded defaults")]
    EmptyPhases {
        /// Leg position
        leg: usize,
        /// Report repaired
        report: ReportKind,
    },

    /// A report had more than one standby phase
    #[error("leg {leg} {report} report had {count} standby phases, kept the first")]
    ExtraStandby {
        /// Leg position
        leg: usize,
        /// Report repaired
        report: ReportKind,
        /// Standby phases found
        count: usize,
    },

    /// A report sat in the wrong slot of its leg
    #[error("leg {leg} {expected} report was marked as {found}")]
    ReportKindMismatch {
        /// Leg position
        leg: usize,
        /// Kind of the slot
        expected: ReportKind,
        /// Kind in the file
        found: ReportKind,
    },

    /// A counter named a fuel its consumer cannot burn
    #[error("leg {leg} {report} phase {phase}: {key} cannot burn {fuel}, reset to {reset}")]
    FuelReset {
        /// Leg position
        leg: usize,
        /// Report repaired
        report: ReportKind,
        /// Phase position
        phase: usize,
        /// Consumer
        key: EquipmentKey,
        /// Fuel found
        fuel: FuelType,
        /// Fuel assigned
        reset: FuelType,
    },

    /// The assigned file name would leave the voyage directory
    #[error("unsafe file name {0:?} dropped")]
    UnsafeFilename(String),

    /// A top-level field could not be read
    #[error("unreadable {field}: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Parse error
        reason: String,
    },
}

/// A repaired voyage and the list of repairs applied.
#[derive(Debug, Clone)]
pub struct Validated {
    /// The usable voyage
    pub cruise: Cruise,
    /// What was fixed
    pub issues: Vec<ValidationIssue>,
}

impl Validated {
    /// Whether the input needed no repair.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate raw voyage JSON and substitute defaults where needed.
pub fn validate_cruise(raw: &Value) -> Result<Validated, ValidationIssue> {
    let obj = raw.as_object().ok_or(ValidationIssue::InvalidFormat)?;
    let mut issues = Vec::new();

    let id = match obj.get("id") {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::MissingId);
            CruiseId::new()
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            issues.push(ValidationIssue::MissingId);
            CruiseId::new()
        }
        Some(Value::Number(n)) if n.is_u64() => {
            let number = n.as_u64().unwrap_or_default();
            issues.push(ValidationIssue::LegacyId(number));
            CruiseId::from_legacy(number)
        }
        Some(value) => match value.as_str().and_then(|s| s.parse::<CruiseId>().ok()) {
            Some(id) => id,
            None => {
                issues.push(ValidationIssue::InvalidId(value.to_string()));
                CruiseId::new()
            }
        },
    };

    let legs = match obj.get("legs") {
        Some(Value::Array(raw_legs)) => raw_legs
            .iter()
            .enumerate()
            .filter_map(|(index, raw_leg)| repair_leg(index, raw_leg, &mut issues))
            .collect(),
        _ => {
            issues.push(ValidationIssue::InvalidLegs);
            Vec::new()
        }
    };

    let densities = repair_densities(obj.get("densities"), &mut issues);

    let voyage_end = match obj.get("voyageEnd") {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<VoyageEnd>(value.clone()) {
            Ok(end) => Some(end),
            Err(e) => {
                issues.push(ValidationIssue::InvalidField {
                    field: "voyageEnd",
                    reason: e.to_string(),
                });
                None
            }
        },
    };

    let last_modified = match obj.get("lastModified") {
        None | Some(Value::Null) => chrono::Utc::now(),
        Some(value) => match serde_json::from_value::<Time>(value.clone()) {
            Ok(t) => t,
            Err(e) => {
                issues.push(ValidationIssue::InvalidField {
                    field: "lastModified",
                    reason: e.to_string(),
                });
                chrono::Utc::now()
            }
        },
    };

    let filename = Some(text(obj, "filename")).filter(|f| !f.is_empty());
    let filename = match filename {
        Some(f) if !is_safe_filename(&f) => {
            issues.push(ValidationIssue::UnsafeFilename(f));
            None
        }
        other => other,
    };

    let vessel = text(obj, "vessel");
    let cruise = Cruise {
        id,
        name: text(obj, "name"),
        vessel: if vessel.is_empty() {
            DEFAULT_VESSEL.to_string()
        } else {
            vessel
        },
        start_date: text(obj, "startDate"),
        end_date: text(obj, "endDate"),
        legs,
        densities,
        voyage_end,
        filename,
        last_modified,
        version: FORMAT_VERSION.to_string(),
    };

    Ok(Validated { cruise, issues })
}

fn text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn repair_densities(raw: Option<&Value>, issues: &mut Vec<ValidationIssue>) -> DensityTable {
    let mut table = DensityTable::default();
    let Some(Value::Object(entries)) = raw else {
        return table;
    };

    for (name, value) in entries {
        let Ok(fuel) = name.parse::<FuelType>() else {
            issues.push(ValidationIssue::UnknownDensityFuel(name.clone()));
            continue;
        };
        let density = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match density.filter(|d| is_sane_density(*d)) {
            Some(d) => {
                // sane by the filter above
                let _ = table.set(fuel, d);
            }
            None => issues.push(ValidationIssue::InvalidDensity {
                fuel: fuel.to_string(),
                value: value.to_string(),
            }),
        }
    }
    table
}

fn repair_leg(index: usize, raw: &Value, issues: &mut Vec<ValidationIssue>) -> Option<Leg> {
    let Some(obj) = raw.as_object() else {
        issues.push(ValidationIssue::UnreadableLeg {
            index,
            reason: format!("expected an object, found {}", raw),
        });
        return None;
    };

    let id = obj
        .get("id")
        .and_then(|v| serde_json::from_value::<LegId>(v.clone()).ok())
        .unwrap_or_default();

    let mut leg = Leg {
        id,
        departure: read_report(index, ReportKind::Departure, obj.get("departure"), issues),
        arrival: read_report(index, ReportKind::Arrival, obj.get("arrival"), issues),
        voyage_report: read_voyage_report(index, obj.get("voyageReport"), issues),
    };

    for kind in [ReportKind::Departure, ReportKind::Arrival] {
        let count = count_standby(obj.get(kind.as_str()));
        if count > 1 {
            issues.push(ValidationIssue::ExtraStandby {
                leg: index,
                report: kind,
                count,
            });
        }
        let report = match kind {
            ReportKind::Departure => &mut leg.departure,
            ReportKind::Arrival => &mut leg.arrival,
        };
        repair_report(index, kind, report, issues);
    }

    Some(leg)
}

/// Keys whose values are not free text and are read by their own rules.
const STRUCTURAL_KEYS: [&str; 4] = ["id", "type", "fuel", "phases"];

/// Turn stray numbers and booleans into text and drop nulls, so the text
/// fields of a report, phase or counter deserialize.
fn coerce_text(leg: usize, path: &str, value: &mut Value, issues: &mut Vec<ValidationIssue>) {
    let Value::Object(map) = value else {
        return;
    };
    map.retain(|_, v| !v.is_null());
    for (key, field) in map.iter_mut() {
        if STRUCTURAL_KEYS.contains(&key.as_str()) {
            continue;
        }
        let field_path = format!("{}.{}", path, key);
        match field {
            Value::Number(_) | Value::Bool(_) => {
                issues.push(ValidationIssue::ReplacedValue {
                    leg,
                    path: field_path,
                    found: field.to_string(),
                });
                *field = Value::String(field.to_string());
            }
            Value::Object(_) => coerce_text(leg, &field_path, field, issues),
            _ => {}
        }
    }
}

fn read_report(
    leg: usize,
    kind: ReportKind,
    raw: Option<&Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Report {
    let mut obj = match raw {
        None | Some(Value::Null) => return Report::new(kind),
        Some(Value::Object(obj)) => obj.clone(),
        Some(other) => {
            issues.push(ValidationIssue::UnreadablePart {
                leg,
                part: kind.as_str().to_string(),
                reason: format!("expected an object, found {}", other),
            });
            return Report::new(kind);
        }
    };

    let bad_kind = obj
        .get("type")
        .filter(|t| serde_json::from_value::<ReportKind>((*t).clone()).is_err())
        .map(Value::to_string);
    if let Some(found) = bad_kind {
        issues.push(ValidationIssue::ReplacedValue {
            leg,
            path: format!("{}.type", kind),
            found,
        });
        obj.insert("type".into(), Value::String(kind.as_str().into()));
    }

    let added_kind = match kind {
        ReportKind::Departure => PhaseKind::Port,
        ReportKind::Arrival => PhaseKind::Sea,
    };
    let phases: Vec<Phase> = match obj.remove("phases") {
        Some(Value::Array(raw_phases)) => raw_phases
            .into_iter()
            .enumerate()
            .filter_map(|(i, p)| read_phase(leg, kind, i, p, added_kind, issues))
            .collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            issues.push(ValidationIssue::ReplacedValue {
                leg,
                path: format!("{}.phases", kind),
                found: other.to_string(),
            });
            Vec::new()
        }
    };

    let mut value = Value::Object(obj);
    coerce_text(leg, kind.as_str(), &mut value, issues);
    let mut report = match serde_json::from_value::<Report>(value) {
        Ok(report) => report,
        Err(e) => {
            issues.push(ValidationIssue::UnreadablePart {
                leg,
                part: kind.as_str().to_string(),
                reason: e.to_string(),
            });
            Report::new(kind)
        }
    };
    report.phases = PhaseList::from(phases);
    report
}

fn read_phase(
    leg: usize,
    report: ReportKind,
    index: usize,
    raw: Value,
    added_kind: PhaseKind,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Phase> {
    let mut obj = match raw {
        Value::Object(obj) => obj,
        other => {
            issues.push(ValidationIssue::UnreadablePhase {
                leg,
                report,
                phase: index,
                reason: format!("expected an object, found {}", other),
            });
            return None;
        }
    };
    let path = format!("{}.phases[{}]", report, index);

    let kind_ok = obj
        .get("type")
        .is_some_and(|t| serde_json::from_value::<PhaseKind>(t.clone()).is_ok());
    if !kind_ok {
        issues.push(ValidationIssue::PhaseKindDefaulted {
            leg,
            report,
            phase: index,
            kind: added_kind,
        });
        obj.insert("type".into(), Value::String(added_kind.as_str().into()));
    }

    match obj.remove("equipment") {
        None => {}
        Some(Value::Object(mut equipment)) => {
            for key in EquipmentKey::ALL {
                match equipment.remove(key.as_str()) {
                    None => {}
                    Some(Value::Object(mut counter)) => {
                        repair_counter_fuel(leg, report, index, key, &mut counter, issues);
                        equipment.insert(key.as_str().into(), Value::Object(counter));
                    }
                    // a missing counter deserializes with its defaults
                    Some(other) => issues.push(ValidationIssue::ReplacedValue {
                        leg,
                        path: format!("{}.equipment.{}", path, key.as_str()),
                        found: other.to_string(),
                    }),
                }
            }
            obj.insert("equipment".into(), Value::Object(equipment));
        }
        Some(other) => issues.push(ValidationIssue::ReplacedValue {
            leg,
            path: format!("{}.equipment", path),
            found: other.to_string(),
        }),
    }

    let mut value = Value::Object(obj);
    coerce_text(leg, &path, &mut value, issues);
    match serde_json::from_value::<Phase>(value) {
        Ok(phase) => Some(phase),
        Err(e) => {
            issues.push(ValidationIssue::UnreadablePhase {
                leg,
                report,
                phase: index,
                reason: e.to_string(),
            });
            None
        }
    }
}

/// Fill a missing or unknown counter fuel with the consumer's factory fuel.
fn repair_counter_fuel(
    leg: usize,
    report: ReportKind,
    phase: usize,
    key: EquipmentKey,
    counter: &mut Map<String, Value>,
    issues: &mut Vec<ValidationIssue>,
) {
    let fuel = counter
        .get("fuel")
        .and_then(Value::as_str)
        .and_then(|f| f.parse::<FuelType>().ok());
    let fuel = match fuel {
        Some(fuel) => fuel,
        None => {
            let fuel = key.default_fuel();
            issues.push(ValidationIssue::FuelDefaulted {
                leg,
                report,
                phase,
                key,
                found: counter.get("fuel").map(Value::to_string),
                fuel,
            });
            fuel
        }
    };
    counter.insert("fuel".into(), Value::String(fuel.label().into()));
}

fn read_voyage_report(
    leg: usize,
    raw: Option<&Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<VoyageReport> {
    let mut value = match raw {
        None | Some(Value::Null) => return None,
        Some(value) => value.clone(),
    };
    coerce_text(leg, "voyageReport", &mut value, issues);
    match serde_json::from_value::<VoyageReport>(value) {
        Ok(report) => Some(report),
        Err(e) => {
            issues.push(ValidationIssue::UnreadablePart {
                leg,
                part: "voyageReport".into(),
                reason: e.to_string(),
            });
            None
        }
    }
}

fn count_standby(raw_report: Option<&Value>) -> usize {
    raw_report
        .and_then(|r| r.get("phases"))
        .and_then(Value::as_array)
        .map(|phases| {
            phases
                .iter()
                .filter(|p| p.get("type").and_then(Value::as_str) == Some("standby"))
                .count()
        })
        .unwrap_or(0)
}

fn repair_report(
    leg: usize,
    expected: ReportKind,
    report: &mut Report,
    issues: &mut Vec<ValidationIssue>,
) {
    if report.kind != expected {
        issues.push(ValidationIssue::ReportKindMismatch {
            leg,
            expected,
            found: report.kind,
        });
        report.kind = expected;
    }

    if report.phases.is_empty() {
        issues.push(ValidationIssue::EmptyPhases {
            leg,
            report: expected,
        });
        report.phases = Report::seed_phases(expected);
    }

    for phase_index in 0..report.phases.len() {
        let Some(phase) = report.phases.get_mut(phase_index) else {
            continue;
        };
        for key in EquipmentKey::ALL {
            let counter = phase.equipment.get_mut(key);
            if !key.allowed_fuels().contains(&counter.fuel) {
                let reset = key.default_fuel();
                issues.push(ValidationIssue::FuelReset {
                    leg,
                    report: expected,
                    phase: phase_index,
                    key,
                    fuel: counter.fuel,
                    reset,
                });
                counter.fuel = reset;
            }
        }
    }
}
