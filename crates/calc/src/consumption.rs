//! Counter readings to mass.

use fueltrack_core::{is_blank, DensityTable, EquipmentCounter, FuelType};

/// Placeholder shown where no consumption is defined.
pub const NO_VALUE: &str = "\u{2013}";

/// Mass consumed between two readings, in metric tonnes.
///
/// `None` when either reading is blank, not a number, or when the end reading
/// is below the start reading. The result is kept at full precision; round
/// with [`round2`] only when presenting it.
pub fn consumption(
    start: &str,
    end: &str,
    fuel: FuelType,
    densities: &DensityTable,
) -> Option<f64> {
    let start = parse_reading(start)?;
    let end = parse_reading(end)?;
    let diff = end - start;
    if diff.is_nan() || diff < 0.0 {
        return None;
    }
    Some(diff * densities.density(fuel))
}

/// [`consumption`] for a counter, using its assigned fuel.
pub fn counter_consumption(counter: &EquipmentCounter, densities: &DensityTable) -> Option<f64> {
    consumption(&counter.start, &counter.end, counter.fuel, densities)
}

/// Round to 2 decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Two-decimal text, or the placeholder when there is no value.
pub fn format_mass(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => NO_VALUE.to_string(),
    }
}

fn parse_reading(value: &str) -> Option<f64> {
    if is_blank(value) {
        return None;
    }
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Plausibility of a reading pair, for warnings in a front end.
///
/// Consumption itself never fails; it just yields no value. This tells the
/// engineer why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingStatus {
    /// Neither reading entered
    Empty,
    /// Only one side entered
    Partial,
    /// A reading is not a number
    Unreadable,
    /// End is below start
    Negative,
    /// Consumption is defined
    Valid,
}

impl ReadingStatus {
    /// Whether the engineer should be warned.
    pub fn needs_attention(&self) -> bool {
        matches!(self, ReadingStatus::Unreadable | ReadingStatus::Negative)
    }
}

/// Classify a reading pair.
pub fn reading_status(start: &str, end: &str) -> ReadingStatus {
    match (is_blank(start), is_blank(end)) {
        (true, true) => return ReadingStatus::Empty,
        (true, false) | (false, true) => return ReadingStatus::Partial,
        (false, false) => {}
    }
    match (parse_reading(start), parse_reading(end)) {
        (Some(s), Some(e)) if e < s => ReadingStatus::Negative,
        (Some(_), Some(_)) => ReadingStatus::Valid,
        _ => ReadingStatus::Unreadable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_volume_times_density() {
        let d = DensityTable::default();
        let mass = consumption("1000", "1012.5", FuelType::Hfo, &d).unwrap();
        assert!(approx(mass, 12.5 * 0.92));
        assert_eq!(round2(mass), 11.5);

        let mass = consumption("10", "20", FuelType::Mgo, &d).unwrap();
        assert_eq!(round2(mass), 8.3);
    }

    #[test]
    fn test_uses_voyage_density() {
        let d = DensityTable::default().with(FuelType::Lsfo, 0.95).unwrap();
        let mass = consumption("0", "100", FuelType::Lsfo, &d).unwrap();
        assert!(approx(mass, 95.0));
    }

    #[test]
    fn test_missing_density_falls_back() {
        let d = DensityTable::empty();
        let mass = consumption("0", "100", FuelType::Mgo, &d).unwrap();
        assert!(approx(mass, 83.0));
    }

    #[test]
    fn test_no_value_cases() {
        let d = DensityTable::default();
        assert_eq!(consumption("", "10", FuelType::Hfo, &d), None);
        assert_eq!(consumption("10", "  ", FuelType::Hfo, &d), None);
        assert_eq!(consumption("20", "10", FuelType::Hfo, &d), None);
        assert_eq!(consumption("abc", "10", FuelType::Hfo, &d), None);
    }

    #[test]
    fn test_zero_diff_is_zero() {
        let d = DensityTable::default();
        assert_eq!(consumption("55.5", "55.5", FuelType::Hfo, &d), Some(0.0));
    }

    #[test]
    fn test_full_precision_until_display() {
        let d = DensityTable::default();
        // 0.004 * 0.92 rounds to 0.00 on its own
        let one = consumption("0", "0.004", FuelType::Hfo, &d).unwrap();
        let sum: f64 = std::iter::repeat(one).take(10).sum();
        assert_eq!(round2(one), 0.0);
        assert_eq!(round2(sum), 0.04);
        assert_eq!(format_mass(Some(sum)), "0.04");
        assert_eq!(format_mass(None), NO_VALUE);
    }

    #[test]
    fn test_reading_status() {
        assert_eq!(reading_status("", ""), ReadingStatus::Empty);
        assert_eq!(reading_status("1", ""), ReadingStatus::Partial);
        assert_eq!(reading_status("x", "2"), ReadingStatus::Unreadable);
        assert_eq!(reading_status("5", "2"), ReadingStatus::Negative);
        assert_eq!(reading_status("2", "5"), ReadingStatus::Valid);
        assert!(ReadingStatus::Negative.needs_attention());
        assert!(!ReadingStatus::Partial.needs_attention());
    }
}
