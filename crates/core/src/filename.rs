//! Voyage file naming.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::cruise::Cruise;

fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new("[^A-Za-z0-9]").expect("literal pattern compiles"))
}

fn unsafe_date_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new("[^A-Za-z0-9-]").expect("literal pattern compiles"))
}

/// Replace every character outside `[A-Za-z0-9]` with `_`.
pub fn safe_name(name: &str) -> String {
    unsafe_chars().replace_all(name, "_").into_owned()
}

/// Date prefix of a file name; `-` survives so `YYYY-MM-DD` reads as is.
fn safe_date(date: &str) -> String {
    unsafe_date_chars().replace_all(date.trim(), "_").into_owned()
}

/// Whether `name` is a bare `*.json` file name inside the voyage directory.
///
/// Rejects path separators, parent references, hidden and absolute names.
pub fn is_safe_filename(name: &str) -> bool {
    let path = Path::new(name);
    name.ends_with(".json")
        && name.len() > ".json".len()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
        && !path.is_absolute()
        && path.file_name().and_then(|f| f.to_str()) == Some(name)
}

/// `{startDate}_{from}_to_{to}.json`, used when a voyage is created from its route.
pub fn route_filename(start_date: &str, from_port: &str, to_port: &str) -> String {
    format!(
        "{}_{}_to_{}.json",
        safe_date(start_date),
        safe_name(from_port),
        safe_name(to_port)
    )
}

/// File name of a cruise.
///
/// An assigned `filename` wins when [`is_safe_filename`] accepts it. Otherwise `{startDate}_{safeName}.json`, or
/// `{startDate}_voyage_{id}.json` for unnamed voyages. A blank start date is
/// replaced by today's date.
pub fn voyage_filename(cruise: &Cruise) -> String {
    if let Some(filename) = cruise.filename.as_deref().filter(|f| is_safe_filename(f)) {
        return filename.to_string();
    }

    let date = if cruise.start_date.trim().is_empty() {
        chrono::Utc::now().format("%Y-%m-%d").to_string()
    } else {
        safe_date(&cruise.start_date)
    };

    if cruise.name.trim().is_empty() {
        format!("{}_voyage_{}.json", date, cruise.id)
    } else {
        format!("{}_{}.json", date, safe_name(&cruise.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_filename_is_safe() {
        let name = route_filename("2025-06-01", "Hong Kong!", "Keelung/Taiwan");
        assert_eq!(name, "2025-06-01_Hong_Kong__to_Keelung_Taiwan.json");
        assert!(name.contains("Hong_Kong_"));
        assert!(name.contains("Keelung_Taiwan"));

        let stem = name.trim_end_matches(".json");
        assert!(stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn test_safe_name_non_ascii() {
        assert_eq!(safe_name("Piräus (GR)"), "Pir_us__GR_");
    }

    #[test]
    fn test_assigned_filename_wins() {
        let mut cruise = Cruise::new();
        cruise.name = "Alaska Run".into();
        cruise.start_date = "2025-05-10".into();
        assert_eq!(voyage_filename(&cruise), "2025-05-10_Alaska_Run.json");

        cruise.filename = Some("custom.json".into());
        assert_eq!(voyage_filename(&cruise), "custom.json");
    }

    #[test]
    fn test_names_stay_inside_the_directory() {
        for bad in [
            "../escape.json",
            "/tmp/abs.json",
            "sub/dir.json",
            "..\\win.json",
            ".hidden.json",
            "notes.txt",
            ".json",
            "",
        ] {
            assert!(!is_safe_filename(bad), "{bad:?} accepted");
        }
        assert!(is_safe_filename("2025-05-10_Alaska_Run.json"));

        let mut cruise = Cruise::new();
        cruise.name = "Loop".into();
        cruise.start_date = "../../etc".into();
        cruise.filename = Some("../../outside.json".into());
        let name = voyage_filename(&cruise);
        assert_eq!(name, "______etc_Loop.json");
        assert!(is_safe_filename(&name));

        let route = route_filename("2025/06/01", "A", "B");
        assert_eq!(route, "2025_06_01_A_to_B.json");
        assert!(is_safe_filename(&route));
    }

    #[test]
    fn test_unnamed_voyage_uses_id() {
        let mut cruise = Cruise::new();
        cruise.start_date = "2025-05-10".into();
        assert_eq!(
            voyage_filename(&cruise),
            format!("2025-05-10_voyage_{}.json", cruise.id)
        );
    }
}
