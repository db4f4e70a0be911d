//! String formatting helpers for listings.

use chrono::NaiveDate;
use uuid::Uuid;

/// Truncate a string to max length, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let truncated: String = s.chars().take(max_len - 3).collect();
    format!("{}...", truncated)
}

/// First 8 characters of a UUID.
pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// An optional field, or `-` when absent.
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// Available over total, e.g. `1/3`.
pub fn copies(available: u32, total: u32) -> String {
    format!("{}/{}", available, total)
}

/// Distance from today to the due date in words.
pub fn due_in(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "due today".to_string(),
        1 => "due tomorrow".to_string(),
        d if d > 1 => format!("in {}d", d),
        -1 => "1d overdue".to_string(),
        d => format!("{}d overdue", -d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dune", 10), "Dune");
        assert_eq!(truncate("The Left Hand of Darkness", 12), "The Left ...");
        assert_eq!(truncate("Dune", 2), "Du");
    }

    #[test]
    fn test_short_id() {
        let id = Uuid::parse_str("7a2e3c0b-1234-5678-9abc-def012345678").unwrap();
        assert_eq!(short_id(&id), "7a2e3c0b");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some("Ace")), "Ace");
    }

    #[test]
    fn test_due_in() {
        assert_eq!(due_in(date(10), date(10)), "due today");
        assert_eq!(due_in(date(11), date(10)), "due tomorrow");
        assert_eq!(due_in(date(15), date(10)), "in 5d");
        assert_eq!(due_in(date(9), date(10)), "1d overdue");
        assert_eq!(due_in(date(1), date(10)), "9d overdue");
    }
}
