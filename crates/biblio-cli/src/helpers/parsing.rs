//! Parsing helpers for dates, ids and loan lengths.

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::errors::CliError;

/// Parse a calendar date (YYYY-MM-DD).
pub fn parse_date(value: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CliError::invalid_input(format!("Invalid date (expected YYYY-MM-DD): {}", value))
    })
}

/// Parse a record id.
pub fn parse_id(kind: &str, value: &str) -> Result<Uuid, CliError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| CliError::invalid_input(format!("Invalid {} id: {}", kind, value)))
}

/// Work out a loan's due date from `--due` or `--days`.
///
/// Without either, the loan runs `default_days` from today. Loans longer
/// than `max_days` are rejected.
pub fn resolve_due_date(
    today: NaiveDate,
    due: Option<&str>,
    days: Option<u32>,
    default_days: u32,
    max_days: u32,
) -> Result<NaiveDate, CliError> {
    let due_date = match (due, days) {
        (Some(value), _) => parse_date(value)?,
        (None, Some(days)) => add_days(today, days)?,
        (None, None) => add_days(today, default_days)?,
    };

    let length = (due_date - today).num_days();
    if length > i64::from(max_days) {
        return Err(CliError::invalid_input(format!(
            "Loan of {} days exceeds the maximum of {} days",
            length, max_days
        )));
    }
    Ok(due_date)
}

fn add_days(today: NaiveDate, days: u32) -> Result<NaiveDate, CliError> {
    today
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| CliError::invalid_input(format!("Loan length out of range: {} days", days)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(" 2026-04-15 ").unwrap(), NaiveDate::from_ymd_opt(2026, 4, 15).unwrap());
        assert!(parse_date("15/04/2026").is_err());
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id("book", &id.to_string()).unwrap(), id);
        assert!(matches!(parse_id("book", "nope"), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_due_date_defaults() {
        let due = resolve_due_date(today(), None, None, 14, 90).unwrap();
        assert_eq!(due, NaiveDate::from_ymd_opt(2026, 4, 15).unwrap());
        let due = resolve_due_date(today(), None, Some(0), 14, 90).unwrap();
        assert_eq!(due, today());
    }

    #[test]
    fn test_due_date_explicit_and_maximum() {
        let due = resolve_due_date(today(), Some("2026-05-01"), None, 14, 90).unwrap();
        assert_eq!(due, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
        assert!(resolve_due_date(today(), None, Some(91), 14, 90).is_err());
        assert!(resolve_due_date(today(), Some("2027-01-01"), None, 14, 90).is_err());
    }
}
