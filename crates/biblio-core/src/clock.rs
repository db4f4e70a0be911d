//! Source of the current date for the loan engine.
//!
//! Overdue status is a function of `due_date` versus today, so every store
//! carries a clock. Tests and the `--today` CLI override use [`FixedClock`].

use std::sync::Mutex;

use chrono::{Days, Local, NaiveDate};

/// Supplies today's calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a date that can be moved explicitly.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    /// Pin the clock to a new date.
    pub fn set(&self, date: NaiveDate) {
        let mut guard = self.today.lock().unwrap_or_else(|e| e.into_inner());
        *guard = date;
    }

    /// Move the clock forward by `days`.
    pub fn advance_days(&self, days: u64) {
        let mut guard = self.today.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = guard.checked_add_days(Days::new(days)) {
            *guard = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 30).unwrap();
        let clock = FixedClock::new(start);

        clock.advance_days(3);

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 4, 2).unwrap());
    }

    #[test]
    fn test_fixed_clock_set() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let later = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        clock.set(later);

        assert_eq!(clock.today(), later);
    }
}
