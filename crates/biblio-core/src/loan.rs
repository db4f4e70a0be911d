//! Loan lifecycle rules.
//!
//! The stored `state` column is a cache of [`compute_state`]. Read paths call
//! it with today's date and write back any row whose state moved, so a loan
//! becomes OVERDUE the first time it is read after its due date.

use chrono::{Datelike, NaiveDate};

use crate::error::{LibraryError, Result};
use crate::storage::types::{Loan, LoanState};

/// State a loan should have on `today`.
///
/// Only ACTIVE moves: it becomes OVERDUE once `due_date` is strictly in the
/// past. OVERDUE and RETURNED are returned unchanged, so the transition can
/// never run backwards even if the clock does.
pub fn compute_state(loan: &Loan, today: NaiveDate) -> LoanState {
    match loan.state {
        LoanState::Active if loan.due_date < today => LoanState::Overdue,
        state => state,
    }
}

/// Apply [`compute_state`] in place. Returns true when the state changed and
/// the row needs to be persisted.
pub fn refresh_state(loan: &mut Loan, today: NaiveDate) -> bool {
    let next = compute_state(loan, today);
    if next != loan.state {
        loan.state = next;
        true
    } else {
        false
    }
}

/// Latest year a due date may fall in. Dates are stored as ISO text and
/// only four-digit years compare correctly as strings.
pub const LATEST_DUE_YEAR: i32 = 9999;

/// Check that a new loan's due date is not before its start date and fits
/// the stored date format.
pub fn validate_due_date(start_date: NaiveDate, due_date: NaiveDate) -> Result<()> {
    if due_date < start_date {
        return Err(LibraryError::Validation(format!(
            "Due date {} is before start date {}",
            due_date, start_date
        )));
    }
    if due_date.year() > LATEST_DUE_YEAR {
        return Err(LibraryError::Validation(format!(
            "Due date {} is past the year {}",
            due_date, LATEST_DUE_YEAR
        )));
    }
    Ok(())
}
