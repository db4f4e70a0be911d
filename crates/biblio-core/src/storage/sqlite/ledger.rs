//! Loan ledger: creation, return, overdue refresh, listings.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use super::row::{format_date, LoanRow, LOAN_COLUMNS};
use super::{catalog, members, touch, SqliteStore};
use crate::error::{LibraryError, Result};
use crate::loan::{refresh_state, validate_due_date};
use crate::storage::traits::LoanLedger;
use crate::storage::types::{Loan, LoanFilter, LoanState};

/// Which loans an overdue refresh pass touches.
#[derive(Debug, Clone, Copy)]
pub(super) enum RefreshScope<'a> {
    All,
    Book(&'a Uuid),
    Member(&'a Uuid),
    Loan(&'a Uuid),
}

/// Persist ACTIVE → OVERDUE for every loan in scope whose due date has passed.
///
/// Only rows still ACTIVE are written, so concurrent refreshes converge.
pub(super) fn mark_overdue(
    conn: &Connection,
    today: NaiveDate,
    scope: RefreshScope<'_>,
) -> Result<usize> {
    let base = "UPDATE loans SET state = 'overdue' WHERE state = 'active' AND due_date < ?1";
    let today = format_date(today);
    let changed = match scope {
        RefreshScope::All => conn.execute(base, [today])?,
        RefreshScope::Book(id) => conn.execute(
            &format!("{} AND book_id = ?2", base),
            [today, id.to_string()],
        )?,
        RefreshScope::Member(id) => conn.execute(
            &format!("{} AND member_id = ?2", base),
            [today, id.to_string()],
        )?,
        RefreshScope::Loan(id) => {
            conn.execute(&format!("{} AND id = ?2", base), [today, id.to_string()])?
        }
    };

    if changed > 0 {
        tracing::info!(count = changed, ?scope, "loans marked overdue");
    }
    Ok(changed)
}

pub(super) fn open_count_for_book(conn: &Connection, book_id: &Uuid) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM loans WHERE book_id = ? AND state IN ('active', 'overdue')",
        [book_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

pub(super) fn open_count_for_member(conn: &Connection, member_id: &Uuid) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM loans WHERE member_id = ? AND state IN ('active', 'overdue')",
        [member_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

fn fetch_loan(conn: &Connection, id: &Uuid) -> Result<Option<Loan>> {
    let sql = format!("SELECT {} FROM loans l WHERE l.id = ?", LOAN_COLUMNS);
    let row = conn
        .query_row(&sql, [id.to_string()], LoanRow::from_row)
        .optional()?;
    row.map(Loan::try_from).transpose()
}

fn query_loans(
    conn: &Connection,
    sql: &str,
    params: &[Box<dyn rusqlite::ToSql>],
) -> Result<Vec<Loan>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), LoanRow::from_row)?;

    let mut loans = Vec::new();
    for row in rows {
        loans.push(row?.try_into()?);
    }
    Ok(loans)
}

/// Shared body of the open and returned listings.
fn loans_in_states(
    conn: &Connection,
    states: &str,
    member_id: Option<&Uuid>,
    order_by: &str,
) -> Result<Vec<Loan>> {
    let mut query = format!(
        "SELECT {} FROM loans l WHERE l.state IN ({})",
        LOAN_COLUMNS, states
    );
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(member_id) = member_id {
        query.push_str(" AND l.member_id = ?");
        params.push(Box::new(member_id.to_string()));
    }
    query.push_str(" ORDER BY ");
    query.push_str(order_by);

    query_loans(conn, &query, &params)
}

fn member_scope(member_id: Option<&Uuid>) -> RefreshScope<'_> {
    match member_id {
        Some(id) => RefreshScope::Member(id),
        None => RefreshScope::All,
    }
}

impl LoanLedger for SqliteStore {
    fn create_loan(&self, book_id: &Uuid, member_id: &Uuid, due_date: NaiveDate) -> Result<Loan> {
        let today = self.today();
        validate_due_date(today, due_date)?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let book = catalog::fetch_book(&tx, book_id)?.ok_or(LibraryError::BookNotFound(*book_id))?;
        if members::fetch_member(&tx, member_id)?.is_none() {
            return Err(LibraryError::MemberNotFound(*member_id));
        }

        let open = open_count_for_book(&tx, book_id)?;
        if u64::from(book.total_copies) <= open {
            tracing::warn!(
                book_id = %book_id,
                total_copies = book.total_copies,
                open,
                "loan refused: no copies available"
            );
            return Err(LibraryError::NoCopiesAvailable { book_id: *book_id });
        }

        let loan = Loan {
            id: Uuid::new_v4(),
            book_id: *book_id,
            member_id: *member_id,
            start_date: today,
            due_date,
            state: LoanState::Active,
        };
        tx.execute(
            r#"
            INSERT INTO loans (id, book_id, member_id, start_date, due_date, state)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            (
                loan.id.to_string(),
                loan.book_id.to_string(),
                loan.member_id.to_string(),
                format_date(loan.start_date),
                format_date(loan.due_date),
                loan.state.as_str(),
            ),
        )?;
        touch(&tx)?;
        tx.commit()?;

        tracing::info!(
            loan_id = %loan.id,
            book_id = %book_id,
            member_id = %member_id,
            due = %due_date,
            "loan created"
        );
        Ok(loan)
    }

    fn return_loan(&self, id: &Uuid) -> Result<Option<Loan>> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut loan) = fetch_loan(&tx, id)? else {
            return Ok(None);
        };
        if loan.state == LoanState::Returned {
            tracing::debug!(loan_id = %id, "loan already returned");
            return Ok(Some(loan));
        }

        tx.execute(
            "UPDATE loans SET state = 'returned' WHERE id = ?",
            [id.to_string()],
        )?;
        touch(&tx)?;
        tx.commit()?;

        loan.state = LoanState::Returned;
        tracing::info!(loan_id = %id, "loan returned");
        Ok(Some(loan))
    }

    fn refresh_overdue(&self, mut loan: Loan) -> Result<Loan> {
        if refresh_state(&mut loan, self.today()) {
            let conn = self.lock_conn()?;
            conn.execute(
                "UPDATE loans SET state = 'overdue' WHERE id = ? AND state = 'active'",
                [loan.id.to_string()],
            )?;
            tracing::info!(loan_id = %loan.id, "loan marked overdue");
        }
        Ok(loan)
    }

    fn get_loan(&self, id: &Uuid) -> Result<Option<Loan>> {
        let conn = self.lock_conn()?;
        mark_overdue(&conn, self.today(), RefreshScope::Loan(id))?;
        fetch_loan(&conn, id)
    }

    fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<Loan>> {
        let conn = self.lock_conn()?;

        let scope = match (&filter.member_id, &filter.book_id) {
            (Some(member_id), _) => RefreshScope::Member(member_id),
            (None, Some(book_id)) => RefreshScope::Book(book_id),
            (None, None) => RefreshScope::All,
        };
        mark_overdue(&conn, self.today(), scope)?;

        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(member_id) = filter.member_id {
            conditions.push("l.member_id = ?");
            params.push(Box::new(member_id.to_string()));
        }
        if let Some(book_id) = filter.book_id {
            conditions.push("l.book_id = ?");
            params.push(Box::new(book_id.to_string()));
        }
        if let Some(state) = filter.state {
            conditions.push("l.state = ?");
            params.push(Box::new(state.as_str()));
        }

        let mut query = format!("SELECT {} FROM loans l", LOAN_COLUMNS);
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY l.start_date DESC, l.id");

        if let Some(limit) = filter.limit {
            query.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let loans = query_loans(&conn, &query, &params)?;
        tracing::debug!(count = loans.len(), ?filter, "listed loans");
        Ok(loans)
    }

    fn open_loans(&self, member_id: Option<&Uuid>) -> Result<Vec<Loan>> {
        let conn = self.lock_conn()?;
        mark_overdue(&conn, self.today(), member_scope(member_id))?;
        loans_in_states(
            &conn,
            "'active', 'overdue'",
            member_id,
            "l.due_date ASC, l.start_date ASC, l.id ASC",
        )
    }

    fn returned_loans(&self, member_id: Option<&Uuid>) -> Result<Vec<Loan>> {
        let conn = self.lock_conn()?;
        mark_overdue(&conn, self.today(), member_scope(member_id))?;
        loans_in_states(&conn, "'returned'", member_id, "l.due_date DESC, l.id ASC")
    }

    fn delete_loan(&self, id: &Uuid) -> Result<bool> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute("DELETE FROM loans WHERE id = ?", [id.to_string()])?;
        if removed > 0 {
            touch(&tx)?;
        }
        tx.commit()?;

        if removed > 0 {
            tracing::info!(loan_id = %id, "loan deleted");
        }
        Ok(removed > 0)
    }

    fn delete_returned_loan(&self, id: &Uuid) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        mark_overdue(&tx, self.today(), RefreshScope::Loan(id))?;
        let loan = fetch_loan(&tx, id)?.ok_or(LibraryError::LoanNotFound(*id))?;
        if loan.state.is_open() {
            tx.commit()?;
            tracing::warn!(loan_id = %id, state = %loan.state, "loan delete refused: still open");
            return Err(LibraryError::LoanStillOpen(*id));
        }

        tx.execute("DELETE FROM loans WHERE id = ?", [id.to_string()])?;
        touch(&tx)?;
        tx.commit()?;

        tracing::info!(loan_id = %id, "returned loan deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::traits::{CatalogStore, MemberStore};
    use crate::storage::types::{NewBook, NewMember, Role};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(copies: u32) -> (SqliteStore, Arc<FixedClock>, Uuid, Uuid) {
        let clock = Arc::new(FixedClock::new(date(2026, 3, 1)));
        let store = SqliteStore::open_in_memory()
            .unwrap()
            .with_clock(clock.clone());
        let book = store
            .insert_book(&NewBook::new("Dune", "Frank Herbert", copies))
            .unwrap();
        let member = store
            .insert_member(&NewMember {
                name: "Ada".into(),
                email: "ada@example.org".into(),
                credential_hash: "hash".into(),
                role: Role::User,
            })
            .unwrap();
        (store, clock, book.id, member.id)
    }

    #[test]
    fn test_create_loan_starts_today_and_active() {
        let (store, _clock, book, member) = setup(1);
        let loan = store
            .create_loan(&book, &member, date(2026, 3, 15))
            .unwrap();

        assert_eq!(loan.start_date, date(2026, 3, 1));
        assert_eq!(loan.state, LoanState::Active);
        assert_eq!(store.get_loan(&loan.id).unwrap().unwrap(), loan);
    }

    #[test]
    fn test_create_loan_rejects_past_due_date() {
        let (store, _clock, book, member) = setup(1);
        let err = store
            .create_loan(&book, &member, date(2026, 2, 28))
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
    }

    #[test]
    fn test_create_loan_unknown_references() {
        let (store, _clock, book, member) = setup(1);
        let ghost = Uuid::new_v4();
        let due = date(2026, 3, 15);

        assert!(matches!(
            store.create_loan(&ghost, &member, due),
            Err(LibraryError::BookNotFound(_))
        ));
        assert!(matches!(
            store.create_loan(&book, &ghost, due),
            Err(LibraryError::MemberNotFound(_))
        ));
    }

    #[test]
    fn test_no_copies_refusal_changes_nothing() {
        let (store, _clock, book, member) = setup(1);
        let due = date(2026, 3, 15);
        store.create_loan(&book, &member, due).unwrap();

        let err = store.create_loan(&book, &member, due).unwrap_err();
        assert!(matches!(err, LibraryError::NoCopiesAvailable { book_id } if book_id == book));
        assert_eq!(store.list_loans(&LoanFilter::new()).unwrap().len(), 1);
    }

    #[test]
    fn test_return_is_idempotent() {
        let (store, _clock, book, member) = setup(1);
        let loan = store
            .create_loan(&book, &member, date(2026, 3, 15))
            .unwrap();

        let first = store.return_loan(&loan.id).unwrap().unwrap();
        let second = store.return_loan(&loan.id).unwrap().unwrap();

        assert_eq!(first.state, LoanState::Returned);
        assert_eq!(second, first);
        assert!(store.return_loan(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_state_filter_sees_refreshed_state() {
        let (store, clock, book, member) = setup(2);
        store
            .create_loan(&book, &member, date(2026, 3, 5))
            .unwrap();
        clock.set(date(2026, 3, 6));

        let overdue = store
            .loans_for_book_in_state(&book, LoanState::Overdue)
            .unwrap();
        let active = store
            .list_loans(&LoanFilter::new().state(LoanState::Active))
            .unwrap();

        assert_eq!(overdue.len(), 1);
        assert!(active.is_empty());
    }

    #[test]
    fn test_refresh_overdue_persists() {
        let (store, clock, book, member) = setup(1);
        let loan = store
            .create_loan(&book, &member, date(2026, 3, 2))
            .unwrap();
        clock.set(date(2026, 3, 10));

        let refreshed = store.refresh_overdue(loan.clone()).unwrap();
        assert_eq!(refreshed.state, LoanState::Overdue);

        let conn = store.lock_conn().unwrap();
        let stored: String = conn
            .query_row(
                "SELECT state FROM loans WHERE id = ?",
                [loan.id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, "overdue");
    }

    #[test]
    fn test_open_and_returned_ordering() {
        let (store, clock, book, member) = setup(3);
        let late = store
            .create_loan(&book, &member, date(2026, 3, 20))
            .unwrap();
        let soon = store
            .create_loan(&book, &member, date(2026, 3, 3))
            .unwrap();
        let mid = store
            .create_loan(&book, &member, date(2026, 3, 10))
            .unwrap();
        clock.set(date(2026, 3, 5));

        let open: Vec<Uuid> = store
            .open_loans(None)
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(open, vec![soon.id, mid.id, late.id]);

        store.return_loan(&soon.id).unwrap();
        store.return_loan(&late.id).unwrap();
        let returned: Vec<Uuid> = store
            .returned_loans(Some(&member))
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(returned, vec![late.id, soon.id]);
    }

    #[test]
    fn test_delete_returned_loan_refuses_open() {
        let (store, _clock, book, member) = setup(1);
        let loan = store
            .create_loan(&book, &member, date(2026, 3, 15))
            .unwrap();

        assert!(matches!(
            store.delete_returned_loan(&loan.id),
            Err(LibraryError::LoanStillOpen(_))
        ));

        store.return_loan(&loan.id).unwrap();
        store.delete_returned_loan(&loan.id).unwrap();
        assert!(store.get_loan(&loan.id).unwrap().is_none());
        assert!(matches!(
            store.delete_returned_loan(&loan.id),
            Err(LibraryError::LoanNotFound(_))
        ));
    }

    #[test]
    fn test_delete_loan_is_unconditional() {
        let (store, _clock, book, member) = setup(1);
        let loan = store
            .create_loan(&book, &member, date(2026, 3, 15))
            .unwrap();

        assert!(store.delete_loan(&loan.id).unwrap());
        assert!(!store.delete_loan(&loan.id).unwrap());
    }

    #[test]
    fn test_list_limit() {
        let (store, _clock, book, member) = setup(3);
        for _ in 0..3 {
            store
                .create_loan(&book, &member, date(2026, 3, 15))
                .unwrap();
        }
        let loans = store
            .list_loans(&LoanFilter::new().member(member).limit(2))
            .unwrap();
        assert_eq!(loans.len(), 2);
    }
}
