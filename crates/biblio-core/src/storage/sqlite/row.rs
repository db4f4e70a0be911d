//! Raw row types for database queries.

use chrono::NaiveDate;
use rusqlite::Row;
use uuid::Uuid;

use crate::error::{LibraryError, Result};
use crate::storage::types::{Book, Loan, LoanState, Member, Role};

pub const BOOK_COLUMNS: &str =
    "b.id, b.title, b.author, b.publisher, b.year, b.category, b.total_copies";

pub const MEMBER_COLUMNS: &str = "m.id, m.name, m.email, m.credential_hash, m.role";

pub const LOAN_COLUMNS: &str =
    "l.id, l.book_id, l.member_id, l.start_date, l.due_date, l.state";

/// Date format for `start_date` / `due_date` columns. ISO order sorts lexically.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| LibraryError::Storage(format!("Invalid {} UUID: {}", what, e)))
}

fn parse_date(value: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| LibraryError::Storage(format!("Invalid {}: {}", what, e)))
}

/// Raw row data from the books table, before parsing into domain types.
#[derive(Debug)]
pub struct BookRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub total_copies: i64,
}

impl BookRow {
    /// Read a row selected with [`BOOK_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            publisher: row.get(3)?,
            year: row.get(4)?,
            category: row.get(5)?,
            total_copies: row.get(6)?,
        })
    }
}

impl TryFrom<BookRow> for Book {
    type Error = LibraryError;

    fn try_from(row: BookRow) -> Result<Self> {
        let id = parse_uuid(&row.id, "book")?;
        let total_copies = u32::try_from(row.total_copies).map_err(|_| {
            LibraryError::Storage(format!("Invalid total_copies: {}", row.total_copies))
        })?;

        Ok(Book {
            id,
            title: row.title,
            author: row.author,
            publisher: row.publisher,
            year: row.year,
            category: row.category,
            total_copies,
        })
    }
}

/// Raw row data from the members table.
#[derive(Debug)]
pub struct MemberRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub credential_hash: String,
    pub role: String,
}

impl MemberRow {
    /// Read a row selected with [`MEMBER_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            credential_hash: row.get(3)?,
            role: row.get(4)?,
        })
    }
}

impl TryFrom<MemberRow> for Member {
    type Error = LibraryError;

    fn try_from(row: MemberRow) -> Result<Self> {
        let id = parse_uuid(&row.id, "member")?;
        let role: Role = row
            .role
            .parse()
            .map_err(|_| LibraryError::Storage(format!("Invalid role: {}", row.role)))?;

        Ok(Member {
            id,
            name: row.name,
            email: row.email,
            credential_hash: row.credential_hash,
            role,
        })
    }
}

/// Raw row data from the loans table.
#[derive(Debug)]
pub struct LoanRow {
    pub id: String,
    pub book_id: String,
    pub member_id: String,
    pub start_date: String,
    pub due_date: String,
    pub state: String,
}

impl LoanRow {
    /// Read a row selected with [`LOAN_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            book_id: row.get(1)?,
            member_id: row.get(2)?,
            start_date: row.get(3)?,
            due_date: row.get(4)?,
            state: row.get(5)?,
        })
    }
}

impl TryFrom<LoanRow> for Loan {
    type Error = LibraryError;

    fn try_from(row: LoanRow) -> Result<Self> {
        let state: LoanState = row
            .state
            .parse()
            .map_err(|_| LibraryError::Storage(format!("Invalid loan state: {}", row.state)))?;

        Ok(Loan {
            id: parse_uuid(&row.id, "loan")?,
            book_id: parse_uuid(&row.book_id, "book_id")?,
            member_id: parse_uuid(&row.member_id, "member_id")?,
            start_date: parse_date(&row.start_date, "start_date")?,
            due_date: parse_date(&row.due_date, "due_date")?,
            state,
        })
    }
}
