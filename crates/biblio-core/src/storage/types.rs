//! Core data types for the storage layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LibraryError;

/// Metadata for a library database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryMetadata {
    /// Format version (e.g., "0.1")
    pub format_version: String,

    /// When this database was created
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp (informational)
    pub last_modified: DateTime<Utc>,
}

/// A catalogued title and how many physical copies the library owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier for this book
    pub id: Uuid,

    pub title: String,

    pub author: String,

    pub publisher: Option<String>,

    /// Publication year, within [1900, 2026] when present
    pub year: Option<i32>,

    pub category: Option<String>,

    /// Copies owned; the ceiling for open loans on this book
    pub total_copies: u32,
}

/// Builder for creating new books.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub total_copies: u32,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>, total_copies: u32) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            total_copies,
            ..Self::default()
        }
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Partial update for a book. `None` leaves a field unchanged.
///
/// Optional fields use a nested option so they can be cleared:
/// `Some(None)` removes the value.
#[derive(Debug, Clone, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<Option<String>>,
    pub year: Option<Option<i32>>,
    pub category: Option<Option<String>>,
    pub total_copies: Option<u32>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publisher.is_none()
            && self.year.is_none()
            && self.category.is_none()
            && self.total_copies.is_none()
    }

    /// Apply this update on top of an existing book.
    pub fn apply(&self, book: &Book) -> Book {
        Book {
            id: book.id,
            title: self.title.clone().unwrap_or_else(|| book.title.clone()),
            author: self.author.clone().unwrap_or_else(|| book.author.clone()),
            publisher: self
                .publisher
                .clone()
                .unwrap_or_else(|| book.publisher.clone()),
            year: self.year.unwrap_or(book.year),
            category: self
                .category
                .clone()
                .unwrap_or_else(|| book.category.clone()),
            total_copies: self.total_copies.unwrap_or(book.total_copies),
        }
    }
}

/// Member role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(LibraryError::Validation(format!(
                "Unknown role: {} (expected admin or user)",
                other
            ))),
        }
    }
}

/// A registered library member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,

    pub name: String,

    /// Normalized (trimmed, lowercase) email, unique across members
    pub email: String,

    /// Argon2 PHC string; never the plaintext secret
    #[serde(skip_serializing, default)]
    pub credential_hash: String,

    pub role: Role,
}

/// Builder for creating new members.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub credential_hash: String,
    pub role: Role,
}

/// Partial update for a member. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub credential_hash: Option<String>,
}

/// Loan lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanState {
    /// Book is out and not yet due
    Active,
    /// Book is out past its due date; still occupies a copy
    Overdue,
    /// Book is back; terminal
    Returned,
}

impl LoanState {
    pub const ALL: [LoanState; 3] = [LoanState::Active, LoanState::Overdue, LoanState::Returned];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanState::Active => "active",
            LoanState::Overdue => "overdue",
            LoanState::Returned => "returned",
        }
    }

    /// Whether the loan still holds a copy-slot.
    pub fn is_open(&self) -> bool {
        matches!(self, LoanState::Active | LoanState::Overdue)
    }
}

impl fmt::Display for LoanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanState {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(LoanState::Active),
            "overdue" => Ok(LoanState::Overdue),
            "returned" => Ok(LoanState::Returned),
            other => Err(LibraryError::Validation(format!(
                "Unknown loan state: {} (expected active, overdue or returned)",
                other
            ))),
        }
    }
}

/// One book copy-slot lent to one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub state: LoanState,
}

/// Filter for querying loans. Every set field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub member_id: Option<Uuid>,
    pub book_id: Option<Uuid>,
    pub state: Option<LoanState>,
    pub limit: Option<usize>,
}

impl LoanFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member(mut self, id: Uuid) -> Self {
        self.member_id = Some(id);
        self
    }

    pub fn book(mut self, id: Uuid) -> Self {
        self.book_id = Some(id);
        self
    }

    pub fn state(mut self, state: LoanState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_builder() {
        let book = NewBook::new("Dune", "Frank Herbert", 3)
            .with_publisher("Chilton")
            .with_year(1965)
            .with_category("sci-fi");

        assert_eq!(book.title, "Dune");
        assert_eq!(book.total_copies, 3);
        assert_eq!(book.publisher.as_deref(), Some("Chilton"));
        assert_eq!(book.year, Some(1965));
        assert_eq!(book.category.as_deref(), Some("sci-fi"));
    }

    #[test]
    fn test_book_update_can_clear_optional_fields() {
        let book = Book {
            id: Uuid::new_v4(),
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            publisher: Some("Chilton".into()),
            year: Some(1965),
            category: None,
            total_copies: 2,
        };
        let update = BookUpdate {
            publisher: Some(None),
            total_copies: Some(4),
            ..BookUpdate::default()
        };

        let updated = update.apply(&book);

        assert_eq!(updated.publisher, None);
        assert_eq!(updated.year, Some(1965));
        assert_eq!(updated.total_copies, 4);
        assert_eq!(updated.title, "Dune");
    }

    #[test]
    fn test_loan_state_parse_and_open() {
        assert_eq!("OVERDUE".parse::<LoanState>().unwrap(), LoanState::Overdue);
        assert!("lost".parse::<LoanState>().is_err());
        assert!(LoanState::Active.is_open());
        assert!(LoanState::Overdue.is_open());
        assert!(!LoanState::Returned.is_open());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("librarian".parse::<Role>().is_err());
    }

    #[test]
    fn test_member_serialization_hides_credential() {
        let member = Member {
            id: Uuid::nil(),
            name: "Ada".into(),
            email: "ada@example.org".into(),
            credential_hash: "$argon2id$secret".into(),
            role: Role::User,
        };

        let json = serde_json::to_value(&member).unwrap();

        assert!(json.get("credential_hash").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_loan_filter_builder() {
        let book = Uuid::new_v4();
        let filter = LoanFilter::new()
            .book(book)
            .state(LoanState::Returned)
            .limit(5);

        assert_eq!(filter.book_id, Some(book));
        assert_eq!(filter.state, Some(LoanState::Returned));
        assert_eq!(filter.member_id, None);
        assert_eq!(filter.limit, Some(5));
    }
}
