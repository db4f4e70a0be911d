//! Error types for Biblio core operations.
//!
//! Domain refusals (no copies left, deletion blocked, duplicate email) are
//! ordinary variants here; callers decide how to present them. Only storage
//! faults are meant to abort a request.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for Biblio operations.
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Core error type for Biblio operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Library database file not found
    #[error("Library database not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    /// Book id does not resolve
    #[error("Book not found: {0}")]
    BookNotFound(Uuid),

    /// Member id does not resolve
    #[error("Member not found: {0}")]
    MemberNotFound(Uuid),

    /// Loan id does not resolve
    #[error("Loan not found: {0}")]
    LoanNotFound(Uuid),

    /// Every copy of the book is out on an open loan
    #[error("No copies available for book {book_id}")]
    NoCopiesAvailable { book_id: Uuid },

    /// Entity still has active or overdue loans
    #[error("Cannot delete {what} {id}: it has active or overdue loans")]
    DeletionBlocked { what: &'static str, id: Uuid },

    /// Loan has not been returned yet
    #[error("Cannot delete loan {0}: it has not been returned")]
    LoanStillOpen(Uuid),

    /// Email already registered to another member
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// Acting member lacks the role for this operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credential hashing or verification error
    #[error("Credential error: {0}")]
    Credential(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl LibraryError {
    /// Whether this is an expected domain outcome rather than a fault.
    ///
    /// Refusals leave the store untouched and should be shown to the user,
    /// not retried.
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            LibraryError::NoCopiesAvailable { .. }
                | LibraryError::DeletionBlocked { .. }
                | LibraryError::LoanStillOpen(_)
                | LibraryError::DuplicateEmail(_)
                | LibraryError::PermissionDenied(_)
        )
    }

    /// Whether this error reports an id that does not resolve.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LibraryError::BookNotFound(_)
                | LibraryError::MemberNotFound(_)
                | LibraryError::LoanNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusals_are_classified() {
        let id = Uuid::new_v4();
        assert!(LibraryError::NoCopiesAvailable { book_id: id }.is_refusal());
        assert!(LibraryError::DeletionBlocked { what: "book", id }.is_refusal());
        assert!(LibraryError::DuplicateEmail("a@b.c".into()).is_refusal());
        assert!(!LibraryError::Storage("disk".into()).is_refusal());
        assert!(!LibraryError::Validation("year".into()).is_refusal());
    }

    #[test]
    fn test_not_found_is_classified() {
        let id = Uuid::new_v4();
        assert!(LibraryError::LoanNotFound(id).is_not_found());
        assert!(!LibraryError::LoanStillOpen(id).is_not_found());
    }

    #[test]
    fn test_deletion_blocked_message() {
        let id = Uuid::nil();
        let err = LibraryError::DeletionBlocked { what: "member", id };
        assert_eq!(
            err.to_string(),
            format!("Cannot delete member {}: it has active or overdue loans", id)
        );
    }
}
