//! Store trait definitions.
//!
//! Each component of the lending engine is a trait so the engine can be
//! exercised against any record store. All methods take `&self`: stores are
//! shared between threads and serialize writes internally.

use chrono::NaiveDate;
use uuid::Uuid;

use super::types::{
    Book, BookUpdate, Loan, LoanFilter, LoanState, Member, MemberUpdate, NewBook, NewMember,
};
use crate::error::Result;

/// Book records.
///
/// Books are removed only through [`DeletionGuard::delete_book_cascade`].
pub trait CatalogStore: Send + Sync {
    /// Insert a new book.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Validation` if:
    /// - Title or author is blank
    /// - Year is outside [1900, 2026]
    fn insert_book(&self, book: &NewBook) -> Result<Book>;

    /// Insert a batch of books atomically: either every book is stored or none.
    fn insert_books(&self, books: &[NewBook]) -> Result<Vec<Book>>;

    /// Update an existing book.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::BookNotFound` if the id does not resolve, or
    /// `LibraryError::Validation` if the updated record is invalid.
    fn update_book(&self, id: &Uuid, update: &BookUpdate) -> Result<Book>;

    /// Get a book by ID.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(book))` if found, `Ok(None)` if not found.
    fn get_book(&self, id: &Uuid) -> Result<Option<Book>>;

    /// List all books ordered by title.
    fn list_books(&self) -> Result<Vec<Book>>;

    /// Books whose title contains `text`, ignoring case.
    fn search_books_by_title(&self, text: &str) -> Result<Vec<Book>>;

    /// Books whose author contains `text`, ignoring case.
    fn list_books_by_author(&self, text: &str) -> Result<Vec<Book>>;

    /// Books in exactly this category.
    fn list_books_by_category(&self, category: &str) -> Result<Vec<Book>>;
}

/// Member records.
pub trait MemberStore: Send + Sync {
    /// Insert a new member.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::DuplicateEmail` if the email is taken.
    fn insert_member(&self, member: &NewMember) -> Result<Member>;

    /// Update an existing member.
    fn update_member(&self, id: &Uuid, update: &MemberUpdate) -> Result<Member>;

    fn get_member(&self, id: &Uuid) -> Result<Option<Member>>;

    /// Look up a member by email (normalized before comparison).
    fn get_member_by_email(&self, email: &str) -> Result<Option<Member>>;

    fn member_exists_by_email(&self, email: &str) -> Result<bool>;

    /// List all members ordered by name.
    fn list_members(&self) -> Result<Vec<Member>>;
}

/// Loan records and their lifecycle.
///
/// Every read path refreshes overdue state before returning, see
/// [`crate::loan::compute_state`].
pub trait LoanLedger: Send + Sync {
    /// Lend one copy of a book to a member, starting today.
    ///
    /// The availability check and the insert run in one write transaction.
    ///
    /// # Errors
    ///
    /// - `LibraryError::BookNotFound` / `LibraryError::MemberNotFound`
    /// - `LibraryError::Validation` if `due_date` is before today
    /// - `LibraryError::NoCopiesAvailable` if every copy is out
    fn create_loan(&self, book_id: &Uuid, member_id: &Uuid, due_date: NaiveDate) -> Result<Loan>;

    /// Mark a loan as returned.
    ///
    /// Idempotent: returning a loan that is already RETURNED leaves it as is.
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the loan does not exist.
    fn return_loan(&self, id: &Uuid) -> Result<Option<Loan>>;

    /// Bring a loan's stored state up to date with today and persist it.
    fn refresh_overdue(&self, loan: Loan) -> Result<Loan>;

    /// Get a loan by ID.
    fn get_loan(&self, id: &Uuid) -> Result<Option<Loan>>;

    /// List loans matching the filter, newest start date first.
    fn list_loans(&self, filter: &LoanFilter) -> Result<Vec<Loan>>;

    /// Active and overdue loans, soonest due first.
    fn open_loans(&self, member_id: Option<&Uuid>) -> Result<Vec<Loan>>;

    /// Returned loans, latest due date first.
    fn returned_loans(&self, member_id: Option<&Uuid>) -> Result<Vec<Loan>>;

    /// Hard-delete a loan regardless of state.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was removed.
    fn delete_loan(&self, id: &Uuid) -> Result<bool>;

    /// Delete a loan only if it has been returned.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::LoanStillOpen` for active or overdue loans and
    /// `LibraryError::LoanNotFound` if the id does not resolve.
    fn delete_returned_loan(&self, id: &Uuid) -> Result<()>;

    /// Convenience: loans on one book in one state.
    fn loans_for_book_in_state(&self, book_id: &Uuid, state: LoanState) -> Result<Vec<Loan>> {
        self.list_loans(&LoanFilter::new().book(*book_id).state(state))
    }
}

/// Copy availability, computed fresh from loan rows on every call.
pub trait Availability: Send + Sync {
    /// `total_copies` minus open (active or overdue) loans, never below zero.
    ///
    /// Returns 0 for an unknown book.
    fn available_copies(&self, book_id: &Uuid) -> Result<u32>;

    fn has_available_copies(&self, book: &Book) -> Result<bool> {
        Ok(self.available_copies(&book.id)? > 0)
    }

    /// Every book with at least one copy on the shelf.
    fn list_available_books(&self) -> Result<Vec<Book>>;

    /// Title search limited to books with a copy on the shelf.
    fn search_available_books(&self, title: &str) -> Result<Vec<Book>>;
}

/// Removal of books and members without orphaning open loans.
pub trait DeletionGuard: Send + Sync {
    /// True when no loan on the book is active or overdue.
    fn can_delete_book(&self, book_id: &Uuid) -> Result<bool>;

    /// Delete the book together with its returned loans.
    ///
    /// # Returns
    ///
    /// Returns `false`, changing nothing, if the book has open loans or does
    /// not exist.
    fn delete_book_cascade(&self, book_id: &Uuid) -> Result<bool>;

    /// True when the member exists and has no active or overdue loan.
    fn can_delete_member(&self, member_id: &Uuid) -> Result<bool>;

    /// Delete the member together with their returned loans.
    fn delete_member_cascade(&self, member_id: &Uuid) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traits_are_object_safe() {
        fn _catalog(_: &dyn CatalogStore) {}
        fn _members(_: &dyn MemberStore) {}
        fn _ledger(_: &dyn LoanLedger) {}
        fn _availability(_: &dyn Availability) {}
        fn _guard(_: &dyn DeletionGuard) {}
    }
}
