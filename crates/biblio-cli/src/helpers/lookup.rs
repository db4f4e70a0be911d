//! Resolve command arguments to stored records.

use biblio_core::storage::{Book, CatalogStore, Loan, LoanLedger, Member, MemberStore};
use biblio_core::LibraryError;

use super::parsing::parse_id;
use crate::errors::CliError;

/// Look up a book by id.
pub fn require_book<S: CatalogStore + ?Sized>(store: &S, value: &str) -> anyhow::Result<Book> {
    let id = parse_id("book", value)?;
    Ok(store.get_book(&id)?.ok_or(LibraryError::BookNotFound(id))?)
}

/// Look up a member by id or email.
pub fn require_member<S: MemberStore + ?Sized>(store: &S, value: &str) -> anyhow::Result<Member> {
    if value.contains('@') {
        return store.get_member_by_email(value)?.ok_or_else(|| {
            CliError::not_found(
                format!("No member with email {}", value.trim()),
                "Run:\n  biblio member list",
            )
            .into()
        });
    }
    let id = parse_id("member", value)?;
    Ok(store.get_member(&id)?.ok_or(LibraryError::MemberNotFound(id))?)
}

/// Look up a loan by id.
pub fn require_loan<S: LoanLedger + ?Sized>(store: &S, value: &str) -> anyhow::Result<Loan> {
    let id = parse_id("loan", value)?;
    Ok(store.get_loan(&id)?.ok_or(LibraryError::LoanNotFound(id))?)
}
