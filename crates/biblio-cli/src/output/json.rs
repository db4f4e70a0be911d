//! JSON output for books, members and loans.

use serde::Serialize;

use biblio_core::storage::{Book, Loan, Member};

use super::text::LookupNames;

/// Book with its current availability.
pub fn book_json(book: &Book, available: u32) -> serde_json::Value {
    serde_json::json!({
        "id": book.id,
        "title": book.title,
        "author": book.author,
        "publisher": book.publisher,
        "year": book.year,
        "category": book.category,
        "total_copies": book.total_copies,
        "available_copies": available,
    })
}

/// Member without the credential hash.
pub fn member_json(member: &Member) -> serde_json::Value {
    serde_json::json!({
        "id": member.id,
        "name": member.name,
        "email": member.email,
        "role": member.role,
    })
}

/// Loan with the book title and member email resolved where known.
pub fn loan_json(loan: &Loan, names: &LookupNames) -> serde_json::Value {
    serde_json::json!({
        "id": loan.id,
        "book_id": loan.book_id,
        "book_title": names.book_title(&loan.book_id),
        "member_id": loan.member_id,
        "member_email": names.member_email(&loan.member_id),
        "start_date": loan.start_date,
        "due_date": loan.due_date,
        "state": loan.state,
    })
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
