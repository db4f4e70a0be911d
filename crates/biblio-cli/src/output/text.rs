//! Table rows for books, members and loans.

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use biblio_core::storage::{Book, CatalogStore, Loan, Member, MemberStore};

use crate::ui::theme::{loan_state_style, styled};
use crate::ui::{copies, due_in, or_dash, short_id, truncate, Column, UiContext};

pub const BOOK_COLUMNS: [Column; 6] = [
    Column::new("ID"),
    Column::new("Title"),
    Column::new("Author"),
    Column::new("Year"),
    Column::new("Category"),
    Column::new("Avail"),
];

pub const MEMBER_COLUMNS: [Column; 4] = [
    Column::new("ID"),
    Column::new("Name"),
    Column::new("Email"),
    Column::new("Role"),
];

pub const LOAN_COLUMNS: [Column; 6] = [
    Column::new("ID"),
    Column::new("Book"),
    Column::new("Member"),
    Column::new("Due"),
    Column::new("State"),
    Column::new("When"),
];

/// Book titles and member emails for labelling loan rows.
#[derive(Debug, Default)]
pub struct LookupNames {
    books: HashMap<Uuid, String>,
    members: HashMap<Uuid, String>,
}

impl LookupNames {
    /// Resolve the names referenced by `loans`.
    pub fn for_loans<S>(store: &S, loans: &[Loan]) -> anyhow::Result<Self>
    where
        S: CatalogStore + MemberStore + ?Sized,
    {
        let mut names = Self::default();
        for loan in loans {
            if !names.books.contains_key(&loan.book_id) {
                if let Some(book) = store.get_book(&loan.book_id)? {
                    names.books.insert(book.id, book.title);
                }
            }
            if !names.members.contains_key(&loan.member_id) {
                if let Some(member) = store.get_member(&loan.member_id)? {
                    names.members.insert(member.id, member.email);
                }
            }
        }
        Ok(names)
    }

    pub fn book_title(&self, id: &Uuid) -> Option<&str> {
        self.books.get(id).map(String::as_str)
    }

    pub fn member_email(&self, id: &Uuid) -> Option<&str> {
        self.members.get(id).map(String::as_str)
    }
}

/// Plain mode shows full ids so rows can be fed back into commands.
fn id_cell(ctx: &UiContext, id: &Uuid) -> String {
    if ctx.mode.is_pretty() {
        short_id(id)
    } else {
        id.to_string()
    }
}

pub fn book_row(ctx: &UiContext, book: &Book, available: u32) -> Vec<String> {
    vec![
        id_cell(ctx, &book.id),
        truncate(&book.title, 40),
        truncate(&book.author, 28),
        book.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
        or_dash(book.category.as_deref()),
        copies(available, book.total_copies),
    ]
}

pub fn member_row(ctx: &UiContext, member: &Member) -> Vec<String> {
    vec![
        id_cell(ctx, &member.id),
        truncate(&member.name, 32),
        member.email.clone(),
        member.role.to_string(),
    ]
}

pub fn loan_row(ctx: &UiContext, loan: &Loan, names: &LookupNames, today: NaiveDate) -> Vec<String> {
    let book = match names.book_title(&loan.book_id) {
        Some(title) if ctx.mode.is_pretty() => truncate(title, 32),
        _ => id_cell(ctx, &loan.book_id),
    };
    let member = match names.member_email(&loan.member_id) {
        Some(email) if ctx.mode.is_pretty() => email.to_string(),
        _ => id_cell(ctx, &loan.member_id),
    };
    let when = if loan.state.is_open() {
        due_in(loan.due_date, today)
    } else {
        "-".to_string()
    };
    vec![
        id_cell(ctx, &loan.id),
        book,
        member,
        loan.due_date.to_string(),
        styled(loan.state.as_str(), loan_state_style(loan.state), ctx.color),
        when,
    ]
}
