//! Book field validation and normalization.

use crate::error::{LibraryError, Result};
use crate::storage::types::{Book, NewBook};

/// Earliest accepted publication year.
pub const MIN_YEAR: i32 = 1900;

/// Latest accepted publication year.
pub const MAX_YEAR: i32 = 2026;

/// Maximum bytes for a title, author, publisher or category.
pub const MAX_FIELD_BYTES: usize = 512;

/// Check a publication year against [`MIN_YEAR`, `MAX_YEAR`].
pub fn validate_year(year: Option<i32>) -> Result<()> {
    match year {
        Some(y) if !(MIN_YEAR..=MAX_YEAR).contains(&y) => Err(LibraryError::Validation(format!(
            "Year {} out of range ({}-{})",
            y, MIN_YEAR, MAX_YEAR
        ))),
        _ => Ok(()),
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::Validation(format!("{} is required", field)));
    }
    if trimmed.len() > MAX_FIELD_BYTES {
        return Err(LibraryError::Validation(format!(
            "{} too long (max {} bytes)",
            field, MAX_FIELD_BYTES
        )));
    }
    Ok(trimmed.to_string())
}

fn optional(field: &str, value: Option<&str>) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.len() > MAX_FIELD_BYTES => Err(LibraryError::Validation(format!(
            "{} too long (max {} bytes)",
            field, MAX_FIELD_BYTES
        ))),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Validate a new book and return it with fields trimmed.
///
/// Blank optional fields are stored as absent.
pub fn normalize_new_book(book: &NewBook) -> Result<NewBook> {
    validate_year(book.year)?;
    Ok(NewBook {
        title: required("Title", &book.title)?,
        author: required("Author", &book.author)?,
        publisher: optional("Publisher", book.publisher.as_deref())?,
        year: book.year,
        category: optional("Category", book.category.as_deref())?,
        total_copies: book.total_copies,
    })
}

/// Validate a full book record (after an update has been applied).
pub fn normalize_book(book: &Book) -> Result<Book> {
    let normalized = normalize_new_book(&NewBook {
        title: book.title.clone(),
        author: book.author.clone(),
        publisher: book.publisher.clone(),
        year: book.year,
        category: book.category.clone(),
        total_copies: book.total_copies,
    })?;
    Ok(Book {
        id: book.id,
        title: normalized.title,
        author: normalized.author,
        publisher: normalized.publisher,
        year: normalized.year,
        category: normalized.category,
        total_copies: normalized.total_copies,
    })
}
