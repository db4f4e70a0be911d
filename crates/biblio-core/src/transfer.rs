//! Bulk import and export of the catalog as JSON.
//!
//! The format is a flat array of book records. Optional fields are omitted
//! when absent. Imports are all-or-nothing: one bad record rejects the batch
//! and nothing is written.

use jsonschema::Validator;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LibraryError, Result};
use crate::storage::traits::CatalogStore;
use crate::storage::types::{Book, NewBook};

const BOOK_SCHEMA: &str = include_str!("../schemas/books.schema.json");

static BOOK_VALIDATOR: OnceCell<Validator> = OnceCell::new();

fn book_validator() -> Result<&'static Validator> {
    BOOK_VALIDATOR.get_or_try_init(|| {
        let schema: Value = serde_json::from_str(BOOK_SCHEMA)?;
        jsonschema::validator_for(&schema)
            .map_err(|e| LibraryError::Storage(format!("Invalid book import schema: {}", e)))
    })
}

/// One book in the transfer format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copies: Option<u32>,
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            publisher: book.publisher.clone(),
            year: book.year,
            category: book.category.clone(),
            copies: Some(book.total_copies),
        }
    }
}

impl From<BookRecord> for NewBook {
    fn from(record: BookRecord) -> Self {
        NewBook {
            title: record.title,
            author: record.author,
            publisher: record.publisher,
            year: record.year,
            category: record.category,
            total_copies: record.copies.unwrap_or(0),
        }
    }
}

/// Serialize the whole catalog as a pretty-printed JSON array.
pub fn export_books<S: CatalogStore + ?Sized>(store: &S) -> Result<String> {
    let records: Vec<BookRecord> = store.list_books()?.iter().map(BookRecord::from).collect();
    tracing::info!(count = records.len(), "exported books");
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Name a schema violation by record index and field, e.g. `/1/year`.
fn describe_violation(path: &str, message: &str) -> String {
    let mut segments = path.trim_start_matches('/').splitn(2, '/');
    match (segments.next().filter(|s| !s.is_empty()), segments.next()) {
        (Some(index), Some(field)) => format!("record {}, '{}': {}", index, field, message),
        (Some(index), None) => format!("record {}: {}", index, message),
        _ => format!("import must be a JSON array of book records: {}", message),
    }
}

/// Check an import document against the book schema and convert it to
/// records.
///
/// Every violation in the batch is collected; the error lists them all.
pub fn validate_batch(document: &Value) -> Result<Vec<BookRecord>> {
    let problems: Vec<String> = book_validator()?
        .iter_errors(document)
        .map(|e| describe_violation(&e.instance_path.to_string(), &e.to_string()))
        .collect();
    if !problems.is_empty() {
        tracing::warn!(violations = problems.len(), "rejected book import");
        return Err(LibraryError::Validation(problems.join("; ")));
    }

    Ok(serde_json::from_value(document.clone())?)
}

/// Parse, validate and insert a batch of books in one transaction.
///
/// Returns the number of books imported.
pub fn import_books<S: CatalogStore + ?Sized>(store: &S, json: &str) -> Result<usize> {
    let document: Value = serde_json::from_str(json)?;
    let records = validate_batch(&document)?;
    let books: Vec<NewBook> = records.into_iter().map(NewBook::from).collect();

    let stored = store.insert_books(&books)?;
    tracing::info!(count = stored.len(), "imported books");
    Ok(stored.len())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::book::{MAX_YEAR, MIN_YEAR};
    use crate::storage::SqliteStore;

    #[test]
    fn test_export_omits_absent_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_book(&NewBook::new("Dune", "Frank Herbert", 2).with_year(1965))
            .unwrap();

        let exported: Value = serde_json::from_str(&export_books(&store).unwrap()).unwrap();
        let record = exported[0].as_object().unwrap();

        assert_eq!(record["title"], "Dune");
        assert_eq!(record["year"], 1965);
        assert_eq!(record["copies"], 2);
        assert!(!record.contains_key("publisher"));
        assert!(!record.contains_key("category"));
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let doc = json!([
            {"title": "Ok", "author": "A"},
            {"title": "", "author": "B", "year": 1800},
            {"title": "C", "author": "C", "copies": -1, "isbn": "x"},
            "not an object"
        ]);

        let err = validate_batch(&doc).unwrap_err().to_string();

        assert!(err.contains("record 1, 'title'"));
        assert!(err.contains("record 1, 'year'"));
        assert!(err.contains("record 2, 'copies'"));
        assert!(err.contains("record 2:") && err.contains("isbn"));
        assert!(err.contains("record 3:"));
        assert!(!err.contains("record 0"));
    }

    #[test]
    fn test_import_rejects_whole_batch() {
        let store = SqliteStore::open_in_memory().unwrap();
        let json = r#"[
            {"title": "Good", "author": "A", "copies": 1},
            {"title": "Bad", "author": "B", "year": 3000}
        ]"#;

        assert!(matches!(
            import_books(&store, json),
            Err(LibraryError::Validation(_))
        ));
        assert!(store.list_books().unwrap().is_empty());
    }

    #[test]
    fn test_import_defaults_copies_to_zero() {
        let store = SqliteStore::open_in_memory().unwrap();
        let json = r#"[{"title": "Ghost", "author": "Nobody"}]"#;

        assert_eq!(import_books(&store, json).unwrap(), 1);
        assert_eq!(store.list_books().unwrap()[0].total_copies, 0);
    }

    #[test]
    fn test_blank_title_and_missing_author_rejected() {
        let err = validate_batch(&json!([{"title": "   "}])).unwrap_err().to_string();

        assert!(err.contains("record 0, 'title'"));
        assert!(err.contains("record 0:") && err.contains("author"));
    }

    #[test]
    fn test_schema_year_bounds_match_catalog_rules() {
        let schema: Value = serde_json::from_str(BOOK_SCHEMA).unwrap();
        let year = &schema["items"]["properties"]["year"];

        assert_eq!(year["minimum"], MIN_YEAR);
        assert_eq!(year["maximum"], MAX_YEAR);
    }

    #[test]
    fn test_describe_violation_paths() {
        assert_eq!(
            describe_violation("/4/year", "3000 is too big"),
            "record 4, 'year': 3000 is too big"
        );
        assert_eq!(describe_violation("/2", "bad"), "record 2: bad");
        assert!(describe_violation("", "not an array").starts_with("import must be"));
    }

    #[test]
    fn test_top_level_must_be_array() {
        assert!(validate_batch(&json!({"title": "x"})).is_err());
        assert!(validate_batch(&json!([])).unwrap().is_empty());
    }
}
