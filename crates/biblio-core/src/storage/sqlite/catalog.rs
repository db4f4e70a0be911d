use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Params, TransactionBehavior};
use uuid::Uuid;

use super::row::{BookRow, BOOK_COLUMNS};
use super::{ledger, touch, SqliteStore};
use crate::book::{normalize_book, normalize_new_book};
use crate::error::{LibraryError, Result};
use crate::storage::traits::CatalogStore;
use crate::storage::types::{Book, BookUpdate, NewBook};

pub(super) fn fetch_book(conn: &Connection, id: &Uuid) -> Result<Option<Book>> {
    let sql = format!("SELECT {} FROM books b WHERE b.id = ?", BOOK_COLUMNS);
    let row = conn
        .query_row(&sql, [id.to_string()], BookRow::from_row)
        .optional()?;
    row.map(Book::try_from).transpose()
}

pub(super) fn query_books<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Book>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, BookRow::from_row)?;

    let mut books = Vec::new();
    for row in rows {
        books.push(row?.try_into()?);
    }
    Ok(books)
}

fn insert_row(conn: &Connection, book: &NewBook) -> Result<Book> {
    let id = Uuid::new_v4();
    conn.execute(
        r#"
        INSERT INTO books (id, title, author, publisher, year, category, total_copies, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        (
            id.to_string(),
            &book.title,
            &book.author,
            &book.publisher,
            book.year,
            &book.category,
            i64::from(book.total_copies),
            Utc::now().to_rfc3339(),
        ),
    )?;

    Ok(Book {
        id,
        title: book.title.clone(),
        author: book.author.clone(),
        publisher: book.publisher.clone(),
        year: book.year,
        category: book.category.clone(),
        total_copies: book.total_copies,
    })
}

impl CatalogStore for SqliteStore {
    fn insert_book(&self, book: &NewBook) -> Result<Book> {
        let book = normalize_new_book(book)?;
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stored = insert_row(&tx, &book)?;
        touch(&tx)?;
        tx.commit()?;

        tracing::info!(book_id = %stored.id, copies = stored.total_copies, "book added");
        Ok(stored)
    }

    fn insert_books(&self, books: &[NewBook]) -> Result<Vec<Book>> {
        let mut normalized = Vec::with_capacity(books.len());
        for (index, book) in books.iter().enumerate() {
            let book = normalize_new_book(book).map_err(|e| match e {
                LibraryError::Validation(msg) => {
                    LibraryError::Validation(format!("record {}: {}", index, msg))
                }
                other => other,
            })?;
            normalized.push(book);
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut stored = Vec::with_capacity(normalized.len());
        for book in &normalized {
            stored.push(insert_row(&tx, book)?);
        }
        touch(&tx)?;
        tx.commit()?;

        tracing::info!(count = stored.len(), "books added in batch");
        Ok(stored)
    }

    fn update_book(&self, id: &Uuid, update: &BookUpdate) -> Result<Book> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = fetch_book(&tx, id)?.ok_or(LibraryError::BookNotFound(*id))?;
        if update.is_empty() {
            return Ok(existing);
        }
        let updated = normalize_book(&update.apply(&existing))?;

        if updated.total_copies < existing.total_copies {
            let open = ledger::open_count_for_book(&tx, id)?;
            if u64::from(updated.total_copies) < open {
                return Err(LibraryError::Validation(format!(
                    "Cannot reduce copies to {}: {} loan(s) are still open",
                    updated.total_copies, open
                )));
            }
        }

        tx.execute(
            r#"
            UPDATE books
            SET title = ?, author = ?, publisher = ?, year = ?, category = ?, total_copies = ?
            WHERE id = ?
            "#,
            (
                &updated.title,
                &updated.author,
                &updated.publisher,
                updated.year,
                &updated.category,
                i64::from(updated.total_copies),
                id.to_string(),
            ),
        )?;
        touch(&tx)?;
        tx.commit()?;

        tracing::info!(book_id = %id, "book updated");
        Ok(updated)
    }

    fn get_book(&self, id: &Uuid) -> Result<Option<Book>> {
        let conn = self.lock_conn()?;
        fetch_book(&conn, id)
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM books b ORDER BY b.title COLLATE NOCASE, b.id",
            BOOK_COLUMNS
        );
        query_books(&conn, &sql, [])
    }

    fn search_books_by_title(&self, text: &str) -> Result<Vec<Book>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM books b WHERE instr(fold_case(b.title), fold_case(?)) > 0 \
             ORDER BY b.title COLLATE NOCASE, b.id",
            BOOK_COLUMNS
        );
        query_books(&conn, &sql, [text.trim()])
    }

    fn list_books_by_author(&self, text: &str) -> Result<Vec<Book>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM books b WHERE instr(fold_case(b.author), fold_case(?)) > 0 \
             ORDER BY b.title COLLATE NOCASE, b.id",
            BOOK_COLUMNS
        );
        query_books(&conn, &sql, [text.trim()])
    }

    fn list_books_by_category(&self, category: &str) -> Result<Vec<Book>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM books b WHERE b.category = ? ORDER BY b.title COLLATE NOCASE, b.id",
            BOOK_COLUMNS
        );
        query_books(&conn, &sql, [category.trim()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get_book() {
        let store = store();
        let book = store
            .insert_book(&NewBook::new("  Dune ", "Frank Herbert", 2).with_year(1965))
            .unwrap();

        assert_eq!(book.title, "Dune");
        let fetched = store.get_book(&book.id).unwrap().unwrap();
        assert_eq!(fetched, book);
    }

    #[test]
    fn test_insert_rejects_bad_year() {
        let store = store();
        let err = store
            .insert_book(&NewBook::new("Old", "Anon", 1).with_year(1850))
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
        assert!(store.list_books().unwrap().is_empty());
    }

    #[test]
    fn test_insert_books_is_all_or_nothing() {
        let store = store();
        let batch = vec![
            NewBook::new("One", "A", 1),
            NewBook::new("", "B", 1),
            NewBook::new("Three", "C", 1),
        ];

        let err = store.insert_books(&batch).unwrap_err();
        assert!(err.to_string().contains("record 1"));
        assert!(store.list_books().unwrap().is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let store = store();
        store
            .insert_book(&NewBook::new("The Left Hand of Darkness", "Ursula K. Le Guin", 1))
            .unwrap();
        store
            .insert_book(&NewBook::new("Dune", "Frank Herbert", 1).with_category("sci-fi"))
            .unwrap();

        assert_eq!(store.search_books_by_title("left HAND").unwrap().len(), 1);
        assert_eq!(store.list_books_by_author("le guin").unwrap().len(), 1);
        assert_eq!(store.list_books_by_category("sci-fi").unwrap().len(), 1);
        assert!(store.list_books_by_category("Sci").unwrap().is_empty());
    }

    #[test]
    fn test_search_folds_accented_letters() {
        let store = store();
        store
            .insert_book(&NewBook::new("La ética para Amador", "Fernando Savater", 1))
            .unwrap();
        store
            .insert_book(&NewBook::new("Ébano", "Ryszard Kapuściński", 1))
            .unwrap();

        assert_eq!(store.search_books_by_title("ÉTICA").unwrap().len(), 1);
        assert_eq!(store.search_books_by_title("ébano").unwrap().len(), 1);
        assert_eq!(store.list_books_by_author("KAPUŚCIŃSKI").unwrap().len(), 1);
    }

    #[test]
    fn test_update_book_fields() {
        let store = store();
        let book = store
            .insert_book(&NewBook::new("Dune", "Frank Herbert", 1).with_publisher("Chilton"))
            .unwrap();

        let updated = store
            .update_book(
                &book.id,
                &BookUpdate {
                    publisher: Some(None),
                    total_copies: Some(5),
                    ..BookUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.publisher, None);
        assert_eq!(updated.total_copies, 5);
        assert_eq!(store.get_book(&book.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_update_missing_book() {
        let store = store();
        let id = Uuid::new_v4();
        let err = store
            .update_book(
                &id,
                &BookUpdate {
                    title: Some("x".into()),
                    ..BookUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, LibraryError::BookNotFound(found) if found == id));
    }
}
