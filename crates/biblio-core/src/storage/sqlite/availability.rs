use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::catalog::query_books;
use super::row::BOOK_COLUMNS;
use super::SqliteStore;
use crate::error::Result;
use crate::storage::traits::Availability;
use crate::storage::types::Book;

/// Books joined with their open-loan count, one aggregate pass over `loans`.
const AVAILABLE_FROM: &str = r#"
    FROM books b
    LEFT JOIN (
        SELECT book_id, COUNT(*) AS open_count
        FROM loans
        WHERE state IN ('active', 'overdue')
        GROUP BY book_id
    ) o ON o.book_id = b.id
    WHERE b.total_copies > COALESCE(o.open_count, 0)
"#;

impl Availability for SqliteStore {
    fn available_copies(&self, book_id: &Uuid) -> Result<u32> {
        let conn = self.lock_conn()?;
        let counts: Option<(i64, i64)> = conn
            .query_row(
                r#"
                SELECT b.total_copies,
                       (SELECT COUNT(*) FROM loans l
                        WHERE l.book_id = b.id AND l.state IN ('active', 'overdue'))
                FROM books b
                WHERE b.id = ?
                "#,
                [book_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let available = match counts {
            Some((total, open)) => u32::try_from(total.saturating_sub(open).max(0)).unwrap_or(0),
            None => 0,
        };
        tracing::debug!(book_id = %book_id, available, "computed availability");
        Ok(available)
    }

    fn list_available_books(&self) -> Result<Vec<Book>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} {} ORDER BY b.title COLLATE NOCASE, b.id",
            BOOK_COLUMNS, AVAILABLE_FROM
        );
        query_books(&conn, &sql, [])
    }

    fn search_available_books(&self, title: &str) -> Result<Vec<Book>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} {} AND instr(fold_case(b.title), fold_case(?)) > 0 \
             ORDER BY b.title COLLATE NOCASE, b.id",
            BOOK_COLUMNS, AVAILABLE_FROM
        );
        query_books(&conn, &sql, [title.trim()])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::traits::{CatalogStore, LoanLedger, MemberStore};
    use crate::storage::types::{NewBook, NewMember, Role};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn member(store: &SqliteStore) -> Uuid {
        store
            .insert_member(&NewMember {
                name: "Lin".into(),
                email: "lin@example.org".into(),
                credential_hash: "hash".into(),
                role: Role::User,
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_unknown_book_has_no_copies() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.available_copies(&Uuid::new_v4()).unwrap(), 0);
    }

    #[test]
    fn test_overdue_loans_still_occupy_copies() {
        let clock = Arc::new(FixedClock::new(date(1)));
        let store = SqliteStore::open_in_memory()
            .unwrap()
            .with_clock(clock.clone());
        let member = member(&store);
        let book = store
            .insert_book(&NewBook::new("Kindred", "Octavia Butler", 1))
            .unwrap();

        store.create_loan(&book.id, &member, date(2)).unwrap();
        clock.set(date(20));

        assert_eq!(store.available_copies(&book.id).unwrap(), 0);
        assert!(!store.has_available_copies(&book).unwrap());
        assert!(store.list_available_books().unwrap().is_empty());
    }

    #[test]
    fn test_available_search_folds_accented_letters() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_book(&NewBook::new("La ética para Amador", "Fernando Savater", 1))
            .unwrap();

        let hits = store.search_available_books("ÉTICA").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "La ética para Amador");
    }

    #[test]
    fn test_available_listing_and_search() {
        let clock = Arc::new(FixedClock::new(date(1)));
        let store = SqliteStore::open_in_memory()
            .unwrap()
            .with_clock(clock);
        let member = member(&store);
        let out = store
            .insert_book(&NewBook::new("Beloved", "Toni Morrison", 1))
            .unwrap();
        let shelf = store
            .insert_book(&NewBook::new("Bel Canto", "Ann Patchett", 2))
            .unwrap();
        store
            .insert_book(&NewBook::new("Empty", "Nobody", 0))
            .unwrap();
        store.create_loan(&out.id, &member, date(10)).unwrap();
        store.create_loan(&shelf.id, &member, date(10)).unwrap();

        let available: Vec<Uuid> = store
            .list_available_books()
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(available, vec![shelf.id]);

        let found = store.search_available_books("bel").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, shelf.id);
    }
}
