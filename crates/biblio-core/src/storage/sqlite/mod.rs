//! SQLite storage backend.
//!
//! One `SqliteStore` owns one connection behind a mutex. Every engine
//! operation holds the lock for its whole duration, and every write runs in
//! a `BEGIN IMMEDIATE` transaction so a second process sharing the file
//! waits for the write lock instead of interleaving with us.

mod availability;
mod catalog;
mod guard;
mod ledger;
mod members;
mod row;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::clock::{Clock, SystemClock};
use crate::error::{LibraryError, Result};
use crate::storage::types::LibraryMetadata;

/// On-disk format version, stored in `meta`.
pub const FORMAT_VERSION: &str = "0.1";

/// How long a writer waits on another process's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE books (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        publisher TEXT,
        year INTEGER CHECK (year IS NULL OR year BETWEEN 1900 AND 2026),
        category TEXT,
        total_copies INTEGER NOT NULL CHECK (total_copies >= 0),
        created_at TEXT NOT NULL
    );

    CREATE TABLE members (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        credential_hash TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('admin', 'user')),
        created_at TEXT NOT NULL
    );

    -- Loans reference books and members without cascading: the engine
    -- removes returned loans itself before deleting either side.
    CREATE TABLE loans (
        id TEXT PRIMARY KEY,
        book_id TEXT NOT NULL,
        member_id TEXT NOT NULL,
        start_date TEXT NOT NULL,
        due_date TEXT NOT NULL,
        state TEXT NOT NULL CHECK (state IN ('active', 'overdue', 'returned')),

        CHECK (due_date >= start_date),
        FOREIGN KEY (book_id) REFERENCES books(id),
        FOREIGN KEY (member_id) REFERENCES members(id)
    );

    CREATE INDEX loans_book_state ON loans (book_id, state);
    CREATE INDEX loans_member_state ON loans (member_id, state);
    CREATE INDEX loans_state_due ON loans (state, due_date);
"#;

/// SQLite-backed record store implementing every engine trait.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Create a new library database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` if the file already exists.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(LibraryError::Storage(format!(
                "Library database already exists: {}",
                path.display()
            )));
        }

        let mut conn = Connection::open(path)?;
        Self::configure(&conn, true)?;
        Self::init_schema(&mut conn)?;
        tracing::info!(path = %path.display(), "created library database");

        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        })
    }

    /// Open an existing library database.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::DatabaseNotFound` if the file is missing, or
    /// `LibraryError::Storage` if it is not a library database of a known
    /// format version.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LibraryError::DatabaseNotFound(path.to_path_buf()));
        }

        let conn = Connection::open(path)?;
        Self::configure(&conn, true)?;

        let version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'format_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| LibraryError::Storage(format!("Not a library database: {}", e)))?;
        match version.as_deref() {
            Some(FORMAT_VERSION) => {}
            Some(other) => {
                return Err(LibraryError::Storage(format!(
                    "Unsupported format version: {}",
                    other
                )))
            }
            None => {
                return Err(LibraryError::Storage(
                    "Library metadata is missing format_version".to_string(),
                ))
            }
        }
        tracing::debug!(path = %path.display(), "opened library database");

        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        })
    }

    /// Create a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        Self::configure(&conn, false)?;
        Self::init_schema(&mut conn)?;

        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used to decide "today".
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Path of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Today's date according to the store's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn configure(conn: &Connection, on_disk: bool) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // SQLite's lower() only folds ASCII.
        conn.create_scalar_function(
            "fold_case",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: Option<String> = ctx.get(0)?;
                Ok(text.map(|t| t.to_lowercase()))
            },
        )?;
        if on_disk {
            // journal_mode returns the resulting mode as a row.
            let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        }
        Ok(())
    }

    fn init_schema(conn: &mut Connection) -> Result<()> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA)?;

        let now = Utc::now().to_rfc3339();
        for (key, value) in [
            ("format_version", FORMAT_VERSION),
            ("created_at", now.as_str()),
            ("last_modified", now.as_str()),
        ] {
            tx.execute("INSERT INTO meta (key, value) VALUES (?, ?)", [key, value])?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LibraryError::Storage("SQLite connection poisoned".to_string()))
    }

    /// Get database metadata.
    pub fn metadata(&self) -> Result<LibraryMetadata> {
        let conn = self.lock_conn()?;

        let read = |key: &str| -> Result<String> {
            conn.query_row("SELECT value FROM meta WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .map_err(|e| LibraryError::Storage(format!("Missing metadata {}: {}", key, e)))
        };
        let parse_ts = |value: String, key: &str| -> Result<DateTime<Utc>> {
            Ok(DateTime::parse_from_rfc3339(&value)
                .map_err(|e| LibraryError::Storage(format!("Invalid {} timestamp: {}", key, e)))?
                .with_timezone(&Utc))
        };

        Ok(LibraryMetadata {
            format_version: read("format_version")?,
            created_at: parse_ts(read("created_at")?, "created_at")?,
            last_modified: parse_ts(read("last_modified")?, "last_modified")?,
        })
    }

    /// Check database integrity.
    ///
    /// Verifies:
    /// - SQLite page integrity
    /// - Foreign key relationships
    /// - No book has more open loans than copies
    pub fn check_integrity(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(LibraryError::Storage(format!(
                "SQLite integrity check failed: {}",
                integrity
            )));
        }

        let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
        let mut rows = stmt.query([])?;
        if rows.next()?.is_some() {
            return Err(LibraryError::Storage(
                "Foreign key integrity check failed".to_string(),
            ));
        }

        let oversubscribed: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM books b
            WHERE b.total_copies < (
                SELECT COUNT(*) FROM loans l
                WHERE l.book_id = b.id AND l.state IN ('active', 'overdue')
            )
            "#,
            [],
            |row| row.get(0),
        )?;
        if oversubscribed > 0 {
            return Err(LibraryError::Storage(format!(
                "{} book(s) have more open loans than copies",
                oversubscribed
            )));
        }

        Ok(())
    }

    /// Write a consistent snapshot of the database to `destination`.
    ///
    /// The snapshot is written next to the destination first and renamed
    /// into place, so a failed backup never leaves a partial file.
    pub fn backup_to(&self, destination: &Path) -> Result<()> {
        let temp_path = crate::fs::temp_sibling(destination)?;
        let temp_str = temp_path
            .to_str()
            .ok_or_else(|| LibraryError::Storage("Backup path is not valid UTF-8".to_string()))?
            .to_string();

        {
            let conn = self.lock_conn()?;
            conn.execute("VACUUM INTO ?", [temp_str])?;
        }

        crate::fs::rename_with_fallback(&temp_path, destination)
            .map_err(|e| LibraryError::Storage(format!("Backup rename failed: {}", e)))?;
        tracing::info!(destination = %destination.display(), "backup written");
        Ok(())
    }
}

/// Record the modification time. Call inside the write transaction.
fn touch(conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE meta SET value = ? WHERE key = 'last_modified'",
        [Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Whether a SQLite error is a UNIQUE constraint failure.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
