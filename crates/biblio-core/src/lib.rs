//! # Biblio Core
//!
//! Core library for Biblio - a lending ledger for a small library's books and members.
//!
//! This crate provides the domain model, the record store, and the loan engine
//! independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **storage**: Store traits (catalog, members, loans, availability, deletion guard)
//!   and the SQLite implementation
//! - **loan**: Loan lifecycle state and the lazy overdue transition
//! - **book**: Book field validation
//! - **members**: Member registration and credential delivery
//! - **credential**: Credential generation and hashing
//! - **access**: Role predicate and listing scopes
//! - **transfer**: Bulk import and export of the catalog (JSON)
//! - **clock**: Source of "today" for the engine

pub mod access;
pub mod book;
pub mod clock;
pub mod credential;
pub mod error;
pub mod fs;
pub mod loan;
pub mod members;
pub mod storage;
pub mod transfer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LibraryError, Result};
pub use storage::{
    Availability, CatalogStore, DeletionGuard, LoanLedger, MemberStore, SqliteStore,
};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
