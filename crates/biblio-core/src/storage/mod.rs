//! Storage abstraction layer for Biblio.
//!
//! The engine traits live in [`traits`]; [`sqlite::SqliteStore`] implements
//! all of them on a single SQLite database file.

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::{SqliteStore, FORMAT_VERSION};
pub use traits::{Availability, CatalogStore, DeletionGuard, LoanLedger, MemberStore};
pub use types::{
    Book, BookUpdate, LibraryMetadata, Loan, LoanFilter, LoanState, Member, MemberUpdate, NewBook,
    NewMember, Role,
};
