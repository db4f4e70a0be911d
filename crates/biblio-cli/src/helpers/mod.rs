//! Input and lookup helpers for the CLI.
//!
//! - Date, id and loan-length parsing (`parsing`)
//! - Resolving command arguments to stored records (`lookup`)

mod lookup;
mod parsing;

pub use lookup::{require_book, require_loan, require_member};
pub use parsing::{parse_date, resolve_due_date};
