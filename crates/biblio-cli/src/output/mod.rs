//! Output formatting helpers for the CLI.
//!
//! JSON documents for `--json` and row builders for tables.

mod json;
mod text;

pub use json::{book_json, loan_json, member_json, print_json};
pub use text::{book_row, loan_row, member_row, LookupNames, BOOK_COLUMNS, LOAN_COLUMNS, MEMBER_COLUMNS};
