//! UI primitives for the Biblio CLI.
//!
//! - **Context**: terminal detection (TTY, width, colour, unicode)
//! - **Mode**: output mode resolution (json, plain, pretty)
//! - **Theme**: badges, symbols and owo-colors styles
//! - **Render**: tables, headers, receipts, hints
//! - **Format**: string helpers for listings

mod context;
pub mod format;
mod mode;
pub mod render;
pub mod theme;

pub use context::{UiContext, UiFlags};
pub use theme::Badge;

pub use render::{
    badge, blank_line, details, error_message, header, hint, kv, print, receipt, simple_table,
    table, Column,
};

pub use format::{copies, due_in, or_dash, short_id, truncate};
