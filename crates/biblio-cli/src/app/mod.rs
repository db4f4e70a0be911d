//! Application-level utilities for the Biblio CLI.
//!
//! - Path resolution for the config and library files
//! - The per-invocation context: store, clock, acting member

mod context;
mod resolver;

pub use context::AppContext;
