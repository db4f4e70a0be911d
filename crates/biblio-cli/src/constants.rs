//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells, also clap usage errors)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, database, book, member, loan).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Acting member lacks the role for the operation.
    pub const PERMISSION_DENIED: i32 = 5;

    /// Integrity check failed.
    pub const INTEGRITY_FAILED: i32 = 6;

    /// Request refused by the lending rules (no copies, open loans, taken email).
    pub const REFUSED: i32 = 7;
}

/// Rows shown by `loan list` when no limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 100;
