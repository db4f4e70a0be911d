//! Path resolution for config and library files.

use std::path::{Path, PathBuf};

use crate::config::{default_config_path, BiblioConfig};

/// Resolve the config file path, checking BIBLIO_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("BIBLIO_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the library database path from `--db` or the config file.
pub fn resolve_library_path(
    db_flag: Option<&str>,
    config: Option<&BiblioConfig>,
    config_path: &Path,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = db_flag {
        return Ok(PathBuf::from(path));
    }
    match config {
        Some(config) => Ok(PathBuf::from(&config.library.path)),
        None => Err(crate::errors::CliError::not_found(
            missing_config_message(config_path),
            "",
        )
        .into()),
    }
}

pub fn missing_library_message(path: &Path) -> String {
    format!(
        "No library found at {}\n\nRun:\n  biblio init\n\nOr specify a database:\n  BIBLIO_DB=/path/to/library.db biblio init",
        path.display()
    )
}

pub fn missing_config_message(config_path: &Path) -> String {
    format!(
        "No config found at {}\n\nRun:\n  biblio init\n\nOr pass a database with --db or BIBLIO_DB",
        config_path.display()
    )
}
