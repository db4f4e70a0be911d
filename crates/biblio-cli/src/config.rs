use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Loan length used when neither `--due` nor `--days` is given.
pub const DEFAULT_LOAN_DAYS: u32 = 14;

/// Longest loan the CLI will create.
pub const MAX_LOAN_DAYS: u32 = 90;

#[derive(Debug, Serialize, Deserialize)]
pub struct BiblioConfig {
    pub library: LibrarySection,
    #[serde(default)]
    pub loans: LoansSection,
    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LibrarySection {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoansSection {
    #[serde(default = "default_loan_days")]
    pub default_loan_days: u32,
    #[serde(default = "max_loan_days")]
    pub max_loan_days: u32,
}

impl Default for LoansSection {
    fn default() -> Self {
        Self {
            default_loan_days: DEFAULT_LOAN_DAYS,
            max_loan_days: MAX_LOAN_DAYS,
        }
    }
}

fn default_loan_days() -> u32 {
    DEFAULT_LOAN_DAYS
}

fn max_loan_days() -> u32 {
    MAX_LOAN_DAYS
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct UiSection {
    /// Preferred output format (table, plain, json)
    pub format: Option<String>,
}

impl BiblioConfig {
    pub fn new(library_path: PathBuf, default_loan_days: u32) -> Self {
        Self {
            library: LibrarySection {
                path: library_path.to_string_lossy().to_string(),
            },
            loans: LoansSection {
                default_loan_days,
                max_loan_days: MAX_LOAN_DAYS.max(default_loan_days),
            },
            ui: UiSection::default(),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_library_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("library.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<BiblioConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &BiblioConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("biblio"));
        }
    }
    Ok(home_dir()?.join(".config").join("biblio"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("biblio"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("biblio"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
