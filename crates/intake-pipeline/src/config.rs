use anyhow::{Context, Result};
use confyg::{env, Confygery};
use intake_core::FormOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pipeline::DEFAULT_STORAGE_KEY;

/// Configuration for intake.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (INTAKE_* prefix)
/// 3. Config file (~/.config/intake/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite key-value store.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: INTAKE_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/intake/intake.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Key the submitted record is written under.
    ///
    /// Can be set via:
    /// - ENV: INTAKE_STORAGE_KEY
    /// - Config: storage_key = "form"
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory holding attachment previews while they are displayed.
    ///
    /// Can be set via:
    /// - ENV: INTAKE_PREVIEW_DIR
    /// - Config: preview_dir = "/path/to/previews"
    /// - Default: ~/.cache/intake/previews
    #[serde(default = "default_preview_dir")]
    pub preview_dir: PathBuf,

    /// Option lists for the choice fields.
    #[serde(default)]
    pub options: FormOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            storage_key: default_storage_key(),
            preview_dir: default_preview_dir(),
            options: FormOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/intake/config.toml
    /// Reads environment variables with INTAKE_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed, or
    /// if it declares an empty or duplicated option list.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("intake");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        if config.storage_key.trim().is_empty() {
            anyhow::bail!("storage_key must not be empty");
        }

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    ///
    /// # Errors
    ///
    /// Returns an error if loading the configuration fails.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

/// Get the default database path.
///
/// Returns: ~/.local/share/intake/intake.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("intake")
        .join("intake.db")
}

/// Get the default preview directory.
fn default_preview_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("intake")
        .join("previews")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/intake/config.toml
/// - macOS: ~/Library/Application Support/intake/config.toml
/// - Windows: %APPDATA%\intake\config.toml
#[must_use]
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("intake")
        .join("config.toml")
}

/// Get the example config file content.
#[must_use]
pub fn example_config() -> &'static str {
    r#"# Intake Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (INTAKE_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite store submitted records are written to
#
# Can also be set via:
# - CLI: intake --db /custom/path.db submit ...
# - Environment: INTAKE_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/intake.db"

# Key the submitted record is stored under (each submit overwrites it)
storage_key = "form"

# Where attachment previews live while they are displayed
#
# Default: Platform-specific cache directory
#preview_dir = "/path/to/previews"

# Option lists. The first label of gender and holidays is the default.
[options.gender]
name = "Gender"
labels = ["male", "female"]

[options.meals]
name = "Favorite Meals"
labels = ["pizza", "pasta", "borsch"]

[options.holidays]
name = "Your Holiday Choice"
labels = ["hiking", "sunbathing on the beach", "city tours"]
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
