use anyhow::{Context, Result};
use intake_core::SqliteStore;
use intake_pipeline::Config;

pub mod config;
pub mod fill;
pub mod show;
pub mod submit;

pub use fill::run_fill;
pub use show::show_submission;
pub use submit::run_submit;

/// Open the configured store, creating its directory if needed.
pub(crate) fn open_store(config: &Config) -> Result<SqliteStore> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    SqliteStore::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open store at {}",
            config.database_path.display()
        )
    })
}
