use anyhow::Result;
use intake_pipeline::Config;

use crate::tui;

/// Run the interactive form.
pub async fn run_fill(config: &Config) -> Result<()> {
    log::info!("Opening form (store: {})", config.database_path.display());
    tui::run_tui(config).await
}
