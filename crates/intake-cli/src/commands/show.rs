use anyhow::{Context, Result};
use intake_core::KeyValueStore;
use intake_pipeline::Config;

use super::open_store;

/// Print the record stored under the configured key.
pub fn show_submission(config: &Config) -> Result<()> {
    let store = open_store(config)?;

    let Some(raw) = store.get(&config.storage_key)? else {
        println!("No submission stored under '{}'.", config.storage_key);
        println!("Run 'intake fill' or 'intake submit' first.");
        return Ok(());
    };

    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Stored submission is not valid JSON")?;
    println!("{}", serde_json::to_string_pretty(&value)?);

    if let Some(updated) = store.updated_at(&config.storage_key)? {
        println!("\nSubmitted at {updated}");
    }

    Ok(())
}
