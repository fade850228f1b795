use anyhow::{Context, Result};
use intake_pipeline::{config, Config};

const VALID_KEYS: &str = "database_path, storage_key, preview_dir";

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!(
        "File exists: {}\n",
        if exists { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  database_path: {}", config.database_path.display());
    println!("  storage_key: {}", config.storage_key);
    println!("  preview_dir: {}", config.preview_dir.display());

    println!("\nOptions:");
    for set in [
        &config.options.gender,
        &config.options.meals,
        &config.options.holidays,
    ] {
        println!("  {}: {}", set.name(), set.labels().join(", "));
    }

    println!("\nPriority: CLI args > ENV vars (INTAKE_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value.
pub fn get_config(key: Option<String>) -> Result<()> {
    if let Some(key) = key {
        let config = Config::load()?;

        match key.as_str() {
            "database_path" => println!("{}", config.database_path.display()),
            "storage_key" => println!("{}", config.storage_key),
            "preview_dir" => println!("{}", config.preview_dir.display()),
            _ => {
                anyhow::bail!("Unknown config key: {key}\n\nValid keys: {VALID_KEYS}");
            }
        }
    } else {
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{contents}");
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'intake config init' to create it.");
        }
    }

    Ok(())
}

/// Set a config value, keeping the rest of the file (comments included)
/// as it is.
pub fn set_config(key: &str, value: &str) -> Result<()> {
    if !matches!(key, "database_path" | "storage_key" | "preview_dir") {
        anyhow::bail!("Unknown config key: {key}\n\nValid keys: {VALID_KEYS}");
    }
    if key == "storage_key" && value.trim().is_empty() {
        anyhow::bail!("storage_key must not be empty");
    }

    let config_path = config::config_file_path();
    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let mut doc = contents
        .parse::<toml_edit::DocumentMut>()
        .context("Failed to parse config file")?;
    doc[key] = toml_edit::value(value);

    std::fs::write(&config_path, doc.to_string()).context("Failed to write config file")?;

    println!("✓ Updated {key} = {value}");
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure intake.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
