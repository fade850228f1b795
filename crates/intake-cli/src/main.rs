use anyhow::Result;
use clap::Parser;
use intake_pipeline::Config;
use std::path::PathBuf;

mod commands;
mod tui;

#[derive(Debug, Parser)]
#[command(name = "intake", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the store (default: ~/.local/share/intake/intake.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Fill in the form interactively
    ///
    /// Opens a terminal form with every field at its default. Move between
    /// fields with Tab / Shift-Tab (or the arrow keys):
    ///
    /// - Text fields: type to edit, Backspace to delete
    /// - Gender and holiday choice: Left/Right to cycle the options
    /// - Favorite meals: Left/Right to move, Space to toggle
    /// - Photo: type a path and press Enter to attach, Delete to remove
    ///
    /// Ctrl-S submits (first name, last name and phone number are
    /// required), Ctrl-R clears the form and the submitted summary, Esc
    /// quits.
    ///
    /// Every submission overwrites the stored record. Use 'intake show' to
    /// print it.
    Fill,
    /// Submit the form without the interactive UI
    Submit(commands::submit::SubmitArgs),
    /// Print the last stored submission
    Show,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print a config value, or the whole config file
    Get {
        /// Key to print (database_path, storage_key, preview_dir)
        key: Option<String>,
    },
    /// Set a config value in the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Create the config file with defaults
    Init,
    /// Print an example config file
    Example,
}

/// Install the log subscriber. The interactive form owns the terminal, so
/// it only logs when `RUST_LOG` asks for it.
fn init_logging(interactive: bool) {
    if interactive && std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(db: Option<PathBuf>) -> Result<Config> {
    match db {
        Some(path) => Config::load_with_db_path(path),
        None => Config::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(matches!(cli.command, Commands::Fill));

    match cli.command {
        Commands::Fill => {
            let config = load_config(cli.db)?;
            commands::run_fill(&config).await?;
        }
        Commands::Submit(args) => {
            let config = load_config(cli.db)?;
            commands::run_submit(&config, args).await?;
        }
        Commands::Show => {
            let config = load_config(cli.db)?;
            commands::show_submission(&config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config()?,
            ConfigAction::Get { key } => commands::config::get_config(key)?,
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value)?,
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Init => commands::config::init_config()?,
            ConfigAction::Example => commands::config::show_example(),
        },
    }

    Ok(())
}
