//! Command-line front end for the Eco-Air local storage.

mod cli;
mod commands;
mod config;
mod format;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::OutputOptions;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let mut config = Config::load_from(&config_path);
    config.storage = config.store_config(cli.data_dir.clone(), cli.backend.map(Into::into));

    let opts = OutputOptions {
        format: cli.format.or(config.format).unwrap_or_default(),
        no_color: cli.no_color || config.no_color,
        quiet: cli.quiet,
    };

    // Config commands never touch storage
    if let Commands::Config { action } = cli.command {
        return commands::cmd_config(action, &config_path, &config, opts);
    }

    let storage = ecoair_store::init(&config.storage)
        .await
        .with_context(|| format!("Failed to open storage in {}", config.storage.data_dir().display()))?;

    let result = match cli.command {
        Commands::Favorites { action } => commands::cmd_favorites(&storage, action, opts).await,
        Commands::Search { action } => commands::cmd_search(&storage, action, opts).await,
        Commands::Cache { action } => commands::cmd_cache(&storage, action, opts).await,
        Commands::Measure { action } => commands::cmd_measure(&storage, action, opts).await,
        Commands::Prefs { action } => commands::cmd_prefs(&storage, action, opts).await,
        Commands::Stats => commands::cmd_stats(&storage, opts).await,
        Commands::Reset { yes } => commands::cmd_reset(&storage, yes, opts).await,
        Commands::Export { file } => commands::cmd_export(&storage, file, opts).await,
        Commands::Import { file } => commands::cmd_import(&storage, file, opts).await,
        Commands::Config { .. } => Ok(()),
    };

    drop(storage);
    ecoair_store::close().await.context("Failed to close storage")?;
    result
}
