//! Config file commands. These run without opening storage.

use std::path::Path;

use anyhow::{Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::format::to_json;

use super::OutputOptions;

/// `effective` is the loaded config with command-line overrides applied.
pub fn cmd_config(
    action: ConfigAction,
    path: &Path,
    effective: &Config,
    opts: OutputOptions,
) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            if opts.is_json() {
                print!("{}", to_json(effective)?);
            } else {
                print!("{}", toml::to_string_pretty(effective)?);
                if !opts.quiet {
                    println!();
                    println!("# data directory: {}", effective.storage.data_dir().display());
                    println!("# backend: {}", effective.storage.backend_kind());
                }
            }
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Config::default().save_to(path)?;
            opts.notice(format!("Wrote {}", path.display()));
        }
    }
    Ok(())
}
