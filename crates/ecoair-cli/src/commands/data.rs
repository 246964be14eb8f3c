//! Stats, reset, export and import.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dialoguer::Confirm;
use ecoair_store::StorageFacade;
use serde_json::json;

use crate::format::{format_stats_text, to_json};

use super::OutputOptions;

pub async fn cmd_stats(storage: &StorageFacade, opts: OutputOptions) -> Result<()> {
    let stats = storage.stats().await?;
    let backend = storage.kind().to_string();

    if opts.is_json() {
        print!(
            "{}",
            to_json(&json!({ "backend": backend, "stats": stats, "total": stats.total() }))?
        );
    } else {
        print!("{}", format_stats_text(&backend, &stats));
    }
    Ok(())
}

pub async fn cmd_reset(storage: &StorageFacade, yes: bool, opts: OutputOptions) -> Result<()> {
    if !yes {
        if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
            bail!("Refusing to reset without confirmation. Pass --yes to proceed.");
        }
        let confirmed = Confirm::new()
            .with_prompt("Delete all favorites, searches, cached data and measurements?")
            .default(false)
            .interact()?;
        if !confirmed {
            opts.notice("Aborted");
            return Ok(());
        }
    }

    storage.reset_all().await?;
    opts.notice("All collections cleared (preferences kept)");
    Ok(())
}

pub async fn cmd_export(
    storage: &StorageFacade,
    file: Option<PathBuf>,
    opts: OutputOptions,
) -> Result<()> {
    let data = storage.export_all().await?;
    let json = to_json(&data)?;

    match file {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            if !opts.quiet {
                eprintln!("Exported {} keys to {}", data.len(), path.display());
            }
        }
        None => print!("{json}"),
    }
    Ok(())
}

pub async fn cmd_import(storage: &StorageFacade, file: PathBuf, opts: OutputOptions) -> Result<()> {
    let content = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;
    let data: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Import file is not a JSON object: {}", file.display()))?;

    let count = storage.import(&data).await?;
    if opts.is_json() {
        print!("{}", to_json(&json!({ "imported": count }))?);
    } else {
        opts.notice(format!("Imported {count} keys"));
    }
    Ok(())
}
