//! AQI response cache.

use anyhow::{Context, Result};
use ecoair_store::{BackendKind, CacheEntry, StorageFacade};
use serde_json::json;

use crate::cli::CacheAction;
use crate::format::{format_cached_text, to_json};

use super::OutputOptions;

fn warn_if_not_persisted(storage: &StorageFacade, opts: OutputOptions) {
    if storage.kind() == BackendKind::KeyValue && !opts.quiet {
        eprintln!("Note: the key-value backend does not persist cached responses");
    }
}

pub async fn cmd_cache(
    storage: &StorageFacade,
    action: CacheAction,
    opts: OutputOptions,
) -> Result<()> {
    match action {
        CacheAction::Put {
            city,
            aqi,
            level,
            data,
            ttl,
        } => {
            let data: serde_json::Value =
                serde_json::from_str(&data).context("--data must be valid JSON")?;
            let mut entry = CacheEntry::new(city.as_str(), aqi, data);
            if let Some(level) = level {
                entry = entry.level(level);
            }

            warn_if_not_persisted(storage, opts);
            match ttl {
                Some(minutes) => storage.cache_air_quality_for(&entry, minutes).await?,
                None => storage.cache_air_quality(&entry).await?,
            }
            let minutes = ttl.unwrap_or(storage.limits().cache_ttl_minutes);
            opts.notice(format!("Cached AQI {aqi} for '{}' ({minutes} min)", city.trim()));
        }
        CacheAction::Get { city } => {
            let cached = storage.cached_air_quality(&city).await?;
            match (cached, opts.is_json()) {
                (Some(entry), true) => print!("{}", to_json(&entry)?),
                (Some(entry), false) => print!("{}", format_cached_text(&entry, opts.no_color)),
                (None, true) => println!("null"),
                (None, false) => println!("No fresh cached data for '{city}'"),
            }
        }
        CacheAction::Purge => {
            let removed = storage.purge_expired().await?;
            if opts.is_json() {
                print!("{}", to_json(&json!({ "removed": removed }))?);
            } else {
                opts.notice(format!("Removed {removed} expired entries"));
            }
        }
    }

    Ok(())
}
