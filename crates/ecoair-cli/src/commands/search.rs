//! Search history.

use anyhow::Result;
use ecoair_store::StorageFacade;

use crate::cli::SearchAction;
use crate::format::{format_searches_text, to_json};

use super::OutputOptions;

pub async fn cmd_search(
    storage: &StorageFacade,
    action: SearchAction,
    opts: OutputOptions,
) -> Result<()> {
    match action {
        SearchAction::Record { city } => {
            storage.record_search(&city).await?;
            opts.notice(format!("Recorded search for '{}'", city.trim()));
        }
        SearchAction::Recent { limit } => {
            let searches = match limit {
                Some(limit) => storage.recent_searches_limited(limit).await?,
                None => storage.recent_searches().await?,
            };
            if opts.is_json() {
                print!("{}", to_json(&searches)?);
            } else {
                print!("{}", format_searches_text(&searches));
            }
        }
        SearchAction::Clear => {
            storage.clear_search_history().await?;
            opts.notice("Search history cleared");
        }
    }

    Ok(())
}
