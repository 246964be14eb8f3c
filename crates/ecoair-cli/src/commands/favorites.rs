//! Favorite cities.

use anyhow::{Result, bail};
use ecoair_store::{FavoriteUpdate, NewFavorite, StorageFacade};
use serde_json::json;

use crate::cli::FavoritesAction;
use crate::format::{format_favorites_text, to_json};

use super::OutputOptions;

pub async fn cmd_favorites(
    storage: &StorageFacade,
    action: FavoritesAction,
    opts: OutputOptions,
) -> Result<()> {
    match action {
        FavoritesAction::Add {
            name,
            country,
            lat,
            lon,
        } => {
            let mut favorite = NewFavorite::new(name.as_str());
            if let Some(country) = country {
                favorite = favorite.country(country);
            }
            if let (Some(lat), Some(lon)) = (lat, lon) {
                favorite = favorite.coordinates(lat, lon);
            }

            let id = storage.add_favorite(&favorite).await?;
            if opts.is_json() {
                print!("{}", to_json(&json!({ "id": id, "name": name.trim() }))?);
            } else {
                opts.notice(format!("Added '{}' (id {})", name.trim(), id));
            }
        }
        FavoritesAction::List => {
            let favorites = storage.list_favorites().await?;
            if opts.is_json() {
                print!("{}", to_json(&favorites)?);
            } else {
                print!("{}", format_favorites_text(&favorites, opts.no_color));
            }
        }
        FavoritesAction::Remove { id } => {
            storage.remove_favorite(id).await?;
            opts.notice(format!("Removed favorite {id}"));
        }
        FavoritesAction::Check { name } => {
            let found = storage.is_favorite(&name).await?;
            if opts.is_json() {
                print!("{}", to_json(&json!({ "name": name, "favorite": found }))?);
            } else if found {
                println!("'{name}' is a favorite");
            } else {
                println!("'{name}' is not a favorite");
            }
        }
        FavoritesAction::Update {
            id,
            name,
            country,
            lat,
            lon,
        } => {
            let mut update = FavoriteUpdate::new();
            if let Some(name) = name {
                update = update.name(name);
            }
            if let Some(country) = country {
                update = update.country(country);
            }
            if let Some(lat) = lat {
                update = update.latitude(lat);
            }
            if let Some(lon) = lon {
                update = update.longitude(lon);
            }
            if update.is_empty() {
                bail!("Nothing to update. Pass at least one of --name, --country, --lat, --lon");
            }

            storage.update_favorite(id, &update).await?;
            opts.notice(format!("Updated favorite {id}"));
        }
    }

    Ok(())
}
