//! Output formatting utilities for text and JSON output.

use anyhow::{Result, bail};
use ecoair_store::{
    AqiLevel, CachedAirQuality, Coordinates, FavoriteCity, MeasurementSample,
    NotificationSettings, StorageStats,
};
use owo_colors::OwoColorize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Rows shown in text tables before truncating.
const MAX_TEXT_ROWS: usize = 20;

/// Pretty-printed JSON followed by a newline.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Parse RFC3339 or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_datetime(s: &str) -> Result<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(dt);
    }

    let format = format_description!("[year]-[month]-[day]");
    if let Ok(date) = time::Date::parse(s, format) {
        return Ok(date.midnight().assume_utc());
    }

    bail!("Invalid date/time format: {}. Use RFC3339 or YYYY-MM-DD", s)
}

/// Compact `YYYY-MM-DD HH:MM` rendering for tables.
#[must_use]
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| "Unknown".to_string())
}

/// AQI value with its health band, colored by severity.
#[must_use]
pub fn format_aqi(aqi: i32, no_color: bool) -> String {
    let Some(level) = AqiLevel::from_aqi(aqi) else {
        return format!("{aqi} [?]");
    };
    let label = level.label();

    if no_color {
        return format!("{aqi} [{label}]");
    }
    let tag = match level {
        AqiLevel::Good => format!("[{}]", label.green()),
        AqiLevel::Moderate => format!("[{}]", label.yellow()),
        AqiLevel::UnhealthyForSensitiveGroups => format!("[{}]", label.bright_red()),
        AqiLevel::Unhealthy => format!("[{}]", label.red()),
        AqiLevel::VeryUnhealthy => format!("[{}]", label.magenta()),
        _ => format!("[{}]", label.bold().red()),
    };
    format!("{aqi} {tag}")
}

fn format_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> String {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => format!("{lat:.4}, {lon:.4}"),
        _ => "-".to_string(),
    }
}

fn heading(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        text.bold().to_string()
    }
}

// ============================================================================
// Favorites
// ============================================================================

#[must_use]
pub fn format_favorites_text(favorites: &[FavoriteCity], no_color: bool) -> String {
    if favorites.is_empty() {
        return "No favorite cities.\n".to_string();
    }

    let mut output = format!("Favorites ({}):\n\n", favorites.len());
    output.push_str(&heading(
        &format!(
            "{:>15}  {:<24} {:<12} {:<22} {}",
            "ID", "City", "Country", "Coordinates", "Added"
        ),
        no_color,
    ));
    output.push('\n');

    for fav in favorites {
        output.push_str(&format!(
            "{:>15}  {:<24} {:<12} {:<22} {}\n",
            fav.id,
            fav.name,
            fav.country.as_deref().unwrap_or("-"),
            format_coordinates(fav.latitude, fav.longitude),
            format_timestamp(fav.added_at),
        ));
    }
    output
}

// ============================================================================
// Search history
// ============================================================================

#[must_use]
pub fn format_searches_text(searches: &[String]) -> String {
    if searches.is_empty() {
        return "No recent searches.\n".to_string();
    }

    let mut output = String::from("Recent searches:\n");
    for (i, city) in searches.iter().enumerate() {
        output.push_str(&format!("{:>3}. {}\n", i + 1, city));
    }
    output
}

// ============================================================================
// AQI cache
// ============================================================================

#[must_use]
pub fn format_cached_text(entry: &CachedAirQuality, no_color: bool) -> String {
    let level = if entry.level.is_empty() {
        "-"
    } else {
        entry.level.as_str()
    };
    let mut output = format!("{}\n", heading(&entry.city_name, no_color));
    output.push_str(&format!("  AQI:      {}\n", format_aqi(entry.aqi, no_color)));
    output.push_str(&format!("  Level:    {level}\n"));
    output.push_str(&format!(
        "  Cached:   {}\n",
        format_timestamp(entry.cached_at)
    ));
    output.push_str(&format!(
        "  Expires:  {}\n",
        format_timestamp(entry.expires_at)
    ));
    output
}

// ============================================================================
// Measurements
// ============================================================================

fn pollutant(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

#[must_use]
pub fn format_samples_text(city: &str, samples: &[MeasurementSample], no_color: bool) -> String {
    if samples.is_empty() {
        return format!("No measurements found for {city}.\n");
    }

    let mut output = format!("Measurements for {} ({} samples):\n\n", city, samples.len());
    output.push_str(&heading(
        &format!(
            "{:<17} {:<40} {:>7} {:>7} {:>7} {:>7}",
            "Time", "AQI", "PM2.5", "PM10", "O3", "NO2"
        ),
        no_color,
    ));
    output.push('\n');

    for sample in samples.iter().take(MAX_TEXT_ROWS) {
        output.push_str(&format!(
            "{:<17} {:<40} {:>7} {:>7} {:>7} {:>7}\n",
            format_timestamp(sample.measured_at),
            format_aqi(sample.aqi, true),
            pollutant(sample.pollutants.pm25),
            pollutant(sample.pollutants.pm10),
            pollutant(sample.pollutants.o3),
            pollutant(sample.pollutants.no2),
        ));
    }

    if samples.len() > MAX_TEXT_ROWS {
        output.push_str(&format!(
            "... and {} more samples\n",
            samples.len() - MAX_TEXT_ROWS
        ));
        output.push_str("(Use --format json for full data)\n");
    }
    output
}

// ============================================================================
// Stats
// ============================================================================

#[must_use]
pub fn format_stats_text(backend: &str, stats: &StorageStats) -> String {
    let mut output = format!("Storage ({backend}):\n");
    output.push_str(&format!("  Favorites:       {}\n", stats.favorites));
    output.push_str(&format!("  Search history:  {}\n", stats.search_history));
    output.push_str(&format!("  Cached AQI:      {}\n", stats.cached));
    output.push_str(&format!("  Measurements:    {}\n", stats.measurements));
    output.push_str(&format!("  Total:           {}\n", stats.total()));
    output
}

// ============================================================================
// Preferences
// ============================================================================

/// Snapshot of every preference, as shown by `prefs show`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesView {
    pub last_city: Option<String>,
    pub onboarding_done: bool,
    pub notifications: NotificationSettings,
    pub user_location: Option<Coordinates>,
}

#[must_use]
pub fn format_prefs_text(prefs: &PreferencesView) -> String {
    let on_off = |b: bool| if b { "on" } else { "off" };
    let n = &prefs.notifications;

    let mut output = String::from("Preferences:\n");
    output.push_str(&format!(
        "  Last city:       {}\n",
        prefs.last_city.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!(
        "  Onboarding:      {}\n",
        if prefs.onboarding_done {
            "done"
        } else {
            "pending"
        }
    ));
    output.push_str(&format!("  Notifications:   {}\n", on_off(n.enabled)));
    output.push_str(&format!("  Alert threshold: {}\n", n.alert_threshold));
    output.push_str(&format!(
        "  Daily reminder:  {} at {}\n",
        on_off(n.daily_reminder),
        n.reminder_time
    ));
    output.push_str(&format!(
        "  Location:        {}\n",
        prefs.user_location.as_ref().map_or_else(
            || "-".to_string(),
            |c| format_coordinates(Some(c.latitude), Some(c.longitude))
        )
    ));
    output
}
