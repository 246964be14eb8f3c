//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ecoair_store::BackendChoice;
use serde::{Deserialize, Serialize};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// SQLite on this machine
    Auto,
    /// SQLite database file
    Relational,
    /// JSON files, one per key
    KeyValue,
}

impl From<BackendArg> for BackendChoice {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendChoice::Auto,
            BackendArg::Relational => BackendChoice::Relational,
            BackendArg::KeyValue => BackendChoice::KeyValue,
        }
    }
}

#[derive(Parser)]
#[command(name = "ecoair")]
#[command(author, version, about = "Inspect and manage Eco-Air local data", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Data directory (overrides config)
    #[arg(long, global = true, env = "ECOAIR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// Output format (overrides config)
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "ECOAIR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage favorite cities
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Manage the search history
    Search {
        #[command(subcommand)]
        action: SearchAction,
    },

    /// Manage cached air quality responses
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Record and query measurement history
    Measure {
        #[command(subcommand)]
        action: MeasureAction,
    },

    /// Show or change user preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Show row counts per collection
    Stats,

    /// Delete favorites, searches, cached responses and measurements
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export preferences and key/value data as JSON
    Export {
        /// Output file (stdout if omitted)
        file: Option<PathBuf>,
    },

    /// Import data previously produced by `export`
    Import {
        /// Input file
        file: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    /// Bookmark a city
    Add {
        /// City name
        name: String,

        /// Country name or code
        #[arg(short, long)]
        country: Option<String>,

        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
    },

    /// List favorites, newest first
    List,

    /// Remove a favorite by id
    Remove {
        /// Favorite id (see `favorites list`)
        id: i64,
    },

    /// Check whether a city is a favorite
    Check {
        /// City name (case-insensitive)
        name: String,
    },

    /// Change fields of a favorite
    Update {
        /// Favorite id
        id: i64,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New country
        #[arg(short, long)]
        country: Option<String>,

        /// New latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        /// New longitude
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SearchAction {
    /// Record a search for a city
    Record {
        /// City name
        city: String,
    },

    /// Show recent searches
    Recent {
        /// Maximum number of entries (defaults to config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Clear the search history
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Store an AQI response for a city
    Put {
        /// City name
        city: String,

        /// AQI value
        aqi: i32,

        /// Level label (derived from the AQI when omitted)
        #[arg(short, long)]
        level: Option<String>,

        /// Provider payload as JSON
        #[arg(short, long, default_value = "{}")]
        data: String,

        /// Lifetime in minutes (defaults to config)
        #[arg(long)]
        ttl: Option<i64>,
    },

    /// Show the cached response for a city
    Get {
        /// City name (case-insensitive)
        city: String,
    },

    /// Delete expired entries
    Purge,
}

#[derive(Debug, Subcommand)]
pub enum MeasureAction {
    /// Record a measurement
    Record {
        /// City name
        city: String,

        /// AQI value
        aqi: i32,

        /// PM2.5 in µg/m³
        #[arg(long)]
        pm25: Option<f64>,

        /// PM10 in µg/m³
        #[arg(long)]
        pm10: Option<f64>,

        /// Ozone in µg/m³
        #[arg(long)]
        o3: Option<f64>,

        /// Nitrogen dioxide in µg/m³
        #[arg(long)]
        no2: Option<f64>,

        /// Measurement time (RFC3339 or YYYY-MM-DD, defaults to now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Show measurements for a city, oldest first
    Range {
        /// City name (case-insensitive)
        city: String,

        /// Trailing window in days (defaults to config)
        #[arg(short, long, conflicts_with = "since")]
        days: Option<i64>,

        /// Only samples at or after this time (RFC3339 or YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Only samples at or before this time (RFC3339 or YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Maximum number of samples
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PrefsAction {
    /// Show all preferences
    Show,

    /// Remember the last city looked up
    SetLastCity {
        /// City name
        city: String,
    },

    /// Mark onboarding as completed
    OnboardingDone {
        /// Mark onboarding as not completed instead
        #[arg(long)]
        undo: bool,
    },

    /// Change notification settings
    Notifications {
        /// Enable notifications
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Disable notifications
        #[arg(long)]
        disable: bool,

        /// AQI at or above which an alert is raised
        #[arg(long)]
        threshold: Option<i32>,

        /// Send a daily reminder
        #[arg(long)]
        daily_reminder: Option<bool>,

        /// Reminder time, HH:MM
        #[arg(long)]
        reminder_time: Option<String>,
    },

    /// Remember the user's position
    Location {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,

    /// Show the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_favorites_add() {
        let cli = Cli::try_parse_from([
            "ecoair", "favorites", "add", "Rio", "--country", "BR", "--lat", "-22.9", "--lon",
            "-43.2",
        ])
        .unwrap();

        match cli.command {
            Commands::Favorites {
                action:
                    FavoritesAction::Add {
                        name,
                        country,
                        lat,
                        lon,
                    },
            } => {
                assert_eq!(name, "Rio");
                assert_eq!(country.as_deref(), Some("BR"));
                assert_eq!(lat, Some(-22.9));
                assert_eq!(lon, Some(-43.2));
            }
            _ => panic!("expected favorites add"),
        }
    }

    #[test]
    fn test_lat_requires_lon() {
        let result = Cli::try_parse_from(["ecoair", "favorites", "add", "Rio", "--lat", "1.0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ecoair",
            "stats",
            "--backend",
            "key-value",
            "--format",
            "json",
            "--data-dir",
            "/tmp/x",
        ])
        .unwrap();
        assert_eq!(cli.backend, Some(BackendArg::KeyValue));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["ecoair", "-v", "-q", "stats"]).is_err());
    }

    #[test]
    fn test_backend_arg_maps_to_choice() {
        assert_eq!(
            BackendChoice::from(BackendArg::KeyValue),
            BackendChoice::KeyValue
        );
        assert_eq!(BackendChoice::from(BackendArg::Auto), BackendChoice::Auto);
    }
}
