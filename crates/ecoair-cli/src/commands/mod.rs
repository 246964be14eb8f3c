//! Command implementations for the CLI.

mod cache;
mod config;
mod data;
mod favorites;
mod measurements;
mod prefs;
mod search;

pub use cache::cmd_cache;
pub use config::cmd_config;
pub use data::{cmd_export, cmd_import, cmd_reset, cmd_stats};
pub use favorites::cmd_favorites;
pub use measurements::cmd_measure;
pub use prefs::cmd_prefs;
pub use search::cmd_search;

use crate::cli::OutputFormat;

/// Output settings shared by every storage command.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub no_color: bool,
    pub quiet: bool,
}

impl OutputOptions {
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Print a confirmation line unless quiet or emitting JSON.
    pub fn notice(&self, message: impl AsRef<str>) {
        if !self.quiet && !self.is_json() {
            println!("{}", message.as_ref());
        }
    }
}
