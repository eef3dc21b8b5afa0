//! Command implementations for the CLI.
//!
//! Each mode is implemented in its own module.

pub mod config;
pub mod once;
pub mod watch;

use crate::config::Settings;

/// Destination names as shown in banners.
pub(crate) fn destination_names(settings: &Settings) -> Vec<String> {
    settings
        .sync
        .destinations
        .iter()
        .map(|d| d.display().to_string())
        .collect()
}
