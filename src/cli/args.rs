//! CLI argument parsing using clap.

use clap::{
    Parser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Watch a theme directory for site editor exports and sync them in
#[derive(Parser, Debug)]
#[command(
    name = "fse-sync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Sync site editor exports into a block theme",
    long_about = "Watches a theme directory for a zip exported from the site editor, \
                  extracts it, and replaces ./templates and ./parts with the exported ones.",
    styles = clap_cargo_style(),
    after_help = "Examples:\n  fse-sync\n  fse-sync my-theme-export\n  fse-sync -C ./wp-content/themes/mytheme --process-existing\n  fse-sync --once edit-site-export.zip"
)]
pub struct Cli {
    /// Substring the exported zip's file name must contain [default: edit-site-export]
    #[arg(value_name = "FRAGMENT")]
    pub fragment: Option<String>,

    /// Theme directory to watch and sync into
    #[arg(short = 'C', long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Path to a config file (defaults to <DIR>/.fse-sync.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Quiet period after the last write before an archive is processed
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Also process matching archives already in the directory at startup
    #[arg(long)]
    pub process_existing: bool,

    /// Process a single archive and exit instead of watching
    #[arg(long, value_name = "ARCHIVE", conflicts_with = "process_existing")]
    pub once: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Directory the settings are loaded for.
    pub fn watch_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
