//! Layered configuration for fse-sync.
//!
//! Sources, lowest precedence first:
//! - Default values
//! - TOML file (`.fse-sync.toml` in the watched directory, or `--config`)
//! - Environment variables
//! - CLI arguments (applied by the caller after loading)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `FSE_SYNC_` and use double
//! underscores to separate nested levels:
//! - `FSE_SYNC_WATCH__FRAGMENT=my-theme` sets `watch.fragment`
//! - `FSE_SYNC_WATCH__DEBOUNCE_MS=1000` sets `watch.debounce_ms`
//! - `FSE_SYNC_LOGGING__DEFAULT=info` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::pipeline::{DEFAULT_DESTINATIONS, DEFAULT_TEMP_DIR, DEFAULT_THEME_DIR, PipelineConfig};

/// Config file looked up in the watched directory.
pub const CONFIG_FILE_NAME: &str = ".fse-sync.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "FSE_SYNC_";
/// Fragment exported archives are recognized by.
pub const DEFAULT_FRAGMENT: &str = "edit-site-export";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// What to watch and how
    #[serde(default)]
    pub watch: WatchConfig,

    /// Where extracted content goes
    #[serde(default)]
    pub sync: SyncConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// Theme directory to watch; archives land here and are synced into it
    #[serde(default = "default_watch_dir")]
    pub dir: PathBuf,

    /// Substring an archive's file name must contain
    #[serde(default = "default_fragment")]
    pub fragment: String,

    /// Quiet period after the last write before an archive is processed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Process matching archives already present at startup
    #[serde(default)]
    pub process_existing: bool,

    /// Settled archives allowed to wait for the worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SyncConfig {
    /// Scratch directory, relative to the watched directory
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Directory inside the archive whose contents are copied
    #[serde(default = "default_theme_dir")]
    pub theme_dir: PathBuf,

    /// Directories deleted before each copy
    #[serde(default = "default_destinations")]
    pub destinations: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for everything without a module override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module levels, e.g. `fse_sync::watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 { 1 }
fn default_watch_dir() -> PathBuf { PathBuf::from(".") }
fn default_fragment() -> String { DEFAULT_FRAGMENT.to_string() }
fn default_debounce_ms() -> u64 { 300 }
fn default_queue_capacity() -> usize { 16 }
fn default_temp_dir() -> PathBuf { PathBuf::from(DEFAULT_TEMP_DIR) }
fn default_theme_dir() -> PathBuf { PathBuf::from(DEFAULT_THEME_DIR) }
fn default_destinations() -> Vec<PathBuf> {
    DEFAULT_DESTINATIONS.iter().map(PathBuf::from).collect()
}
fn default_log_level() -> String { "warn".to_string() }

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            watch: WatchConfig::default(),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            dir: default_watch_dir(),
            fragment: default_fragment(),
            debounce_ms: default_debounce_ms(),
            process_existing: false,
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            theme_dir: default_theme_dir(),
            destinations: default_destinations(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration for a watched directory.
    ///
    /// Reads `config_path` when given, otherwise `<dir>/.fse-sync.toml` if it
    /// exists. `watch.dir` defaults to `dir`.
    pub fn load(dir: &Path, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.join(CONFIG_FILE_NAME));

        let defaults = Settings {
            watch: WatchConfig {
                dir: dir.to_path_buf(),
                ..WatchConfig::default()
            },
            ..Settings::default()
        };

        Self::figment(defaults, &config_path)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Load configuration from a specific file, on top of the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::figment(Settings::default(), path.as_ref())
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    fn figment(defaults: Settings, config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(defaults))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels,
            // single underscores stay part of the field name
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
    }

    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                reason: reason.to_string(),
            })
        };

        if self.watch.fragment.is_empty() {
            return invalid("watch.fragment must not be empty");
        }
        if self.sync.destinations.is_empty() {
            return invalid("sync.destinations must list at least one directory");
        }
        check_contained("sync.temp_dir", &self.sync.temp_dir)?;
        check_contained("sync.theme_dir", &self.sync.theme_dir)?;
        for destination in &self.sync.destinations {
            check_contained("sync.destinations", destination)?;
        }
        Ok(())
    }

    /// The watched directory as an absolute, canonical path when possible.
    pub fn resolved_dir(&self) -> PathBuf {
        std::fs::canonicalize(&self.watch.dir).unwrap_or_else(|_| {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.watch.dir))
                .unwrap_or_else(|_| self.watch.dir.clone())
        })
    }

    /// Resolve sync paths against the watched directory.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let root = self.resolved_dir();
        PipelineConfig {
            temp_dir: root.join(&self.sync.temp_dir),
            theme_dir: self.sync.theme_dir.clone(),
            destinations: self
                .sync
                .destinations
                .iter()
                .map(|d| root.join(d))
                .collect(),
            root,
        }
    }

    /// Render the settings as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Paths the pipeline deletes must name something strictly inside the root.
fn check_contained(key: &str, path: &Path) -> Result<(), ConfigError> {
    let mut names_entry = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => names_entry = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::Invalid {
                    reason: format!(
                        "{key} entry '{}' must be a relative path without '..'",
                        path.display()
                    ),
                });
            }
        }
    }

    if !names_entry {
        return Err(ConfigError::Invalid {
            reason: format!(
                "{key} entry '{}' must name a directory below the watched directory",
                path.display()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.watch.fragment, "edit-site-export");
        assert_eq!(settings.watch.dir, PathBuf::from("."));
        assert!(!settings.watch.process_existing);
        assert_eq!(settings.sync.temp_dir, PathBuf::from("__temp_dir__"));
        assert_eq!(
            settings.sync.destinations,
            vec![PathBuf::from("templates"), PathBuf::from("parts")]
        );
        assert_eq!(settings.logging.default, "warn");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "fse-sync.toml",
                r#"
[watch]
fragment = "my-theme-export"
debounce_ms = 50

[sync]
destinations = ["templates", "parts", "patterns"]

[logging.modules]
fse_sync = "debug"
"#,
            )?;

            let settings = Settings::load_from("fse-sync.toml").unwrap();
            assert_eq!(settings.watch.fragment, "my-theme-export");
            assert_eq!(settings.watch.debounce_ms, 50);
            assert_eq!(settings.sync.destinations.len(), 3);
            assert_eq!(settings.logging.modules["fse_sync"], "debug");
            // Untouched sections keep their defaults
            assert_eq!(settings.sync.theme_dir, PathBuf::from("theme"));
            assert_eq!(settings.watch.queue_capacity, 16);
            Ok(())
        });
    }

    #[test]
    fn test_load_uses_dir_and_its_config_file() {
        Jail::expect_with(|jail| {
            jail.create_dir("site")?;
            jail.create_file(
                "site/.fse-sync.toml",
                r#"
                [watch]
                process_existing = true
                "#,
            )?;

            let settings = Settings::load(Path::new("site"), None).unwrap();
            assert_eq!(settings.watch.dir, PathBuf::from("site"));
            assert!(settings.watch.process_existing);
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let settings = Settings::load(Path::new("."), None).unwrap();
            assert_eq!(settings.watch.fragment, DEFAULT_FRAGMENT);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                ".fse-sync.toml",
                r#"
                [watch]
                fragment = "from-file"
                debounce_ms = 10
                "#,
            )?;
            jail.set_env("FSE_SYNC_WATCH__FRAGMENT", "from-env");
            jail.set_env("FSE_SYNC_LOGGING__DEFAULT", "debug");

            let settings = Settings::load(Path::new("."), None).unwrap();
            assert_eq!(settings.watch.fragment, "from-env");
            assert_eq!(settings.watch.debounce_ms, 10);
            assert_eq!(settings.logging.default, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file("broken.toml", "[watch\nfragment = ")?;

            assert!(matches!(
                Settings::load_from("broken.toml"),
                Err(ConfigError::Load(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.watch.fragment.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.sync.destinations.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.sync.temp_dir = PathBuf::from(".");
        assert!(settings.validate().is_err());
    }

    fn with_temp_dir(path: &str) -> Settings {
        let mut settings = Settings::default();
        settings.sync.temp_dir = PathBuf::from(path);
        settings
    }

    fn with_destinations(paths: &[&str]) -> Settings {
        let mut settings = Settings::default();
        settings.sync.destinations = paths.iter().map(PathBuf::from).collect();
        settings
    }

    fn is_invalid(settings: &Settings) -> bool {
        matches!(settings.validate(), Err(ConfigError::Invalid { .. }))
    }

    #[test]
    fn test_temp_dir_must_stay_below_root() {
        assert!(is_invalid(&with_temp_dir("")));
        assert!(is_invalid(&with_temp_dir("./.")));
        assert!(is_invalid(&with_temp_dir("..")));
        assert!(is_invalid(&with_temp_dir("sub/..")));
        assert!(is_invalid(&with_temp_dir("../elsewhere")));
        assert!(is_invalid(&with_temp_dir("/tmp/__temp_dir__")));

        assert!(with_temp_dir("./scratch").validate().is_ok());
        assert!(with_temp_dir(".cache/fse-sync").validate().is_ok());
    }

    #[test]
    fn test_destinations_must_stay_below_root() {
        assert!(is_invalid(&with_destinations(&["."])));
        assert!(is_invalid(&with_destinations(&[".."])));
        assert!(is_invalid(&with_destinations(&["/"])));
        assert!(is_invalid(&with_destinations(&["templates", "/etc"])));
        assert!(is_invalid(&with_destinations(&["parts/../.."])));

        assert!(with_destinations(&["templates", "parts/custom"]).validate().is_ok());
    }

    #[test]
    fn test_theme_dir_must_stay_inside_archive() {
        let mut settings = Settings::default();
        settings.sync.theme_dir = PathBuf::from("../theme");
        assert!(is_invalid(&settings));

        settings.sync.theme_dir = PathBuf::from("/theme");
        assert!(is_invalid(&settings));

        settings.sync.theme_dir = PathBuf::from("export/theme");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_cannot_point_deletes_outside_root() {
        Jail::expect_with(|jail| {
            jail.set_env("FSE_SYNC_SYNC__TEMP_DIR", "..");
            let settings = Settings::load(Path::new("."), None).unwrap();
            assert!(is_invalid(&settings));
            Ok(())
        });
    }

    #[test]
    fn test_to_pipeline_config_resolves_against_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.watch.dir = temp_dir.path().to_path_buf();

        let config = settings.to_pipeline_config();
        let root = fs::canonicalize(temp_dir.path()).unwrap();

        assert_eq!(config.root, root);
        assert_eq!(config.temp_dir, root.join("__temp_dir__"));
        assert_eq!(config.destinations[0], root.join("templates"));
        assert_eq!(config.theme_source(), root.join("__temp_dir__/theme"));
    }

    #[test]
    fn test_toml_round_trip_is_loadable() {
        Jail::expect_with(|jail| {
            let mut settings = Settings::default();
            settings.watch.fragment = "twentytwentyfive".to_string();
            jail.create_file("settings.toml", &settings.to_toml().unwrap())?;

            let loaded = Settings::load_from("settings.toml").unwrap();
            assert_eq!(loaded, settings);
            Ok(())
        });
    }
}
