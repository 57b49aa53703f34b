//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::extract::ExtractConfig;
use crate::fetch::FetcherConfig;
use crate::models::{Settings, DEFAULT_DAILY_MINUTES, DEFAULT_PLAYBACK_SPEED};

/// Prefix for environment overrides, e.g. `PLANNER_DEFAULTS__DAILY_MINUTES=45`.
pub const ENV_PREFIX: &str = "PLANNER";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Planner defaults used until the user saves their own settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerDefaults {
    #[serde(default = "default_playback_speed")]
    pub playback_speed: f64,

    #[serde(default = "default_daily_minutes")]
    pub daily_minutes: f64,
}

fn default_playback_speed() -> f64 {
    DEFAULT_PLAYBACK_SPEED
}

fn default_daily_minutes() -> f64 {
    DEFAULT_DAILY_MINUTES
}

impl Default for PlannerDefaults {
    fn default() -> Self {
        Self {
            playback_speed: default_playback_speed(),
            daily_minutes: default_daily_minutes(),
        }
    }
}

impl PlannerDefaults {
    pub fn settings(&self) -> Settings {
        Settings {
            playback_speed: self.playback_speed,
            daily_minutes: self.daily_minutes,
            ..Settings::default()
        }
    }
}

/// Page fetching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_user_agent() -> String {
    FetcherConfig::default().user_agent
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            cache_ttl_seconds: default_cache_ttl(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchSettings {
    /// Fetcher configuration caching into `cache_dir`.
    pub fn fetcher_config(&self, cache_dir: PathBuf, fresh: bool) -> FetcherConfig {
        FetcherConfig {
            cache_dir,
            cache_ttl: Duration::from_secs(self.cache_ttl_seconds),
            timeout: Duration::from_secs(self.timeout_seconds),
            user_agent: self.user_agent.clone(),
            fresh,
            ..FetcherConfig::default()
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub defaults: PlannerDefaults,

    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub fetch: FetchSettings,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            defaults: PlannerDefaults::default(),
            extract: ExtractConfig::default(),
            fetch: FetchSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load an optional TOML file, then apply `PLANNER_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: &Path, prefix: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = ::config::Config::builder()
            .add_source(
                ::config::File::from(path.to_path_buf())
                    .format(::config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.defaults.playback_speed > 0.0) {
            return Err(ConfigError::ValidationError(
                "Default playback speed must be greater than 0".to_string(),
            ));
        }

        if !(self.defaults.daily_minutes > 0.0) {
            return Err(ConfigError::ValidationError(
                "Default daily minutes must be greater than 0".to_string(),
            ));
        }

        if self.extract.max_videos == 0 {
            return Err(ConfigError::ValidationError(
                "max_videos must be greater than 0".to_string(),
            ));
        }

        if self.fetch.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Fetch timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
