/// Forecast configuration loader - parses forecast.toml
///
/// Keeps the default coordinate, history window, model hyperparameters and
/// data source settings in one struct that is passed explicitly through the
/// pipeline, so every layer sees the same values. Every field has a default;
/// a missing file yields `ForecastConfig::default()`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::forecast::forest::ForestParams;
use crate::model::{Coordinate, Variable};

/// Default file name, resolved against the current working directory.
pub const DEFAULT_CONFIG_PATH: &str = "forecast.toml";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration for the forecast pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Coordinate used when a request omits `lat`/`lon`
    pub latitude: f64,
    pub longitude: f64,

    /// Number of prior years to collect (one fetch per year)
    pub years: u32,

    /// Half-width of the calendar window around the target date, in days
    pub window_days: u32,

    /// Sliding window length, in hourly rows
    pub window_hours: usize,

    /// Tree ensemble settings
    pub trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,

    /// Worker threads for the per-year fetches (defaults to `years`)
    pub fetch_workers: Option<usize>,

    /// Worker threads for tree training
    pub training_workers: usize,

    pub source: SourceConfig,
    pub server: ServerConfig,
}

/// Outbound data source settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub community: String,
    pub parameters: Vec<Variable>,

    /// Per-request timeout; 0 waits indefinitely
    pub timeout_secs: u64,
}

/// Inbound HTTP settings (bind address comes from the environment).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub workers: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            latitude: -23.08720429991206,
            longitude: -47.2100151415641,
            years: 5,
            window_days: 7,
            window_hours: 24,
            trees: 30,
            seed: 42,
            max_depth: None,
            min_samples_leaf: 1,
            fetch_workers: None,
            training_workers: 4,
            source: SourceConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://power.larc.nasa.gov/api/temporal/hourly/point".to_string(),
            community: "AG".to_string(),
            parameters: Variable::ALL.to_vec(),
            timeout_secs: 120,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

impl ForecastConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ForecastConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("config path={} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years == 0 {
            return Err(ConfigError::Invalid("years must be at least 1".into()));
        }
        if self.window_hours == 0 {
            return Err(ConfigError::Invalid("window_hours must be at least 1".into()));
        }
        if self.trees == 0 {
            return Err(ConfigError::Invalid("trees must be at least 1".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(ConfigError::Invalid("min_samples_leaf must be at least 1".into()));
        }
        if self.fetch_workers == Some(0) || self.training_workers == 0 || self.server.workers == 0 {
            return Err(ConfigError::Invalid("worker counts must be at least 1".into()));
        }
        if self.source.parameters.is_empty() {
            return Err(ConfigError::Invalid("source.parameters must not be empty".into()));
        }
        Ok(())
    }

    /// Coordinate used when a request does not carry one.
    pub fn default_coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn fetch_workers(&self) -> usize {
        self.fetch_workers.unwrap_or(self.years as usize).max(1)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.source.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Converts the ensemble settings into `ForestParams`.
///
/// Bridges the configuration layer and the model so the forest itself never
/// depends on `ForecastConfig`.
impl From<&ForecastConfig> for ForestParams {
    fn from(config: &ForecastConfig) -> Self {
        ForestParams {
            trees: config.trees,
            seed: config.seed,
            max_depth: config.max_depth,
            min_samples_leaf: config.min_samples_leaf,
            workers: config.training_workers,
        }
    }
}

/// Resolves the bind address from `PREVER_HOST` / `PREVER_PORT`.
pub fn bind_address_from_env() -> (String, u16) {
    let host = std::env::var("PREVER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = std::env::var("PREVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    (host, port)
}

/// Resolves the config file path from `PREVER_CONFIG`.
pub fn config_path_from_env() -> PathBuf {
    std::env::var("PREVER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}
