//! Run configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! is a valid configuration. The CLI layers its flags on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use police_map_records_models::{DEFAULT_API_BASE_URL, Period};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Environment variable naming the default configuration file.
pub const CONFIG_ENV_VAR: &str = "POLICE_MAP_CONFIG";

/// Pause after a region that made at least one remote call.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 100;

/// Per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Errors that can occur loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// Config file location.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected shape.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// How boundary files are arranged under the boundaries directory.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RegionLayout {
    /// KML files directly in the directory.
    Flat,
    /// One subdirectory per police force, KML files inside.
    ByForce,
    /// Top-level KML files (no force) followed by each force subdirectory.
    #[default]
    Auto,
}

/// An inclusive month range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    /// First month.
    pub from: Period,
    /// Last month, inclusive.
    pub to: Period,
}

impl PeriodRange {
    /// Every month in the range, in order.
    #[must_use]
    pub fn months(self) -> Vec<Period> {
        Period::range(self.from, self.to)
    }
}

/// Everything an aggregation run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregateConfig {
    /// Police API base URL.
    pub api_base_url: String,
    /// Directory holding the KML boundary files.
    pub boundaries_dir: PathBuf,
    /// Directory holding cache entries.
    pub cache_dir: PathBuf,
    /// Explicit months to fetch.
    pub periods: Vec<Period>,
    /// Inclusive month range to fetch, after [`Self::periods`].
    pub period_range: Option<PeriodRange>,
    /// Boundary directory layout.
    pub layout: RegionLayout,
    /// Pause after each region that made a remote call, in milliseconds.
    pub request_delay_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Drop duplicate records after merging.
    pub dedupe: bool,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            boundaries_dir: PathBuf::from("boundaries"),
            cache_dir: PathBuf::from("cache"),
            periods: Vec::new(),
            period_range: None,
            layout: RegionLayout::default(),
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            dedupe: false,
        }
    }
}

impl AggregateConfig {
    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the text is not a valid config.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// The months to process: [`Self::periods`] followed by the expanded
    /// [`Self::period_range`], without repeats.
    #[must_use]
    pub fn resolved_periods(&self) -> Vec<Period> {
        let range = self.period_range.map(PeriodRange::months).unwrap_or_default();

        let mut resolved: Vec<Period> = Vec::with_capacity(self.periods.len() + range.len());
        for period in self.periods.iter().copied().chain(range) {
            if !resolved.contains(&period) {
                resolved.push(period);
            }
        }
        resolved
    }

    /// Pause taken after a region that made a remote call.
    #[must_use]
    pub const fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
