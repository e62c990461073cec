//! Configuration flags shared by every subcommand that reads the
//! boundaries tree.

use std::path::PathBuf;

use clap::Args;
use police_map_aggregate_models::{
    AggregateConfig, CONFIG_ENV_VAR, ConfigError, PeriodRange, RegionLayout,
};
use police_map_records_models::Period;

/// Config file selection plus per-field overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML config file (defaults to `$POLICE_MAP_CONFIG` when set)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the KML boundary files
    #[arg(long)]
    pub boundaries: Option<PathBuf>,

    /// Directory holding cached API responses
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Month to fetch (`YYYY-MM`); repeat for several months
    #[arg(long = "period", value_name = "YYYY-MM")]
    pub periods: Vec<Period>,

    /// First month of an inclusive range
    #[arg(long, value_name = "YYYY-MM", requires = "to")]
    pub from: Option<Period>,

    /// Last month of an inclusive range
    #[arg(long, value_name = "YYYY-MM", requires = "from")]
    pub to: Option<Period>,

    /// Boundary layout: `flat`, `by_force`, or `auto`
    #[arg(long)]
    pub layout: Option<RegionLayout>,

    /// Pause after each region that called the API, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Police API base URL
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Drop duplicate records after merging (`--dedupe=false` turns it off)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub dedupe: Option<bool>,
}

impl ConfigArgs {
    /// Loads the config file (if any) and applies the flag overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn resolve(&self) -> Result<AggregateConfig, ConfigError> {
        let mut config = match self.config_path() {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                AggregateConfig::load(&path)?
            }
            None => AggregateConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }

    /// Overwrites every field given on the command line.
    pub fn apply(&self, config: &mut AggregateConfig) {
        if let Some(dir) = &self.boundaries {
            config.boundaries_dir.clone_from(dir);
        }
        if let Some(dir) = &self.cache {
            config.cache_dir.clone_from(dir);
        }
        if !self.periods.is_empty() {
            config.periods.clone_from(&self.periods);
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            config.period_range = Some(PeriodRange { from, to });
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        if let Some(delay) = self.delay_ms {
            config.request_delay_ms = delay;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(url) = &self.api_base_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(dedupe) = self.dedupe {
            config.dedupe = dedupe;
        }
    }
}
