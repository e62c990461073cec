#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation configuration, region, report, and summary types.

pub mod config;

use std::collections::BTreeMap;
use std::path::PathBuf;

use police_map_records_models::{CrimeRecord, StopSearchRecord};
use serde::{Deserialize, Serialize};

pub use config::{
    AggregateConfig, CONFIG_ENV_VAR, ConfigError, DEFAULT_REQUEST_DELAY_MS, DEFAULT_TIMEOUT_SECS,
    PeriodRange, RegionLayout,
};

/// A named area with one boundary file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region {
    /// Boundary file stem. Also the cache key component.
    pub name: String,
    /// Police force directory the file was found in, if any.
    pub force: Option<String>,
    /// Path to the KML boundary file.
    pub path: PathBuf,
}

/// Counters describing one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Boundary files found.
    pub regions_discovered: u64,
    /// `(period, region)` steps whose boundary parsed.
    pub regions_processed: u64,
    /// `(period, region)` steps skipped because the boundary did not parse.
    pub regions_skipped: u64,
    /// Remote API calls made.
    pub live_calls: u64,
    /// Fetches served from the cache.
    pub cache_hits: u64,
    /// Pacing pauses taken.
    pub pauses: u64,
    /// Rows removed for missing latitude or longitude.
    pub rows_dropped: u64,
    /// Rows removed as duplicates.
    pub duplicates_removed: u64,
}

/// The unified collections produced by a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOutput {
    /// Street-level crimes across all regions and periods.
    pub crimes: Vec<CrimeRecord>,
    /// Stop-and-search events across all regions and periods.
    pub stop_searches: Vec<StopSearchRecord>,
    /// What the run did.
    pub report: RunReport,
}

/// Simple counts over an [`AggregateOutput`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Crimes per crime type.
    pub crimes_by_type: BTreeMap<String, u64>,
    /// Crimes per month (`YYYY-MM`).
    pub crimes_by_month: BTreeMap<String, u64>,
    /// Stop-and-search events per object of search.
    pub stops_by_object: BTreeMap<String, u64>,
}

/// How much of a run's expected cache is already populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    /// Entries a full run would read or write.
    pub expected: u64,
    /// Entries already present.
    pub present: u64,
    /// Keys (`region/period/kind`) not yet cached.
    pub missing: Vec<String>,
}

impl CacheStatus {
    /// Whether a run would make no remote calls.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.present == self.expected
    }
}
