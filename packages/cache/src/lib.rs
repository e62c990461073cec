#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region cache for fetched record collections.
//!
//! Keyed by `(region, period, kind)`. An entry, once written, is the
//! authoritative answer for its key: nothing here expires, refreshes, or
//! deletes entries. Empty collections are stored too, recording that a
//! fetch was attempted so it is never repeated.
//!
//! The cache has a single writer. Running two ingestion processes against
//! the same cache directory at once is unsupported.

pub mod file;
pub mod memory;

use std::fmt;
use std::path::PathBuf;

use police_map_records_models::{Period, PoliceRecord, RecordKind};

pub use file::FileCache;
pub use memory::MemoryCache;

/// Errors that can occur reading or writing cache entries.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error (file read/write, directory creation).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be serialized or deserialized.
    #[error("Corrupt cache entry {}: {source}", path.display())]
    Json {
        /// Entry location.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

/// Identifies one cached collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    /// Region name (the boundary file stem).
    pub region: String,
    /// Month the collection covers.
    pub period: Period,
    /// Crime or stop-and-search.
    pub kind: RecordKind,
}

impl CacheKey {
    /// Creates a key.
    #[must_use]
    pub fn new(region: impl Into<String>, period: Period, kind: RecordKind) -> Self {
        Self {
            region: region.into(),
            period,
            kind,
        }
    }

    /// File name for this entry: `{region}_{period}_{kind}.json`.
    ///
    /// Renaming a boundary file changes its region name and therefore
    /// orphans any entries written under the old name.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.json",
            self.region,
            self.period,
            self.kind.cache_tag()
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.region, self.period, self.kind)
    }
}

/// A store of previously fetched collections.
pub trait RegionCache {
    /// Returns the cached collection for `key`, or `None` if the key has
    /// never been stored. Has no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if an existing entry cannot be read or decoded.
    fn lookup<R: PoliceRecord>(&self, key: &CacheKey) -> Result<Option<Vec<R>>, CacheError>;

    /// Writes `records` as the entry for `key`, replacing any existing
    /// entry. Empty collections are stored like any other.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the entry cannot be encoded or written.
    fn store<R: PoliceRecord>(&self, key: &CacheKey, records: &[R]) -> Result<(), CacheError>;

    /// Whether an entry exists for `key`, without decoding it.
    fn contains(&self, key: &CacheKey) -> bool;
}

impl<T: RegionCache + ?Sized> RegionCache for &T {
    fn lookup<R: PoliceRecord>(&self, key: &CacheKey) -> Result<Option<Vec<R>>, CacheError> {
        (**self).lookup(key)
    }

    fn store<R: PoliceRecord>(&self, key: &CacheKey, records: &[R]) -> Result<(), CacheError> {
        (**self).store(key, records)
    }

    fn contains(&self, key: &CacheKey) -> bool {
        (**self).contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_naming_contract() {
        let period: Period = "2025-04".parse().unwrap();
        let crime = CacheKey::new("Salisbury_City", period, RecordKind::Crime);
        let stops = CacheKey::new("Salisbury_City", period, RecordKind::StopAndSearch);
        assert_eq!(crime.file_name(), "Salisbury_City_2025-04_street.json");
        assert_eq!(stops.file_name(), "Salisbury_City_2025-04_stop_and_search.json");
    }

    #[test]
    fn kinds_never_collide() {
        let period: Period = "2025-04".parse().unwrap();
        let crime = CacheKey::new("area", period, RecordKind::Crime);
        let stops = CacheKey::new("area", period, RecordKind::StopAndSearch);
        assert_ne!(crime, stops);
        assert_ne!(crime.file_name(), stops.file_name());
    }
}
