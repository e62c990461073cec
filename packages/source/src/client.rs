//! Cache-first ingestion.
//!
//! [`IngestClient::fetch`] consults the cache before every remote call and
//! writes back whatever the call produced, including nothing. A failed
//! call is logged and cached as an empty collection, so each
//! `(region, period, kind)` reaches the network at most once for the life
//! of the cache.

use police_map_cache::{CacheKey, RegionCache};
use police_map_records_models::Period;

use crate::normalize::{FromRaw, normalize_all};
use crate::{PoliceApi, QueryArea};

/// Result of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<R> {
    /// Normalized records, possibly empty.
    pub records: Vec<R>,
    /// Whether a remote call was made (`false` on a cache hit).
    pub was_live: bool,
}

/// Fetches records through a cache.
#[derive(Debug)]
pub struct IngestClient<A, C> {
    api: A,
    cache: C,
}

impl<A: PoliceApi, C: RegionCache> IngestClient<A, C> {
    /// Creates a client over `api` backed by `cache`.
    pub const fn new(api: A, cache: C) -> Self {
        Self { api, cache }
    }

    /// The cache backing this client.
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns the records of kind `R` for `region` in `period`.
    ///
    /// Never fails: transport errors, bad statuses, and unusable bodies
    /// yield an empty collection. The only observable difference between a
    /// hit and a miss is [`Fetched::was_live`].
    pub fn fetch<R: FromRaw>(&self, area: &QueryArea, period: Period, region: &str) -> Fetched<R> {
        let key = CacheKey::new(region, period, R::KIND);

        match self.cache.lookup::<R>(&key) {
            Ok(Some(records)) => {
                log::debug!("Cache hit {key} ({} records)", records.len());
                return Fetched {
                    records,
                    was_live: false,
                };
            }
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring unreadable cache entry {key}: {e}"),
        }

        let records = match self.api.query(R::KIND, area, period) {
            Ok(raw) => normalize_all(&raw, region, period),
            Err(e) => {
                log::warn!("Fetching {} for {region} {period} failed: {e}", R::KIND.label());
                Vec::new()
            }
        };

        log::info!(
            "Fetched {} {} for {region} {period}",
            records.len(),
            R::KIND.label()
        );

        if let Err(e) = self.cache.store(&key, &records) {
            log::warn!("Failed to cache {key}: {e}");
        }

        Fetched {
            records,
            was_live: true,
        }
    }
}
