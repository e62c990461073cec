//! In-process cache backend.
//!
//! Holds entries as serialized JSON so it behaves exactly like
//! [`crate::FileCache`] (same encoding, same empty-entry semantics) without
//! touching the filesystem. The test suites use it in place of a directory.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use police_map_records_models::PoliceRecord;

use crate::{CacheError, CacheKey, RegionCache};

/// Non-durable cache living for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<CacheKey, String>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<CacheKey, String>> {
        // A poisoned map is still a consistent map; entries are replaced whole.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RegionCache for MemoryCache {
    fn lookup<R: PoliceRecord>(&self, key: &CacheKey) -> Result<Option<Vec<R>>, CacheError> {
        let entries = self.lock();
        let Some(json) = entries.get(key) else {
            return Ok(None);
        };

        serde_json::from_str(json)
            .map(Some)
            .map_err(|source| CacheError::Json {
                path: PathBuf::from(key.file_name()),
                source,
            })
    }

    fn store<R: PoliceRecord>(&self, key: &CacheKey, records: &[R]) -> Result<(), CacheError> {
        let json = serde_json::to_string(records).map_err(|source| CacheError::Json {
            path: PathBuf::from(key.file_name()),
            source,
        })?;
        self.lock().insert(key.clone(), json);
        Ok(())
    }

    fn contains(&self, key: &CacheKey) -> bool {
        self.lock().contains_key(key)
    }
}
