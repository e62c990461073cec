//! Directory-of-files cache backend.
//!
//! Each entry is one JSON array in `{cache_dir}/{region}_{period}_{kind}.json`.
//! Entries are written to a temporary sibling and renamed into place, so an
//! interrupted run leaves either the complete entry or none at all.

use std::path::{Path, PathBuf};

use police_map_records_models::PoliceRecord;

use crate::{CacheError, CacheKey, RegionCache};

/// Durable cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Opens (or creates) a cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    /// The cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `key`.
    #[must_use]
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl RegionCache for FileCache {
    fn lookup<R: PoliceRecord>(&self, key: &CacheKey) -> Result<Option<Vec<R>>, CacheError> {
        let path = self.entry_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let records =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Json { path, source })?;
        Ok(Some(records))
    }

    fn store<R: PoliceRecord>(&self, key: &CacheKey, records: &[R]) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let json = serde_json::to_vec(records).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;

        log::debug!("Cached {} {} record(s) at {}", records.len(), key, path.display());
        Ok(())
    }

    fn contains(&self, key: &CacheKey) -> bool {
        self.entry_path(key).is_file()
    }
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
