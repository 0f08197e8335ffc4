//! File-backed local cache.
//!
//! The snapshot is one JSON file. A store writes the new snapshot to a
//! sibling `.tmp` file, flushes it to disk, then renames it over the old
//! file, so a crash mid-write leaves the previous snapshot intact.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::cache::{CacheLoad, CacheSnapshot, LocalCache, decode, encode};
use crate::error::CacheError;

/// A [`LocalCache`] stored in a single file.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    /// A cache at `path`. Nothing is touched until the first load or store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalCache for FileCache {
    fn load(&self) -> Result<CacheLoad, CacheError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(decode(&bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(CacheLoad::Empty),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        let bytes = encode(snapshot)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            events = snapshot.events.len(),
            pending = snapshot.pending.len(),
            "stored local cache"
        );
        Ok(())
    }
}
