//! In-memory local cache.
//!
//! Holds the encoded snapshot bytes rather than the snapshot itself, so a
//! load goes through the same decode path as [`FileCache`](crate::FileCache)
//! and tests can plant arbitrary bytes to simulate corruption.

use std::sync::{Arc, Mutex};

use crate::cache::{CacheLoad, CacheSnapshot, LocalCache, decode, encode};
use crate::error::CacheError;

/// A [`LocalCache`] kept in process memory. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemoryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored bytes verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the lock is poisoned.
    pub fn overwrite(&self, bytes: &[u8]) -> Result<(), CacheError> {
        let mut stored = self.bytes.lock().map_err(|_poison| CacheError::Poisoned)?;
        stored.clear();
        stored.extend_from_slice(bytes);
        Ok(())
    }
}

impl LocalCache for MemoryCache {
    fn load(&self) -> Result<CacheLoad, CacheError> {
        let stored = self.bytes.lock().map_err(|_poison| CacheError::Poisoned)?;
        Ok(decode(&stored))
    }

    fn store(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        let bytes = encode(snapshot)?;
        let mut stored = self.bytes.lock().map_err(|_poison| CacheError::Poisoned)?;
        *stored = bytes;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        cache.store(&CacheSnapshot::empty()).unwrap();
        assert_eq!(other.load().unwrap(), CacheLoad::Ready(CacheSnapshot::empty()));
    }

    #[test]
    fn overwrite_plants_corruption() {
        let cache = MemoryCache::new();
        cache.overwrite(b"[]").unwrap();
        assert!(matches!(cache.load().unwrap(), CacheLoad::NeedsResync { .. }));
    }
}
