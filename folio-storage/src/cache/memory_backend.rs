//! In-memory cache backend.
//!
//! Entries are held as JSON bytes so that a value goes through the same
//! encode/decode path it would with a persistent backend.

use std::collections::HashMap;
use std::sync::RwLock;

use folio_core::{FolioResult, StorageError};

use super::entry::{CacheEntry, Lookup};
use super::key::CacheKey;
use super::traits::{CacheBackend, CacheStats, CacheableValue};

/// Process-local cache backend.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<CacheKey, Vec<u8>>>,
    stats: RwLock<CacheStats>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an entry is stored under `key`, without touching statistics.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }

    fn record<F: FnOnce(&mut CacheStats)>(&self, f: F) {
        if let Ok(mut stats) = self.stats.write() {
            f(&mut stats);
        }
    }
}

impl CacheBackend for InMemoryCacheBackend {
    fn get<T: CacheableValue>(&self, key: &CacheKey) -> FolioResult<Lookup<CacheEntry<T>>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        match entries.get(key) {
            Some(bytes) => {
                let entry: CacheEntry<T> =
                    serde_json::from_slice(bytes).map_err(|e| StorageError::Decode {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                self.record(|s| s.hits += 1);
                Ok(Lookup::Present(entry))
            }
            None => {
                self.record(|s| s.misses += 1);
                Ok(Lookup::Absent)
            }
        }
    }

    fn set<T: CacheableValue>(&self, key: &CacheKey, entry: &CacheEntry<T>) -> FolioResult<()> {
        let bytes = serde_json::to_vec(entry).map_err(|e| StorageError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.clone(), bytes);
        let count = entries.len() as u64;
        self.record(|s| {
            s.writes += 1;
            s.entry_count = count;
        });
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> FolioResult<bool> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        let existed = entries.remove(key).is_some();
        let count = entries.len() as u64;
        self.record(|s| {
            if existed {
                s.deletes += 1;
            }
            s.entry_count = count;
        });
        Ok(existed)
    }

    fn stats(&self) -> FolioResult<CacheStats> {
        let stats = self.stats.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(stats.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn key() -> CacheKey {
        CacheKey::new("folio_categories").unwrap()
    }

    #[test]
    fn test_get_absent() {
        let backend = InMemoryCacheBackend::new();
        let lookup = backend.get::<usize>(&key()).unwrap();
        assert!(lookup.is_absent());
        assert_eq!(backend.stats().unwrap().misses, 1);
    }

    #[test]
    fn test_set_then_get() {
        let backend = InMemoryCacheBackend::new();
        let entry = CacheEntry::new(2usize, Utc::now());
        backend.set(&key(), &entry).unwrap();

        let lookup = backend.get::<usize>(&key()).unwrap();
        assert_eq!(lookup, Lookup::Present(entry));
        assert!(backend.contains(&key()));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_stored_zero_is_present() {
        let backend = InMemoryCacheBackend::new();
        backend.set(&key(), &CacheEntry::new(0usize, Utc::now())).unwrap();
        let lookup = backend.get::<usize>(&key()).unwrap();
        assert_eq!(lookup.map(|e| e.value), Lookup::Present(0));
    }

    #[test]
    fn test_delete_reports_existence() {
        let backend = InMemoryCacheBackend::new();
        assert!(!backend.delete(&key()).unwrap());

        backend.set(&key(), &CacheEntry::new(true, Utc::now())).unwrap();
        assert!(backend.delete(&key()).unwrap());
        assert!(backend.is_empty());
        assert!(!backend.delete(&key()).unwrap());

        let stats = backend.stats().unwrap();
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.entry_count, 0);
    }

    #[test]
    fn test_get_with_wrong_type_is_decode_error() {
        let backend = InMemoryCacheBackend::new();
        backend
            .set(&key(), &CacheEntry::new("two".to_string(), Utc::now()))
            .unwrap();
        let err = backend.get::<usize>(&key()).unwrap_err();
        assert!(matches!(
            err,
            folio_core::FolioError::Storage(StorageError::Decode { .. })
        ));
    }
}
