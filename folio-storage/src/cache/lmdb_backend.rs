//! LMDB-backed cache implementation.
//!
//! Uses the heed crate (Rust bindings for LMDB) to keep derived values in a
//! memory-mapped file, so an entry survives process restarts and is shared
//! by every process that opens the same environment.
//!
//! # Entry Format
//!
//! `[computed_at millis: 8 bytes LE][valid_until millis: 8 bytes LE][json value]`
//!
//! A `valid_until` of `i64::MIN` means the entry has no expiry.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The backend uses:
//! - Read transactions for `get`, `keys`
//! - Write transactions for `set`, `delete`, `clear`
//! - Statistics behind a `RwLock`

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use folio_core::{FolioError, FolioResult, StorageError};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use super::entry::{CacheEntry, Lookup};
use super::key::CacheKey;
use super::traits::{CacheBackend, CacheStats, CacheableValue};

const HEADER_LEN: usize = 16;
const NO_EXPIRY: i64 = i64::MIN;

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for FolioError {
    fn from(e: LmdbCacheError) -> Self {
        FolioError::Storage(StorageError::TransactionFailed {
            backend: "lmdb",
            reason: e.to_string(),
        })
    }
}

fn txn_err(e: heed::Error) -> LmdbCacheError {
    LmdbCacheError::Transaction(e.to_string())
}

/// LMDB-backed cache backend.
///
/// # Example
///
/// ```ignore
/// use folio_storage::cache::{CacheBackend, CacheEntry, CacheKey, LmdbCacheBackend};
///
/// let backend = LmdbCacheBackend::new("/var/lib/folio/cache", 16)?;
/// let key = CacheKey::new("folio_categories")?;
/// backend.set(&key, &CacheEntry::new(2usize, Utc::now()))?;
/// let cached = backend.get::<usize>(&key)?;
/// ```
pub struct LmdbCacheBackend {
    env: Env,
    db: Database<Bytes, Bytes>,
    path: PathBuf,
    stats: RwLock<CacheStats>,
}

impl LmdbCacheBackend {
    /// Open (or create) an LMDB cache backend.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment directory is owned by this backend and the
        // memory map is never resized while transactions are open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        let entry_count = {
            let rtxn = env.read_txn().map_err(txn_err)?;
            db.len(&rtxn).map_err(txn_err)?
        };

        tracing::debug!(path = %path.as_ref().display(), entry_count, "Opened LMDB cache");

        Ok(Self {
            env,
            db,
            path: path.as_ref().to_path_buf(),
            stats: RwLock::new(CacheStats {
                entry_count,
                ..CacheStats::default()
            }),
        })
    }

    /// Directory holding the environment.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All keys currently stored, in key order.
    ///
    /// Stored keys that are not valid `CacheKey`s are skipped.
    pub fn keys(&self) -> Result<Vec<CacheKey>, LmdbCacheError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let iter = self.db.iter(&rtxn).map_err(txn_err)?;

        let mut keys = Vec::new();
        for result in iter {
            match result {
                Ok((key, _)) => {
                    if let Some(key) = CacheKey::decode(key) {
                        keys.push(key);
                    }
                }
                Err(_) => continue,
            }
        }
        Ok(keys)
    }

    /// Delete every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<u64, LmdbCacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let removed = self.db.len(&wtxn).map_err(txn_err)?;
        self.db.clear(&mut wtxn).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;

        if let Ok(mut stats) = self.stats.write() {
            stats.deletes += removed;
            stats.entry_count = 0;
        }
        Ok(removed)
    }

    fn record<F: FnOnce(&mut CacheStats)>(&self, f: F) {
        if let Ok(mut stats) = self.stats.write() {
            f(&mut stats);
        }
    }
}

fn encode_entry<T: CacheableValue>(
    key: &CacheKey,
    entry: &CacheEntry<T>,
) -> Result<Vec<u8>, StorageError> {
    let value_bytes = serde_json::to_vec(&entry.value).map_err(|e| StorageError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    let valid_until = entry
        .valid_until
        .map(|t| t.timestamp_millis())
        .unwrap_or(NO_EXPIRY);

    let mut bytes = Vec::with_capacity(HEADER_LEN + value_bytes.len());
    bytes.extend_from_slice(&entry.computed_at.timestamp_millis().to_le_bytes());
    bytes.extend_from_slice(&valid_until.to_le_bytes());
    bytes.extend_from_slice(&value_bytes);
    Ok(bytes)
}

fn decode_entry<T: CacheableValue>(
    key: &CacheKey,
    bytes: &[u8],
) -> Result<CacheEntry<T>, StorageError> {
    let corrupt = |reason: String| StorageError::Decode {
        key: key.to_string(),
        reason,
    };
    if bytes.len() < HEADER_LEN {
        return Err(corrupt(format!("entry is {} bytes, header needs {}", bytes.len(), HEADER_LEN)));
    }

    let read_i64 = |range: std::ops::Range<usize>| -> Result<i64, StorageError> {
        let raw: [u8; 8] = bytes[range]
            .try_into()
            .map_err(|_| corrupt("invalid timestamp".to_string()))?;
        Ok(i64::from_le_bytes(raw))
    };
    let computed_at = DateTime::<Utc>::from_timestamp_millis(read_i64(0..8)?)
        .ok_or_else(|| corrupt("computed_at out of range".to_string()))?;
    let valid_until = match read_i64(8..16)? {
        NO_EXPIRY => None,
        millis => Some(
            DateTime::<Utc>::from_timestamp_millis(millis)
                .ok_or_else(|| corrupt("valid_until out of range".to_string()))?,
        ),
    };
    let value: T =
        serde_json::from_slice(&bytes[HEADER_LEN..]).map_err(|e| corrupt(e.to_string()))?;

    Ok(CacheEntry {
        value,
        computed_at,
        valid_until,
    })
}

impl CacheBackend for LmdbCacheBackend {
    fn get<T: CacheableValue>(&self, key: &CacheKey) -> FolioResult<Lookup<CacheEntry<T>>> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;

        match self.db.get(&rtxn, key.as_bytes()) {
            Ok(Some(bytes)) => {
                self.record(|s| s.hits += 1);
                let entry = decode_entry(key, bytes)?;
                Ok(Lookup::Present(entry))
            }
            Ok(None) => {
                self.record(|s| s.misses += 1);
                Ok(Lookup::Absent)
            }
            Err(e) => {
                self.record(|s| s.misses += 1);
                Err(txn_err(e).into())
            }
        }
    }

    fn set<T: CacheableValue>(&self, key: &CacheKey, entry: &CacheEntry<T>) -> FolioResult<()> {
        let bytes = encode_entry(key, entry)?;

        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db
            .put(&mut wtxn, key.as_bytes(), &bytes)
            .map_err(txn_err)?;
        let entry_count = self.db.len(&wtxn).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;

        self.record(|s| {
            s.writes += 1;
            s.entry_count = entry_count;
        });
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> FolioResult<bool> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let existed = self.db.delete(&mut wtxn, key.as_bytes()).map_err(txn_err)?;
        let entry_count = self.db.len(&wtxn).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;

        self.record(|s| {
            if existed {
                s.deletes += 1;
            }
            s.entry_count = entry_count;
        });
        Ok(existed)
    }

    fn stats(&self) -> FolioResult<CacheStats> {
        let stats = self.stats.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(stats.clone())
    }
}
