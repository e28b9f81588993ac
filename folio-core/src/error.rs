//! Error types for FOLIO operations

use thiserror::Error;

/// Cache storage backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Transaction failed on {backend}: {reason}")]
    TransactionFailed { backend: &'static str, reason: String },

    #[error("Failed to encode entry for key {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("Failed to decode entry for key {key}: {reason}")]
    Decode { key: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid cache key {key:?}: {reason}")]
    InvalidCacheKey { key: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or FOLIO_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Master error type for all FOLIO errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FolioError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for FOLIO operations.
pub type FolioResult<T> = Result<T, FolioError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_transaction_failed() {
        let err = StorageError::TransactionFailed {
            backend: "lmdb",
            reason: "MDB_MAP_FULL".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("lmdb"));
        assert!(msg.contains("MDB_MAP_FULL"));
    }

    #[test]
    fn test_validation_error_display_invalid_key() {
        let err = ValidationError::InvalidCacheKey {
            key: "".to_string(),
            reason: "must not be empty".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid cache key"));
        assert!(msg.contains("must not be empty"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "cache.probe_limit",
            reason: "must be >= 2".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("cache.probe_limit"));
        assert!(msg.contains("must be >= 2"));
    }

    #[test]
    fn test_folio_error_from_storage() {
        let err: FolioError = StorageError::LockPoisoned.into();
        assert!(matches!(err, FolioError::Storage(StorageError::LockPoisoned)));
        assert!(format!("{}", err).starts_with("Storage error"));
    }
}
