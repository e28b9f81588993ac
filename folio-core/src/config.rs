//! Configuration loading for FOLIO.
//!
//! Read from TOML. Every section has a default matching the single-site
//! setup, so an empty file is a valid configuration.

use crate::error::{ConfigError, FolioResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "FOLIO_CONFIG";

/// Longest cache key accepted, in bytes.
pub const MAX_CACHE_KEY_LEN: usize = 172;

/// Joins a cache namespace to the entry name. Never allowed in a namespace,
/// so `(namespace, name)` maps to exactly one key.
pub const CACHE_KEY_SEPARATOR: char = '_';

/// Check a full cache key: non-empty, at most [`MAX_CACHE_KEY_LEN`] bytes,
/// printable ASCII without whitespace.
pub fn check_cache_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("must not be empty".to_string());
    }
    if key.len() > MAX_CACHE_KEY_LEN {
        return Err(format!(
            "length {} exceeds {} bytes",
            key.len(),
            MAX_CACHE_KEY_LEN
        ));
    }
    if let Some(c) = key.chars().find(|c| !c.is_ascii_graphic()) {
        return Err(format!("contains disallowed character {:?}", c));
    }
    Ok(())
}

/// Check a cache namespace. Empty is allowed.
pub fn check_cache_namespace(namespace: &str) -> Result<(), String> {
    if namespace.contains(CACHE_KEY_SEPARATOR) {
        return Err(format!("must not contain {:?}", CACHE_KEY_SEPARATOR));
    }
    if let Some(c) = namespace.chars().find(|c| !c.is_ascii_graphic()) {
        return Err(format!("contains disallowed character {:?}", c));
    }
    Ok(())
}

/// Master configuration struct.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    pub cache: CacheSettings,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

/// Settings for the derived category-count entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Prefix joined to `name` with an underscore. May be empty, and may not
    /// itself contain an underscore.
    pub namespace: String,
    pub name: String,
    /// How many category ids the derivation asks the store for.
    pub probe_limit: usize,
    /// Optional entry lifetime. Unset means valid until invalidated.
    pub entry_ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            namespace: "folio".to_string(),
            name: "categories".to_string(),
            probe_limit: 2,
            entry_ttl_secs: None,
        }
    }
}

impl CacheSettings {
    pub fn entry_ttl(&self) -> Option<Duration> {
        self.entry_ttl_secs.map(Duration::from_secs)
    }

    /// `"{namespace}_{name}"`, or just `name` when the namespace is empty.
    pub fn key_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}{}{}", self.namespace, CACHE_KEY_SEPARATOR, self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Memory,
    Lmdb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// LMDB environment directory. Required when `kind = "lmdb"`.
    pub path: Option<PathBuf>,
    pub max_size_mb: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            path: None,
            max_size_mb: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "folio_storage=info,folio_cachectl=info,warn".to_string(),
            json: false,
        }
    }
}

impl FolioConfig {
    /// Load from `--config <path>` or `FOLIO_CONFIG`, then validate.
    pub fn load() -> FolioResult<Self> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> FolioResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> FolioResult<Self> {
        let config: FolioConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> FolioResult<()> {
        if self.cache.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "cache.name",
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if let Err(reason) = check_cache_namespace(&self.cache.namespace) {
            return Err(ConfigError::InvalidValue {
                field: "cache.namespace",
                reason,
            }
            .into());
        }
        if let Err(reason) = check_cache_key(&self.cache.key_name()) {
            return Err(ConfigError::InvalidValue {
                field: "cache.name",
                reason,
            }
            .into());
        }
        if self.cache.probe_limit < 2 {
            return Err(ConfigError::InvalidValue {
                field: "cache.probe_limit",
                reason: "must be >= 2 to tell one category from several".to_string(),
            }
            .into());
        }
        if self.cache.entry_ttl_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cache.entry_ttl_secs",
                reason: "must be > 0 when set".to_string(),
            }
            .into());
        }
        if self.backend.kind == BackendKind::Lmdb {
            match &self.backend.path {
                Some(path) if !path.as_os_str().is_empty() => {}
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "backend.path",
                        reason: "required for the lmdb backend".to_string(),
                    }
                    .into())
                }
            }
            if self.backend.max_size_mb == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "backend.max_size_mb",
                    reason: "must be > 0".to_string(),
                }
                .into());
            }
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.filter",
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::FolioError;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A probe limit below two cannot distinguish one category from many.
        #[test]
        fn prop_config_rejects_small_probe_limit(limit in 0usize..2) {
            let mut config = FolioConfig::default();
            config.cache.probe_limit = limit;
            let result = config.validate();
            if let Err(FolioError::Config(ConfigError::InvalidValue { field, .. })) = result {
                prop_assert_eq!(field, "cache.probe_limit");
            } else {
                prop_assert!(false, "Expected ConfigError::InvalidValue");
            }
        }

        #[test]
        fn prop_config_accepts_probe_limit_of_two_or_more(limit in 2usize..1000) {
            let mut config = FolioConfig::default();
            config.cache.probe_limit = limit;
            prop_assert!(config.validate().is_ok());
        }
    }
}
