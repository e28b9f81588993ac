//! Validated cache keys.
//!
//! A derived value lives under one fixed key for the lifetime of the host
//! configuration. `CacheKey` can only be built through `new` or `scoped`,
//! so every key that reaches a backend has already been checked.

use folio_core::{
    check_cache_key, check_cache_namespace, CacheSettings, FolioResult, ValidationError,
    CACHE_KEY_SEPARATOR,
};
use std::fmt;

/// Longest key accepted, in bytes.
pub const MAX_KEY_LEN: usize = folio_core::MAX_CACHE_KEY_LEN;

/// A validated key naming one derived value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    inner: String,
}

impl CacheKey {
    /// Create a key from a full name.
    ///
    /// The name must be non-empty, at most [`MAX_KEY_LEN`] bytes and made of
    /// printable ASCII without whitespace.
    pub fn new(name: impl Into<String>) -> FolioResult<Self> {
        let name = name.into();
        validate(&name)?;
        Ok(Self { inner: name })
    }

    /// Create `"{namespace}_{name}"`, or just `name` when the namespace is empty.
    ///
    /// The namespace may not contain `_`, so distinct pairs with a non-empty
    /// namespace never share a key. An empty namespace leaves `name` bare.
    pub fn scoped(namespace: &str, name: &str) -> FolioResult<Self> {
        if namespace.is_empty() {
            return Self::new(name);
        }
        if let Err(reason) = check_cache_namespace(namespace) {
            return Err(invalid(namespace, &format!("namespace {}", reason)).into());
        }
        if name.is_empty() {
            return Err(invalid(name, "name must not be empty").into());
        }
        Self::new(format!("{}{}{}", namespace, CACHE_KEY_SEPARATOR, name))
    }

    /// Build the key configured in `[cache]`.
    pub fn from_settings(settings: &CacheSettings) -> FolioResult<Self> {
        Self::scoped(&settings.namespace, &settings.name)
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Decode a key read back from a backend.
    ///
    /// Returns `None` for bytes that are not a valid key.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let name = std::str::from_utf8(bytes).ok()?;
        Self::new(name).ok()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

fn validate(name: &str) -> Result<(), ValidationError> {
    check_cache_key(name).map_err(|reason| invalid(name, &reason))
}

fn invalid(name: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidCacheKey {
        key: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::FolioError;

    #[test]
    fn test_scoped_key() {
        let key = CacheKey::scoped("folio", "categories").unwrap();
        assert_eq!(key.as_str(), "folio_categories");
    }

    #[test]
    fn test_scoped_key_without_namespace() {
        let key = CacheKey::scoped("", "categories").unwrap();
        assert_eq!(key.as_str(), "categories");
    }

    #[test]
    fn test_default_settings_key() {
        let key = CacheKey::from_settings(&CacheSettings::default()).unwrap();
        assert_eq!(key.to_string(), "folio_categories");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            CacheKey::new(""),
            Err(FolioError::Validation(ValidationError::InvalidCacheKey { .. }))
        ));
        assert!(CacheKey::scoped("folio", "").is_err());
    }

    #[test]
    fn test_whitespace_rejected() {
        assert!(CacheKey::new("folio categories").is_err());
        assert!(CacheKey::new("folio\tcategories").is_err());
    }

    #[test]
    fn test_length_limit() {
        assert!(CacheKey::new("k".repeat(MAX_KEY_LEN)).is_ok());
        assert!(CacheKey::new("k".repeat(MAX_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn test_separator_in_namespace_rejected() {
        // Would otherwise collide with ("a", "b_c").
        assert!(CacheKey::scoped("a_b", "c").is_err());
        assert_eq!(CacheKey::scoped("a", "b_c").unwrap().as_str(), "a_b_c");
        assert!(CacheKey::scoped("a b", "c").is_err());
    }

    #[test]
    fn test_settings_and_key_agree() {
        let settings = CacheSettings {
            name: "k".repeat(MAX_KEY_LEN - "folio_".len() + 1),
            ..CacheSettings::default()
        };
        assert!(CacheKey::from_settings(&settings).is_err());
        assert!(folio_core::FolioConfig {
            cache: settings,
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_bytes() {
        assert!(CacheKey::decode(&[0xFF, 0xFE]).is_none());
        assert!(CacheKey::decode(b"").is_none());
        assert_eq!(
            CacheKey::decode(b"folio_categories"),
            Some(CacheKey::new("folio_categories").unwrap())
        );
    }
}
