//! Cache entries, backend lookups and read results.
//!
//! `Lookup` keeps "no entry" apart from "an entry whose value is falsy":
//! a cached `false` or `0` comes back as `Present`, never as `Absent`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A derived value together with when it was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub computed_at: DateTime<Utc>,
    /// `None` means valid until explicitly invalidated.
    pub valid_until: Option<DateTime<Utc>>,
}

impl<T> CacheEntry<T> {
    /// Entry with no expiry.
    pub fn new(value: T, computed_at: DateTime<Utc>) -> Self {
        Self {
            value,
            computed_at,
            valid_until: None,
        }
    }

    /// Entry that expires `ttl` after `computed_at`. `None` means no expiry.
    pub fn with_ttl(value: T, computed_at: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        let valid_until = ttl.and_then(|ttl| {
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| computed_at.checked_add_signed(ttl))
        });
        Self {
            value,
            computed_at,
            valid_until,
        }
    }

    /// Whether the entry may still be served at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.valid_until {
            Some(until) => now < until,
            None => true,
        }
    }
}

/// Result of a backend `get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Present(T),
    Absent,
}

impl<T> Lookup<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> Lookup<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Present(value) => Lookup::Present(f(value)),
            Self::Absent => Lookup::Absent,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Present(value),
            None => Self::Absent,
        }
    }
}

/// Value returned by a derived-value cache read.
///
/// Carries whether the value was memoized or freshly derived, which is how
/// callers (and tests) observe that a read did not recompute.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    computed_at: DateTime<Utc>,
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    /// A read served from a stored entry.
    pub fn from_cache(entry: CacheEntry<T>) -> Self {
        Self {
            value: entry.value,
            computed_at: entry.computed_at,
            was_cache_hit: true,
        }
    }

    /// A read that ran the derivation.
    pub fn derived(value: T, computed_at: DateTime<Utc>) -> Self {
        Self {
            value,
            computed_at,
            was_cache_hit: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }

    /// How long ago the value was derived.
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.computed_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            computed_at: self.computed_at,
            was_cache_hit: self.was_cache_hit,
        }
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = CacheEntry::new(1usize, Utc::now());
        let far_future = Utc::now() + chrono::Duration::days(365 * 100);
        assert!(entry.is_valid_at(far_future));
    }

    #[test]
    fn test_entry_with_ttl_expires() {
        let now = Utc::now();
        let entry = CacheEntry::with_ttl(1usize, now, Some(Duration::from_secs(60)));
        assert_eq!(entry.valid_until, Some(now + chrono::Duration::seconds(60)));
        assert!(entry.is_valid_at(now));
        assert!(entry.is_valid_at(now + chrono::Duration::seconds(59)));
        assert!(!entry.is_valid_at(now + chrono::Duration::seconds(60)));
    }

    #[test]
    fn test_with_ttl_none_is_unbounded() {
        let entry = CacheEntry::with_ttl(false, Utc::now(), None);
        assert_eq!(entry.valid_until, None);
    }

    #[test]
    fn test_lookup_keeps_falsy_values_present() {
        let zero: Lookup<usize> = Some(0).into();
        assert_eq!(zero, Lookup::Present(0));
        let no: Lookup<bool> = Lookup::Present(false);
        assert!(no.is_present());
        let none: Lookup<bool> = None.into();
        assert!(none.is_absent());
    }

    #[test]
    fn test_lookup_map_and_into_option() {
        assert_eq!(Lookup::Present(2).map(|v| v > 1).into_option(), Some(true));
        assert_eq!(Lookup::<usize>::Absent.map(|v| v > 1).into_option(), None);
    }

    #[test]
    fn test_cache_read_from_cache() {
        let computed_at = Utc::now();
        let read = CacheRead::from_cache(CacheEntry::new(2usize, computed_at));
        assert!(read.was_cache_hit());
        assert_eq!(read.computed_at(), computed_at);
        assert_eq!(*read.value(), 2);
    }

    #[test]
    fn test_cache_read_derived_and_map() {
        let read = CacheRead::derived(3usize, Utc::now());
        assert!(read.was_cache_miss());
        assert!(read.age() < Duration::from_secs(5));
        assert!(read.map(|count| count > 1).into_value());
    }
}
