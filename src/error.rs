//! Error types for zonecache.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when capacity or zone limits are invalid
//!   (zero capacity, limits out of order).
//! - [`InvariantError`]: Returned when the zone ring and the key index
//!   disagree (debug-only `check_invariants` / `debug_validate` methods).
//!
//! Factory failures are not wrapped: the caller's own error type is handed
//! back unchanged by
//! [`try_get_or_create_with`](crate::policy::tri_zone::TriZoneCache::try_get_or_create_with).
//!
//! ## Example Usage
//!
//! ```
//! use zonecache::error::ConfigError;
//! use zonecache::policy::tri_zone::TriZoneCache;
//!
//! let cache: Result<TriZoneCache<u64, u64>, ConfigError> =
//!     TriZoneCache::try_with_limits(100, 50, 75, |k: &u64| *k);
//! assert!(cache.is_ok());
//!
//! // nominated limit must stay below the added limit
//! let bad = TriZoneCache::<u64, u64>::try_with_limits(100, 80, 75, |k: &u64| *k);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`TriZoneCache::try_with_limits`](crate::policy::tri_zone::TriZoneCache::try_with_limits)
/// and [`TriZoneCacheBuilder::try_build`](crate::builder::TriZoneCacheBuilder::try_build).
/// Carries a human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use zonecache::builder::TriZoneCacheBuilder;
///
/// let err = TriZoneCacheBuilder::<u64, u64>::new(0)
///     .try_build()
///     .unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal zone invariants are violated.
///
/// Produced by [`TriZoneCache::check_invariants`](crate::policy::tri_zone::TriZoneCache::check_invariants)
/// and [`ZoneRing::debug_validate`](crate::ds::ZoneRing::debug_validate),
/// both debug-only. Reaching one is a bug in this crate, not a runtime
/// condition callers are expected to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be greater than zero");
        assert_eq!(err.to_string(), "capacity must be greater than zero");
    }

    #[test]
    fn config_message_accessor() {
        let err = ConfigError::new("added_limit must exceed nominated_limit");
        assert_eq!(err.message(), "added_limit must exceed nominated_limit");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("boundary points past sentinel");
        assert_eq!(err.to_string(), "boundary points past sentinel");
        assert!(format!("{:?}", err).contains("boundary"));
    }

    #[test]
    fn both_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<ConfigError>();
        assert_error::<InvariantError>();
    }
}
