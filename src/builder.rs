//! Builder for [`TriZoneCache`].
//!
//! Collects capacity, optional zone limits, the miss-path factory and an
//! optional eviction listener, then validates everything in one place.
//! Limits left unset fall back to the defaults documented in
//! [`policy::tri_zone`](crate::policy::tri_zone).
//!
//! ## Example
//!
//! ```rust
//! use zonecache::builder::TriZoneCacheBuilder;
//!
//! let mut evicted = Vec::new();
//! let (tx, rx) = std::sync::mpsc::channel();
//!
//! let mut cache = TriZoneCacheBuilder::new(4)
//!     .factory(|k: &u32| k * 10)
//!     .on_evict(move |k, v| tx.send((k, v)).unwrap())
//!     .build();
//!
//! for k in 0..5 {
//!     cache.get_or_create(k);
//! }
//! evicted.extend(rx.try_iter());
//! assert_eq!(evicted, vec![(0, 0)]);
//! ```

use std::fmt;
use std::hash::Hash;

use crate::error::ConfigError;
use crate::policy::tri_zone::{
    EvictListener, Factory, TriZoneCache, default_nominated_limit, validate_limits,
};

/// Step-by-step configuration for a [`TriZoneCache`].
pub struct TriZoneCacheBuilder<K, V> {
    capacity: usize,
    nominated_limit: Option<usize>,
    added_limit: Option<usize>,
    factory: Option<Factory<K, V>>,
    on_evict: Option<EvictListener<K, V>>,
}

impl<K, V> TriZoneCacheBuilder<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Starts a builder for a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            nominated_limit: None,
            added_limit: None,
            factory: None,
            on_evict: None,
        }
    }

    /// Target size of the `Nominated` zone. Default: `capacity / 2`.
    pub fn nominated_limit(mut self, limit: usize) -> Self {
        self.nominated_limit = Some(limit);
        self
    }

    /// Target size of `Nominated + Added`. Default: `nominated_limit + capacity / 4`.
    pub fn added_limit(mut self, limit: usize) -> Self {
        self.added_limit = Some(limit);
        self
    }

    /// Value constructor run on every miss.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: FnMut(&K) -> V + Send + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Observer that receives each evicted key and value by move.
    ///
    /// Not called by `clear` or when the cache is dropped.
    pub fn on_evict<L>(mut self, listener: L) -> Self
    where
        L: FnMut(K, V) + Send + 'static,
    {
        self.on_evict = Some(Box::new(listener));
        self
    }

    /// Builds the cache.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. For a non-panicking
    /// alternative, use [`try_build`](Self::try_build).
    pub fn build(self) -> TriZoneCache<K, V> {
        match self.try_build() {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds the cache, returning an error on invalid configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the capacity or limits are invalid, or if
    /// no factory was set.
    ///
    /// ```
    /// use zonecache::builder::TriZoneCacheBuilder;
    ///
    /// let err = TriZoneCacheBuilder::<u32, u32>::new(10)
    ///     .nominated_limit(6)
    ///     .added_limit(4)
    ///     .factory(|k: &u32| *k)
    ///     .try_build()
    ///     .unwrap_err();
    /// assert!(err.message().contains("added_limit"));
    /// ```
    pub fn try_build(self) -> Result<TriZoneCache<K, V>, ConfigError> {
        let nominated_limit = self
            .nominated_limit
            .unwrap_or_else(|| default_nominated_limit(self.capacity));
        let added_limit = self
            .added_limit
            .unwrap_or_else(|| nominated_limit + self.capacity / 4);
        // capacity and limit errors take precedence over a missing factory
        validate_limits(self.capacity, nominated_limit, added_limit)?;
        let factory = self
            .factory
            .ok_or_else(|| ConfigError::new("a factory must be set before building"))?;
        TriZoneCache::from_parts(
            self.capacity,
            nominated_limit,
            added_limit,
            factory,
            self.on_evict,
        )
    }
}

impl<K, V> TriZoneCacheBuilder<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: From<K> + 'static,
{
    /// Uses `V::from(key.clone())` as the factory.
    pub fn from_key_factory(self) -> Self {
        self.factory(|key: &K| V::from(key.clone()))
    }
}

impl<K, V> fmt::Debug for TriZoneCacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriZoneCacheBuilder")
            .field("capacity", &self.capacity)
            .field("nominated_limit", &self.nominated_limit)
            .field("added_limit", &self.added_limit)
            .field("has_factory", &self.factory.is_some())
            .field("has_evict_listener", &self.on_evict.is_some())
            .finish()
    }
}
