//! # Cache Traits
//!
//! The tri-zone cache exposes exactly one policy-relevant operation,
//! get-or-create, as an inherent method. Everything that can be asked of a
//! cache *without* moving entries between zones is collected here so that
//! monitoring and diagnostic code can be written against any of the
//! crate's cache types.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────┐
//!   │          ReadOnlyCache<K, V>          │
//!   │                                       │
//!   │  contains(&, &K) → bool               │
//!   │  peek(&, &K) → Option<&V>             │
//!   │  len(&) → usize                       │
//!   │  is_empty(&) → bool                   │
//!   │  capacity(&) → usize                  │
//!   └───────────────────────────────────────┘
//!        ▲
//!        │ implemented by TriZoneCache
//!
//!   ┌───────────────────────────────────────┐
//!   │      ConcurrentCache: Send + Sync     │   marker
//!   └───────────────────────────────────────┘
//!        ▲
//!        │ implemented by ConcurrentTriZoneCache, ShardedTriZoneCache
//! ```
//!
//! Admission, promotion and eviction have no trait methods; they only
//! happen inside get-or-create.

/// Non-promoting, read-only view of a cache.
///
/// None of these methods changes zone membership or eviction order.
///
/// # Example
///
/// ```
/// use zonecache::policy::tri_zone::TriZoneCache;
/// use zonecache::traits::ReadOnlyCache;
///
/// fn fill_ratio<K, V, C: ReadOnlyCache<K, V>>(cache: &C) -> f64 {
///     cache.len() as f64 / cache.capacity() as f64
/// }
///
/// let mut cache = TriZoneCache::with_factory(8, |k: &u32| *k);
/// cache.get_or_create(1);
/// cache.get_or_create(2);
/// assert_eq!(fill_ratio(&cache), 0.25);
/// ```
pub trait ReadOnlyCache<K, V> {
    /// Returns `true` if `key` is cached.
    fn contains(&self, key: &K) -> bool;

    /// Returns the number of cached entries.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum number of entries.
    fn capacity(&self) -> usize;

    /// Returns the cached value without affecting its zone.
    fn peek(&self, key: &K) -> Option<&V>;
}

/// Marker trait for caches that are safe to share across threads.
///
/// # Example
///
/// ```
/// use zonecache::traits::ConcurrentCache;
///
/// fn share<C: ConcurrentCache + 'static>(cache: std::sync::Arc<C>) {
///     std::thread::spawn(move || drop(cache)).join().unwrap();
/// }
/// ```
///
/// A plain [`TriZoneCache`](crate::policy::tri_zone::TriZoneCache) is
/// `Send` but not `Sync`; wrap it in a lock or use the `concurrency`
/// feature wrappers.
pub trait ConcurrentCache: Send + Sync {}
