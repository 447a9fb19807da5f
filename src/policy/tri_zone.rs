//! Tri-Zone cache: scan-resistant get-or-create cache with lazily balanced zones.
//!
//! Every entry lives on one sentinel ring ([`ZoneRing`]) ordered oldest to
//! newest, split into three contiguous zones by two boundary handles:
//!
//! ```text
//!                nomination_boundary        added_boundary
//!                        │                        │
//!                        ▼                        ▼
//!  (sentinel) ─► [N][N][N][A][A] ─────────────► [R][R][R] ─► (sentinel)
//!                ╰─ Nominated ─╯╰── Added ──╯   ╰─ Reused ─╯
//!                   oldest                          newest
//!
//!  index: FxHashMap<K, SlotId> ─────► arena slot of each ring node
//! ```
//!
//! A boundary of `None` points at the sentinel, meaning every zone after it
//! is empty. Zone sizes are never stored; they follow from the boundaries.
//!
//! ## Access path
//!
//! - **Hit on `Nominated`**: the entry moves to the newest end as `Reused`,
//!   then the first `Added` entry is nominated, and if that happened the
//!   first `Reused` entry is readmitted to `Added`. At most two retags.
//! - **Hit on `Added` / `Reused`**: nothing but the hash lookup.
//! - **Miss while growing**: the new entry fills `Nominated` first, then
//!   `Added`; past `nominated_limit` each insert also converts the newest
//!   `Added` entry to `Reused`.
//! - **Miss while full**: the oldest entry is evicted, the new one joins
//!   `Added`, and the first `Added` entry is nominated.
//!
//! One-time keys therefore only ever age out through `Nominated`; a scan
//! cannot displace the `Reused` working set.
//!
//! ## Example Usage
//!
//! ```
//! use zonecache::policy::tri_zone::{TriZoneCache, Zone};
//!
//! let mut cache = TriZoneCache::with_factory(4, |k: &u32| k * 10);
//! for k in 0..4 {
//!     cache.get_or_create(k);
//! }
//! assert_eq!(cache.zone_of(&0), Some(Zone::Nominated));
//! assert_eq!(cache.zone_of(&2), Some(Zone::Reused));
//!
//! // a second touch while nominated protects the key
//! assert_eq!(*cache.get_or_create(0), 0);
//! assert_eq!(cache.zone_of(&0), Some(Zone::Reused));
//! ```
//!
//! ## Thread Safety
//!
//! [`TriZoneCache`] is single-threaded. With the `concurrency` feature,
//! [`ConcurrentTriZoneCache`] wraps it in a `parking_lot::Mutex` and
//! [`ShardedTriZoneCache`] spreads keys over independently locked shards.
//! A mutex is used rather than a read-write lock because a hit may promote.

use std::fmt::Debug;
use std::hash::Hash;
#[cfg(feature = "concurrency")]
use std::sync::Arc;

#[cfg(feature = "concurrency")]
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

#[cfg(feature = "concurrency")]
use crate::ds::ShardSelector;
use crate::ds::{SlotId, ZoneRing, ZoneRingIter};
use crate::error::ConfigError;
#[cfg(debug_assertions)]
use crate::error::InvariantError;
#[cfg(feature = "concurrency")]
use crate::traits::ConcurrentCache;
use crate::traits::ReadOnlyCache;

pub use crate::ds::Zone;

/// Boxed miss-path value constructor.
pub type Factory<K, V> = Box<dyn FnMut(&K) -> V + Send>;

/// Boxed observer invoked once per evicted entry, with ownership of both halves.
pub type EvictListener<K, V> = Box<dyn FnMut(K, V) + Send>;

/// Smallest capacity for which the default limits are valid.
pub const MIN_DEFAULT_CAPACITY: usize = 4;

/// Default `Nominated` target: `capacity / 2`.
#[inline]
pub const fn default_nominated_limit(capacity: usize) -> usize {
    capacity / 2
}

/// Default `Nominated + Added` target: `nominated_limit + capacity / 4`.
#[inline]
pub const fn default_added_limit(capacity: usize) -> usize {
    default_nominated_limit(capacity) + capacity / 4
}

/// Checks `0 < nominated_limit < added_limit < capacity`.
pub(crate) fn validate_limits(
    capacity: usize,
    nominated_limit: usize,
    added_limit: usize,
) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::new("cache capacity must be greater than zero"));
    }
    if nominated_limit == 0 {
        return Err(ConfigError::new(format!(
            "nominated_limit must be greater than zero (capacity {})",
            capacity
        )));
    }
    if added_limit <= nominated_limit {
        return Err(ConfigError::new(format!(
            "added_limit ({}) must be greater than nominated_limit ({})",
            added_limit, nominated_limit
        )));
    }
    if capacity <= added_limit {
        return Err(ConfigError::new(format!(
            "capacity ({}) must be greater than added_limit ({})",
            capacity, added_limit
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters for tri-zone cache operations.
#[cfg(feature = "metrics")]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct TriZoneMetrics {
    /// Lookups that found the key.
    pub hits: u64,
    /// Lookups that had to run a factory.
    pub misses: u64,
    /// Entries created.
    pub inserts: u64,
    /// `Nominated` → `Reused` moves.
    pub promotions: u64,
    /// `Added` → `Nominated` retags.
    pub nominations: u64,
    /// `Reused` → `Added` retags.
    pub readmissions: u64,
    /// Entries evicted from the oldest position.
    pub evictions: u64,
    /// Fallible factories that returned an error.
    pub factory_errors: u64,
}

#[cfg(feature = "metrics")]
impl TriZoneMetrics {
    /// Fraction of lookups that hit, in `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    #[cfg(feature = "concurrency")]
    fn accumulate(&mut self, other: &Self) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.inserts += other.inserts;
        self.promotions += other.promotions;
        self.nominations += other.nominations;
        self.readmissions += other.readmissions;
        self.evictions += other.evictions;
        self.factory_errors += other.factory_errors;
    }
}

#[cfg(feature = "metrics")]
impl std::fmt::Display for TriZoneMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TriZoneMetrics {{ hits: {}, misses: {}, hit_rate: {:.2}%, inserts: {}, \
             promotions: {}, nominations: {}, readmissions: {}, evictions: {}, factory_errors: {} }}",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.inserts,
            self.promotions,
            self.nominations,
            self.readmissions,
            self.evictions,
            self.factory_errors
        )
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

struct Entry<K, V> {
    key: K,
    value: V,
}

/// Oldest-to-newest iterator over cache entries.
pub struct Iter<'a, K, V> {
    inner: ZoneRingIter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(_, _, entry)| (&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> std::iter::FusedIterator for Iter<'_, K, V> {}

impl<K, V> Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.inner.len())
            .finish()
    }
}

/// Oldest-to-newest iterator over cache keys.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> std::iter::FusedIterator for Keys<'_, K, V> {}

/// Oldest-to-newest iterator over cache values.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> std::iter::FusedIterator for Values<'_, K, V> {}

// ---------------------------------------------------------------------------
// TriZoneCache
// ---------------------------------------------------------------------------

/// Fixed-capacity get-or-create cache with a three-zone eviction ring.
///
/// Values are produced by a factory on miss and handed to an optional
/// eviction listener when they leave. See the [module docs](self) for the
/// zone discipline.
///
/// # Type Parameters
///
/// - `K`: Key type, must be `Clone + Eq + Hash`
/// - `V`: Value type
///
/// # Example
///
/// ```
/// use zonecache::policy::tri_zone::TriZoneCache;
///
/// let mut cache: TriZoneCache<u64, String> =
///     TriZoneCache::with_factory(100, |k: &u64| format!("page-{}", k));
///
/// cache.get_or_create(7).push_str("-dirty");
/// assert_eq!(cache.peek(&7).map(String::as_str), Some("page-7-dirty"));
/// ```
pub struct TriZoneCache<K, V> {
    ring: ZoneRing<Entry<K, V>>,
    index: FxHashMap<K, SlotId>,
    /// First entry after the `Nominated` run; `None` is the sentinel.
    nomination_boundary: Option<SlotId>,
    /// First `Reused` entry; `None` is the sentinel.
    added_boundary: Option<SlotId>,
    capacity: usize,
    nominated_limit: usize,
    added_limit: usize,
    factory: Factory<K, V>,
    on_evict: Option<EvictListener<K, V>>,
    #[cfg(feature = "metrics")]
    metrics: TriZoneMetrics,
}

impl<K, V> TriZoneCache<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: From<K> + 'static,
{
    /// Creates a cache whose values are built with `V::from(key.clone())`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is below [`MIN_DEFAULT_CAPACITY`], where the
    /// default limits collapse.
    ///
    /// ```
    /// use zonecache::policy::tri_zone::TriZoneCache;
    ///
    /// let mut cache: TriZoneCache<u32, u64> = TriZoneCache::new(8);
    /// assert_eq!(*cache.get_or_create(3), 3u64);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self::with_factory(capacity, |key: &K| V::from(key.clone()))
    }
}

impl<K, V> TriZoneCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache with default limits and the given factory.
    ///
    /// # Panics
    ///
    /// Panics on invalid configuration. See [`try_with_limits`](Self::try_with_limits).
    pub fn with_factory<F>(capacity: usize, factory: F) -> Self
    where
        F: FnMut(&K) -> V + Send + 'static,
    {
        match Self::try_with_limits(
            capacity,
            default_nominated_limit(capacity),
            default_added_limit(capacity),
            factory,
        ) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a cache with explicit zone limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] unless `0 < nominated_limit < added_limit < capacity`.
    pub fn try_with_limits<F>(
        capacity: usize,
        nominated_limit: usize,
        added_limit: usize,
        factory: F,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&K) -> V + Send + 'static,
    {
        Self::from_parts(
            capacity,
            nominated_limit,
            added_limit,
            Box::new(factory),
            None,
        )
    }

    /// Returns a builder for limits, factory and eviction listener.
    pub fn builder(capacity: usize) -> crate::builder::TriZoneCacheBuilder<K, V> {
        crate::builder::TriZoneCacheBuilder::new(capacity)
    }

    pub(crate) fn from_parts(
        capacity: usize,
        nominated_limit: usize,
        added_limit: usize,
        factory: Factory<K, V>,
        on_evict: Option<EvictListener<K, V>>,
    ) -> Result<Self, ConfigError> {
        validate_limits(capacity, nominated_limit, added_limit)?;
        debug!(capacity, nominated_limit, added_limit, "tri-zone cache created");
        Ok(Self {
            ring: ZoneRing::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            nomination_boundary: None,
            added_boundary: None,
            capacity,
            nominated_limit,
            added_limit,
            factory,
            on_evict,
            #[cfg(feature = "metrics")]
            metrics: TriZoneMetrics::default(),
        })
    }

    // -----------------------------------------------------------------------
    // Sizes and limits
    // -----------------------------------------------------------------------

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Target size of the `Nominated` zone.
    #[inline]
    pub fn nominated_limit(&self) -> usize {
        self.nominated_limit
    }

    /// Target combined size of `Nominated` and `Added`.
    ///
    /// Validated at construction; the balancing steps keep proportions
    /// through the boundaries alone and never consult it.
    #[inline]
    pub fn added_limit(&self) -> usize {
        self.added_limit
    }

    #[cfg(feature = "metrics")]
    #[inline]
    pub fn metrics(&self) -> &TriZoneMetrics {
        &self.metrics
    }

    #[cfg(feature = "metrics")]
    #[inline]
    pub fn reset_metrics(&mut self) {
        self.metrics = TriZoneMetrics::default();
    }

    // -----------------------------------------------------------------------
    // Get-or-create
    // -----------------------------------------------------------------------

    /// Returns the value for `key`, creating it with the configured factory
    /// on a miss.
    ///
    /// A hit on a `Nominated` entry promotes it to `Reused`; hits on `Added`
    /// or `Reused` entries change nothing. A miss on a full cache evicts the
    /// oldest entry first.
    pub fn get_or_create(&mut self, key: K) -> &mut V {
        if let Some(id) = self.lookup(&key) {
            return self.value_mut(id);
        }
        let value = (self.factory)(&key);
        let id = self.admit(key, value);
        self.value_mut(id)
    }

    /// Like [`get_or_create`](Self::get_or_create), but a miss is served by
    /// `factory` instead of the configured one.
    pub fn get_or_create_with<F>(&mut self, key: K, factory: F) -> &mut V
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(id) = self.lookup(&key) {
            return self.value_mut(id);
        }
        let value = factory(&key);
        let id = self.admit(key, value);
        self.value_mut(id)
    }

    /// Get-or-create with a fallible factory.
    ///
    /// # Errors
    ///
    /// Returns the factory's error unchanged. The cache is left exactly as
    /// it was: nothing inserted, nothing evicted.
    ///
    /// ```
    /// use zonecache::policy::tri_zone::TriZoneCache;
    ///
    /// let mut cache: TriZoneCache<u32, u32> = TriZoneCache::with_factory(4, |k: &u32| *k);
    /// let err = cache.try_get_or_create_with(9, |_| Err::<u32, _>("backend down"));
    /// assert_eq!(err, Err("backend down"));
    /// assert!(cache.is_empty());
    /// ```
    pub fn try_get_or_create_with<F, E>(&mut self, key: K, factory: F) -> Result<&mut V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        if let Some(id) = self.lookup(&key) {
            return Ok(self.value_mut(id));
        }
        let value = match factory(&key) {
            Ok(value) => value,
            Err(e) => {
                #[cfg(feature = "metrics")]
                {
                    self.metrics.factory_errors += 1;
                }
                return Err(e);
            },
        };
        let id = self.admit(key, value);
        Ok(self.value_mut(id))
    }

    // -----------------------------------------------------------------------
    // Non-promoting reads
    // -----------------------------------------------------------------------

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the value without touching zones.
    #[inline]
    pub fn peek(&self, key: &K) -> Option<&V> {
        let &id = self.index.get(key)?;
        self.ring.get(id).map(|entry| &entry.value)
    }

    /// Returns the value mutably without touching zones.
    #[inline]
    pub fn peek_mut(&mut self, key: &K) -> Option<&mut V> {
        let &id = self.index.get(key)?;
        self.ring.get_mut(id).map(|entry| &mut entry.value)
    }

    /// Returns the zone `key` currently occupies.
    #[inline]
    pub fn zone_of(&self, key: &K) -> Option<Zone> {
        let &id = self.index.get(key)?;
        self.ring.zone(id)
    }

    /// Keys currently in `zone`, oldest first. O(n).
    pub fn zone_keys(&self, zone: Zone) -> Vec<&K> {
        self.ring
            .iter()
            .filter(|(_, z, _)| *z == zone)
            .map(|(_, _, entry)| &entry.key)
            .collect()
    }

    /// Iterates entries from oldest (next to be evicted) to newest.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.ring.iter(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Drops every entry. The eviction listener is not called.
    pub fn clear(&mut self) {
        self.ring.clear();
        self.index.clear();
        self.nomination_boundary = None;
        self.added_boundary = None;
        debug!(capacity = self.capacity, "tri-zone cache cleared");
    }

    // -----------------------------------------------------------------------
    // Hit path
    // -----------------------------------------------------------------------

    /// Index lookup plus promotion; records hit/miss.
    fn lookup(&mut self, key: &K) -> Option<SlotId> {
        let Some(&id) = self.index.get(key) else {
            #[cfg(feature = "metrics")]
            {
                self.metrics.misses += 1;
            }
            return None;
        };

        #[cfg(feature = "metrics")]
        {
            self.metrics.hits += 1;
        }

        if self.ring.zone(id) == Some(Zone::Nominated) {
            self.promote(id);
        }
        Some(id)
    }

    fn promote(&mut self, id: SlotId) {
        self.ring.move_before(id, None, Zone::Reused);

        // Reused was empty: the promoted entry now opens it (and Added too,
        // if that was empty as well).
        if self.added_boundary.is_none() {
            self.added_boundary = Some(id);
            if self.nomination_boundary.is_none() {
                self.nomination_boundary = Some(id);
            }
        }

        if self.nominate_first_added() {
            self.readmit_first_reused();
        }

        #[cfg(feature = "metrics")]
        {
            self.metrics.promotions += 1;
        }
        trace!(len = self.len(), "promoted nominated entry to reused");
    }

    /// Retags the entry at `nomination_boundary` `Nominated` if it is `Added`.
    fn nominate_first_added(&mut self) -> bool {
        let Some(id) = self.nomination_boundary else {
            return false;
        };
        if self.ring.zone(id) != Some(Zone::Added) {
            return false;
        }
        self.ring.set_zone(id, Zone::Nominated);
        self.nomination_boundary = self.ring.next(Some(id));
        #[cfg(feature = "metrics")]
        {
            self.metrics.nominations += 1;
        }
        true
    }

    /// Retags the entry at `added_boundary` `Added` if it is `Reused`.
    fn readmit_first_reused(&mut self) -> bool {
        let Some(id) = self.added_boundary else {
            return false;
        };
        if self.ring.zone(id) != Some(Zone::Reused) {
            return false;
        }
        self.ring.set_zone(id, Zone::Added);
        self.added_boundary = self.ring.next(Some(id));
        #[cfg(feature = "metrics")]
        {
            self.metrics.readmissions += 1;
        }
        true
    }

    // -----------------------------------------------------------------------
    // Miss path
    // -----------------------------------------------------------------------

    fn admit(&mut self, key: K, value: V) -> SlotId {
        #[cfg(feature = "metrics")]
        {
            self.metrics.inserts += 1;
        }
        if self.len() < self.capacity {
            self.admit_growing(key, value)
        } else {
            self.admit_full(key, value)
        }
    }

    fn admit_growing(&mut self, key: K, value: V) -> SlotId {
        let len = self.len();
        if len < self.nominated_limit {
            debug_assert_eq!(
                self.nomination_boundary, self.added_boundary,
                "Added zone must be empty while Nominated fills"
            );
            return self.attach_entry(self.nomination_boundary, key, value, Zone::Nominated);
        }

        if len > self.nominated_limit {
            // Newest Added entry becomes the oldest Reused one.
            let stepped = self
                .ring
                .prev(self.added_boundary)
                .filter(|&id| self.ring.zone(id) == Some(Zone::Added));
            if let Some(stepped_id) = stepped {
                self.ring.set_zone(stepped_id, Zone::Reused);
                self.added_boundary = stepped;
            }
        }
        self.attach_added(key, value)
    }

    fn admit_full(&mut self, key: K, value: V) -> SlotId {
        let evicted = self.detach_oldest();
        let id = self.attach_added(key, value);
        self.nominate_first_added();

        if let Some((evicted_key, evicted_value)) = evicted {
            #[cfg(feature = "metrics")]
            {
                self.metrics.evictions += 1;
            }
            trace!(
                capacity = self.capacity,
                len = self.len(),
                "evicted oldest entry"
            );
            if let Some(listener) = self.on_evict.as_mut() {
                listener(evicted_key, evicted_value);
            }
        }
        id
    }

    /// Links a new `Added` entry at the newest end of the `Added` zone.
    fn attach_added(&mut self, key: K, value: V) -> SlotId {
        let added_was_empty = self.nomination_boundary == self.added_boundary;
        let id = self.attach_entry(self.added_boundary, key, value, Zone::Added);
        if added_was_empty {
            self.nomination_boundary = Some(id);
        }
        id
    }

    /// Links an entry before `at` and indexes it. The only way entries enter.
    fn attach_entry(&mut self, at: Option<SlotId>, key: K, value: V, zone: Zone) -> SlotId {
        let id = self.ring.push_before(
            at,
            Entry {
                key: key.clone(),
                value,
            },
            zone,
        );
        self.index.insert(key, id);
        id
    }

    /// Unlinks and unindexes the oldest entry. The only way entries leave
    /// (besides `clear`). Boundaries resting on it move to its successor.
    fn detach_oldest(&mut self) -> Option<(K, V)> {
        let victim = self.ring.front()?;
        let successor = self.ring.next(Some(victim));
        if self.nomination_boundary == Some(victim) {
            self.nomination_boundary = successor;
        }
        if self.added_boundary == Some(victim) {
            self.added_boundary = successor;
        }

        let entry = self.ring.remove(victim)?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    #[inline]
    fn value_mut(&mut self, id: SlotId) -> &mut V {
        &mut self
            .ring
            .get_mut(id)
            .expect("index/ring out of sync")
            .value
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Validates ring links, index agreement, zone order and both boundaries.
    #[cfg(debug_assertions)]
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.ring.debug_validate()?;

        if self.index.len() != self.ring.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys, ring holds {} entries",
                self.index.len(),
                self.ring.len()
            )));
        }
        if self.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "len {} exceeds capacity {}",
                self.len(),
                self.capacity
            )));
        }

        let rank = |z: Zone| match z {
            Zone::Nominated => 0,
            Zone::Added => 1,
            Zone::Reused => 2,
            Zone::Detached => 3,
        };
        let mut previous = Zone::Nominated;
        let mut first_non_nominated = None;
        let mut first_reused = None;
        for (position, (id, zone, entry)) in self.ring.iter().enumerate() {
            if zone == Zone::Detached {
                return Err(InvariantError::new(format!(
                    "entry at position {} is detached",
                    position
                )));
            }
            if rank(zone) < rank(previous) {
                return Err(InvariantError::new(format!(
                    "{} entry at position {} follows a {} entry",
                    zone, position, previous
                )));
            }
            if self.index.get(&entry.key) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "entry at position {} is not indexed under its key",
                    position
                )));
            }
            if zone != Zone::Nominated && first_non_nominated.is_none() {
                first_non_nominated = Some(id);
            }
            if zone == Zone::Reused && first_reused.is_none() {
                first_reused = Some(id);
            }
            previous = zone;
        }

        if self.nomination_boundary != first_non_nominated {
            return Err(InvariantError::new(format!(
                "nomination_boundary {:?}, first non-nominated entry {:?}",
                self.nomination_boundary, first_non_nominated
            )));
        }
        if self.added_boundary != first_reused {
            return Err(InvariantError::new(format!(
                "added_boundary {:?}, first reused entry {:?}",
                self.added_boundary, first_reused
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Std trait implementations
// ---------------------------------------------------------------------------

impl<'a, K, V> IntoIterator for &'a TriZoneCache<K, V>
where
    K: Clone + Eq + Hash,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Debug for TriZoneCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriZoneCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("nominated_limit", &self.nominated_limit)
            .field("added_limit", &self.added_limit)
            .field("has_evict_listener", &self.on_evict.is_some())
            .finish_non_exhaustive()
    }
}

impl<K, V> ReadOnlyCache<K, V> for TriZoneCache<K, V>
where
    K: Clone + Eq + Hash,
{
    #[inline]
    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn peek(&self, key: &K) -> Option<&V> {
        TriZoneCache::peek(self, key)
    }
}

// ---------------------------------------------------------------------------
// Concurrent wrapper
// ---------------------------------------------------------------------------

/// Thread-safe tri-zone cache behind one `parking_lot::Mutex`.
///
/// `Clone` hands out another handle to the same cache. Values cross the
/// lock either by clone ([`get_or_create_cloned`](Self::get_or_create_cloned))
/// or through a closure run under the lock
/// ([`get_or_create_with_value`](Self::get_or_create_with_value)).
///
/// # Example
///
/// ```
/// use zonecache::policy::tri_zone::ConcurrentTriZoneCache;
///
/// let cache = ConcurrentTriZoneCache::with_factory(64, |k: &u32| vec![*k; 3]);
/// let handle = cache.clone();
///
/// std::thread::spawn(move || {
///     handle.get_or_create_with_value(1, |v| v.push(0));
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(cache.peek_cloned(&1), Some(vec![1, 1, 1, 0]));
/// ```
#[cfg(feature = "concurrency")]
pub struct ConcurrentTriZoneCache<K, V> {
    inner: Arc<Mutex<TriZoneCache<K, V>>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> Clone for ConcurrentTriZoneCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> From<TriZoneCache<K, V>> for ConcurrentTriZoneCache<K, V> {
    fn from(cache: TriZoneCache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentTriZoneCache<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: From<K> + 'static,
{
    /// # Panics
    ///
    /// Panics if `capacity` is below [`MIN_DEFAULT_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        TriZoneCache::new(capacity).into()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentTriZoneCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// # Panics
    ///
    /// Panics on invalid configuration.
    pub fn with_factory<F>(capacity: usize, factory: F) -> Self
    where
        F: FnMut(&K) -> V + Send + 'static,
    {
        TriZoneCache::with_factory(capacity, factory).into()
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] unless `0 < nominated_limit < added_limit < capacity`.
    pub fn try_with_limits<F>(
        capacity: usize,
        nominated_limit: usize,
        added_limit: usize,
        factory: F,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&K) -> V + Send + 'static,
    {
        TriZoneCache::try_with_limits(capacity, nominated_limit, added_limit, factory)
            .map(Self::from)
    }

    /// Runs get-or-create under the lock and applies `f` to the value.
    pub fn get_or_create_with_value<F, R>(&self, key: K, f: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let mut guard = self.inner.lock();
        f(guard.get_or_create(key))
    }

    /// Runs get-or-create under the lock and returns a clone of the value.
    pub fn get_or_create_cloned(&self, key: K) -> V
    where
        V: Clone,
    {
        self.inner.lock().get_or_create(key).clone()
    }

    /// Fallible get-or-create; the factory runs under the lock.
    ///
    /// # Errors
    ///
    /// Returns the factory's error; the cache is unchanged.
    pub fn try_get_or_create_with<F, E>(&self, key: K, factory: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
        V: Clone,
    {
        self.inner
            .lock()
            .try_get_or_create_with(key, factory)
            .map(|v| v.clone())
    }

    /// Clones the value without touching zones.
    pub fn peek_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().peek(key).cloned()
    }

    /// Applies `f` to the value without touching zones.
    pub fn peek_with<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.inner.lock().peek(key).map(f)
    }

    pub fn zone_of(&self, key: &K) -> Option<Zone> {
        self.inner.lock().zone_of(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Drops every entry without notifying the eviction listener.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> TriZoneMetrics {
        self.inner.lock().metrics().clone()
    }

    #[cfg(feature = "metrics")]
    pub fn reset_metrics(&self) {
        self.inner.lock().reset_metrics();
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> Debug for ConcurrentTriZoneCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentTriZoneCache")
            .field("inner", &*self.inner.lock())
            .finish()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentCache for ConcurrentTriZoneCache<K, V>
where
    K: Send,
    V: Send,
{
}

// ---------------------------------------------------------------------------
// Sharded wrapper
// ---------------------------------------------------------------------------

/// Tri-zone cache split into independently locked shards.
///
/// Each key is routed by a [`ShardSelector`] to one shard, so zone history
/// for a key stays in one place. Capacity is split as evenly as possible:
/// the first `capacity % shards` shards hold one extra entry, so shard
/// capacities always sum to `capacity`. Each shard must itself satisfy the
/// limit rules.
///
/// ```
/// use zonecache::policy::tri_zone::ShardedTriZoneCache;
///
/// let cache = ShardedTriZoneCache::try_with_factory(64, 4, |k: &u64| k + 1).unwrap();
/// assert_eq!(cache.get_or_create_cloned(41), 42);
/// assert_eq!(cache.capacity(), 64);
/// assert_eq!(cache.shard_count(), 4);
/// ```
#[cfg(feature = "concurrency")]
pub struct ShardedTriZoneCache<K, V> {
    shards: Vec<Mutex<TriZoneCache<K, V>>>,
    selector: ShardSelector,
}

#[cfg(feature = "concurrency")]
impl<K, V> ShardedTriZoneCache<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: From<K> + 'static,
{
    /// # Panics
    ///
    /// Panics if a shard would be smaller than [`MIN_DEFAULT_CAPACITY`].
    pub fn new(capacity: usize, shards: usize) -> Self {
        match Self::try_with_factory(capacity, shards, |key: &K| V::from(key.clone())) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ShardedTriZoneCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Builds `shards` caches whose capacities sum to `capacity`, each with
    /// default limits and its own copy of `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `shards` is zero or a shard's limits are invalid.
    pub fn try_with_factory<F>(capacity: usize, shards: usize, factory: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&K) -> V + Clone + Send + 'static,
    {
        Self::build_shards(capacity, shards, None, factory, || None)
    }

    /// Like [`try_with_factory`](Self::try_with_factory) with explicit
    /// whole-cache limits and an eviction listener. Limits are scaled to
    /// each shard's share of the capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `shards` is zero or a shard's limits are invalid.
    pub fn try_with_limits<F, L>(
        capacity: usize,
        shards: usize,
        nominated_limit: usize,
        added_limit: usize,
        factory: F,
        on_evict: L,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&K) -> V + Clone + Send + 'static,
        L: FnMut(K, V) + Clone + Send + 'static,
    {
        validate_limits(capacity, nominated_limit, added_limit)?;
        Self::build_shards(
            capacity,
            shards,
            Some((nominated_limit, added_limit)),
            factory,
            || Some(Box::new(on_evict.clone()) as EvictListener<K, V>),
        )
    }

    fn build_shards<F>(
        capacity: usize,
        shards: usize,
        limits: Option<(usize, usize)>,
        factory: F,
        mut make_listener: impl FnMut() -> Option<EvictListener<K, V>>,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&K) -> V + Clone + Send + 'static,
    {
        if shards == 0 {
            return Err(ConfigError::new("shard count must be greater than zero"));
        }
        let base = capacity / shards;
        let remainder = capacity % shards;

        let mut caches = Vec::with_capacity(shards);
        for index in 0..shards {
            // the first `remainder` shards absorb one extra slot each
            let shard_capacity = base + usize::from(index < remainder);
            let (nominated_limit, added_limit) = match limits {
                Some((nominated, added)) => (
                    nominated * shard_capacity / capacity,
                    added * shard_capacity / capacity,
                ),
                None => (
                    default_nominated_limit(shard_capacity),
                    default_added_limit(shard_capacity),
                ),
            };
            let cache = TriZoneCache::from_parts(
                shard_capacity,
                nominated_limit,
                added_limit,
                Box::new(factory.clone()),
                make_listener(),
            )
            .map_err(|e| ConfigError::new(format!("per-shard configuration: {}", e)))?;
            caches.push(Mutex::new(cache));
        }

        debug!(capacity, shards, base, remainder, "sharded tri-zone cache created");
        Ok(Self {
            shards: caches,
            selector: ShardSelector::new(shards, 0),
        })
    }

    #[inline]
    fn shard(&self, key: &K) -> &Mutex<TriZoneCache<K, V>> {
        &self.shards[self.selector.shard_for_key(key)]
    }

    pub fn get_or_create_with_value<F, R>(&self, key: K, f: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let mut guard = self.shard(&key).lock();
        f(guard.get_or_create(key))
    }

    pub fn get_or_create_cloned(&self, key: K) -> V
    where
        V: Clone,
    {
        self.shard(&key).lock().get_or_create(key).clone()
    }

    /// # Errors
    ///
    /// Returns the factory's error; the owning shard is unchanged.
    pub fn try_get_or_create_with<F, E>(&self, key: K, factory: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
        V: Clone,
    {
        self.shard(&key)
            .lock()
            .try_get_or_create_with(key, factory)
            .map(|v| v.clone())
    }

    pub fn peek_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.shard(key).lock().peek(key).cloned()
    }

    pub fn peek_with<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.shard(key).lock().peek(key).map(f)
    }

    pub fn zone_of(&self, key: &K) -> Option<Zone> {
        self.shard(key).lock().zone_of(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.shard(key).lock().contains(key)
    }

    /// Sum of shard lengths. Shards are locked one at a time, so the
    /// total is not an atomic snapshot under concurrent writes.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.lock().is_empty())
    }

    pub fn capacity(&self) -> usize {
        self.shards.iter().map(|s| s.lock().capacity()).sum()
    }

    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }

    /// Counters summed across shards.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> TriZoneMetrics {
        let mut total = TriZoneMetrics::default();
        for shard in &self.shards {
            total.accumulate(shard.lock().metrics());
        }
        total
    }

    #[cfg(feature = "metrics")]
    pub fn reset_metrics(&self) {
        for shard in &self.shards {
            shard.lock().reset_metrics();
        }
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> Debug for ShardedTriZoneCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedTriZoneCache")
            .field("shards", &self.shards.len())
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentCache for ShardedTriZoneCache<K, V>
where
    K: Send,
    V: Send,
{
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
