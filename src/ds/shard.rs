//! Key-to-shard routing for the sharded tri-zone cache.
//!
//! [`ShardSelector`] hashes a key together with a seed and reduces it modulo
//! the shard count. Used by
//! [`ShardedTriZoneCache`](crate::policy::tri_zone::ShardedTriZoneCache) to
//! pick which independently locked shard owns a key.
//!
//! ```text
//!   key ──► FxHasher(seed, key) ──► h % shards ──► shard index
//!
//!   ┌─────────┬─────────┬─────────┬─────────┐
//!   │ shard 0 │ shard 1 │ shard 2 │ shard 3 │   each: Mutex<TriZoneCache>
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! The mapping is stable for a given `(key, seed, shards)`, so a key always
//! lands in the same shard and its zone history stays in one place.
//!
//! ## Example Usage
//!
//! ```
//! use zonecache::ds::ShardSelector;
//!
//! let selector = ShardSelector::new(4, 0);
//! let shard = selector.shard_for_key(&"user:123");
//! assert!(shard < 4);
//! assert_eq!(selector.shard_for_key(&"user:123"), shard);
//! ```

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Deterministic, seeded key → shard mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSelector {
    shards: usize,
    seed: u64,
}

impl ShardSelector {
    /// Creates a selector over `shards` shards. Zero is clamped to one.
    ///
    /// ```
    /// use zonecache::ds::ShardSelector;
    ///
    /// assert_eq!(ShardSelector::new(0, 7).shard_count(), 1);
    /// ```
    pub fn new(shards: usize, seed: u64) -> Self {
        Self {
            shards: shards.max(1),
            seed,
        }
    }

    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shards
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the shard index in `[0, shard_count)` that owns `key`.
    #[inline]
    pub fn shard_for_key<K: Hash + ?Sized>(&self, key: &K) -> usize {
        if self.shards == 1 {
            return 0;
        }
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() % self.shards as u64) as usize
    }
}

impl Default for ShardSelector {
    /// A single shard with seed 0.
    fn default() -> Self {
        Self::new(1, 0)
    }
}
