//! Seeded key streams for the tri-zone hit-rate benchmarks.
//!
//! Every stream draws from `rand`'s `StdRng`, so a pattern and a seed always
//! replay the same keys. [`drive`] feeds a stream through a cache and
//! [`ZoneReport`] records where the resident entries ended up.

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zonecache::policy::tri_zone::{TriZoneCache, Zone};

/// Shape of the key stream, over keys `[0, universe)`.
#[derive(Debug, Clone, Copy)]
pub enum KeyPattern {
    /// Every key equally likely.
    Uniform,
    /// `hot_share` of requests go to the first `hot_keys` keys.
    Hotset { hot_keys: u64, hot_share: f64 },
    /// A hotset stream that stops every `scan_every` requests for a burst of
    /// `scan_len` one-time keys from above the universe.
    HotsetWithScans {
        hot_keys: u64,
        hot_share: f64,
        scan_every: u64,
        scan_len: u64,
    },
    /// Rank-frequency skew; key `0` is the most popular. `exponent` 0.0 is
    /// uniform, around 1.0 is typical of web traffic.
    Zipfian { exponent: f64 },
}

pub struct KeyStream {
    universe: u64,
    pattern: KeyPattern,
    rng: StdRng,
    // cumulative probabilities by rank, only for `Zipfian`
    cdf: Vec<f64>,
    until_scan: u64,
    scan_left: u64,
    next_scan_key: u64,
}

impl KeyStream {
    pub fn new(universe: u64, pattern: KeyPattern, seed: u64) -> Self {
        let universe = universe.max(1);
        let cdf = match pattern {
            KeyPattern::Zipfian { exponent } => zipf_cdf(universe, exponent),
            _ => Vec::new(),
        };
        let until_scan = match pattern {
            KeyPattern::HotsetWithScans { scan_every, .. } => scan_every.max(1),
            _ => 0,
        };
        Self {
            universe,
            pattern,
            rng: StdRng::seed_from_u64(seed),
            cdf,
            until_scan,
            scan_left: 0,
            next_scan_key: universe,
        }
    }

    fn hotset_key(&mut self, hot_keys: u64, hot_share: f64) -> u64 {
        let hot_keys = hot_keys.clamp(1, self.universe);
        if hot_keys == self.universe || self.rng.gen_bool(hot_share.clamp(0.0, 1.0)) {
            self.rng.gen_range(0..hot_keys)
        } else {
            self.rng.gen_range(hot_keys..self.universe)
        }
    }

    fn scan_key(&mut self) -> u64 {
        let key = self.next_scan_key;
        self.next_scan_key += 1;
        key
    }
}

impl Iterator for KeyStream {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let key = match self.pattern {
            KeyPattern::Uniform => self.rng.gen_range(0..self.universe),
            KeyPattern::Hotset {
                hot_keys,
                hot_share,
            } => self.hotset_key(hot_keys, hot_share),
            KeyPattern::HotsetWithScans {
                hot_keys,
                hot_share,
                scan_every,
                scan_len,
            } => {
                if self.scan_left > 0 {
                    self.scan_left -= 1;
                    self.scan_key()
                } else {
                    self.until_scan -= 1;
                    if self.until_scan == 0 {
                        self.until_scan = scan_every.max(1);
                        self.scan_left = scan_len;
                    }
                    self.hotset_key(hot_keys, hot_share)
                }
            },
            KeyPattern::Zipfian { .. } => {
                let u: f64 = self.rng.gen();
                let rank = self.cdf.partition_point(|&c| c < u);
                (rank as u64).min(self.universe - 1)
            },
        };
        Some(key)
    }
}

fn zipf_cdf(universe: u64, exponent: f64) -> Vec<f64> {
    let weights: Vec<f64> = (1..=universe)
        .map(|rank| (rank as f64).powf(-exponent.max(0.0)))
        .collect();
    let total: f64 = weights.iter().sum();
    let mut running = 0.0;
    weights
        .into_iter()
        .map(|w| {
            running += w / total;
            running
        })
        .collect()
}

/// Hits and misses seen while replaying a stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tally {
    pub hits: u64,
    pub misses: u64,
}

/// Replays `operations` keys through `cache`. A request is a hit when the key
/// was resident before `get_or_create`.
pub fn drive<V>(cache: &mut TriZoneCache<u64, Arc<V>>, stream: &mut KeyStream, operations: usize) -> Tally {
    let mut tally = Tally::default();
    for key in stream.take(operations) {
        if cache.contains(&key) {
            tally.hits += 1;
        } else {
            tally.misses += 1;
        }
        std::hint::black_box(cache.get_or_create(key));
    }
    tally
}

/// Hit rate plus the zone occupancy a replay left behind.
#[derive(Debug, Clone, Copy)]
pub struct ZoneReport {
    pub tally: Tally,
    pub nominated: usize,
    pub added: usize,
    pub reused: usize,
}

impl ZoneReport {
    pub fn capture<V>(cache: &TriZoneCache<u64, V>, tally: Tally) -> Self {
        Self {
            tally,
            nominated: cache.zone_keys(Zone::Nominated).len(),
            added: cache.zone_keys(Zone::Added).len(),
            reused: cache.zone_keys(Zone::Reused).len(),
        }
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.tally.hits + self.tally.misses;
        if total == 0 {
            0.0
        } else {
            self.tally.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for ZoneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hit rate {:.2}% | nominated {} / added {} / reused {}",
            self.hit_rate() * 100.0,
            self.nominated,
            self.added,
            self.reused
        )
    }
}
