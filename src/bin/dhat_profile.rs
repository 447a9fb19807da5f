//! DHAT heap profiling for the tri-zone cache.
//!
//! Run with: `cargo run --bin dhat_profile --features dhat-heap --release`
//!
//! Writes `dhat-heap.json`, which can be opened in the DHAT viewer.

use std::sync::Arc;

use zonecache::policy::tri_zone::TriZoneCache;

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Debug, Clone, Copy)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (u64::MAX as f64);
        (self.next_u64() as f64) * SCALE
    }
}

type ProfiledCache = TriZoneCache<u64, Arc<u64>>;

/// 90% of accesses go to 10% of the keys.
fn hotset_workload(cache: &mut ProfiledCache, operations: usize, universe: u64, seed: u64) {
    let mut rng = XorShift64::new(seed);
    let hot_size = (universe as f64 * 0.1) as u64;

    for _ in 0..operations {
        let key = if rng.next_f64() < 0.9 {
            rng.next_u64() % hot_size
        } else {
            hot_size + (rng.next_u64() % (universe - hot_size))
        };
        cache.get_or_create(key);
    }
}

/// One sequential pass over the universe, repeated until `operations` is spent.
fn scan_workload(cache: &mut ProfiledCache, operations: usize, universe: u64) {
    for i in 0..operations {
        cache.get_or_create((i as u64) % universe);
    }
}

/// Only never-seen keys, so every request admits and evicts.
fn eviction_churn(cache: &mut ProfiledCache, operations: usize, offset: u64) {
    for i in 0..operations {
        cache.get_or_create(offset + i as u64);
    }
}

fn profile(label: &str, capacity: usize, nominated: usize, added: usize) {
    println!("=== Profiling {label} (capacity {capacity}) ===");
    let operations = 100_000;
    let universe = 16_384;

    let mut cache = match ProfiledCache::try_with_limits(capacity, nominated, added, |k: &u64| {
        Arc::new(*k)
    }) {
        Ok(cache) => cache,
        Err(e) => {
            eprintln!("  skipped: {e}");
            return;
        },
    };

    for i in 0..capacity as u64 {
        cache.get_or_create(i);
    }

    hotset_workload(&mut cache, operations, universe, 42);
    scan_workload(&mut cache, operations / 2, universe);
    eviction_churn(&mut cache, operations / 4, universe);

    println!("  Final size: {}", cache.len());
}

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    println!("zonecache DHAT Heap Profiling");
    println!("=============================\n");

    profile("default limits", 4096, 2048, 3072);
    profile("small nominated zone", 4096, 512, 3072);
    profile("small reused zone", 4096, 2048, 3968);

    println!("\n=============================");
    println!("Profile written to dhat-heap.json");
}
