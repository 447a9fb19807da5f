//! Walkthrough of the tri-zone cache.
//!
//! Run with: cargo run --example basic_tri_zone
//!
//! Set `RUST_LOG=zonecache=trace` to see promotions and evictions logged.

use zonecache::policy::tri_zone::{TriZoneCache, Zone};

fn print_zones(cache: &TriZoneCache<u32, u32>) {
    let render = |zone| {
        cache
            .zone_keys(zone)
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };
    println!(
        "   {{{}}}//{{{}}}//{{{}}}",
        render(Zone::Nominated),
        render(Zone::Added),
        render(Zone::Reused)
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== Tri-Zone Cache Example ===\n");

    // Example 1: filling a four-slot cache
    println!("1. Fill (capacity 4, nominated 2, added 3)");
    let mut cache = TriZoneCache::builder(4)
        .factory(|k: &u32| k * 10)
        .on_evict(|k, v| println!("   evicted {k} -> {v}"))
        .build();

    for k in 0..5 {
        cache.get_or_create(k);
        print!("   after {k}:");
        print_zones(&cache);
    }
    println!();

    // Example 2: hits
    println!("2. Hits");
    cache.get_or_create(2);
    print!("   hit on reused 2 (no-op):");
    print_zones(&cache);
    cache.get_or_create(3);
    print!("   hit on nominated 3 (promoted):");
    print_zones(&cache);
    println!();

    // Example 3: eviction picks the oldest nominated entry
    println!("3. Eviction");
    cache.get_or_create(5);
    print!("   after 5:");
    print_zones(&cache);
    println!();

    // Example 4: a scan does not flush the working set
    println!("4. Scan resistance (capacity 100)");
    let mut big = TriZoneCache::with_factory(100, |k: &u64| *k);
    let working_set: Vec<u64> = (0..20).collect();
    for round in 0..3 {
        for &k in &working_set {
            big.get_or_create(k);
        }
        for k in 0..40 {
            big.get_or_create(1_000 * (round + 1) + k);
        }
    }
    for k in 50_000..50_060 {
        big.get_or_create(k);
    }
    let kept = working_set.iter().filter(|k| big.contains(k)).count();
    println!("   working set kept after 60-key scan: {kept}/{}", working_set.len());
    println!();

    // Example 5: fallible construction
    println!("5. Fallible factory");
    let result = big.try_get_or_create_with(7_777, |_| Err::<u64, _>("backend unavailable"));
    println!("   result: {:?}", result.map(|v| *v));
    println!("   cached after failure? {}", big.contains(&7_777));
}
