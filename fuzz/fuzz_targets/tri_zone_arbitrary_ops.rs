#![no_main]

use std::sync::{Arc, Mutex};

use libfuzzer_sys::fuzz_target;
use zonecache::policy::tri_zone::TriZoneCache;

// Fuzz request streams on TriZoneCache with arbitrary limits
//
// First three bytes pick capacity and limits; every following byte is an
// operation on a small key space so hits, promotions and evictions all occur.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let capacity = (data[0] as usize % 32) + 3;
    let nominated = (data[1] as usize % (capacity - 2)) + 1;
    let added = nominated + 1 + (data[2] as usize % (capacity - nominated - 1));

    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&evicted);
    let mut cache = TriZoneCache::builder(capacity)
        .nominated_limit(nominated)
        .added_limit(added)
        .factory(|k: &u8| u32::from(*k) * 3)
        .on_evict(move |k, v| sink.lock().unwrap().push((k, v)))
        .build();

    for &byte in &data[3..] {
        let key = byte & 0x3f;
        match byte >> 6 {
            0 | 1 => {
                let was_resident = cache.contains(&key);
                let before = cache.len();
                assert_eq!(*cache.get_or_create(key), u32::from(key) * 3);
                let drained: Vec<_> = evicted.lock().unwrap().drain(..).collect();
                if was_resident || before < capacity {
                    assert!(drained.is_empty());
                    assert_eq!(cache.len(), before + usize::from(!was_resident));
                } else {
                    assert_eq!(drained.len(), 1);
                    assert_ne!(drained[0].0, key);
                    assert_eq!(drained[0].1, u32::from(drained[0].0) * 3);
                    assert!(!cache.contains(&drained[0].0));
                }
            },
            2 => {
                let len = cache.len();
                let resident = cache.contains(&key);
                let ok = cache
                    .try_get_or_create_with(key, |_| Err::<u32, _>(()))
                    .is_ok();
                assert_eq!(ok, resident);
                assert_eq!(cache.len(), len);
            },
            3 => {
                if key == 0 {
                    cache.clear();
                    assert!(cache.is_empty());
                } else {
                    let zone = cache.zone_of(&key);
                    assert_eq!(zone.is_some(), cache.peek(&key).is_some());
                }
            },
            _ => unreachable!(),
        }

        assert!(cache.len() <= capacity);
        if let Err(e) = cache.check_invariants() {
            panic!("{e}");
        }
    }
});
