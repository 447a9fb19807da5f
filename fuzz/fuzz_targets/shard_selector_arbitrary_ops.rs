#![no_main]

use libfuzzer_sys::fuzz_target;
use zonecache::ds::ShardSelector;

// Fuzz shard selection for arbitrary shard counts, seeds and keys
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let shard_count = (data[0] as usize) % 65;
    let seed = u64::from(data[1]);
    let selector = ShardSelector::new(shard_count, seed);
    assert_eq!(selector.shard_count(), shard_count.max(1));

    for &byte in &data[2..] {
        let key = u32::from(byte);
        let shard = selector.shard_for_key(&key);
        assert!(shard < selector.shard_count());
        assert_eq!(shard, selector.shard_for_key(&key));
    }

    if let Ok(text) = std::str::from_utf8(&data[2..]) {
        let shard = selector.shard_for_key(text);
        assert!(shard < selector.shard_count());
    }
});
