#![no_main]

use libfuzzer_sys::fuzz_target;
use zonecache::ds::SlotArena;

// Fuzz arbitrary operation sequences on SlotArena
//
// Stale handles must never resolve, even after their slot is reused.
fuzz_target!(|data: &[u8]| {
    let mut arena: SlotArena<u32> = SlotArena::new();
    let mut live = Vec::new();
    let mut dead = Vec::new();

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 6;
        let value = u32::from(pair[1]);

        match op {
            0 => {
                let id = arena.insert(value);
                assert_eq!(arena.get(id), Some(&value));
                live.push((id, value));
            },
            1 => {
                if !live.is_empty() {
                    let (id, expected) = live.swap_remove(value as usize % live.len());
                    assert_eq!(arena.remove(id), Some(expected));
                    assert!(!arena.contains(id));
                    dead.push(id);
                }
            },
            2 => {
                if !live.is_empty() {
                    let slot = value as usize % live.len();
                    let (id, _) = live[slot];
                    if let Some(v) = arena.get_mut(id) {
                        *v = value.wrapping_add(1);
                    }
                    live[slot].1 = value.wrapping_add(1);
                }
            },
            3 => {
                for &id in &dead {
                    assert_eq!(arena.get(id), None);
                    assert_eq!(arena.remove(id), None);
                }
            },
            4 => {
                assert_eq!(arena.iter().count(), arena.len());
            },
            5 => {
                arena.clear();
                dead.extend(live.drain(..).map(|(id, _)| id));
                assert!(arena.is_empty());
            },
            _ => unreachable!(),
        }

        assert_eq!(arena.len(), live.len());
        for &(id, expected) in &live {
            assert_eq!(arena.get(id), Some(&expected));
        }
    }
});
