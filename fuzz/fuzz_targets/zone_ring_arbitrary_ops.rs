#![no_main]

use libfuzzer_sys::fuzz_target;
use zonecache::ds::{SlotId, Zone, ZoneRing};

const ZONES: [Zone; 3] = [Zone::Nominated, Zone::Added, Zone::Reused];

// Fuzz arbitrary link/unlink sequences on ZoneRing against a Vec model
//
// The model holds (id, value, zone) in ring order, oldest first.
fuzz_target!(|data: &[u8]| {
    let mut ring: ZoneRing<u16> = ZoneRing::new();
    let mut model: Vec<(SlotId, u16, Zone)> = Vec::new();

    for chunk in data.chunks_exact(3) {
        let op = chunk[0] % 5;
        let a = chunk[1] as usize;
        let zone = ZONES[chunk[2] as usize % ZONES.len()];

        // picks a position in the model, or the sentinel when it lands past the end
        let anchor = |model: &Vec<(SlotId, u16, Zone)>, pick: usize| -> (usize, Option<SlotId>) {
            let pos = pick % (model.len() + 1);
            (pos, model.get(pos).map(|entry| entry.0))
        };

        match op {
            0 => {
                let (pos, at) = anchor(&model, a);
                let value = u16::from(chunk[1]) << 8 | u16::from(chunk[2]);
                let id = ring.push_before(at, value, zone);
                model.insert(pos, (id, value, zone));
            },
            1 => {
                if !model.is_empty() {
                    let (id, value, _) = model.remove(a % model.len());
                    assert_eq!(ring.remove(id), Some(value));
                    assert!(!ring.contains(id));
                    assert_eq!(ring.remove(id), None);
                }
            },
            2 => {
                if model.len() >= 2 {
                    let from = a % model.len();
                    let entry = model.remove(from);
                    let (pos, at) = anchor(&model, usize::from(chunk[2]));
                    ring.move_before(entry.0, at, zone);
                    model.insert(pos, (entry.0, entry.1, zone));
                }
            },
            3 => {
                if !model.is_empty() {
                    let slot = a % model.len();
                    assert!(ring.set_zone(model[slot].0, zone));
                    model[slot].2 = zone;
                }
            },
            4 => {
                ring.clear();
                model.clear();
            },
            _ => unreachable!(),
        }

        assert_eq!(ring.len(), model.len());
        assert_eq!(ring.front(), model.first().map(|e| e.0));
        assert_eq!(ring.back(), model.last().map(|e| e.0));
        let walked: Vec<(SlotId, u16, Zone)> = ring.iter().map(|(id, z, v)| (id, *v, z)).collect();
        assert_eq!(walked, model);
        if let Err(e) = ring.debug_validate() {
            panic!("{e}");
        }
    }
});
