pub mod ring;
pub mod shard;
pub mod slot_arena;

pub use ring::{Zone, ZoneRing, ZoneRingIter};
pub use shard::ShardSelector;
pub use slot_arena::{SlotArena, SlotId};
