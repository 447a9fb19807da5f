pub use crate::builder::TriZoneCacheBuilder;
pub use crate::ds::{ShardSelector, SlotArena, SlotId, ZoneRing};
pub use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
pub use crate::policy::tri_zone::TriZoneMetrics;
pub use crate::policy::tri_zone::{TriZoneCache, Zone};
#[cfg(feature = "concurrency")]
pub use crate::policy::tri_zone::{ConcurrentTriZoneCache, ShardedTriZoneCache};
pub use crate::traits::{ConcurrentCache, ReadOnlyCache};
