//! zonecache: a fixed-capacity get-or-create cache with a scan-resistant
//! three-zone eviction policy.
//!
//! Entries age through `Nominated`, `Added` and `Reused` zones on a single
//! ring; a second access while `Nominated` protects an entry, one-time keys
//! leave through `Nominated` without touching the working set. The
//! [`policy::tri_zone`] module docs describe the ring layout, the access
//! path and the boundary rules.
//!
//! ```
//! use zonecache::prelude::*;
//!
//! let mut cache = TriZoneCache::with_factory(16, |k: &u32| k.to_string());
//! assert_eq!(cache.get_or_create(7).as_str(), "7");
//! assert!(cache.contains(&7));
//! ```
//!
//! ## Features
//!
//! - `metrics`: per-cache counters ([`policy::tri_zone::TriZoneMetrics`]).
//! - `concurrency`: `parking_lot` backed shared and sharded wrappers.
//! - `dhat-heap`: heap profiling binary.

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod traits;
