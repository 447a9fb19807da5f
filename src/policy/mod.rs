//! Eviction policies.
//!
//! - [`tri_zone`]: three-zone ring (`Nominated` / `Added` / `Reused`) with
//!   O(1) lazy boundary balancing.

pub mod tri_zone;
