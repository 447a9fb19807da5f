//! Sentinel ring backed by [`SlotArena`], with a zone tag per node.
//!
//! Nodes live in a `SlotArena` and link to each other by [`SlotId`]. The ring
//! closes through an implicit sentinel: a link of `None` means "the sentinel".
//! Walking forward from the sentinel visits nodes oldest to newest.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<RingNode<T>>)
//!   ┌────────┬───────────────────────────────────────────────────┐
//!   │ SlotId │ RingNode { value, zone, prev, next }              │
//!   ├────────┼───────────────────────────────────────────────────┤
//!   │ id_1   │ { A, Nominated, prev: None,       next: id_2 }    │
//!   │ id_2   │ { B, Added,     prev: Some(id_1), next: id_3 }    │
//!   │ id_3   │ { C, Reused,    prev: Some(id_2), next: None }    │
//!   └────────┴───────────────────────────────────────────────────┘
//!
//!        ┌──────────────────────────────────────────────┐
//!        ▼                                              │
//!   (sentinel) ─► [id_1] ◄──► [id_2] ◄──► [id_3] ───────┘
//!     head = id_1 (oldest)            tail = id_3 (newest)
//! ```
//!
//! Positions are `Option<SlotId>` throughout, so a cursor that "points at the
//! sentinel" is simply `None`. [`next`](ZoneRing::next) and
//! [`prev`](ZoneRing::prev) wrap around the sentinel the way the ring does.
//!
//! ## Operations
//! - `push_before(at, value, zone)`: allocate + link before `at`
//! - `move_before(id, at)`: unlink + relink before `at`
//! - `remove(id)`: unlink + free slot
//!
//! All of the above are O(1). `iter` is O(n).
//!
//! The ring knows nothing about zone ordering; it only stores the tag. The
//! three-zone discipline is enforced by
//! [`TriZoneCache`](crate::policy::tri_zone::TriZoneCache).

use std::fmt;

use crate::ds::slot_arena::{SlotArena, SlotId};
#[cfg(any(test, debug_assertions))]
use crate::error::InvariantError;

/// Zone tag carried by every ring node.
///
/// Traversal order of a well-formed tri-zone ring is all `Nominated`, then all
/// `Added`, then all `Reused`. `Detached` marks a node that is momentarily
/// out of the ring and never appears on a linked node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Inserted and aged, not yet proven by a second access. Evicted first.
    Nominated,
    /// Recently inserted, shielded from promotion until it ages into `Nominated`.
    Added,
    /// Accessed again while `Nominated`; the working set.
    Reused,
    /// Not linked into the ring.
    Detached,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Nominated => "nominated",
            Zone::Added => "added",
            Zone::Reused => "reused",
            Zone::Detached => "detached",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct RingNode<T> {
    value: T,
    zone: Zone,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Circular doubly linked ring over a `SlotArena`, closed by a sentinel.
#[derive(Debug)]
pub struct ZoneRing<T> {
    arena: SlotArena<RingNode<T>>,
    /// Sentinel's successor: the oldest node.
    head: Option<SlotId>,
    /// Sentinel's predecessor: the newest node.
    tail: Option<SlotId>,
}

impl<T> ZoneRing<T> {
    /// Creates an empty ring (only the sentinel).
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty ring with reserved node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of linked nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: SlotId) -> bool {
        self.arena.contains(id)
    }

    /// Returns the oldest node (the sentinel's successor).
    #[inline]
    pub fn front(&self) -> Option<SlotId> {
        self.head
    }

    /// Returns the newest node (the sentinel's predecessor).
    #[inline]
    pub fn back(&self) -> Option<SlotId> {
        self.tail
    }

    /// Successor of `pos`, wrapping through the sentinel.
    ///
    /// `next(None)` is the oldest node; `next` of the newest node is `None`.
    #[inline]
    pub fn next(&self, pos: Option<SlotId>) -> Option<SlotId> {
        match pos {
            None => self.head,
            Some(id) => self.node(id).next,
        }
    }

    /// Predecessor of `pos`, wrapping through the sentinel.
    #[inline]
    pub fn prev(&self, pos: Option<SlotId>) -> Option<SlotId> {
        match pos {
            None => self.tail,
            Some(id) => self.node(id).prev,
        }
    }

    /// Zone of the node at `pos`; the sentinel has no zone.
    #[inline]
    pub fn zone_at(&self, pos: Option<SlotId>) -> Option<Zone> {
        pos.map(|id| self.node(id).zone)
    }

    #[inline]
    pub fn zone(&self, id: SlotId) -> Option<Zone> {
        self.arena.get(id).map(|node| node.zone)
    }

    /// Retags a linked node. Returns `false` if `id` is stale.
    #[inline]
    pub fn set_zone(&mut self, id: SlotId, zone: Zone) -> bool {
        debug_assert_ne!(zone, Zone::Detached, "linked nodes cannot be detached");
        match self.arena.get_mut(id) {
            Some(node) => {
                node.zone = zone;
                true
            },
            None => false,
        }
    }

    #[inline]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.value)
    }

    #[inline]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|node| &mut node.value)
    }

    /// Allocates a node tagged `zone` and links it immediately before `at`.
    ///
    /// `at == None` links it before the sentinel, i.e. as the newest node.
    pub fn push_before(&mut self, at: Option<SlotId>, value: T, zone: Zone) -> SlotId {
        let id = self.arena.insert(RingNode {
            value,
            zone: Zone::Detached,
            prev: None,
            next: None,
        });
        self.link_before(at, id, zone);
        id
    }

    /// Unlinks `id` and relinks it immediately before `at`, tagged `zone`.
    ///
    /// `at` must not be `id` itself.
    pub fn move_before(&mut self, id: SlotId, at: Option<SlotId>, zone: Zone) {
        debug_assert_ne!(at, Some(id), "cannot link a node before itself");
        self.unlink(id);
        self.link_before(at, id, zone);
    }

    /// Unlinks `id` and frees its slot, returning the value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        if !self.arena.contains(id) {
            return None;
        }
        self.unlink(id);
        self.arena.remove(id).map(|node| node.value)
    }

    /// Drops every node; only the sentinel remains.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates `(id, zone, value)` from oldest to newest.
    pub fn iter(&self) -> ZoneRingIter<'_, T> {
        ZoneRingIter {
            ring: self,
            current: self.head,
            remaining: self.len(),
        }
    }

    #[inline]
    fn node(&self, id: SlotId) -> &RingNode<T> {
        self.arena.get(id).expect("ring: stale SlotId")
    }

    #[inline]
    fn node_mut(&mut self, id: SlotId) -> &mut RingNode<T> {
        self.arena.get_mut(id).expect("ring: stale SlotId")
    }

    fn unlink(&mut self, id: SlotId) {
        let (prev, next) = {
            let node = self.node_mut(id);
            debug_assert_ne!(node.zone, Zone::Detached, "unlinking a detached node");
            node.zone = Zone::Detached;
            (node.prev.take(), node.next.take())
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    fn link_before(&mut self, at: Option<SlotId>, id: SlotId, zone: Zone) {
        let prev = self.prev(at);
        {
            let node = self.node_mut(id);
            debug_assert_eq!(node.zone, Zone::Detached, "linking an already linked node");
            node.zone = zone;
            node.prev = prev;
            node.next = at;
        }
        match prev {
            Some(p) => self.node_mut(p).next = Some(id),
            None => self.head = Some(id),
        }
        match at {
            Some(a) => self.node_mut(a).prev = Some(id),
            None => self.tail = Some(id),
        }
    }

    /// Walks the ring and checks link symmetry, node count and that no linked
    /// node is tagged `Detached`.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate(&self) -> Result<(), InvariantError> {
        if self.head.is_none() != self.tail.is_none() {
            return Err(InvariantError::new(format!(
                "ring: head {:?} / tail {:?} disagree on emptiness",
                self.head, self.tail
            )));
        }

        let mut count = 0usize;
        let mut prev = None;
        let mut current = self.head;
        while let Some(id) = current {
            let node = self
                .arena
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("ring: stale link {:?}", id)))?;
            if node.prev != prev {
                return Err(InvariantError::new(format!(
                    "ring: node {:?} prev {:?}, expected {:?}",
                    id, node.prev, prev
                )));
            }
            if node.zone == Zone::Detached {
                return Err(InvariantError::new(format!(
                    "ring: linked node {:?} tagged detached",
                    id
                )));
            }
            count += 1;
            if count > self.arena.len() {
                return Err(InvariantError::new("ring: cycle detected"));
            }
            prev = Some(id);
            current = node.next;
        }

        if self.tail != prev {
            return Err(InvariantError::new(format!(
                "ring: tail {:?}, last walked node {:?}",
                self.tail, prev
            )));
        }
        if count != self.arena.len() {
            return Err(InvariantError::new(format!(
                "ring: walked {} nodes, arena holds {}",
                count,
                self.arena.len()
            )));
        }
        Ok(())
    }
}

impl<T> Default for ZoneRing<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Oldest-to-newest iterator over a [`ZoneRing`].
pub struct ZoneRingIter<'a, T> {
    ring: &'a ZoneRing<T>,
    current: Option<SlotId>,
    remaining: usize,
}

impl<'a, T> Iterator for ZoneRingIter<'a, T> {
    type Item = (SlotId, Zone, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.ring.arena.get(id)?;
        self.current = node.next;
        self.remaining -= 1;
        Some((id, node.zone, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for ZoneRingIter<'_, T> {}

impl<T> std::iter::FusedIterator for ZoneRingIter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<T: Copy>(ring: &ZoneRing<T>) -> Vec<T> {
        ring.iter().map(|(_, _, v)| *v).collect()
    }

    #[test]
    fn push_before_sentinel_appends_newest() {
        let mut ring = ZoneRing::new();
        let a = ring.push_before(None, 'a', Zone::Nominated);
        let b = ring.push_before(None, 'b', Zone::Nominated);
        let c = ring.push_before(None, 'c', Zone::Reused);

        assert_eq!(values(&ring), vec!['a', 'b', 'c']);
        assert_eq!(ring.front(), Some(a));
        assert_eq!(ring.back(), Some(c));
        assert_eq!(ring.next(Some(a)), Some(b));
        ring.debug_validate().unwrap();
    }

    #[test]
    fn next_and_prev_wrap_through_sentinel() {
        let mut ring = ZoneRing::new();
        assert_eq!(ring.next(None), None);
        assert_eq!(ring.prev(None), None);

        let a = ring.push_before(None, 1, Zone::Added);
        let b = ring.push_before(None, 2, Zone::Added);

        assert_eq!(ring.next(None), Some(a));
        assert_eq!(ring.prev(None), Some(b));
        assert_eq!(ring.next(Some(b)), None);
        assert_eq!(ring.prev(Some(a)), None);
        assert_eq!(ring.zone_at(None), None);
        assert_eq!(ring.zone_at(Some(a)), Some(Zone::Added));
    }

    #[test]
    fn push_before_interior_node() {
        let mut ring = ZoneRing::new();
        let a = ring.push_before(None, 1, Zone::Nominated);
        let c = ring.push_before(None, 3, Zone::Reused);
        ring.push_before(Some(c), 2, Zone::Added);
        ring.push_before(Some(a), 0, Zone::Nominated);

        assert_eq!(values(&ring), vec![0, 1, 2, 3]);
        ring.debug_validate().unwrap();
    }

    #[test]
    fn move_before_relinks_and_retags() {
        let mut ring = ZoneRing::new();
        let a = ring.push_before(None, 'a', Zone::Nominated);
        let b = ring.push_before(None, 'b', Zone::Nominated);
        let c = ring.push_before(None, 'c', Zone::Added);

        ring.move_before(a, None, Zone::Reused);
        assert_eq!(values(&ring), vec!['b', 'c', 'a']);
        assert_eq!(ring.zone(a), Some(Zone::Reused));

        ring.move_before(a, Some(b), Zone::Nominated);
        assert_eq!(values(&ring), vec!['a', 'b', 'c']);
        assert_eq!(ring.front(), Some(a));
        assert_eq!(ring.back(), Some(c));
        ring.debug_validate().unwrap();
    }

    #[test]
    fn remove_front_back_and_middle() {
        let mut ring = ZoneRing::new();
        let ids: Vec<_> = (0..5).map(|i| ring.push_before(None, i, Zone::Added)).collect();

        assert_eq!(ring.remove(ids[0]), Some(0));
        assert_eq!(ring.remove(ids[4]), Some(4));
        assert_eq!(ring.remove(ids[2]), Some(2));
        assert_eq!(ring.remove(ids[2]), None);

        assert_eq!(values(&ring), vec![1, 3]);
        assert_eq!(ring.len(), 2);
        ring.debug_validate().unwrap();
    }

    #[test]
    fn remove_last_node_empties_ring() {
        let mut ring = ZoneRing::new();
        let a = ring.push_before(None, 1, Zone::Reused);
        ring.remove(a);

        assert!(ring.is_empty());
        assert_eq!(ring.front(), None);
        assert_eq!(ring.back(), None);
        ring.debug_validate().unwrap();
    }

    #[test]
    fn set_zone_on_stale_id_fails() {
        let mut ring = ZoneRing::new();
        let a = ring.push_before(None, 1, Zone::Added);
        assert!(ring.set_zone(a, Zone::Nominated));
        ring.remove(a);
        assert!(!ring.set_zone(a, Zone::Nominated));
    }

    #[test]
    fn iter_reports_zones_and_exact_len() {
        let mut ring = ZoneRing::new();
        ring.push_before(None, 1, Zone::Nominated);
        ring.push_before(None, 2, Zone::Added);
        ring.push_before(None, 3, Zone::Reused);

        let iter = ring.iter();
        assert_eq!(iter.len(), 3);
        let zones: Vec<_> = iter.map(|(_, zone, _)| zone).collect();
        assert_eq!(zones, vec![Zone::Nominated, Zone::Added, Zone::Reused]);
    }

    #[test]
    fn clear_resets_to_sentinel_only() {
        let mut ring = ZoneRing::new();
        let a = ring.push_before(None, 1, Zone::Added);
        ring.push_before(None, 2, Zone::Added);
        ring.clear();

        assert!(ring.is_empty());
        assert!(!ring.contains(a));
        assert_eq!(ring.next(None), None);
        ring.debug_validate().unwrap();
    }

    #[test]
    fn zone_display_is_lowercase() {
        assert_eq!(Zone::Nominated.to_string(), "nominated");
        assert_eq!(Zone::Reused.to_string(), "reused");
    }
}
