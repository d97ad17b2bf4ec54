//! Arena allocation for term DAG nodes.
//!
//! Provides `NodeId` (a slot index paired with a generation counter) and
//! `NodeArena` (contiguous storage with free-list reuse). The arena stores
//! node data of a generic type `T`.
//!
//! # Determinism
//! - `NodeId` ordering is by index, then generation.
//! - Iteration visits live slots in index order.
//! - Free-list reuse is LIFO; the same sequence of allocations and
//!   deallocations yields the same ids across runs.
//!
//! # Staleness
//! Freeing a slot bumps its generation, so an id handed out before the free
//! no longer resolves once the slot has been reused.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation-checked identifier of a node in a `NodeArena`.
///
/// Two ids are equal only if both the slot index and the generation match.
/// Because the term DAG is hash-consed, equality of live ids is structural
/// equality of the terms they denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Creates a `NodeId` from raw parts.
    ///
    /// Ids built this way are only meaningful for the arena that issued the
    /// same parts; prefer the ids returned by `TermDag` constructors.
    #[inline]
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index.
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Returns the generation of the slot when this id was issued.
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}#{})", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    data: Option<T>,
    generation: u32,
    next_free: Option<u32>,
}

/// Slot storage for DAG nodes; freed slots go on an intrusive free list.
#[derive(Debug, Clone)]
pub struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    free_list_head: Option<u32>,
    live_count: usize,
}

impl<T> NodeArena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list_head: None,
            live_count: 0,
        }
    }

    /// Allocates a slot for `data` and returns its id.
    ///
    /// The most recently freed slot is reused first; its generation was
    /// already advanced when it was freed.
    pub fn allocate(&mut self, data: T) -> NodeId {
        self.live_count += 1;
        if let Some(idx) = self.free_list_head {
            let slot = &mut self.slots[idx as usize];
            debug_assert!(slot.data.is_none(), "slot {} is on the free list but occupied", idx);
            self.free_list_head = slot.next_free;
            slot.data = Some(data);
            slot.next_free = None;
            NodeId::from_parts(idx, slot.generation)
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                data: Some(data),
                generation: 0,
                next_free: None,
            });
            NodeId::from_parts(idx, 0)
        }
    }

    /// Frees the slot identified by `id` and returns its data.
    ///
    /// Returns `None` if `id` is stale or already free.
    pub fn deallocate(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let data = slot.data.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.next_free = self.free_list_head;
        self.free_list_head = Some(id.index);
        self.live_count -= 1;
        Some(data)
    }

    /// Returns `true` if `id` refers to a live slot of the current generation.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Returns a reference to the data stored at `id`, if live.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    /// Returns a mutable reference to the data stored at `id`, if live.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    /// Returns the number of live nodes.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Iterates over all live nodes in index order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.data
                .as_ref()
                .map(|data| (NodeId::from_parts(idx as u32, slot.generation), data))
        })
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
