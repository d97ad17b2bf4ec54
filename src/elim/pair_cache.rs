//! Pass-scoped memo table for beta-reduction results.
//!
//! Keys are `Pair`s of canonical node identities (function, argument list).
//! Each entry owns one reference on both key components and one on the
//! cached value, so the key ids cannot be freed and reissued to different
//! terms while the pass runs. `drain` hands every reference back to the DAG;
//! a cache must be drained before it is dropped.

use crate::dag::{NodeId, NodeRef, TermDag};
use indexmap::IndexMap;

/// Ordered pair of node identities used as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    pub first: NodeId,
    pub second: NodeId,
}

impl Pair {
    /// Creates a pair from two node ids.
    #[inline]
    pub const fn new(first: NodeId, second: NodeId) -> Self {
        Self { first, second }
    }

    /// The `(function, arguments)` pair of an application node.
    pub fn of_apply(dag: &TermDag, app: NodeId) -> Option<Self> {
        let node = dag.node(app).filter(|node| node.is_apply())?;
        Some(Self::new(
            dag.resolve(node.children()[0]),
            dag.resolve(node.children()[1]),
        ))
    }
}

#[derive(Debug)]
struct CacheEntry {
    first: NodeRef,
    second: NodeRef,
    value: NodeRef,
}

/// Memo table from `Pair` to reduced node.
#[derive(Debug, Default)]
pub struct PairCache {
    entries: IndexMap<Pair, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl PairCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `pair`, returning a fresh reference to the cached value.
    ///
    /// The value is resolved through proxies, so a result that was rewritten
    /// by a later rebuild is served in its current form.
    pub fn get(&mut self, dag: &mut TermDag, pair: Pair) -> Option<NodeRef> {
        match self.entries.get(&pair) {
            Some(entry) => {
                self.hits += 1;
                let current = dag.resolve(entry.value.id());
                Some(dag.acquire(current))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Caches `value` for `pair`. The cache takes its own references.
    ///
    /// An existing entry for `pair` is kept.
    pub fn put(&mut self, dag: &mut TermDag, pair: Pair, value: &NodeRef) {
        if self.contains(&pair) {
            return;
        }
        let entry = CacheEntry {
            first: dag.acquire(pair.first),
            second: dag.acquire(pair.second),
            value: dag.copy(value),
        };
        self.entries.insert(pair, entry);
    }

    /// Returns `true` if `pair` has an entry. Does not count as a lookup.
    pub fn contains(&self, pair: &Pair) -> bool {
        self.entries.contains_key(pair)
    }

    /// Number of cached pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups served from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that found nothing.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Releases every held reference and empties the cache.
    ///
    /// Returns the number of entries dropped.
    pub fn drain(&mut self, dag: &mut TermDag) -> usize {
        let count = self.entries.len();
        for (_, entry) in self.entries.drain(..) {
            dag.release(entry.value);
            dag.release(entry.second);
            dag.release(entry.first);
        }
        count
    }
}

impl Drop for PairCache {
    fn drop(&mut self) {
        debug_assert!(
            self.entries.is_empty() || std::thread::panicking(),
            "pair cache dropped with {} live entries",
            self.entries.len()
        );
    }
}
