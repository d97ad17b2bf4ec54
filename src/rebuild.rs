//! Substitute-and-rebuild over the term DAG.
//!
//! Every substituted node becomes a proxy to its replacement. Every node that
//! has a proxy child is then re-created with resolved children and itself
//! turned into a proxy, bottom-up, until no live node points at a proxy.
//!
//! # Determinism
//! Dirty nodes are processed from a min-heap ordered by `(level, NodeId)`,
//! so children are handled before their parents and the same DAG and
//! substitutions always produce the same sequence of rewrites.
//!
//! # Sharing
//! Replacements go through hash-consing and each dirty node is rewritten at
//! most once, so two occurrences of one original subterm end up pointing at a
//! single replacement instance.

use crate::dag::{NodeId, TermDag};
use crate::elim::subst::Substitutions;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use tracing::trace;

/// Counters of one rebuild invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Substituted nodes turned into proxies.
    pub substituted: usize,
    /// Ancestors re-created with rewritten children.
    pub rebuilt: usize,
}

/// Deterministic worklist of nodes whose children may have been rewritten.
#[derive(Debug, Default)]
struct DirtyQueue {
    heap: BinaryHeap<Reverse<(u32, NodeId)>>,
    queued: HashSet<NodeId>,
}

impl DirtyQueue {
    fn mark_parents(&mut self, dag: &TermDag, node: NodeId) {
        let Some(node) = dag.node(node) else {
            return;
        };
        for &parent in node.parents() {
            if let Some(level) = dag.node(parent).map(|p| p.level()) {
                if self.queued.insert(parent) {
                    self.heap.push(Reverse((level, parent)));
                }
            }
        }
    }

    fn pop(&mut self) -> Option<NodeId> {
        let Reverse((_, id)) = self.heap.pop()?;
        self.queued.remove(&id);
        Some(id)
    }
}

/// Applies `substitutions` to the whole DAG and re-targets the roots.
///
/// Consumes every replacement reference. An empty map leaves the DAG
/// untouched.
pub fn substitute_and_rebuild(dag: &mut TermDag, substitutions: Substitutions) -> RebuildStats {
    let mut stats = RebuildStats::default();
    if substitutions.is_empty() {
        return stats;
    }

    let mut dirty = DirtyQueue::default();
    for (node, replacement) in substitutions {
        let live = dag.node(node).is_some_and(|n| !n.is_proxy());
        if !live || dag.resolve(replacement.id()) == node {
            dag.release(replacement);
            continue;
        }
        dirty.mark_parents(dag, node);
        trace!(%node, replacement = %replacement.id(), "substitute");
        dag.make_proxy(node, replacement);
        stats.substituted += 1;
    }

    while let Some(id) = dirty.pop() {
        let Some(node) = dag.node(id).filter(|n| !n.is_proxy()) else {
            continue;
        };
        let children: Vec<NodeId> = node.children().iter().map(|&c| dag.resolve(c)).collect();
        if children == node.children() {
            continue;
        }
        let kind = node.kind().clone();
        let replacement = dag.intern(kind, children);
        if replacement.id() == id {
            dag.release(replacement);
            continue;
        }
        dirty.mark_parents(dag, id);
        dag.make_proxy(id, replacement);
        stats.rebuilt += 1;
    }

    dag.retarget_roots();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elim::subst::SubstitutionMap;
    use crate::fingerprint::dag_digest;

    #[test]
    fn empty_map_is_a_no_op() {
        let mut dag = TermDag::new();
        let a = dag.var("a");
        let b = dag.var("b");
        let root = dag.and(a.id(), b.id()).unwrap();
        dag.assert_root(root);
        let digest = dag_digest(&dag);
        let live = dag.live_nodes();

        let stats = substitute_and_rebuild(&mut dag, SubstitutionMap::begin().consume());
        assert_eq!(stats, RebuildStats::default());
        assert_eq!(dag_digest(&dag), digest);
        assert_eq!(dag.live_nodes(), live);
    }

    #[test]
    fn shared_ancestor_is_rebuilt_once() {
        let mut dag = TermDag::new();
        let a = dag.var("a");
        let b = dag.var("b");
        let c = dag.var("c");
        let not_a = dag.not(a.id()).unwrap();
        let shared = dag.add(not_a.id(), c.id()).unwrap();
        let left = dag.and(shared.id(), c.id()).unwrap();
        let right = dag.eq(shared.id(), c.id()).unwrap();
        let (left_id, right_id) = (left.id(), right.id());
        dag.assert_root(left);
        dag.assert_root(right);
        for r in [shared, not_a] {
            dag.release(r);
        }

        // Substitute `not a` rather than `shared`: the rewrite has to climb.
        let mut map = SubstitutionMap::begin();
        let not_a_id = dag.node(dag.node(left_id).unwrap().children()[0]).unwrap().children()[0];
        map.insert(not_a_id, dag.copy(&b)).unwrap();
        let stats = substitute_and_rebuild(&mut dag, map.consume());

        // `shared`, `left` and `right` are rebuilt; `shared` only once.
        assert_eq!(stats, RebuildStats { substituted: 1, rebuilt: 3 });
        let roots: Vec<NodeId> = dag.roots().collect();
        assert!(!dag.contains(left_id));
        assert!(!dag.contains(right_id));
        let new_shared_left = dag.node(roots[0]).unwrap().children()[0];
        let new_shared_right = dag.node(roots[1]).unwrap().children()[0];
        assert_eq!(new_shared_left, new_shared_right);
        assert_eq!(dag.node(new_shared_left).unwrap().children(), &[b.id(), c.id()]);

        for r in [a, b, c] {
            dag.release(r);
        }
        dag.release_roots();
        assert_eq!(dag.live_nodes(), 0);
    }
}
