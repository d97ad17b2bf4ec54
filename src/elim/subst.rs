//! Round-scoped substitution map.
//!
//! Each key is inserted at most once per round. Values are owned references;
//! `consume` moves them into `Substitutions`, which the rebuild pass takes by
//! value and empties.

use crate::dag::{NodeId, NodeRef, TermDag};
use indexmap::IndexMap;
use thiserror::Error;

/// Error type for substitution bookkeeping.
#[derive(Debug, Error)]
pub enum ElimError {
    /// `node` already has a replacement this round. The rejected reference
    /// is handed back so the caller can release it.
    #[error("{node} already has a substitution in this round")]
    DuplicateSubstitution { node: NodeId, replacement: NodeRef },
}

/// Mapping from rewritten node to replacement, built during one round.
#[derive(Debug, Default)]
pub struct SubstitutionMap {
    entries: IndexMap<NodeId, NodeRef>,
}

impl SubstitutionMap {
    /// Starts an empty map for a new round.
    pub fn begin() -> Self {
        Self::default()
    }

    /// Records `node ↦ replacement`, taking ownership of `replacement`.
    pub fn insert(&mut self, node: NodeId, replacement: NodeRef) -> Result<(), ElimError> {
        if self.contains(node) {
            return Err(ElimError::DuplicateSubstitution { node, replacement });
        }
        self.entries.insert(node, replacement);
        Ok(())
    }

    /// Replacement recorded for `node`, if any.
    pub fn get(&self, node: NodeId) -> Option<NodeId> {
        self.entries.get(&node).map(NodeRef::id)
    }

    /// Returns `true` if `node` already has a replacement this round.
    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    /// Number of recorded substitutions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hands the accumulated mapping over for rebuilding.
    pub fn consume(self) -> Substitutions {
        Substitutions {
            entries: self.entries,
        }
    }
}

/// Substitutions handed to the rebuild pass, in insertion order.
#[derive(Debug, Default)]
pub struct Substitutions {
    entries: IndexMap<NodeId, NodeRef>,
}

impl Substitutions {
    /// Number of substitutions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewritten nodes, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().copied()
    }

    /// Drops every substitution without applying it.
    pub fn release(self, dag: &mut TermDag) {
        for (_, replacement) in self.entries {
            dag.release(replacement);
        }
    }
}

impl IntoIterator for Substitutions {
    type Item = (NodeId, NodeRef);
    type IntoIter = indexmap::map::IntoIter<NodeId, NodeRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_is_rejected_and_reference_returned() {
        let mut dag = TermDag::new();
        let a = dag.var("a");
        let b = dag.var("b");
        let c = dag.var("c");

        let mut map = SubstitutionMap::begin();
        map.insert(a.id(), dag.copy(&b)).unwrap();
        assert!(map.contains(a.id()));
        assert!(!map.contains(b.id()));
        let err = map.insert(a.id(), dag.copy(&c)).unwrap_err();
        assert_eq!(err.to_string(), format!("{} already has a substitution in this round", a.id()));
        let ElimError::DuplicateSubstitution { node, replacement } = err;
        assert_eq!(node, a.id());
        assert_eq!(replacement.id(), c.id());
        dag.release(replacement);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(a.id()), Some(b.id()));
        map.consume().release(&mut dag);
        for r in [a, b, c] {
            dag.release(r);
        }
        assert_eq!(dag.live_nodes(), 0);
    }

    #[test]
    fn consume_preserves_insertion_order() {
        let mut dag = TermDag::new();
        let nodes: Vec<NodeRef> = (0..4).map(|i| dag.var(format!("v{i}"))).collect();
        let mut map = SubstitutionMap::begin();
        for pair in nodes.windows(2).rev() {
            map.insert(pair[1].id(), dag.copy(&pair[0])).unwrap();
        }
        let subst = map.consume();
        let keys: Vec<NodeId> = subst.keys().collect();
        assert_eq!(keys, vec![nodes[3].id(), nodes[2].id(), nodes[1].id()]);
        subst.release(&mut dag);
        for r in nodes {
            dag.release(r);
        }
        assert_eq!(dag.live_nodes(), 0);
    }
}
