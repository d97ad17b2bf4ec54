//! Enumeration of the ground applications of a lambda.

use crate::dag::{NodeId, TermDag};

/// Lazy iterator over the non-parameterized application parents of a lambda.
///
/// Parameterized applications depend on a parameter bound by an enclosing
/// lambda and cannot be reduced at this scope; they are skipped. The order is
/// the lambda's parent-list order, which is stable for a fixed DAG state.
#[derive(Debug, Clone)]
pub struct ApplyCollector<'a> {
    dag: &'a TermDag,
    lambda: NodeId,
    pos: usize,
}

impl<'a> ApplyCollector<'a> {
    /// Starts at the first parent of `lambda`.
    pub fn new(dag: &'a TermDag, lambda: NodeId) -> Self {
        Self { dag, lambda, pos: 0 }
    }

    /// Rewinds to the first parent.
    pub fn restart(&mut self) {
        self.pos = 0;
    }
}

impl Iterator for ApplyCollector<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let parents = self.dag.node(self.lambda)?.parents();
        while let Some(&parent) = parents.get(self.pos) {
            self.pos += 1;
            let Some(node) = self.dag.node(parent) else {
                continue;
            };
            if node.is_apply() && node.children()[0] == self.lambda && !node.is_parameterized() {
                return Some(parent);
            }
        }
        None
    }
}
