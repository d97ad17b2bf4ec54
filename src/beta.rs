//! Beta-reduction of a single application.
//!
//! The reducer is the seam between the elimination pass and the term
//! algebra: the pass only needs "give me the reduced form of this
//! application, as an owned reference". `SubstitutingReducer` is the
//! implementation the solver uses; tests wrap it to observe calls.

use crate::dag::{NodeId, NodeRef, TermDag};
use std::collections::HashMap;

/// Reduces one application node.
pub trait BetaReduce {
    /// Returns the reduced form of `app` with one caller-owned reference.
    ///
    /// Must not mutate existing nodes; it may create new ones through the
    /// DAG's hash-consing constructors.
    fn reduce(&mut self, dag: &mut TermDag, app: NodeId) -> NodeRef;
}

/// Substitutes arguments for the parameters of a (curried) lambda.
///
/// Applications exposed by the substitution are left in place; they become
/// ground applications that the next elimination round picks up.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstitutingReducer;

impl BetaReduce for SubstitutingReducer {
    fn reduce(&mut self, dag: &mut TermDag, app: NodeId) -> NodeRef {
        let Some((fun, args)) = dag
            .node(app)
            .filter(|node| node.is_apply())
            .map(|node| (node.children()[0], node.children()[1]))
        else {
            debug_assert!(false, "{} is not an application", app);
            return dag.acquire(app);
        };
        let arguments: Vec<NodeId> = dag
            .node(args)
            .map(|node| node.children().to_vec())
            .unwrap_or_default();

        let mut env = HashMap::with_capacity(arguments.len());
        let mut current = dag.resolve(fun);
        for argument in arguments {
            let Some((param, body)) = dag
                .node(current)
                .filter(|node| node.is_lambda())
                .map(|node| (node.children()[0], node.children()[1]))
            else {
                // Uninterpreted functions have nothing to reduce.
                return dag.acquire(app);
            };
            env.insert(param, argument);
            current = body;
        }
        instantiate(dag, current, &env)
    }
}

/// Rebuilds `root` with every parameter in `env` replaced by its argument.
///
/// Subterms that mention none of the bound parameters are shared as they
/// are; everything else is re-created bottom-up through hash-consing.
pub fn instantiate(dag: &mut TermDag, root: NodeId, env: &HashMap<NodeId, NodeId>) -> NodeRef {
    let mut memo: HashMap<NodeId, NodeRef> = HashMap::new();
    let mut stack = vec![(root, false)];
    while let Some((id, expanded)) = stack.pop() {
        if memo.contains_key(&id) {
            continue;
        }
        let Some(node) = dag.node(id) else {
            debug_assert!(false, "instantiating dead node {}", id);
            continue;
        };
        if let Some(&argument) = env.get(&id) {
            let replacement = dag.acquire(argument);
            memo.insert(id, replacement);
            continue;
        }
        if !node.free_params().iter().any(|p| env.contains_key(p)) {
            let shared = dag.acquire(id);
            memo.insert(id, shared);
            continue;
        }
        let kind = node.kind().clone();
        let children = node.children().to_vec();
        if !expanded {
            stack.push((id, true));
            stack.extend(
                children
                    .iter()
                    .rev()
                    .filter(|c| !memo.contains_key(*c))
                    .map(|&c| (c, false)),
            );
            continue;
        }
        debug_assert!(kind.is_hash_consed(), "bound parameter under a {} node", kind);
        let rebuilt: Vec<NodeId> = children.iter().map(|c| memo[c].id()).collect();
        let node = dag.intern(kind, rebuilt);
        memo.insert(id, node);
    }

    let result = match memo.remove(&root) {
        Some(result) => result,
        None => dag.acquire(root),
    };
    for (_, held) in memo {
        dag.release(held);
    }
    result
}
