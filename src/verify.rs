//! Invariant checks for the elimination pass.
//!
//! The checks are kept out of the rewriting path. The pass calls them at
//! teardown when its `VerifyMode` is enabled and treats a violation as fatal;
//! tests call them directly.

use crate::dag::{NodeId, TermDag};
use crate::elim::pair_cache::PairCache;
use thiserror::Error;

/// A broken invariant of the term DAG or of the pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("ground application {app} of lambda {lambda} survived elimination")]
    GroundApplication { lambda: NodeId, app: NodeId },
    #[error("proxy {0} is still registered in the unique table")]
    ProxyInUniqueTable(NodeId),
    #[error("{node} still points at proxy {child}")]
    ProxyChild { node: NodeId, child: NodeId },
    #[error("lambda registry lists {0}, which is not a live lambda")]
    StaleLambda(NodeId),
    #[error("pair cache still holds {0} entries")]
    CacheNotDrained(usize),
}

/// Every application parent of every registered lambda is parameterized.
pub fn check_no_ground_applies(dag: &TermDag) -> Result<(), InvariantViolation> {
    for lambda in dag.lambdas() {
        if let Some(app) = dag
            .apply_parents(lambda)
            .find(|&app| !dag.is_parameterized(app))
        {
            return Err(InvariantViolation::GroundApplication { lambda, app });
        }
    }
    Ok(())
}

/// The unique table holds no proxies and the registry only live lambdas.
pub fn check_tables_proxy_free(dag: &TermDag) -> Result<(), InvariantViolation> {
    for id in dag.unique_ids() {
        if dag.node(id).map_or(true, |n| n.is_proxy()) {
            return Err(InvariantViolation::ProxyInUniqueTable(id));
        }
    }
    for lambda in dag.lambdas() {
        if !dag.node(lambda).is_some_and(|n| n.is_lambda()) {
            return Err(InvariantViolation::StaleLambda(lambda));
        }
    }
    Ok(())
}

/// No live non-proxy node has a proxy child.
pub fn check_children_proxy_free(dag: &TermDag) -> Result<(), InvariantViolation> {
    for (id, node) in dag.nodes().filter(|(_, n)| !n.is_proxy()) {
        if let Some(&child) = node
            .children()
            .iter()
            .find(|&&c| dag.node(c).is_some_and(|n| n.is_proxy()))
        {
            return Err(InvariantViolation::ProxyChild { node: id, child });
        }
    }
    Ok(())
}

/// The pair cache holds no entries.
pub fn check_cache_drained(cache: &PairCache) -> Result<(), InvariantViolation> {
    if cache.is_empty() {
        Ok(())
    } else {
        Err(InvariantViolation::CacheNotDrained(cache.len()))
    }
}

/// Post-conditions of a converged pass.
pub fn check_converged(dag: &TermDag) -> Result<(), InvariantViolation> {
    check_no_ground_applies(dag)?;
    check_tables_proxy_free(dag)?;
    check_children_proxy_free(dag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elim::pair_cache::Pair;

    #[test]
    fn reports_ground_application() {
        let mut dag = TermDag::new();
        let x = dag.param("x");
        let v = dag.var("v");
        let lam = dag.lambda(x.id(), x.id()).unwrap();
        let args = dag.args(&[v.id()]).unwrap();
        let app = dag.apply(lam.id(), args.id()).unwrap();
        assert_eq!(
            check_no_ground_applies(&dag),
            Err(InvariantViolation::GroundApplication { lambda: lam.id(), app: app.id() })
        );
        assert_eq!(check_tables_proxy_free(&dag), Ok(()));
        assert_eq!(check_children_proxy_free(&dag), Ok(()));
    }

    #[test]
    fn reports_proxy_child() {
        let mut dag = TermDag::new();
        let a = dag.var("a");
        let b = dag.var("b");
        let not_a = dag.not(a.id()).unwrap();
        let parent = dag.not(not_a.id()).unwrap();
        let target = dag.copy(&b);
        dag.make_proxy(not_a.id(), target);
        assert_eq!(
            check_children_proxy_free(&dag),
            Err(InvariantViolation::ProxyChild { node: parent.id(), child: not_a.id() })
        );
    }

    #[test]
    fn reports_undrained_cache() {
        let mut dag = TermDag::new();
        let a = dag.var("a");
        let mut cache = PairCache::new();
        cache.put(&mut dag, Pair::new(a.id(), a.id()), &a);
        assert_eq!(check_cache_drained(&cache), Err(InvariantViolation::CacheNotDrained(1)));
        cache.drain(&mut dag);
        assert_eq!(check_cache_drained(&cache), Ok(()));
    }
}
