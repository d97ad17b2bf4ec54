//! Node records of the term DAG.
//!
//! # Invariants
//! - `refs` counts every parent edge plus every outstanding `NodeRef`.
//! - `parents` lists one entry per parent edge, in creation order.
//! - `free_params` is sorted and deduplicated.
//! - `level` is 0 for leaves and `1 + max(child levels)` otherwise, so
//!   children always have a strictly lower level. A node turned into a proxy
//!   keeps its level, raised above its target's level if needed.

use super::arena::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a term DAG node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Free variable; every construction is a distinct symbol.
    Var(String),
    /// Constant value.
    Const(u64),
    /// Lambda-bound parameter; every construction is a distinct symbol.
    Param(String),
    /// Uninterpreted function symbol of the given arity.
    Uf { name: String, arity: usize },
    Not,
    And,
    Add,
    Eq,
    Ite,
    /// `[param, body]`.
    Lambda,
    /// Argument list of an application.
    Args,
    /// `[fun, args]`.
    Apply,
    /// `[target]`: a node rewritten by the rebuild pass.
    Proxy,
}

impl NodeKind {
    /// Returns `true` if nodes of this kind are shared through the unique table.
    pub fn is_hash_consed(&self) -> bool {
        !matches!(
            self,
            NodeKind::Var(_) | NodeKind::Param(_) | NodeKind::Uf { .. } | NodeKind::Proxy
        )
    }

    /// Short operator name used in diagnostics and digests.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Var(_) => "var",
            NodeKind::Const(_) => "const",
            NodeKind::Param(_) => "param",
            NodeKind::Uf { .. } => "uf",
            NodeKind::Not => "not",
            NodeKind::And => "and",
            NodeKind::Add => "add",
            NodeKind::Eq => "eq",
            NodeKind::Ite => "ite",
            NodeKind::Lambda => "lambda",
            NodeKind::Args => "args",
            NodeKind::Apply => "apply",
            NodeKind::Proxy => "proxy",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Var(name) | NodeKind::Param(name) => write!(f, "{}:{}", self.tag(), name),
            NodeKind::Const(value) => write!(f, "const:{}", value),
            NodeKind::Uf { name, arity } => write!(f, "uf:{}/{}", name, arity),
            other => f.write_str(other.tag()),
        }
    }
}

/// A vertex of the term DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) free_params: Vec<NodeId>,
    pub(crate) level: u32,
    pub(crate) refs: u32,
}

impl Node {
    /// Returns the node kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Child ids in operand order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// One entry per parent edge, oldest first.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Parameters occurring free in this node, sorted by id.
    pub fn free_params(&self) -> &[NodeId] {
        &self.free_params
    }

    /// `true` if the node's value depends on a parameter not bound inside it.
    #[inline]
    pub fn is_parameterized(&self) -> bool {
        !self.free_params.is_empty()
    }

    /// Height above the leaves.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Live reference count.
    pub fn refs(&self) -> u32 {
        self.refs
    }

    /// Returns `true` for lambda nodes.
    #[inline]
    pub fn is_lambda(&self) -> bool {
        matches!(self.kind, NodeKind::Lambda)
    }

    /// Returns `true` for application nodes.
    #[inline]
    pub fn is_apply(&self) -> bool {
        matches!(self.kind, NodeKind::Apply)
    }

    /// Returns `true` for nodes forwarded by the rebuild pass.
    #[inline]
    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, NodeKind::Proxy)
    }
}

/// Structural key of a hash-consed node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey {
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<NodeId>,
}

/// An owned, counted reference to a DAG node.
///
/// `NodeRef` is deliberately neither `Copy` nor `Clone`: duplicating a
/// reference goes through `TermDag::copy`, dropping one goes through
/// `TermDag::release`. Both take the handle by value or by reference so the
/// count always matches the number of handles in existence.
#[must_use = "a NodeRef holds a counted reference; hand it back with TermDag::release"]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct NodeRef(NodeId);

impl NodeRef {
    /// Wraps an id whose reference has already been counted.
    #[inline]
    pub(crate) fn adopt(id: NodeId) -> Self {
        Self(id)
    }

    /// Returns the id this reference points to.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.0
    }

    /// Gives up the handle without releasing; the caller takes over the count.
    #[inline]
    pub(crate) fn into_id(self) -> NodeId {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_not_hash_consed() {
        assert!(!NodeKind::Var("a".into()).is_hash_consed());
        assert!(!NodeKind::Param("x".into()).is_hash_consed());
        assert!(!NodeKind::Uf { name: "f".into(), arity: 2 }.is_hash_consed());
        assert!(!NodeKind::Proxy.is_hash_consed());
        assert!(NodeKind::Apply.is_hash_consed());
        assert!(NodeKind::Const(3).is_hash_consed());
    }

    #[test]
    fn kind_display() {
        assert_eq!(NodeKind::Var("v".into()).to_string(), "var:v");
        assert_eq!(NodeKind::Uf { name: "f".into(), arity: 2 }.to_string(), "uf:f/2");
        assert_eq!(NodeKind::Lambda.to_string(), "lambda");
    }
}
