//! The hash-consed term DAG (node universe).
//!
//! `TermDag` owns node identity, reference counts, parent edges, the lambda
//! registry and the asserted roots. Every rewriting operation receives the
//! DAG explicitly; there is no process-wide node table.
//!
//! # Ownership
//! Constructors return an owned `NodeRef`. A node acquires its own
//! references on its children, so callers may release their child handles
//! right after building a parent. Releasing the last reference frees the
//! node and, transitively, any child left without references.
//!
//! # Proxies
//! The rebuild pass turns a rewritten node into a `Proxy` forwarding to its
//! replacement. Proxies leave the unique table and the lambda registry, so
//! they are never found by hash-consing again; `resolve` chases them.

pub mod arena;
pub mod node;

pub use arena::{NodeArena, NodeId};
pub use node::{Node, NodeKind, NodeRef};

use indexmap::IndexSet;
use node::NodeKey;
use std::collections::HashMap;
use thiserror::Error;

/// Error type for term construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DagError {
    #[error("{0} is not a live node of this DAG")]
    StaleNode(NodeId),
    #[error("lambda parameter {0} is not a parameter node")]
    NotAParam(NodeId),
    #[error("{0} is neither a lambda nor an uninterpreted function")]
    NotAFunction(NodeId),
    #[error("{0} is not an argument list")]
    NotArgs(NodeId),
    #[error("function {fun} expects {expected} arguments, got {got}")]
    ArityMismatch {
        fun: NodeId,
        expected: usize,
        got: usize,
    },
}

/// Hash-consed, reference-counted term DAG.
#[derive(Debug, Default)]
pub struct TermDag {
    arena: NodeArena<Node>,
    unique: HashMap<NodeKey, NodeId>,
    lambdas: IndexSet<NodeId>,
    roots: Vec<NodeRef>,
}

impl TermDag {
    /// Creates an empty DAG.
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Leaves

    /// Declares a fresh variable.
    pub fn var(&mut self, name: impl Into<String>) -> NodeRef {
        self.fresh(NodeKind::Var(name.into()))
    }

    /// Returns the canonical constant `value`.
    pub fn constant(&mut self, value: u64) -> NodeRef {
        self.intern(NodeKind::Const(value), Vec::new())
    }

    /// Declares a fresh lambda parameter.
    pub fn param(&mut self, name: impl Into<String>) -> NodeRef {
        self.fresh(NodeKind::Param(name.into()))
    }

    /// Declares a fresh uninterpreted function symbol.
    pub fn uf(&mut self, name: impl Into<String>, arity: usize) -> NodeRef {
        self.fresh(NodeKind::Uf {
            name: name.into(),
            arity,
        })
    }

    // ---------------------------------------------------------------------
    // Operators

    /// Builds `not a`.
    pub fn not(&mut self, a: NodeId) -> Result<NodeRef, DagError> {
        self.operator(NodeKind::Not, &[a])
    }

    /// Builds `a and b`.
    pub fn and(&mut self, a: NodeId, b: NodeId) -> Result<NodeRef, DagError> {
        self.operator(NodeKind::And, &[a, b])
    }

    /// Builds `a + b`.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeRef, DagError> {
        self.operator(NodeKind::Add, &[a, b])
    }

    /// Builds `a = b`.
    pub fn eq(&mut self, a: NodeId, b: NodeId) -> Result<NodeRef, DagError> {
        self.operator(NodeKind::Eq, &[a, b])
    }

    /// Builds `if cond then then else els`.
    pub fn ite(&mut self, cond: NodeId, then: NodeId, els: NodeId) -> Result<NodeRef, DagError> {
        self.operator(NodeKind::Ite, &[cond, then, els])
    }

    /// Builds `λparam. body`.
    ///
    /// Nested lambdas (`λx. λy. b`) form a curried function whose arity is the
    /// length of the chain.
    pub fn lambda(&mut self, param: NodeId, body: NodeId) -> Result<NodeRef, DagError> {
        let param = self.live(param)?;
        if !matches!(self.kind(param), Some(NodeKind::Param(_))) {
            return Err(DagError::NotAParam(param));
        }
        let body = self.live(body)?;
        Ok(self.intern(NodeKind::Lambda, vec![param, body]))
    }

    /// Builds an argument list.
    pub fn args(&mut self, items: &[NodeId]) -> Result<NodeRef, DagError> {
        self.operator(NodeKind::Args, items)
    }

    /// Builds `fun(args)`, checking that `fun` is a function of matching arity.
    pub fn apply(&mut self, fun: NodeId, args: NodeId) -> Result<NodeRef, DagError> {
        let fun = self.live(fun)?;
        let args = self.live(args)?;
        let expected = self.arity(fun).ok_or(DagError::NotAFunction(fun))?;
        let got = match self.arena.get(args) {
            Some(node) if matches!(node.kind, NodeKind::Args) => node.children.len(),
            _ => return Err(DagError::NotArgs(args)),
        };
        if expected != got {
            return Err(DagError::ArityMismatch { fun, expected, got });
        }
        Ok(self.intern(NodeKind::Apply, vec![fun, args]))
    }

    /// Number of arguments `fun` takes, or `None` if it is not a function.
    pub fn arity(&self, fun: NodeId) -> Option<usize> {
        match self.arena.get(fun)?.kind() {
            NodeKind::Uf { arity, .. } => Some(*arity),
            NodeKind::Lambda => {
                let mut arity = 0;
                let mut current = fun;
                while let Some(node) = self.arena.get(current).filter(|n| n.is_lambda()) {
                    arity += 1;
                    current = node.children[1];
                }
                Some(arity)
            }
            _ => None,
        }
    }

    fn operator(&mut self, kind: NodeKind, children: &[NodeId]) -> Result<NodeRef, DagError> {
        let children = children
            .iter()
            .map(|&c| self.live(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.intern(kind, children))
    }

    /// Resolves `id` through proxies and checks that the result is live.
    fn live(&self, id: NodeId) -> Result<NodeId, DagError> {
        if !self.arena.contains(id) {
            return Err(DagError::StaleNode(id));
        }
        Ok(self.resolve(id))
    }

    // ---------------------------------------------------------------------
    // Hash-consing and reference counting

    /// Returns the canonical node for `(kind, children)`, creating it if needed.
    ///
    /// `children` must be live and proxy-free.
    pub(crate) fn intern(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeRef {
        debug_assert!(kind.is_hash_consed(), "{} nodes are not hash-consed", kind);
        let key = NodeKey { kind, children };
        if let Some(&id) = self.unique.get(&key) {
            return self.acquire(id);
        }
        let id = self.create(key.kind.clone(), key.children.clone());
        self.unique.insert(key, id);
        NodeRef::adopt(id)
    }

    fn fresh(&mut self, kind: NodeKind) -> NodeRef {
        NodeRef::adopt(self.create(kind, Vec::new()))
    }

    fn create(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        let mut level = 0;
        let mut free_params = Vec::new();
        for child in &children {
            if let Some(node) = self.arena.get(*child) {
                level = level.max(node.level + 1);
                free_params.extend_from_slice(&node.free_params);
            }
        }
        if matches!(kind, NodeKind::Lambda) {
            let param = children[0];
            free_params.retain(|p| *p != param);
        }
        free_params.sort();
        free_params.dedup();

        let is_lambda = matches!(kind, NodeKind::Lambda);
        let is_param = matches!(kind, NodeKind::Param(_));
        let id = self.arena.allocate(Node {
            kind,
            children: children.clone(),
            parents: Vec::new(),
            free_params,
            level,
            refs: 1,
        });
        if is_param {
            if let Some(node) = self.arena.get_mut(id) {
                node.free_params.push(id);
            }
        }
        for child in children {
            if let Some(node) = self.arena.get_mut(child) {
                node.parents.push(id);
                node.refs += 1;
            }
        }
        if is_lambda {
            self.lambdas.insert(id);
        }
        id
    }

    /// Takes a new reference on a live node.
    pub(crate) fn acquire(&mut self, id: NodeId) -> NodeRef {
        match self.arena.get_mut(id) {
            Some(node) => node.refs += 1,
            None => debug_assert!(false, "acquire on dead node {}", id),
        }
        NodeRef::adopt(id)
    }

    /// Duplicates a reference.
    pub fn copy(&mut self, node: &NodeRef) -> NodeRef {
        self.acquire(node.id())
    }

    /// Gives back a reference, freeing every node left unreferenced.
    pub fn release(&mut self, node: NodeRef) {
        let mut pending = vec![node.into_id()];
        while let Some(id) = pending.pop() {
            let Some(node) = self.arena.get_mut(id) else {
                debug_assert!(false, "release on dead node {}", id);
                continue;
            };
            debug_assert!(node.refs > 0, "reference count underflow on {}", id);
            node.refs -= 1;
            if node.refs > 0 {
                continue;
            }
            let Some(node) = self.arena.deallocate(id) else {
                continue;
            };
            debug_assert!(node.parents.is_empty(), "freed {} while it still had parents", id);
            if node.kind.is_hash_consed() {
                self.forget_unique(id, node.kind, node.children.clone());
            }
            for child in node.children {
                self.unlink_parent(child, id);
                pending.push(child);
            }
        }
    }

    fn forget_unique(&mut self, id: NodeId, kind: NodeKind, children: Vec<NodeId>) {
        if matches!(kind, NodeKind::Lambda) {
            self.lambdas.shift_remove(&id);
        }
        let key = NodeKey { kind, children };
        if self.unique.get(&key) == Some(&id) {
            self.unique.remove(&key);
        }
    }

    /// Removes one `parent` entry from `child`'s parent list.
    fn unlink_parent(&mut self, child: NodeId, parent: NodeId) {
        if let Some(node) = self.arena.get_mut(child) {
            if let Some(pos) = node.parents.iter().position(|p| *p == parent) {
                node.parents.remove(pos);
            }
        }
    }

    /// Turns `id` into a proxy forwarding to `target`.
    ///
    /// `id` leaves the unique table and the lambda registry, drops its child
    /// edges and keeps `target` alive through the moved reference. Holders
    /// of `id` keep a valid handle that now resolves to `target`.
    pub(crate) fn make_proxy(&mut self, id: NodeId, target: NodeRef) {
        let target = target.into_id();
        let Some(node) = self.arena.get(id) else {
            debug_assert!(false, "proxying dead node {}", id);
            self.release(NodeRef::adopt(target));
            return;
        };
        let kind = node.kind.clone();
        let children = node.children.clone();
        if kind.is_hash_consed() {
            self.forget_unique(id, kind, children.clone());
        }
        for child in &children {
            self.unlink_parent(*child, id);
        }

        let (target_level, target_free) = match self.arena.get_mut(target) {
            Some(t) => {
                t.parents.push(id);
                (t.level, t.free_params.clone())
            }
            None => (0, Vec::new()),
        };
        if let Some(node) = self.arena.get_mut(id) {
            node.kind = NodeKind::Proxy;
            node.children = vec![target];
            node.free_params = target_free;
            node.level = node.level.max(target_level + 1);
        }
        for child in children {
            self.release(NodeRef::adopt(child));
        }
    }

    /// Follows proxies from `id` to the node it currently stands for.
    pub fn resolve(&self, mut id: NodeId) -> NodeId {
        while let Some(node) = self.arena.get(id) {
            if !node.is_proxy() {
                break;
            }
            id = node.children[0];
        }
        id
    }

    // ---------------------------------------------------------------------
    // Queries

    /// Returns the node at `id`, if live. Proxies are not resolved.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Returns the kind of the node at `id`, if live.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.arena.get(id).map(Node::kind)
    }

    /// Returns `true` if `id` is a live node of this DAG.
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    /// Returns `true` if `id` is live and has free parameters.
    pub fn is_parameterized(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some_and(Node::is_parameterized)
    }

    /// Application nodes whose function child is `fun`, in parent-list order.
    pub fn apply_parents(&self, fun: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.arena
            .get(fun)
            .map(|node| node.parents.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |&parent| {
                self.arena
                    .get(parent)
                    .is_some_and(|p| p.is_apply() && p.children[0] == fun)
            })
    }

    /// Lambda registry, in creation order.
    pub fn lambdas(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.lambdas.iter().copied()
    }

    /// Number of registered lambdas.
    pub fn lambda_count(&self) -> usize {
        self.lambdas.len()
    }

    /// All live nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.arena.iter()
    }

    /// Ids currently registered in the unique table.
    pub(crate) fn unique_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.unique.values().copied()
    }

    /// Number of live nodes, proxies included.
    pub fn live_nodes(&self) -> usize {
        self.arena.live_count()
    }

    /// Sum of all live reference counts.
    pub fn total_refs(&self) -> u64 {
        self.arena.iter().map(|(_, node)| u64::from(node.refs)).sum()
    }

    // ---------------------------------------------------------------------
    // Roots

    /// Asserts `root` as a top-level constraint; the DAG takes the reference.
    pub fn assert_root(&mut self, root: NodeRef) {
        self.roots.push(root);
    }

    /// Asserted roots, in assertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.iter().map(NodeRef::id)
    }

    /// Re-points roots that were turned into proxies at their targets.
    pub(crate) fn retarget_roots(&mut self) {
        for i in 0..self.roots.len() {
            let id = self.roots[i].id();
            let resolved = self.resolve(id);
            if resolved != id {
                let fresh = self.acquire(resolved);
                let old = std::mem::replace(&mut self.roots[i], fresh);
                self.release(old);
            }
        }
    }

    /// Drops every asserted root.
    pub fn release_roots(&mut self) {
        for root in std::mem::take(&mut self.roots) {
            self.release(root);
        }
    }
}
