//! Structural digests of the term DAG.
//!
//! Digests depend only on node kinds, payloads and child order, never on
//! `NodeId`s, so two DAGs built in different orders (or the same DAG before
//! and after slot reuse) digest identically when they denote the same terms.
//! Proxies are transparent: a node digests as the node it resolves to.
//!
//! Hashing uses SHA-256 with domain separation and length prefixing.

use crate::dag::{NodeId, NodeKind, TermDag};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// Returns the all-zero hash.
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of `data` under `domain`.
    ///
    /// Input layout: `b"ELIM:" || domain || b":v1" || len(data) as u64 LE || data`.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"ELIM:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

fn payload_bytes(kind: &NodeKind, out: &mut Vec<u8>) {
    out.extend_from_slice(kind.tag().as_bytes());
    out.push(0);
    match kind {
        NodeKind::Var(name) | NodeKind::Param(name) => {
            out.extend_from_slice(&(name.len() as u64).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
        }
        NodeKind::Uf { name, arity } => {
            out.extend_from_slice(&(name.len() as u64).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&(*arity as u64).to_le_bytes());
        }
        NodeKind::Const(value) => out.extend_from_slice(&value.to_le_bytes()),
        _ => {}
    }
}

/// Memoizing digest computation over one DAG state.
struct Digester<'a> {
    dag: &'a TermDag,
    memo: HashMap<NodeId, HashValue>,
}

impl<'a> Digester<'a> {
    fn new(dag: &'a TermDag) -> Self {
        Self {
            dag,
            memo: HashMap::new(),
        }
    }

    fn digest(&mut self, root: NodeId) -> HashValue {
        let root = self.dag.resolve(root);
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if self.memo.contains_key(&id) {
                continue;
            }
            let Some(node) = self.dag.node(id) else {
                self.memo.insert(id, HashValue::zero());
                continue;
            };
            let children: Vec<NodeId> =
                node.children().iter().map(|&c| self.dag.resolve(c)).collect();
            if !expanded {
                stack.push((id, true));
                stack.extend(children.iter().rev().map(|&c| (c, false)));
                continue;
            }
            let mut data = Vec::with_capacity(64 + 32 * children.len());
            payload_bytes(node.kind(), &mut data);
            data.extend_from_slice(&(children.len() as u64).to_le_bytes());
            for child in &children {
                data.extend_from_slice(self.memo[child].as_bytes());
            }
            self.memo
                .insert(id, HashValue::hash_with_domain(b"NODE", &data));
        }
        self.memo[&root]
    }
}

/// Digest of the term rooted at `id`.
pub fn node_digest(dag: &TermDag, id: NodeId) -> HashValue {
    Digester::new(dag).digest(id)
}

/// Digest of all asserted roots, in assertion order.
pub fn dag_digest(dag: &TermDag) -> HashValue {
    let mut digester = Digester::new(dag);
    let roots: Vec<NodeId> = dag.roots().collect();
    let mut data = Vec::with_capacity(8 + 32 * roots.len());
    data.extend_from_slice(&(roots.len() as u64).to_le_bytes());
    for root in roots {
        data.extend_from_slice(digester.digest(root).as_bytes());
    }
    HashValue::hash_with_domain(b"ROOTS", &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_ignores_construction_order() {
        let mut first = TermDag::new();
        let a = first.var("a");
        let b = first.var("b");
        let sum = first.add(a.id(), b.id()).unwrap();
        first.assert_root(sum);

        let mut second = TermDag::new();
        let filler = second.constant(9);
        let b2 = second.var("b");
        let a2 = second.var("a");
        let sum2 = second.add(a2.id(), b2.id()).unwrap();
        second.assert_root(sum2);

        assert_eq!(dag_digest(&first), dag_digest(&second));
        second.release(filler);
    }

    #[test]
    fn digest_respects_child_order() {
        let mut dag = TermDag::new();
        let a = dag.var("a");
        let b = dag.var("b");
        let ab = dag.add(a.id(), b.id()).unwrap();
        let ba = dag.add(b.id(), a.id()).unwrap();
        assert_ne!(node_digest(&dag, ab.id()), node_digest(&dag, ba.id()));
    }

    #[test]
    fn proxies_are_transparent() {
        let mut dag = TermDag::new();
        let a = dag.var("a");
        let not_a = dag.not(a.id()).unwrap();
        let before = node_digest(&dag, a.id());
        let target = dag.copy(&a);
        dag.make_proxy(not_a.id(), target);
        assert_eq!(node_digest(&dag, not_a.id()), before);
    }
}
