//! elim-applies: fixpoint elimination of lambda applications over a
//! hash-consed, reference-counted term DAG.
//!
//! This crate provides:
//! - A term DAG with hash-consing, reference counts, parent edges, a lambda
//!   registry and asserted roots (`dag`).
//! - Single-step beta-reduction behind a trait seam (`beta`).
//! - A substitute-and-rebuild pass that rewrites nodes into proxies and
//!   re-creates their ancestors bottom-up (`rebuild`).
//! - The elimination driver with its pair cache, apply collector and
//!   round-scoped substitution map (`elim`).
//! - Invariant checks usable from tests and at runtime (`verify`).
//!
//! # Example
//!
//! ```
//! use elim_applies::prelude::*;
//!
//! let mut dag = TermDag::new();
//! let x = dag.param("x");
//! let y = dag.param("y");
//! let v = dag.var("v");
//!
//! // (λx. (λy. y)(x))(v)
//! let inner = dag.lambda(y.id(), y.id()).unwrap();
//! let x_args = dag.args(&[x.id()]).unwrap();
//! let body = dag.apply(inner.id(), x_args.id()).unwrap();
//! let outer = dag.lambda(x.id(), body.id()).unwrap();
//! let v_args = dag.args(&[v.id()]).unwrap();
//! let root = dag.apply(outer.id(), v_args.id()).unwrap();
//! dag.assert_root(root);
//!
//! let mut stats = SolverStats::new();
//! let report = ApplyEliminator::new(ElimConfig::default()).run(&mut dag, &mut stats);
//! assert_eq!(report.rounds, 3);
//! assert_eq!(dag.roots().collect::<Vec<_>>(), vec![v.id()]);
//! # for r in [v_args, outer, body, x_args, inner, v, y, x] { dag.release(r); }
//! # dag.release_roots();
//! # assert_eq!(dag.live_nodes(), 0);
//! ```

pub mod beta;
pub mod config;
pub mod dag;
pub mod elim;
pub mod fingerprint;
pub mod rebuild;
pub mod stats;
pub mod verify;

pub use beta::{BetaReduce, SubstitutingReducer};
pub use config::{ConfigError, ElimConfig, VerifyMode};
pub use dag::{DagError, Node, NodeId, NodeKind, NodeRef, TermDag};
pub use elim::{ApplyEliminator, Convergence, ElimReport, PassState};
pub use stats::{SolverStats, StatsError};
pub use verify::InvariantViolation;

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::beta::{BetaReduce, SubstitutingReducer};
    pub use crate::config::{ElimConfig, VerifyMode};
    pub use crate::dag::{DagError, NodeId, NodeKind, NodeRef, TermDag};
    pub use crate::elim::pair_cache::{Pair, PairCache};
    pub use crate::elim::subst::{ElimError, SubstitutionMap};
    pub use crate::elim::{ApplyEliminator, Convergence, ElimReport, PassState};
    pub use crate::fingerprint::{dag_digest, node_digest, HashValue};
    pub use crate::stats::SolverStats;
}
