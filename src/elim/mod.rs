//! Fixpoint elimination of ground lambda applications.
//!
//! Each round collects every application of a registered lambda that does not
//! depend on an enclosing parameter, beta-reduces it (through the pair cache)
//! and records `app ↦ reduced` in a fresh substitution map. The map is then
//! applied by [`substitute_and_rebuild`]. Rebuilding can turn parameterized
//! applications into ground ones, so rounds repeat until one of them finds
//! nothing to do.
//!
//! The round that finds nothing is counted: a DAG with a single ground
//! application converges after two rounds.

pub mod collect;
pub mod pair_cache;
pub mod subst;

use crate::beta::{BetaReduce, SubstitutingReducer};
use crate::config::ElimConfig;
use crate::dag::{NodeId, NodeRef, TermDag};
use crate::rebuild::substitute_and_rebuild;
use crate::stats::SolverStats;
use crate::verify;
use collect::ApplyCollector;
use pair_cache::{Pair, PairCache};
use std::fmt;
use std::time::{Duration, Instant};
use subst::{ElimError, SubstitutionMap};
use tracing::{debug, info, trace, warn};

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// A round found no ground application.
    Converged,
    /// The configured round bound was reached while work remained.
    RoundLimit { rounds: usize },
}

/// Where the driver is in its round loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    #[default]
    Idle,
    CollectingRound(usize),
    Rebuilding(usize),
    Converged,
    RoundLimit,
}

impl PassState {
    /// `true` for `Converged` and `RoundLimit`.
    pub fn is_terminal(self) -> bool {
        matches!(self, PassState::Converged | PassState::RoundLimit)
    }
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassState::Idle => write!(f, "idle"),
            PassState::CollectingRound(round) => write!(f, "collecting round {}", round),
            PassState::Rebuilding(round) => write!(f, "rebuilding round {}", round),
            PassState::Converged => write!(f, "converged"),
            PassState::RoundLimit => write!(f, "round limit"),
        }
    }
}

/// Outcome of one invocation of the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElimReport {
    /// Rounds executed, including the final empty one.
    pub rounds: usize,
    /// Substitutions recorded in each round, in round order.
    pub substitutions_per_round: Vec<usize>,
    pub total_substitutions: usize,
    /// Applications handed to the reducer (cache misses).
    pub reducer_calls: u64,
    /// Applications served from the pair cache.
    pub cache_hits: u64,
    pub elapsed: Duration,
    pub convergence: Convergence,
}

impl ElimReport {
    fn empty() -> Self {
        Self {
            rounds: 0,
            substitutions_per_round: Vec::new(),
            total_substitutions: 0,
            reducer_calls: 0,
            cache_hits: 0,
            elapsed: Duration::ZERO,
            convergence: Convergence::Converged,
        }
    }

    /// `true` unless the round bound was hit.
    pub fn is_converged(&self) -> bool {
        self.convergence == Convergence::Converged
    }
}

/// The apply-elimination pass.
///
/// ```
/// use elim_applies::prelude::*;
///
/// let mut dag = TermDag::new();
/// let x = dag.param("x");
/// let v = dag.var("v");
/// let id = dag.lambda(x.id(), x.id()).unwrap();
/// let args = dag.args(&[v.id()]).unwrap();
/// let app = dag.apply(id.id(), args.id()).unwrap();
/// dag.assert_root(app);
///
/// let mut stats = SolverStats::new();
/// let report = ApplyEliminator::new(ElimConfig::default()).run(&mut dag, &mut stats);
/// assert_eq!(report.rounds, 2);
/// assert_eq!(dag.roots().collect::<Vec<_>>(), vec![v.id()]);
/// # for r in [args, id, v, x] { dag.release(r); }
/// # dag.release_roots();
/// ```
#[derive(Debug)]
pub struct ApplyEliminator<R = SubstitutingReducer> {
    config: ElimConfig,
    reducer: R,
    state: PassState,
    transitions: Vec<PassState>,
}

impl ApplyEliminator<SubstitutingReducer> {
    /// Creates a pass using the substituting reducer.
    pub fn new(config: ElimConfig) -> Self {
        Self::with_reducer(config, SubstitutingReducer)
    }
}

impl<R: BetaReduce> ApplyEliminator<R> {
    /// Creates a pass that reduces applications with `reducer`.
    ///
    /// A `max_rounds` of 0 is raised to 1: every pass runs at least one
    /// round. `config()` reports the bound actually in effect.
    pub fn with_reducer(mut config: ElimConfig, reducer: R) -> Self {
        if config.max_rounds == 0 {
            warn!("max_rounds = 0 raised to 1");
            config.max_rounds = 1;
        }
        Self {
            config,
            reducer,
            state: PassState::Idle,
            transitions: Vec::new(),
        }
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ElimConfig {
        &self.config
    }

    /// The reducer applications are handed to.
    pub fn reducer(&self) -> &R {
        &self.reducer
    }

    /// State reached by the last `run`.
    pub fn state(&self) -> PassState {
        self.state
    }

    /// States entered by the last `run`, in order.
    pub fn transitions(&self) -> &[PassState] {
        &self.transitions
    }

    /// Eliminates every ground application of a registered lambda.
    ///
    /// Roots are re-targeted in place. Counters and elapsed time are added to
    /// `stats`. Panics on a broken invariant when verification is enabled.
    pub fn run(&mut self, dag: &mut TermDag, stats: &mut SolverStats) -> ElimReport {
        self.transitions.clear();
        self.transition(PassState::Idle);
        if dag.lambda_count() == 0 {
            self.transition(PassState::Converged);
            return ElimReport::empty();
        }

        let start = Instant::now();
        let mut cache = PairCache::new();
        let mut report = ElimReport::empty();
        let mut round = 0;
        loop {
            round += 1;
            self.transition(PassState::CollectingRound(round));
            let map = self.collect_round(dag, &mut cache, &mut report);
            let substitutions = map.len();
            report.substitutions_per_round.push(substitutions);
            report.total_substitutions += substitutions;
            info!(round, substitutions, "eliminate applications");

            if map.is_empty() {
                self.transition(PassState::Converged);
                report.convergence = Convergence::Converged;
                break;
            }

            self.transition(PassState::Rebuilding(round));
            let rebuilt = substitute_and_rebuild(dag, map.consume());
            debug!(round, substituted = rebuilt.substituted, rebuilt = rebuilt.rebuilt, "rebuild");

            if round >= self.config.max_rounds {
                warn!(rounds = round, "apply elimination stopped at the round bound");
                self.transition(PassState::RoundLimit);
                report.convergence = Convergence::RoundLimit { rounds: round };
                break;
            }
        }
        report.rounds = round;
        report.cache_hits = cache.hits();

        let drained = cache.drain(dag);
        trace!(entries = drained, "pair cache drained");
        if self.config.verify.enabled() {
            self.verify(dag, &cache, report.is_converged());
        }

        report.elapsed = start.elapsed();
        stats.elim_applies_time += report.elapsed;
        stats.applies_eliminated += report.total_substitutions as u64;
        stats.elim_rounds += report.rounds as u64;
        stats.reducer_calls += report.reducer_calls;
        stats.cache_hits += report.cache_hits;
        info!(
            total = report.total_substitutions,
            seconds = report.elapsed.as_secs_f64(),
            "eliminated function applications"
        );
        report
    }

    /// Collects and reduces the ground applications of one round.
    ///
    /// All applications are gathered before any is reduced, so applications
    /// created by reduction wait for the next round.
    fn collect_round(
        &mut self,
        dag: &mut TermDag,
        cache: &mut PairCache,
        report: &mut ElimReport,
    ) -> SubstitutionMap {
        let view: &TermDag = dag;
        let apps: Vec<NodeId> = view
            .lambdas()
            .flat_map(|lambda| ApplyCollector::new(view, lambda))
            .collect();

        let mut map = SubstitutionMap::begin();
        for app in apps {
            let reduced = self.reduce_cached(dag, cache, app, report);
            trace!(%app, reduced = %reduced.id(), "reduce");
            if let Err(ElimError::DuplicateSubstitution { node, replacement }) =
                map.insert(app, reduced)
            {
                dag.release(replacement);
                map.consume().release(dag);
                cache.drain(dag);
                panic!("{} collected twice in one round", node);
            }
        }
        map
    }

    fn reduce_cached(
        &mut self,
        dag: &mut TermDag,
        cache: &mut PairCache,
        app: NodeId,
        report: &mut ElimReport,
    ) -> NodeRef {
        let pair = Pair::of_apply(dag, app);
        if let Some(hit) = pair.and_then(|pair| cache.get(dag, pair)) {
            return hit;
        }
        report.reducer_calls += 1;
        let reduced = self.reducer.reduce(dag, app);
        if let Some(pair) = pair {
            cache.put(dag, pair, &reduced);
        }
        reduced
    }

    fn verify(&self, dag: &TermDag, cache: &PairCache, converged: bool) {
        let result = verify::check_cache_drained(cache)
            .and_then(|()| verify::check_tables_proxy_free(dag))
            .and_then(|()| verify::check_children_proxy_free(dag))
            .and_then(|()| {
                if converged {
                    verify::check_no_ground_applies(dag)
                } else {
                    Ok(())
                }
            });
        if let Err(violation) = result {
            panic!("apply elimination invariant violated: {}", violation);
        }
    }

    fn transition(&mut self, next: PassState) {
        trace!(from = %self.state, to = %next, "pass state");
        self.state = next;
        self.transitions.push(next);
    }
}
