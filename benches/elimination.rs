//! Benchmarks for the apply-elimination pass.
//!
//! Each iteration builds a fresh DAG outside the timed region; the DAG is
//! dropped wholesale afterwards.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use elim_applies::prelude::*;

/// `l_k = λx. l_{k-1}(x + 1)` for `k` in `1..=depth`, `l_0 = λx. x`, with
/// `l_depth(v)` asserted. Every round exposes exactly one new application.
fn nested_chain(depth: usize) -> (TermDag, Vec<NodeRef>) {
    let mut dag = TermDag::new();
    let mut held = Vec::new();
    let one = dag.constant(1);
    let x0 = dag.param("x0");
    let mut fun = dag.lambda(x0.id(), x0.id()).unwrap();
    held.push(x0);
    for k in 1..=depth {
        let x = dag.param(format!("x{k}"));
        let succ = dag.add(x.id(), one.id()).unwrap();
        let args = dag.args(&[succ.id()]).unwrap();
        let body = dag.apply(fun.id(), args.id()).unwrap();
        let next = dag.lambda(x.id(), body.id()).unwrap();
        held.extend([x, succ, args, body, std::mem::replace(&mut fun, next)]);
    }
    let v = dag.var("v");
    let args = dag.args(&[v.id()]).unwrap();
    let root = dag.apply(fun.id(), args.id()).unwrap();
    dag.assert_root(root);
    held.extend([one, fun, v, args]);
    (dag, held)
}

/// One lambda applied to `width` distinct variables, each under its own root.
fn wide_fanout(width: usize) -> (TermDag, Vec<NodeRef>) {
    let mut dag = TermDag::new();
    let x = dag.param("x");
    let body = dag.not(x.id()).unwrap();
    let lam = dag.lambda(x.id(), body.id()).unwrap();
    let mut held = Vec::new();
    for i in 0..width {
        let v = dag.var(format!("v{i}"));
        let args = dag.args(&[v.id()]).unwrap();
        let app = dag.apply(lam.id(), args.id()).unwrap();
        let root = dag.and(app.id(), v.id()).unwrap();
        dag.assert_root(root);
        held.extend([v, args, app]);
    }
    held.extend([x, body, lam]);
    (dag, held)
}

fn bench_nested_chain_64(c: &mut Criterion) {
    c.bench_function("elim_nested_chain_64", |b| {
        b.iter_batched(
            || nested_chain(64),
            |(mut dag, held)| {
                let mut stats = SolverStats::new();
                let report = ApplyEliminator::new(ElimConfig::default().with_verify(VerifyMode::Off))
                    .run(black_box(&mut dag), &mut stats);
                assert_eq!(report.rounds, 66);
                (dag, held)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_wide_fanout_10k(c: &mut Criterion) {
    c.bench_function("elim_wide_fanout_10k", |b| {
        b.iter_batched(
            || wide_fanout(10_000),
            |(mut dag, held)| {
                let mut stats = SolverStats::new();
                let report = ApplyEliminator::new(ElimConfig::default().with_verify(VerifyMode::Off))
                    .run(black_box(&mut dag), &mut stats);
                assert_eq!(report.total_substitutions, 10_000);
                (dag, held)
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_nested_chain_64, bench_wide_fanout_10k);
criterion_main!(benches);
