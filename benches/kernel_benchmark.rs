//! Benchmarks for the Life kernel and full match steps.
//!
//! The kernel is the hot path: one evolution of the default 384x256 board per
//! step, thousands of steps per round.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use cholerama::bot::{Bot, GermBot};
use cholerama::config::MatchConfig;
use cholerama::engine::Match;
use cholerama::game::{Board, Kernel, PlayerId};
use cholerama::rng::Rng;

const OWNERS: [PlayerId; 4] = [1, 2, 3, 4];

/// Default-sized board with roughly a quarter of the cells alive.
fn random_board(seed: u64) -> Board {
    let config = MatchConfig::default();
    let mut rng = Rng::new(seed);
    let cells: Vec<PlayerId> = (0..config.nx * config.ny)
        .map(|_| if rng.below(4) == 0 { OWNERS[rng.below(OWNERS.len())] } else { 0 })
        .collect();
    Board::from_cells(config.nx, config.ny, cells).unwrap()
}

fn bench_evolve(c: &mut Criterion) {
    let old = random_board(42);
    let mut new = old.clone();
    let mut counts = vec![0u32; 5];

    let sequential = Kernel::sequential();
    c.bench_function("evolve_sequential", |b| {
        b.iter(|| {
            sequential.evolve(black_box(&old), &mut new, &mut counts);
            black_box(&counts);
        });
    });

    let pooled = Kernel::new(0).unwrap();
    c.bench_function("evolve_parallel", |b| {
        b.iter(|| {
            pooled.evolve(black_box(&old), &mut new, &mut counts);
            black_box(&counts);
        });
    });
}

fn bench_match(c: &mut Criterion) {
    let config = MatchConfig {
        iterations: 200,
        ..MatchConfig::default()
    };

    c.bench_function("match_200_steps_4p", |b| {
        b.iter(|| {
            let bots: Vec<Box<dyn Bot>> = (0..4u64)
                .map(|i| Box::new(GermBot::new(format!("germ{i}"), i + 1)) as Box<dyn Bot>)
                .collect();
            let result = Match::new(config, bots, 0).unwrap().run().unwrap();
            black_box(result)
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_evolve, bench_match
}
criterion_main!(benches);
