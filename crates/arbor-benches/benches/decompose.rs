// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
// criterion_group!/criterion_main! expand to undocumented functions that cannot
// carry #[allow] (attributes on macro invocations are ignored). Crate-level
// suppress is required for benchmark binaries using Criterion.
#![allow(missing_docs)]
//! Graph view construction and segment decomposition.
//!
//! - `topology/<backend>/N`: building the dense graph view from a fresh clone.
//! - `segments/N`: decomposition on top of a prebuilt topology.
//! - `deep_chain`: a single 200k-node run, the worst case for depth.
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use arbor_core::GraphBackend;
mod common;
use common::{chain, random_tree};

fn bench_topology(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology");
    group
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(4))
        .sample_size(40);

    for &n in &[1_000usize, 10_000, 100_000] {
        let base = random_tree(n, 7);
        group.throughput(Throughput::Elements(n as u64));
        for backend in [GraphBackend::Reference, GraphBackend::Compact] {
            let label = format!("{backend:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter_batched(
                    || {
                        let mut s = base.clone();
                        s.set_backend(backend);
                        s
                    },
                    |s| {
                        black_box(s.topology().len());
                        s
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_segments(c: &mut Criterion) {
    let mut group = c.benchmark_group("segments");
    for &n in &[1_000usize, 10_000, 100_000] {
        let base = random_tree(n, 11);
        let _ = base.topology();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter_batched(
                || base.clone(),
                |s| {
                    black_box(s.segment_index().len());
                    s
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_deep_chain(c: &mut Criterion) {
    let base = chain(200_000);
    c.bench_function("deep_chain", |b| {
        b.iter_batched(
            || base.clone(),
            |s| {
                black_box(s.segment_index().len());
                s
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_topology, bench_segments, bench_deep_chain);
criterion_main!(benches);
