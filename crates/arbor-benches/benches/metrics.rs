// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Per-node metrics on a warmed skeleton (topology and segments cached).
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use arbor_core::metrics::{flow_centrality, strahler_index, FlowMode, GeodesicIndex, StrahlerMethod, Weighting};
use arbor_core::NodeId;
mod common;
use common::{random_tree, SplitMix};

fn bench_strahler(c: &mut Criterion) {
    let mut group = c.benchmark_group("strahler");
    for &n in &[10_000usize, 100_000] {
        let s = random_tree(n, 3);
        let _ = s.segment_index();
        group.throughput(Throughput::Elements(n as u64));
        for method in [StrahlerMethod::Standard, StrahlerMethod::Greedy] {
            let label = format!("{method:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(label, n), &s, |b, s| {
                b.iter(|| black_box(strahler_index(s, method)));
            });
        }
    }
    group.finish();
}

fn bench_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow_centrality");
    for &n in &[10_000usize, 100_000] {
        let s = random_tree(n, 5);
        let _ = s.topology();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &s, |b, s| {
            b.iter(|| black_box(flow_centrality(s, FlowMode::Sum)));
        });
    }
    group.finish();
}

fn bench_geodesic(c: &mut Criterion) {
    let mut group = c.benchmark_group("geodesic");
    let n = 100_000usize;
    let s = random_tree(n, 9);
    let _ = s.topology();

    group.bench_function("index_build", |b| {
        b.iter(|| black_box(GeodesicIndex::new(&s, Weighting::Cable)));
    });

    let index = GeodesicIndex::new(&s, Weighting::Cable);
    let mut rng = SplitMix::new(42);
    let pairs: Vec<(NodeId, NodeId)> = (0..1_000)
        .map(|_| {
            let a = (rng.next_u64() % n as u64) as i64 + 1;
            let b = (rng.next_u64() % n as u64) as i64 + 1;
            (NodeId(a), NodeId(b))
        })
        .collect();
    group.throughput(Throughput::Elements(pairs.len() as u64));
    group.bench_function("pairs_1000", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for &(a, z) in &pairs {
                total += index.distance(a, z).unwrap_or(0.0);
            }
            black_box(total)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_strahler, bench_flow, bench_geodesic);
criterion_main!(benches);
