// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::time::Duration;

use arbor_batch::{BatchError, BatchOptions, BatchOrchestrator, CancelToken, ItemError};
use arbor_core::edit::EditMode;
use arbor_core::metrics::cable_length;
use arbor_core::{NodeId, RawNode, Skeleton, SkeletonError};
use proptest::prelude::*;

/// Chain `k` has `k + 1` nodes spaced one unit apart.
fn chains(n: usize) -> Vec<Skeleton> {
    (0..n)
        .map(|k| {
            let rows = (1..=k as i64 + 1)
                .map(|id| RawNode::new(id, (id > 1).then_some(id - 1), [id as f64, 0.0, 0.0]));
            Skeleton::from_rows(format!("chain-{k}"), rows).expect("valid chain")
        })
        .collect()
}

/// Looks up node 3, which chains 0 and 1 do not have.
fn third_node(s: &Skeleton) -> Result<f64, SkeletonError> {
    s.node(NodeId(3)).map(|n| n.position.x())
}

#[test]
fn parallel_results_keep_input_order() {
    let items = chains(32);
    let batch = BatchOrchestrator::new(BatchOptions::parallel(4));
    let out = batch
        .run_ref(&items, |s| {
            // Early items finish last.
            std::thread::sleep(Duration::from_micros(32 - s.node_count() as u64));
            Ok(cable_length(s))
        })
        .expect("no failures");
    let expected: Vec<f64> = (0..32).map(f64::from).collect();
    assert_eq!(out.results, expected);
    assert_eq!(out.indices, (0..32).collect::<Vec<_>>());
    assert!(out.is_complete());
}

#[test]
fn fail_fast_reports_the_lowest_failing_index() {
    let mut items = chains(16);
    items.swap(0, 9);
    items.swap(1, 12);
    for workers in [1, 3, 8] {
        let batch = BatchOrchestrator::new(BatchOptions::parallel(workers));
        let err = batch.run_ref(&items, third_node).expect_err("two bad items");
        match err {
            BatchError::Item {
                index,
                label,
                source: ItemError::Operation(SkeletonError::NotFound(_)),
            } => {
                assert_eq!(index, 9, "workers = {workers}");
                assert_eq!(label, "chain-0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn omit_failures_collects_and_skips() {
    let items = chains(6);
    let batch = BatchOrchestrator::new(BatchOptions::parallel(2).omit_failures(true));
    let out = batch.run_ref(&items, third_node).expect("failures omitted");
    assert_eq!(out.indices, vec![2, 3, 4, 5]);
    assert_eq!(out.results, vec![3.0; 4]);
    let failed: Vec<(usize, &str)> = out
        .failures
        .iter()
        .map(|f| (f.index, f.label.as_str()))
        .collect();
    assert_eq!(failed, vec![(0, "chain-0"), (1, "chain-1")]);
    assert!(!out.is_complete());
}

#[test]
fn panics_become_item_errors() {
    let items = chains(4);
    let batch = BatchOrchestrator::new(BatchOptions::serial().omit_failures(true));
    let out = batch
        .run_ref(&items, |s| {
            assert!(s.node_count() != 3, "three nodes");
            Ok(s.node_count())
        })
        .expect("panic contained");
    assert_eq!(out.results, vec![1, 2, 4]);
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].index, 2);
    assert!(matches!(&out.failures[0].error, ItemError::Panicked(m) if m.contains("three nodes")));
}

#[test]
fn owned_items_are_edited_and_returned() {
    let items = chains(5).into_iter().skip(1).collect::<Vec<_>>();
    let batch = BatchOrchestrator::new(BatchOptions::parallel(2));
    let out = batch
        .run(items, |mut s| {
            let leaf = s.leaves()[0];
            s.reroot(leaf, EditMode::InPlace)?;
            Ok(s)
        })
        .expect("every chain has a leaf");
    for s in &out.results {
        assert_eq!(s.roots(), vec![NodeId(s.node_count() as i64)]);
    }
}

#[test]
fn a_cancelled_token_stops_before_the_next_item() {
    let items = chains(10);
    let token = CancelToken::new();
    let batch = BatchOrchestrator::new(BatchOptions::serial()).with_cancel(token.clone());
    let err = batch
        .run_ref(&items, |s| {
            if s.node_count() == 4 {
                token.cancel();
            }
            Ok(())
        })
        .expect_err("cancelled");
    assert_eq!(err, BatchError::Cancelled { completed: 4, total: 10 });
    assert!(batch.cancel_token().is_cancelled());
}

#[test]
fn the_deadline_covers_the_whole_batch() {
    let items = chains(40);
    let batch = BatchOrchestrator::new(BatchOptions::serial().timeout(Duration::from_millis(20)));
    let err = batch
        .run_ref(&items, |_| {
            std::thread::sleep(Duration::from_millis(5));
            Ok(())
        })
        .expect_err("40 x 5ms exceeds 20ms");
    match err {
        BatchError::TimedOut { completed, total, .. } => {
            assert!(completed >= 1 && completed < total);
            assert_eq!(total, 40);
        }
        other => panic!("unexpected error: {other}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn serial_and_parallel_agree(n in 0usize..40, workers in 1usize..9, omit in any::<bool>()) {
        let items = chains(n);
        let serial = BatchOrchestrator::new(BatchOptions::serial().omit_failures(omit));
        let parallel = BatchOrchestrator::new(BatchOptions::parallel(workers).omit_failures(omit));
        prop_assert_eq!(
            serial.run_ref(&items, third_node),
            parallel.run_ref(&items, third_node)
        );
    }
}
