// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! arbor-batch: apply single-skeleton operations across collections.
//!
//! The topology engine in `arbor-core` is synchronous per skeleton; this crate
//! is the only place work is spread across threads. Each worker owns the items
//! it claims exclusively, results are reassembled in input order, and per-item
//! failures are either escalated (fail-fast) or collected (omit-failures).
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation
)]

mod cancel;
mod error;
mod options;
mod orchestrator;

// Re-exports for stable public API
/// Cooperative cancellation flag shared with a running batch.
pub use cancel::CancelToken;
/// Batch-level and item-level errors.
pub use error::{BatchError, ItemError, ItemFailure};
/// Batch execution settings.
pub use options::BatchOptions;
/// The orchestrator and its item/output types.
pub use orchestrator::{BatchItem, BatchOrchestrator, BatchOutput};
