// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Work-queue execution of one operation over many items.
//!
//! Workers claim item indices from a shared atomic cursor until the queue is
//! drained, a failure halts a fail-fast batch, the cancel token fires or the
//! deadline passes. Indices are claimed in increasing order, so when a
//! fail-fast batch halts every lower index has already been claimed and runs
//! to completion. The reported failure is therefore always the lowest failing
//! index, independent of scheduling.
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use arbor_core::{Neuron, NeuronCore, Skeleton, SkeletonError};
use tracing::{info, instrument, warn};

use crate::cancel::CancelToken;
use crate::error::{BatchError, ItemError, ItemFailure};
use crate::options::BatchOptions;

/// Anything a batch can name in its diagnostics.
pub trait BatchItem {
    /// Human-readable identity, reported with failures.
    fn label(&self) -> String;
}

impl BatchItem for Skeleton {
    fn label(&self) -> String {
        self.name().to_owned()
    }
}

impl BatchItem for Neuron {
    fn label(&self) -> String {
        NeuronCore::name(self).to_owned()
    }
}

impl<T: BatchItem + ?Sized> BatchItem for &T {
    fn label(&self) -> String {
        (**self).label()
    }
}

impl<T: BatchItem + ?Sized> BatchItem for Box<T> {
    fn label(&self) -> String {
        (**self).label()
    }
}

/// Successful results of a batch, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput<R> {
    /// Results of the items that succeeded.
    pub results: Vec<R>,
    /// Input index of each entry in `results`.
    pub indices: Vec<usize>,
    /// Items left out in omit-failures mode; always empty otherwise.
    pub failures: Vec<ItemFailure>,
}

impl<R> BatchOutput<R> {
    /// Whether every item succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Drops the bookkeeping and keeps the results.
    pub fn into_results(self) -> Vec<R> {
        self.results
    }
}

#[derive(Clone, Copy, Debug)]
enum Stop {
    Cancelled,
    TimedOut,
}

type Outcome<R> = (usize, Result<R, ItemFailure>);

/// Shared queue state for one run.
struct Queue {
    len: usize,
    next: AtomicUsize,
    halted: AtomicBool,
    stop: OnceLock<Stop>,
    deadline: Option<Instant>,
}

/// Applies single-skeleton operations across collections.
#[derive(Clone, Debug, Default)]
pub struct BatchOrchestrator {
    options: BatchOptions,
    cancel: CancelToken,
}

impl BatchOrchestrator {
    /// Orchestrator with its own cancel token.
    #[must_use]
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options,
            cancel: CancelToken::new(),
        }
    }

    /// Replaces the cancel token, e.g. with one shared by a UI.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execution settings.
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// The token that cancels runs of this orchestrator.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Runs `op` over owned items; each item moves into exactly one call.
    ///
    /// # Errors
    /// See [`BatchError`]: the lowest failing item in fail-fast mode, or
    /// cancellation/timeout before every item was processed.
    #[instrument(skip_all, fields(items = items.len(), parallel = self.options.parallel))]
    pub fn run<T, R, F>(&self, items: Vec<T>, op: F) -> Result<BatchOutput<R>, BatchError>
    where
        T: BatchItem + Send,
        R: Send,
        F: Fn(T) -> Result<R, SkeletonError> + Sync,
    {
        let slots: Vec<Mutex<Option<T>>> = items.into_iter().map(|t| Mutex::new(Some(t))).collect();
        self.execute(slots.len(), |index| {
            let taken = slots[index]
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            let Some(item) = taken else {
                return Err(ItemFailure {
                    index,
                    label: String::new(),
                    error: ItemError::Panicked("item claimed twice".to_owned()),
                });
            };
            let label = item.label();
            invoke(index, || op(item)).map_err(|error| ItemFailure { index, label, error })
        })
    }

    /// Runs `op` over borrowed items; the items are shared read-only.
    ///
    /// # Errors
    /// As [`run`](Self::run).
    #[instrument(skip_all, fields(items = items.len(), parallel = self.options.parallel))]
    pub fn run_ref<T, R, F>(&self, items: &[T], op: F) -> Result<BatchOutput<R>, BatchError>
    where
        T: BatchItem + Sync,
        R: Send,
        F: Fn(&T) -> Result<R, SkeletonError> + Sync,
    {
        self.execute(items.len(), |index| {
            let item = &items[index];
            invoke(index, || op(item)).map_err(|error| ItemFailure {
                index,
                label: item.label(),
                error,
            })
        })
    }

    fn execute<R, W>(&self, len: usize, work: W) -> Result<BatchOutput<R>, BatchError>
    where
        R: Send,
        W: Fn(usize) -> Result<R, ItemFailure> + Sync,
    {
        let started = Instant::now();
        let workers = self.options.effective_workers(len);
        info!(workers, omit_failures = self.options.omit_failures, "batch started");

        let queue = Queue {
            len,
            next: AtomicUsize::new(0),
            halted: AtomicBool::new(false),
            stop: OnceLock::new(),
            deadline: self.options.timeout.map(|t| started + t),
        };

        let mut outcomes: Vec<Outcome<R>> = if workers <= 1 {
            self.drain(&queue, &work)
        } else {
            std::thread::scope(|s| {
                let handles: Vec<_> = (0..workers)
                    .map(|_| {
                        let queue = &queue;
                        let work = &work;
                        s.spawn(move || self.drain(queue, work))
                    })
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|h| match h.join() {
                        Ok(done) => done,
                        Err(e) => std::panic::resume_unwind(e),
                    })
                    .collect()
            })
        };
        outcomes.sort_unstable_by_key(|(index, _)| *index);
        self.finish(&queue, outcomes, started.elapsed())
    }

    /// One worker's loop: claim, run, record, until there is nothing to do.
    fn drain<R, W>(&self, queue: &Queue, work: &W) -> Vec<Outcome<R>>
    where
        W: Fn(usize) -> Result<R, ItemFailure>,
    {
        let mut done = Vec::new();
        loop {
            if queue.halted.load(Ordering::Acquire) {
                break;
            }
            if self.cancel.is_cancelled() {
                let _ = queue.stop.set(Stop::Cancelled);
                break;
            }
            if queue.deadline.is_some_and(|d| Instant::now() >= d) {
                let _ = queue.stop.set(Stop::TimedOut);
                break;
            }
            let index = queue.next.fetch_add(1, Ordering::Relaxed);
            if index >= queue.len {
                break;
            }
            let outcome = work(index);
            if outcome.is_err() && !self.options.omit_failures {
                queue.halted.store(true, Ordering::Release);
            }
            done.push((index, outcome));
        }
        done
    }

    fn finish<R>(
        &self,
        queue: &Queue,
        outcomes: Vec<Outcome<R>>,
        elapsed: Duration,
    ) -> Result<BatchOutput<R>, BatchError> {
        let completed = outcomes.len();
        let mut output = BatchOutput {
            results: Vec::with_capacity(completed),
            indices: Vec::with_capacity(completed),
            failures: Vec::new(),
        };
        for (index, outcome) in outcomes {
            match outcome {
                Ok(r) => {
                    output.results.push(r);
                    output.indices.push(index);
                }
                Err(failure) if self.options.omit_failures => {
                    warn!(index, label = %failure.label, error = %failure.error, "omitting failed item");
                    output.failures.push(failure);
                }
                Err(failure) => {
                    warn!(index, label = %failure.label, error = %failure.error, "batch aborted");
                    return Err(failure.into_batch_error());
                }
            }
        }

        if completed < queue.len {
            let total = queue.len;
            let err = match queue.stop.get() {
                Some(Stop::TimedOut) => BatchError::TimedOut {
                    completed,
                    total,
                    elapsed,
                },
                _ => BatchError::Cancelled { completed, total },
            };
            warn!(completed, total, error = %err, "batch stopped early");
            return Err(err);
        }

        info!(
            ok = output.results.len(),
            failed = output.failures.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "batch finished"
        );
        Ok(output)
    }
}

/// Runs one item, turning a panic into an item error.
fn invoke<R>(index: usize, f: impl FnOnce() -> Result<R, SkeletonError>) -> Result<R, ItemError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(ItemError::from),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(index, %message, "item panicked");
            Err(ItemError::Panicked(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
