// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::time::Duration;

/// How a batch is executed.
///
/// The default is serial, fail-fast and without a deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchOptions {
    /// Spread items over worker threads.
    pub parallel: bool,
    /// Worker count when `parallel` is set; `0` means one per available core.
    pub n_workers: usize,
    /// Collect failed items instead of aborting on the first one.
    pub omit_failures: bool,
    /// Deadline for the whole batch, checked between items.
    pub timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            n_workers: 1,
            omit_failures: false,
            timeout: None,
        }
    }
}

impl BatchOptions {
    /// Serial, fail-fast.
    #[must_use]
    pub fn serial() -> Self {
        Self::default()
    }

    /// Parallel on `n_workers` threads (`0` for one per core).
    #[must_use]
    pub fn parallel(n_workers: usize) -> Self {
        Self {
            parallel: true,
            n_workers,
            ..Self::default()
        }
    }

    /// Sets omit-failures mode.
    pub fn omit_failures(mut self, omit: bool) -> Self {
        self.omit_failures = omit;
        self
    }

    /// Sets the whole-batch deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Threads actually used for `items` items; never more than the item count
    /// and at least one.
    pub fn effective_workers(&self, items: usize) -> usize {
        if !self.parallel {
            return 1;
        }
        let requested = if self.n_workers == 0 {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        } else {
            self.n_workers
        };
        requested.min(items).max(1)
    }
}
