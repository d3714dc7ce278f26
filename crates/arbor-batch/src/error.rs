// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::time::Duration;

use arbor_core::SkeletonError;
use thiserror::Error;

/// Why a single item failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemError {
    /// The operation returned an error.
    #[error(transparent)]
    Operation(#[from] SkeletonError),
    /// The operation panicked; carries the panic message when it was a string.
    #[error("operation panicked: {0}")]
    Panicked(String),
}

/// A failed item collected in omit-failures mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    /// Position of the item in the input collection.
    pub index: usize,
    /// The item's label (usually the skeleton name).
    pub label: String,
    /// What went wrong.
    pub error: ItemError,
}

/// Errors that abort a whole batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    /// Fail-fast mode: the failing item with the lowest input index.
    #[error("item {index} ({label}) failed: {source}")]
    Item {
        /// Position of the item in the input collection.
        index: usize,
        /// The item's label.
        label: String,
        /// The item's error.
        source: ItemError,
    },
    /// The cancel token fired before every item was processed.
    #[error("batch cancelled after {completed} of {total} items")]
    Cancelled {
        /// Items that ran to completion.
        completed: usize,
        /// Items in the batch.
        total: usize,
    },
    /// The batch deadline passed before every item was processed.
    #[error("batch timed out after {elapsed:?} with {completed} of {total} items done")]
    TimedOut {
        /// Items that ran to completion.
        completed: usize,
        /// Items in the batch.
        total: usize,
        /// Wall time spent when the deadline was observed.
        elapsed: Duration,
    },
}

impl ItemFailure {
    pub(crate) fn into_batch_error(self) -> BatchError {
        BatchError::Item {
            index: self.index,
            label: self.label,
            source: self.error,
        }
    }
}
