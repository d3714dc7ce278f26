// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structural editing operations.
//!
//! Every operation takes an [`EditMode`] and always returns a usable
//! skeleton: the receiver itself (borrowed) after an in-place edit, or a
//! fresh copy (owned) in copy mode. Preconditions are checked before anything
//! is touched, and the new node table is validated before it replaces the
//! old one, so a failed edit leaves the receiver unchanged in either mode.
use std::borrow::Cow;

use crate::error::SkeletonError;
use crate::skeleton::Skeleton;

mod cut;
mod heal;
mod prune;
mod resample;
mod reroot;

pub use cut::CutPieces;
pub use heal::{stitch, Eligibility, HealEdge, HealOptions, SearchStrategy};
pub use prune::{OrphanPolicy, PruneTarget};
pub use resample::{ResampleTarget, DEFAULT_RESAMPLE_LIMIT};

/// Whether an edit mutates the receiver or works on a copy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EditMode {
    /// Mutate the receiver and return it borrowed.
    #[default]
    InPlace,
    /// Leave the receiver untouched and return an owned, edited copy.
    Copy,
}

/// Runs `edit` on the receiver or on a clone, per `mode`.
pub(crate) fn apply<'a, F>(
    skel: &'a mut Skeleton,
    mode: EditMode,
    edit: F,
) -> Result<Cow<'a, Skeleton>, SkeletonError>
where
    F: FnOnce(&mut Skeleton) -> Result<(), SkeletonError>,
{
    match mode {
        EditMode::InPlace => {
            edit(skel)?;
            Ok(Cow::Borrowed(skel))
        }
        EditMode::Copy => {
            let mut copy = skel.clone();
            edit(&mut copy)?;
            Ok(Cow::Owned(copy))
        }
    }
}
