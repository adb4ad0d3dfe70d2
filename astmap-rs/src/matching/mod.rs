//! Tree matching algorithms.
//!
//! This module provides the matchers that establish correspondences between
//! the nodes of two trees. Each matcher is a stateless strategy implementing
//! [`Matcher`]; the specialised ones are built by composing the generic
//! greedy and bottom-up passes with different candidate filters rather than
//! by overriding them.

mod bottom_up;
mod composite;
pub mod filters;
mod fragment;
mod generic;
mod greedy;
pub(crate) mod lcs;
mod missing;
mod priority;

pub use bottom_up::BottomUpMatcher;
pub use composite::CompositeMatcher;
pub use fragment::{Fragment, LeafMatcher, PrunePolicy, PrunedTree};
pub use generic::GenericMatcher;
pub use greedy::{GreedySubtreeMatcher, PairContext, PairFilter};
pub use missing::MissingSubtreeMatcher;
pub use priority::HeightQueue;

use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::{Error, Result};
use crate::mapping::MappingStore;
use crate::tree::NodeId;

/// A matching strategy.
///
/// A matcher receives the roots of the two subtrees to correspond and the
/// store to populate. The store's existing content acts as seed knowledge.
pub trait Matcher {
    /// Matches the subtree of `src` against the subtree of `dst`, adding the
    /// pairs it finds to `store`.
    fn match_trees(&self, src: NodeId, dst: NodeId, store: &mut MappingStore<'_>) -> MatchOutcome;
}

/// Fails unless `src` lies in the source tree of `store` and `dst` in its
/// destination tree.
pub(crate) fn check_roots(store: &MappingStore<'_>, src: NodeId, dst: NodeId) -> Result<()> {
    if store.src_tree().contains(src) && store.dst_tree().contains(dst) {
        Ok(())
    } else {
        Err(Error::MalformedFragment(
            "matching roots outside the store's trees".to_string(),
        ))
    }
}

/// Result of one matching attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The attempt ran to completion.
    Matched {
        /// Number of pairs the attempt produced.
        pairs: usize,
    },
    /// The attempt was abandoned; nothing was committed.
    Unmatched {
        /// Why the attempt was abandoned.
        reason: String,
    },
    /// The deadline expired during the attempt.
    Cancelled,
}

impl MatchOutcome {
    /// Converts a pass result, absorbing every error but cancellation.
    pub fn from_result(result: Result<usize>) -> Self {
        match result {
            Ok(pairs) => MatchOutcome::Matched { pairs },
            Err(Error::Cancelled) => MatchOutcome::Cancelled,
            Err(e) => {
                warn!(error = %e, "fragment skipped");
                MatchOutcome::Unmatched {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// True for [`MatchOutcome::Matched`].
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }

    /// Turns cancellation back into an error so callers can unwind with `?`.
    pub fn into_result(self) -> Result<usize> {
        match self {
            MatchOutcome::Matched { pairs } => Ok(pairs),
            MatchOutcome::Unmatched { .. } => Ok(0),
            MatchOutcome::Cancelled => Err(Error::Cancelled),
        }
    }
}

/// Wall-clock limit for a matching run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn never() -> Self {
        Deadline { at: None }
    }

    /// A deadline expiring at `instant`.
    pub fn at(instant: Instant) -> Self {
        Deadline { at: Some(instant) }
    }

    /// A deadline expiring `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Deadline::at(Instant::now() + timeout)
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Fails with [`Error::Cancelled`] once the deadline has passed.
    pub fn check(&self) -> Result<()> {
        if self.is_expired() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// An ambiguous anchor candidate with the measures used to rank it.
#[derive(Debug, Clone, Copy)]
pub struct CandidateEntry {
    /// Source node.
    pub src: NodeId,
    /// Destination node.
    pub dst: NodeId,
    /// Dice similarity of the parents over already known pairs.
    pub score: f64,
    /// Similarity of the ancestor kind chains.
    pub ancestry: f64,
    /// Distance between the positions among siblings.
    pub distance: usize,
    /// Distance between the pre-order ranks.
    pub offset: usize,
}

impl CandidateEntry {
    /// Orders candidates best first: higher score, higher ancestry, smaller
    /// distance, smaller offset, then node order.
    pub fn rank(&self, other: &CandidateEntry) -> std::cmp::Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.ancestry.total_cmp(&self.ancestry))
            .then_with(|| self.distance.cmp(&other.distance))
            .then_with(|| self.offset.cmp(&other.offset))
            .then_with(|| self.src.cmp(&other.src))
            .then_with(|| self.dst.cmp(&other.dst))
    }
}
