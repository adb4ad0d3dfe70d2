//! Rescue of subtrees every earlier pass left unmapped.

use tracing::debug;

use super::filters;
use super::greedy::GreedySubtreeMatcher;
use super::{check_roots, Deadline, MatchOutcome, Matcher};
use crate::error::Result;
use crate::mapping::MappingStore;
use crate::tree::NodeId;

/// Final sweep pairing still-unmapped isomorphic subtrees.
///
/// Only pairs that are unique on both sides are taken, and only when their
/// root is a statement, a documentation comment or a call. Expressions are
/// never rescued on their own: the refactoring-aware passes leave them
/// unmapped on purpose.
#[derive(Debug, Clone)]
pub struct MissingSubtreeMatcher {
    greedy: GreedySubtreeMatcher,
}

impl Default for MissingSubtreeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MissingSubtreeMatcher {
    pub fn new() -> Self {
        MissingSubtreeMatcher {
            greedy: GreedySubtreeMatcher::bare()
                .with_filter(filters::unmapped_in_seed)
                .with_filter(filters::rescuable_kind)
                .discard_ambiguous(),
        }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.greedy = self.greedy.with_deadline(deadline);
        self
    }

    /// Sweeps the whole tree pair of `store`.
    pub fn rescue(&self, store: &mut MappingStore<'_>) -> Result<usize> {
        let (src, dst) = (store.src_tree().root(), store.dst_tree().root());
        self.rescue_within(src, dst, store)
    }

    fn rescue_within(&self, src: NodeId, dst: NodeId, store: &mut MappingStore<'_>) -> Result<usize> {
        check_roots(store, src, dst)?;
        let found = self.greedy.anchors(src, dst, store)?;
        debug!(pairs = found.len(), "missing subtrees rescued");
        store.merge(&found);
        Ok(found.len())
    }
}

impl Matcher for MissingSubtreeMatcher {
    fn match_trees(&self, src: NodeId, dst: NodeId, store: &mut MappingStore<'_>) -> MatchOutcome {
        MatchOutcome::from_result(self.rescue_within(src, dst, store))
    }
}
