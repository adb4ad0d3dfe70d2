//! Greedy top-down anchor search.
//!
//! Subtrees are visited highest first. At every height level each pair of
//! isomorphic subtrees that passes the candidate filters becomes a candidate.
//! Pairs that are unique on both sides are committed straight away; the rest
//! are ranked and committed greedily. Subtrees with no candidate are opened
//! so their children compete at the lower levels.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use super::filters;
use super::priority::HeightQueue;
use super::{check_roots, CandidateEntry, Deadline};
use crate::constants::MIN_PRIORITY;
use crate::error::Result;
use crate::mapping::MappingStore;
use crate::measure::{ancestor_similarity, dice, position_distance};
use crate::tree::{Digest, NodeId, Tree};

/// What a [`PairFilter`] can see of the running pass.
#[derive(Debug, Clone, Copy)]
pub struct PairContext<'a, 't> {
    /// Source tree.
    pub src_tree: &'t Tree,
    /// Destination tree.
    pub dst_tree: &'t Tree,
    /// Root of the source subtree being matched.
    pub src_root: NodeId,
    /// Root of the destination subtree being matched.
    pub dst_root: NodeId,
    /// Pairs known before the pass started.
    pub seed: &'a MappingStore<'t>,
    /// Pairs committed by the pass so far.
    pub confirmed: &'a MappingStore<'t>,
}

impl<'a, 't> PairContext<'a, 't> {
    /// Creates a context for matching `src_root` against `dst_root`.
    pub fn new(
        seed: &'a MappingStore<'t>,
        confirmed: &'a MappingStore<'t>,
        src_root: NodeId,
        dst_root: NodeId,
    ) -> Self {
        PairContext {
            src_tree: seed.src_tree(),
            dst_tree: seed.dst_tree(),
            src_root,
            dst_root,
            seed,
            confirmed,
        }
    }

    /// Whether the pair is known, either from the seed or from this pass.
    pub fn is_linked(&self, src: NodeId, dst: NodeId) -> bool {
        self.seed.contains(src, dst) || self.confirmed.contains(src, dst)
    }

    /// Dice similarity of the parents of two nodes over every known pair.
    pub fn sibling_similarity(&self, src: NodeId, dst: NodeId) -> f64 {
        let (Some(src_parent), Some(dst_parent)) =
            (self.src_tree.parent(src), self.dst_tree.parent(dst))
        else {
            return 0.0;
        };
        let common = self
            .src_tree
            .descendants(src_parent)
            .filter(|&s| {
                self.seed
                    .dsts(s)
                    .chain(self.confirmed.dsts(s))
                    .any(|d| d != dst_parent && self.dst_tree.is_within(d, dst_parent))
            })
            .count();
        dice(
            common,
            self.src_tree.size(src_parent) - 1,
            self.dst_tree.size(dst_parent) - 1,
        )
    }

    fn candidate(&self, src: NodeId, dst: NodeId) -> CandidateEntry {
        CandidateEntry {
            src,
            dst,
            score: self.sibling_similarity(src, dst),
            ancestry: ancestor_similarity(self.src_tree, src, self.dst_tree, dst),
            distance: position_distance(self.src_tree, src, self.dst_tree, dst),
            offset: self
                .src_tree
                .pre_order_rank(src)
                .abs_diff(self.dst_tree.pre_order_rank(dst)),
        }
    }
}

/// A predicate a candidate pair must satisfy.
pub type PairFilter = fn(&PairContext<'_, '_>, NodeId, NodeId) -> bool;

/// Top-down greedy matcher producing anchor pairs.
#[derive(Debug, Clone)]
pub struct GreedySubtreeMatcher {
    min_priority: usize,
    filters: Vec<PairFilter>,
    ambiguous_filters: Vec<PairFilter>,
    resolve_ambiguity: bool,
    deadline: Deadline,
}

impl Default for GreedySubtreeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl GreedySubtreeMatcher {
    /// Creates the matcher used for statement fragments: identifiers stay
    /// in their conditional branch, call parts pair with call parts, and
    /// ambiguous string literals need a known context.
    pub fn new() -> Self {
        GreedySubtreeMatcher::bare()
            .with_filter(filters::same_conditional_branch)
            .with_filter(filters::symmetric_call_parent)
            .with_ambiguous_filter(filters::literal_context)
    }

    /// Creates a matcher without any filter.
    pub fn bare() -> Self {
        GreedySubtreeMatcher {
            min_priority: MIN_PRIORITY,
            filters: Vec::new(),
            ambiguous_filters: Vec::new(),
            resolve_ambiguity: true,
            deadline: Deadline::never(),
        }
    }

    /// Sets the lowest subtree height taking part.
    pub fn with_min_priority(mut self, min_priority: usize) -> Self {
        self.min_priority = min_priority;
        self
    }

    /// Adds a filter every candidate must pass.
    pub fn with_filter(mut self, filter: PairFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a filter ambiguous candidates must pass at commit time.
    pub fn with_ambiguous_filter(mut self, filter: PairFilter) -> Self {
        self.ambiguous_filters.push(filter);
        self
    }

    /// Drops ambiguous candidates instead of ranking them.
    pub fn discard_ambiguous(mut self) -> Self {
        self.resolve_ambiguity = false;
        self
    }

    /// Sets the deadline checked after every height level.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Runs the search between `src` and `dst`.
    ///
    /// `seed` is consulted by the filters and the ranking but never written.
    /// The committed pairs are returned in a fresh store over the same trees.
    /// Fails with [`Error::MalformedFragment`](crate::error::Error) when a
    /// root lies outside the seed's trees.
    pub fn anchors<'t>(
        &self,
        src: NodeId,
        dst: NodeId,
        seed: &MappingStore<'t>,
    ) -> Result<MappingStore<'t>> {
        check_roots(seed, src, dst)?;
        let (src_tree, dst_tree) = (seed.src_tree(), seed.dst_tree());
        let mut confirmed = seed.empty_like();
        let mut src_queue = HeightQueue::new(self.min_priority);
        let mut dst_queue = HeightQueue::new(self.min_priority);
        src_queue.push(src_tree, src);
        dst_queue.push(dst_tree, dst);

        while HeightQueue::synchronize(&mut src_queue, src_tree, &mut dst_queue, dst_tree) {
            let height = src_queue.peek_max().unwrap_or_default();
            let srcs = src_queue.pop();
            let dsts = dst_queue.pop();

            let candidates = {
                let ctx = PairContext::new(seed, &confirmed, src, dst);
                self.level_candidates(&ctx, &srcs, &dsts)
            };
            for &s in &srcs {
                if !candidates.is_src_mapped(s) {
                    src_queue.open(src_tree, s);
                }
            }
            for &d in &dsts {
                if !candidates.is_dst_mapped(d) {
                    dst_queue.open(dst_tree, d);
                }
            }

            let committed = self.commit(src, dst, seed, &candidates, &mut confirmed);
            trace!(height, candidates = candidates.len(), committed, "greedy level");
            self.deadline.check()?;
        }
        Ok(confirmed)
    }

    fn level_candidates<'t>(
        &self,
        ctx: &PairContext<'_, 't>,
        srcs: &[NodeId],
        dsts: &[NodeId],
    ) -> MappingStore<'t> {
        let mut by_hash: FxHashMap<Digest, Vec<NodeId>> = FxHashMap::default();
        for &d in dsts {
            by_hash
                .entry(*ctx.dst_tree.node(d).structural_hash())
                .or_default()
                .push(d);
        }

        let mut candidates = ctx.seed.empty_like();
        for &s in srcs {
            let Some(bucket) = by_hash.get(ctx.src_tree.node(s).structural_hash()) else {
                continue;
            };
            for &d in bucket {
                if ctx.src_tree.is_isomorphic(s, ctx.dst_tree, d)
                    && self.filters.iter().all(|f| f(ctx, s, d))
                {
                    candidates.add(s, d);
                }
            }
        }
        candidates
    }

    fn commit<'t>(
        &self,
        src_root: NodeId,
        dst_root: NodeId,
        seed: &MappingStore<'t>,
        candidates: &MappingStore<'t>,
        confirmed: &mut MappingStore<'t>,
    ) -> usize {
        let before = confirmed.len();
        let mut ambiguous = Vec::new();
        for (s, d) in candidates.pairs() {
            if candidates.is_src_unique(s) && candidates.is_dst_unique(d) {
                confirmed.add_recursively(s, d);
            } else if self.resolve_ambiguity {
                ambiguous.push((s, d));
            }
        }
        if ambiguous.is_empty() {
            return confirmed.len() - before;
        }

        let mut entries: Vec<CandidateEntry> = {
            let ctx = PairContext::new(seed, confirmed, src_root, dst_root);
            ambiguous
                .into_iter()
                .map(|(s, d)| ctx.candidate(s, d))
                .collect()
        };
        entries.sort_by(CandidateEntry::rank);

        let mut src_taken = FxHashSet::default();
        let mut dst_taken = FxHashSet::default();
        for entry in entries {
            if src_taken.contains(&entry.src) || dst_taken.contains(&entry.dst) {
                continue;
            }
            let accepted = {
                let ctx = PairContext::new(seed, confirmed, src_root, dst_root);
                self.ambiguous_filters
                    .iter()
                    .all(|f| f(&ctx, entry.src, entry.dst))
            };
            if accepted {
                confirmed.add_recursively(entry.src, entry.dst);
                src_taken.insert(entry.src);
                dst_taken.insert(entry.dst);
            }
        }
        confirmed.len() - before
    }
}
