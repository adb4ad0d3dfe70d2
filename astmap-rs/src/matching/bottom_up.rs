//! Bottom-up container matching and the last-chance recovery.
//!
//! Once anchors are known, each unmatched inner source node looks for the
//! destination node of the same kind that contains most of the counterparts
//! of its own mapped descendants. Every accepted container pair then gets a
//! last chance: its still unmapped children are paired by exact and by
//! structural longest common subsequence, and finally by kind when a kind
//! occurs exactly once on each side.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{trace, warn};

use super::check_roots;
use super::lcs::lcs;
use crate::constants::SIMILARITY_THRESHOLD;
use crate::mapping::MappingStore;
use crate::measure::dice_similarity;
use crate::tree::{NodeId, NodeKind, Tree};

/// Container matcher run after the greedy anchors.
#[derive(Debug, Clone)]
pub struct BottomUpMatcher {
    threshold: f64,
}

impl Default for BottomUpMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum Equivalence {
    Exact,
    Structural,
}

impl BottomUpMatcher {
    pub fn new() -> Self {
        BottomUpMatcher {
            threshold: SIMILARITY_THRESHOLD,
        }
    }

    /// Sets the Dice score a candidate must exceed.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Matches the containers of `src` against those of `dst`.
    ///
    /// The roots are always paired and receive a last chance. Roots outside
    /// the store's trees leave it untouched.
    pub fn propagate(&self, src: NodeId, dst: NodeId, store: &mut MappingStore<'_>) {
        if let Err(e) = check_roots(store, src, dst) {
            warn!(%e, "bottom-up pass skipped");
            return;
        }
        let src_tree = store.src_tree();
        for t in src_tree.post_order(src) {
            if t == src {
                store.add(src, dst);
                self.last_chance(store, src, dst);
                break;
            }
            if src_tree.is_leaf(t) || !store.all_srcs_unmapped([t], dst) {
                continue;
            }
            if let Some((best, score)) = self.best_candidate(store, t, src, dst) {
                trace!(score, kind = %src_tree.kind(t), "container matched");
                store.add(t, best);
                self.last_chance(store, t, best);
            }
        }
    }

    fn best_candidate(
        &self,
        store: &MappingStore<'_>,
        t: NodeId,
        src_root: NodeId,
        dst_root: NodeId,
    ) -> Option<(NodeId, f64)> {
        let mut best: Option<(NodeId, f64)> = None;
        for candidate in candidates(store, t, src_root, dst_root) {
            let score = dice_similarity(store, t, candidate);
            if score > self.threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }
        best
    }

    /// Pairs the unmapped children of a matched container pair, repeating on
    /// every pair the kind histogram produces.
    pub fn last_chance(&self, store: &mut MappingStore<'_>, src: NodeId, dst: NodeId) {
        if let Err(e) = check_roots(store, src, dst) {
            warn!(%e, "last chance skipped");
            return;
        }
        let mut work = vec![(src, dst)];
        while let Some((s, d)) = work.pop() {
            lcs_pass(store, s, d, Equivalence::Exact);
            lcs_pass(store, s, d, Equivalence::Structural);
            for (a, b) in histogram_pairs(store, s, d) {
                store.add(a, b);
                work.push((a, b));
            }
        }
    }
}

/// Destination containers worth scoring for `t`: proper ancestors, inside
/// `dst_root`, of the counterparts of `t`'s descendants, of the same kind as
/// `t`, and not already claimed by another node of the source subtree.
fn candidates(
    store: &MappingStore<'_>,
    t: NodeId,
    src_root: NodeId,
    dst_root: NodeId,
) -> Vec<NodeId> {
    let (src_tree, dst_tree) = (store.src_tree(), store.dst_tree());
    let kind = src_tree.kind(t);
    let mut seen = FxHashSet::default();
    let mut found = Vec::new();
    for s in src_tree.descendants(t) {
        for d in store.dsts(s) {
            if d == dst_root || !dst_tree.is_within(d, dst_root) {
                continue;
            }
            for ancestor in dst_tree.ancestors(d) {
                if ancestor == dst_root || !seen.insert(ancestor) {
                    break;
                }
                if dst_tree.kind(ancestor) == kind && store.all_dsts_unmapped([ancestor], src_root) {
                    found.push(ancestor);
                }
            }
        }
    }
    found
}

fn unmapped_children(tree: &Tree, node: NodeId, mapped: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
    tree.children(node).filter(|&c| !mapped(c)).collect()
}

fn lcs_pass(store: &mut MappingStore<'_>, src: NodeId, dst: NodeId, eq: Equivalence) {
    let (src_tree, dst_tree) = (store.src_tree(), store.dst_tree());
    let a = unmapped_children(src_tree, src, |c| store.is_src_mapped(c));
    let b = unmapped_children(dst_tree, dst, |c| store.is_dst_mapped(c));
    let common = lcs(&a, &b, |&x, &y| match eq {
        Equivalence::Exact => src_tree.is_isomorphic(x, dst_tree, y),
        Equivalence::Structural => src_tree.is_iso_structural(x, dst_tree, y),
    });
    for (i, j) in common {
        if !store.are_subtrees_confined(a[i], b[j], src, dst) {
            continue;
        }
        // Equivalent subtrees share their shape, so pre-orders align.
        for (s, d) in src_tree.pre_order(a[i]).zip(dst_tree.pre_order(b[j])) {
            if !store.is_src_mapped(s) && !store.is_dst_mapped(d) {
                store.add(s, d);
            }
        }
    }
}

/// Children pairs whose kind occurs exactly once among the unmapped
/// children on each side, in source order.
fn histogram_pairs(store: &MappingStore<'_>, src: NodeId, dst: NodeId) -> Vec<(NodeId, NodeId)> {
    let (src_tree, dst_tree) = (store.src_tree(), store.dst_tree());
    let a = unmapped_children(src_tree, src, |c| store.is_src_mapped(c));
    let b = unmapped_children(dst_tree, dst, |c| store.is_dst_mapped(c));

    let mut src_by_kind: FxHashMap<NodeKind, Vec<NodeId>> = FxHashMap::default();
    for &c in &a {
        src_by_kind.entry(src_tree.kind(c)).or_default().push(c);
    }
    let mut dst_by_kind: FxHashMap<NodeKind, Vec<NodeId>> = FxHashMap::default();
    for &c in &b {
        dst_by_kind.entry(dst_tree.kind(c)).or_default().push(c);
    }

    a.iter()
        .filter_map(|&c| {
            let kind = src_tree.kind(c);
            match (src_by_kind.get(&kind)?.as_slice(), dst_by_kind.get(&kind)?.as_slice()) {
                ([_], [d]) => Some((c, *d)),
                _ => None,
            }
        })
        .collect()
}
