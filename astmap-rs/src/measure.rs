//! Similarity measures between nodes of two trees.
//!
//! The bottom-up matcher scores container candidates with the Dice
//! coefficient over mapped descendants; the greedy matcher breaks ties between
//! ambiguous anchors with the ancestor and position measures below.

use crate::mapping::MappingStore;
use crate::matching::lcs::lcs;
use crate::tree::{NodeId, NodeKind, Tree};

/// Dice coefficient: `2 * common / (size_a + size_b)`.
///
/// Returns 0.0 when both sets are empty.
#[must_use]
pub fn dice(common: usize, size_a: usize, size_b: usize) -> f64 {
    if size_a + size_b == 0 {
        return 0.0;
    }
    (2.0 * common as f64) / (size_a + size_b) as f64
}

/// Counts the proper descendants of `src` linked to a proper descendant of
/// `dst`.
pub fn mapped_descendant_pairs(store: &MappingStore<'_>, src: NodeId, dst: NodeId) -> usize {
    let (src_tree, dst_tree) = (store.src_tree(), store.dst_tree());
    src_tree
        .descendants(src)
        .filter(|&s| {
            store
                .dsts(s)
                .any(|d| d != dst && dst_tree.is_within(d, dst))
        })
        .count()
}

/// Dice similarity of two containers over their mapped descendants.
#[must_use]
pub fn dice_similarity(store: &MappingStore<'_>, src: NodeId, dst: NodeId) -> f64 {
    let common = mapped_descendant_pairs(store, src, dst);
    dice(
        common,
        store.src_tree().size(src) - 1,
        store.dst_tree().size(dst) - 1,
    )
}

/// Similarity of the ancestor kind chains of two nodes: Dice over their
/// longest common subsequence.
#[must_use]
pub fn ancestor_similarity(src_tree: &Tree, src: NodeId, dst_tree: &Tree, dst: NodeId) -> f64 {
    let a: Vec<NodeKind> = src_tree.ancestors(src).map(|n| src_tree.kind(n)).collect();
    let b: Vec<NodeKind> = dst_tree.ancestors(dst).map(|n| dst_tree.kind(n)).collect();
    dice(lcs(&a, &b, |x, y| x == y).len(), a.len(), b.len())
}

/// Distance between the positions of two nodes among their siblings.
#[must_use]
pub fn position_distance(src_tree: &Tree, src: NodeId, dst_tree: &Tree, dst: NodeId) -> usize {
    let a = src_tree.child_position(src).unwrap_or(0);
    let b = dst_tree.child_position(dst).unwrap_or(0);
    a.abs_diff(b)
}
