//! Correspondence store between two trees.
//!
//! A [`MappingStore`] records which nodes of a source tree correspond to
//! which nodes of a destination tree. It is multi-valued in both directions:
//! a node may be linked to several counterparts while the matchers are still
//! working, and the 1:1 projection used downstream is derived on demand with
//! [`MappingStore::mono`].

mod mono;

pub use mono::MonoMappings;

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::tree::{NodeId, Tree};

/// Bidirectional multi-valued mapping scoped to one (source, destination)
/// tree pair.
#[derive(Debug, Clone)]
pub struct MappingStore<'t> {
    src: &'t Tree,
    dst: &'t Tree,
    src_to_dst: FxHashMap<NodeId, BTreeSet<NodeId>>,
    dst_to_src: FxHashMap<NodeId, BTreeSet<NodeId>>,
}

impl<'t> MappingStore<'t> {
    /// Creates an empty store for the given tree pair.
    pub fn new(src: &'t Tree, dst: &'t Tree) -> Self {
        MappingStore {
            src,
            dst,
            src_to_dst: FxHashMap::default(),
            dst_to_src: FxHashMap::default(),
        }
    }

    /// Creates an empty store over the same trees as this one.
    pub fn empty_like(&self) -> Self {
        MappingStore::new(self.src, self.dst)
    }

    /// The source tree.
    pub fn src_tree(&self) -> &'t Tree {
        self.src
    }

    /// The destination tree.
    pub fn dst_tree(&self) -> &'t Tree {
        self.dst
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.src_to_dst.values().map(BTreeSet::len).sum()
    }

    /// True if no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.src_to_dst.is_empty()
    }

    /// Returns true if the pair is stored.
    pub fn contains(&self, src: NodeId, dst: NodeId) -> bool {
        self.src_to_dst
            .get(&src)
            .is_some_and(|dsts| dsts.contains(&dst))
    }

    /// Adds a pair.
    ///
    /// Returns true if the pair was new. Pairs outside this store's tree pair
    /// are refused.
    pub fn add(&mut self, src: NodeId, dst: NodeId) -> bool {
        if !self.src.contains(src) || !self.dst.contains(dst) {
            warn!(?src, ?dst, "refusing mapping outside the store's tree pair");
            return false;
        }
        let inserted = self.src_to_dst.entry(src).or_default().insert(dst);
        self.dst_to_src.entry(dst).or_default().insert(src);
        inserted
    }

    /// Removes a pair. Returns true if it was present.
    pub fn remove(&mut self, src: NodeId, dst: NodeId) -> bool {
        let removed = detach(&mut self.src_to_dst, src, dst);
        detach(&mut self.dst_to_src, dst, src);
        removed
    }

    /// Drops every pair incident to either node, then adds `(src, dst)`.
    pub fn replace(&mut self, src: NodeId, dst: NodeId) -> bool {
        if !self.src.contains(src) || !self.dst.contains(dst) {
            warn!(?src, ?dst, "refusing replacement outside the store's tree pair");
            return false;
        }
        self.unlink_src(src);
        self.unlink_dst(dst);
        self.add(src, dst)
    }

    /// Adds the pair, then descends child by child while both nodes have
    /// the same number of children. Where the counts differ only that level's
    /// pair is added.
    pub fn add_recursively(&mut self, src: NodeId, dst: NodeId) {
        let mut stack = vec![(src, dst)];
        while let Some((s, d)) = stack.pop() {
            if !self.add(s, d) && !self.contains(s, d) {
                continue;
            }
            if self.src.child_count(s) == self.dst.child_count(d) {
                stack.extend(self.src.children(s).zip(self.dst.children(d)));
            }
        }
    }

    /// Adds every pair of `other`.
    pub fn merge(&mut self, other: &MappingStore<'_>) {
        for (src, dst) in other.pairs() {
            self.add(src, dst);
        }
    }

    /// Installs the pairs of `other` as authoritative: every node `other`
    /// touches loses its prior links here before the pairs are added.
    pub fn replace_all(&mut self, other: &MappingStore<'_>) {
        let pairs = other.pairs();
        for &(src, dst) in &pairs {
            self.unlink_src(src);
            self.unlink_dst(dst);
        }
        for (src, dst) in pairs {
            self.add(src, dst);
        }
    }

    /// Installs the pairs of `other`, dropping only the prior links that
    /// point at a structurally different counterpart.
    ///
    /// A source already linked to a destination that is iso-structural with
    /// the new one keeps that link, and the destination side is handled the
    /// same way.
    pub fn replace_with_optimized(&mut self, other: &MappingStore<'_>) {
        for (src, dst) in other.pairs() {
            if !self.src.contains(src) || !self.dst.contains(dst) {
                self.add(src, dst);
                continue;
            }
            let stale_dsts: Vec<NodeId> = self
                .dsts(src)
                .filter(|&d| d != dst && !self.dst.is_iso_structural(d, self.dst, dst))
                .collect();
            for d in stale_dsts {
                self.remove(src, d);
            }
            let stale_srcs: Vec<NodeId> = self
                .srcs(dst)
                .filter(|&s| s != src && !self.src.is_iso_structural(s, self.src, src))
                .collect();
            for s in stale_srcs {
                self.remove(s, dst);
            }
            self.add(src, dst);
        }
    }

    /// Destinations linked to `src`, in node order.
    pub fn dsts(&self, src: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.src_to_dst.get(&src).into_iter().flatten().copied()
    }

    /// Sources linked to `dst`, in node order.
    pub fn srcs(&self, dst: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.dst_to_src.get(&dst).into_iter().flatten().copied()
    }

    /// First destination linked to `src`.
    pub fn first_dst(&self, src: NodeId) -> Option<NodeId> {
        self.dsts(src).next()
    }

    /// First source linked to `dst`.
    pub fn first_src(&self, dst: NodeId) -> Option<NodeId> {
        self.srcs(dst).next()
    }

    /// Whether `src` has any link.
    pub fn is_src_mapped(&self, src: NodeId) -> bool {
        self.src_to_dst.contains_key(&src)
    }

    /// Whether `dst` has any link.
    pub fn is_dst_mapped(&self, dst: NodeId) -> bool {
        self.dst_to_src.contains_key(&dst)
    }

    fn dst_count(&self, src: NodeId) -> usize {
        self.src_to_dst.get(&src).map_or(0, BTreeSet::len)
    }

    fn src_count(&self, dst: NodeId) -> usize {
        self.dst_to_src.get(&dst).map_or(0, BTreeSet::len)
    }

    /// True if `src` has exactly one destination.
    pub fn is_src_unique(&self, src: NodeId) -> bool {
        self.dst_count(src) == 1
    }

    /// True if `dst` has exactly one source.
    pub fn is_dst_unique(&self, dst: NodeId) -> bool {
        self.src_count(dst) == 1
    }

    /// A source is multi-mapped if it has several destinations, or if its
    /// only destination has several sources.
    pub fn is_src_multi_mapped(&self, src: NodeId) -> bool {
        match self.dst_count(src) {
            0 => false,
            1 => self.first_dst(src).is_some_and(|d| self.src_count(d) > 1),
            _ => true,
        }
    }

    /// A destination is multi-mapped if it has several sources, or if its
    /// only source has several destinations.
    pub fn is_dst_multi_mapped(&self, dst: NodeId) -> bool {
        match self.src_count(dst) {
            0 => false,
            1 => self.first_src(dst).is_some_and(|s| self.dst_count(s) > 1),
            _ => true,
        }
    }

    /// True if none of `srcs` maps to a node inside the destination subtree
    /// rooted at `dst_root`.
    pub fn all_srcs_unmapped<I>(&self, srcs: I, dst_root: NodeId) -> bool
    where
        I: IntoIterator<Item = NodeId>,
    {
        srcs.into_iter()
            .all(|s| self.dsts(s).all(|d| !self.dst.is_within(d, dst_root)))
    }

    /// True if none of `dsts` maps to a node inside the source subtree
    /// rooted at `src_root`.
    pub fn all_dsts_unmapped<I>(&self, dsts: I, src_root: NodeId) -> bool
    where
        I: IntoIterator<Item = NodeId>,
    {
        dsts.into_iter()
            .all(|d| self.srcs(d).all(|s| !self.src.is_within(s, src_root)))
    }

    /// True if every link of the `src` subtree ends inside `dst_root` and
    /// every link of the `dst` subtree starts inside `src_root`.
    pub fn are_subtrees_confined(
        &self,
        src: NodeId,
        dst: NodeId,
        src_root: NodeId,
        dst_root: NodeId,
    ) -> bool {
        self.src
            .pre_order(src)
            .all(|s| self.dsts(s).all(|d| self.dst.is_within(d, dst_root)))
            && self
                .dst
                .pre_order(dst)
                .all(|d| self.srcs(d).all(|s| self.src.is_within(s, src_root)))
    }

    /// True if no node of either subtree has any link.
    pub fn are_subtrees_unmapped(&self, src: NodeId, dst: NodeId) -> bool {
        self.src.pre_order(src).all(|s| !self.is_src_mapped(s))
            && self.dst.pre_order(dst).all(|d| !self.is_dst_mapped(d))
    }

    /// All pairs, sorted by source then destination.
    pub fn pairs(&self) -> Vec<(NodeId, NodeId)> {
        let mut srcs: Vec<&NodeId> = self.src_to_dst.keys().collect();
        srcs.sort();
        srcs.into_iter()
            .flat_map(|s| self.dsts(*s).map(move |d| (*s, d)))
            .collect()
    }

    /// The 1:1 projection of this store.
    pub fn mono(&self) -> MonoMappings {
        MonoMappings::from_pairs(
            self.pairs()
                .into_iter()
                .filter(|&(s, d)| self.is_src_unique(s) && self.is_dst_unique(d)),
        )
    }

    fn unlink_src(&mut self, src: NodeId) {
        if let Some(dsts) = self.src_to_dst.remove(&src) {
            for d in dsts {
                detach(&mut self.dst_to_src, d, src);
            }
        }
    }

    fn unlink_dst(&mut self, dst: NodeId) {
        if let Some(srcs) = self.dst_to_src.remove(&dst) {
            for s in srcs {
                detach(&mut self.src_to_dst, s, dst);
            }
        }
    }
}

/// Removes `value` from the set of `key`, dropping the entry once empty.
fn detach(map: &mut FxHashMap<NodeId, BTreeSet<NodeId>>, key: NodeId, value: NodeId) -> bool {
    let Some(set) = map.get_mut(&key) else {
        return false;
    };
    let removed = set.remove(&value);
    if set.is_empty() {
        map.remove(&key);
    }
    removed
}
