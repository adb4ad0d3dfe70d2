//! The 1:1 projection of a correspondence store.

use rustc_hash::FxHashMap;

use crate::tree::NodeId;

/// Read-only 1:1 view derived from a [`super::MappingStore`]: the pairs
/// whose source has exactly one destination and whose destination has
/// exactly one source.
#[derive(Debug, Clone, Default)]
pub struct MonoMappings {
    pairs: Vec<(NodeId, NodeId)>,
    src_to_dst: FxHashMap<NodeId, NodeId>,
    dst_to_src: FxHashMap<NodeId, NodeId>,
}

impl MonoMappings {
    pub(crate) fn from_pairs(pairs: impl IntoIterator<Item = (NodeId, NodeId)>) -> Self {
        let mut mono = MonoMappings::default();
        for (src, dst) in pairs {
            mono.pairs.push((src, dst));
            mono.src_to_dst.insert(src, dst);
            mono.dst_to_src.insert(dst, src);
        }
        mono
    }

    /// Destination of `src`.
    pub fn dst(&self, src: NodeId) -> Option<NodeId> {
        self.src_to_dst.get(&src).copied()
    }

    /// Source of `dst`.
    pub fn src(&self, dst: NodeId) -> Option<NodeId> {
        self.dst_to_src.get(&dst).copied()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if the projection is empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.pairs.iter().copied()
    }
}
