//! Matching of statement fragments through pruned projections.
//!
//! A fragment is matched on a copy of its subtree that keeps only the parts
//! relevant to the correspondence: comments and anonymous class bodies are
//! left out of leaf statements, nested statements are left out of composite
//! ones. The pairs found on the copies are translated back to the original
//! nodes before they reach the caller's store.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::generic::GenericMatcher;
use super::{Deadline, MatchOutcome, Matcher};
use crate::error::{Error, Result};
use crate::mapping::MappingStore;
use crate::tree::{NodeId, NodeKind, Tree, TreeBuilder};

/// One side of a fragment pair: its root and, optionally, the parts of it
/// that take part in the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub root: NodeId,
    pub parts: Vec<NodeId>,
}

impl Fragment {
    /// The whole subtree of `root`.
    pub fn whole(root: NodeId) -> Self {
        Fragment {
            root,
            parts: Vec::new(),
        }
    }

    /// Only the given descendants of `root`.
    pub fn with_parts(root: NodeId, parts: Vec<NodeId>) -> Self {
        Fragment { root, parts }
    }
}

/// Which children of a fragment root survive pruning when no explicit parts
/// are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrunePolicy {
    /// Everything but comments and anonymous class bodies.
    #[default]
    Leaf,
    /// Only the non-statement children of a composite statement, such as
    /// its condition, initialisers or resources.
    Composite,
}

/// A pruned copy of a fragment, remembering the original of every copied
/// node.
#[derive(Debug)]
pub struct PrunedTree {
    tree: Tree,
    originals: FxHashMap<NodeId, NodeId>,
}

impl PrunedTree {
    /// Copies `fragment` out of `tree`.
    pub fn build(tree: &Tree, fragment: &Fragment, policy: PrunePolicy) -> Result<PrunedTree> {
        if !tree.contains(fragment.root) {
            return Err(Error::MalformedFragment(
                "fragment root belongs to another tree".to_string(),
            ));
        }
        let mut builder = TreeBuilder::new();
        if let Some(path) = tree.path() {
            builder = builder.with_path(path);
        }
        let mut originals = FxHashMap::default();
        let root = builder.copy_node(None, tree, fragment.root, &mut originals);
        let keep = |n: NodeId| !is_pruned(tree.kind(n));

        if fragment.parts.is_empty() {
            for child in tree.children(fragment.root) {
                let kind = tree.kind(child);
                let kept = match policy {
                    PrunePolicy::Leaf => !is_pruned(kind),
                    PrunePolicy::Composite => !is_pruned(kind) && !kind.is_statement(),
                };
                if kept {
                    builder.copy_subtree_where(Some(root), tree, child, &mut originals, keep);
                }
            }
        } else {
            let mut parts = fragment.parts.clone();
            for &part in &parts {
                if part == fragment.root
                    || !tree.contains(part)
                    || !tree.is_within(part, fragment.root)
                {
                    return Err(Error::MalformedFragment(
                        "part lies outside its fragment".to_string(),
                    ));
                }
            }
            parts.sort_by_key(|&p| tree.pre_order_rank(p));
            let mut copied: Vec<NodeId> = Vec::new();
            for part in parts {
                if copied.iter().any(|&c| tree.is_within(part, c)) {
                    continue;
                }
                builder.copy_subtree_where(Some(root), tree, part, &mut originals, keep);
                copied.push(part);
            }
        }

        Ok(PrunedTree {
            tree: builder.finish()?,
            originals,
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The original node a copy was made from.
    pub fn original(&self, copy: NodeId) -> Option<NodeId> {
        self.originals.get(&copy).copied()
    }
}

fn is_pruned(kind: NodeKind) -> bool {
    kind.is_comment() || kind == NodeKind::AnonymousClassDeclaration
}

/// Matches one pair of statement fragments.
///
/// When `overwrite` is set, the pairs found replace every prior link of the
/// nodes they touch; otherwise they are added next to them.
#[derive(Debug, Clone, Default)]
pub struct LeafMatcher {
    overwrite: bool,
    policy: PrunePolicy,
    generic: GenericMatcher,
}

impl LeafMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the found pairs authoritative.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the pruning applied when a fragment has no explicit parts.
    pub fn with_policy(mut self, policy: PrunePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.generic = self.generic.with_deadline(deadline);
        self
    }

    /// Matches two fragments into `store`.
    ///
    /// Failures are reported in the outcome and leave `store` unchanged.
    pub fn match_fragments(
        &self,
        src: &Fragment,
        dst: &Fragment,
        store: &mut MappingStore<'_>,
    ) -> MatchOutcome {
        MatchOutcome::from_result(self.try_match(src, dst, store))
    }

    fn try_match(&self, src: &Fragment, dst: &Fragment, store: &mut MappingStore<'_>) -> Result<usize> {
        let src_pruned = PrunedTree::build(store.src_tree(), src, self.policy)?;
        let dst_pruned = PrunedTree::build(store.dst_tree(), dst, self.policy)?;
        let (a, b) = (src_pruned.tree(), dst_pruned.tree());

        let local = if a.is_iso_structural(a.root(), b, b.root()) {
            let mut local = MappingStore::new(a, b);
            local.add_recursively(a.root(), b.root());
            local
        } else {
            let seed = MappingStore::new(a, b);
            self.generic.compute(a.root(), b.root(), &seed)?
        };

        let mut translated = store.empty_like();
        for (s, d) in local.pairs() {
            let (Some(os), Some(od)) = (src_pruned.original(s), dst_pruned.original(d)) else {
                return Err(Error::MalformedFragment(
                    "pruned node without an original".to_string(),
                ));
            };
            translated.add(os, od);
        }
        debug!(
            src = %store.src_tree().kind(src.root),
            pairs = translated.len(),
            overwrite = self.overwrite,
            "fragment matched"
        );
        if self.overwrite {
            store.replace_all(&translated);
        } else {
            store.merge(&translated);
        }
        Ok(translated.len())
    }
}

impl Matcher for LeafMatcher {
    fn match_trees(&self, src: NodeId, dst: NodeId, store: &mut MappingStore<'_>) -> MatchOutcome {
        self.match_fragments(&Fragment::whole(src), &Fragment::whole(dst), store)
    }
}
