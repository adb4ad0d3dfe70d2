//! Incremental tree construction.

use md5::{Digest as _, Md5};
use rustc_hash::FxHashMap;

use super::{Digest, Node, NodeId, NodeKind, SourceRange, Tree, TreeId};
use crate::error::{Error, Result};

/// A node under construction.
#[derive(Debug)]
struct PendingNode {
    kind: NodeKind,
    label: String,
    range: SourceRange,
    parent: Option<u32>,
    children: Vec<u32>,
}

/// Builds a [`Tree`] top-down.
///
/// The first node pushed with [`TreeBuilder::root`] becomes the root; every
/// other node is attached to an already pushed parent. Node ids handed out by
/// the builder stay valid in the finished tree.
#[derive(Debug)]
pub struct TreeBuilder {
    id: TreeId,
    path: Option<String>,
    nodes: Vec<PendingNode>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        TreeBuilder {
            id: TreeId::fresh(),
            path: None,
            nodes: Vec::new(),
        }
    }

    /// Sets the file path the tree belongs to.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Pushes the root node.
    pub fn root(&mut self, kind: NodeKind, label: impl Into<String>, range: SourceRange) -> NodeId {
        self.push(None, kind, label.into(), range)
    }

    /// Pushes a node as the last child of `parent`.
    pub fn child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        label: impl Into<String>,
        range: SourceRange,
    ) -> NodeId {
        debug_assert_eq!(parent.tree(), self.id, "parent from another builder");
        self.push(Some(parent.index), kind, label.into(), range)
    }

    /// Copies a single node of `tree` (without its children) under `parent`,
    /// or as the root when `parent` is `None`. The copy is recorded in
    /// `copies` as copy → original.
    pub fn copy_node(
        &mut self,
        parent: Option<NodeId>,
        tree: &Tree,
        node: NodeId,
        copies: &mut FxHashMap<NodeId, NodeId>,
    ) -> NodeId {
        let n = tree.node(node);
        let copy = self.push(
            parent.map(|p| p.index),
            n.kind(),
            n.label().to_string(),
            n.range(),
        );
        copies.insert(copy, node);
        copy
    }

    /// Copies the whole subtree of `node` under `parent`, recording every
    /// copy → original pair in `copies`.
    pub fn copy_subtree(
        &mut self,
        parent: Option<NodeId>,
        tree: &Tree,
        node: NodeId,
        copies: &mut FxHashMap<NodeId, NodeId>,
    ) -> NodeId {
        self.copy_subtree_where(parent, tree, node, copies, |_| true)
    }

    /// Like [`TreeBuilder::copy_subtree`], but skips every descendant for
    /// which `keep` is false, together with its own subtree. The top node is
    /// always copied.
    pub fn copy_subtree_where<F>(
        &mut self,
        parent: Option<NodeId>,
        tree: &Tree,
        node: NodeId,
        copies: &mut FxHashMap<NodeId, NodeId>,
        keep: F,
    ) -> NodeId
    where
        F: Fn(NodeId) -> bool,
    {
        let top = self.copy_node(parent, tree, node, copies);
        let mut stack: Vec<(NodeId, NodeId)> = vec![(node, top)];
        while let Some((original, copy)) = stack.pop() {
            for child in tree.children(original).filter(|&c| keep(c)) {
                let child_copy = self.copy_node(Some(copy), tree, child, copies);
                stack.push((child, child_copy));
            }
        }
        top
    }

    /// Number of nodes pushed so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if nothing was pushed yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, parent: Option<u32>, kind: NodeKind, label: String, range: SourceRange) -> NodeId {
        let index = self.nodes.len() as u32;
        if let Some(p) = parent {
            self.nodes[p as usize].children.push(index);
        }
        self.nodes.push(PendingNode {
            kind,
            label,
            range,
            parent,
            children: Vec::new(),
        });
        NodeId::new(self.id, index)
    }

    /// Computes hashes and metrics and seals the tree.
    pub fn finish(self) -> Result<Tree> {
        if self.nodes.is_empty() {
            return Err(Error::Parse("tree has no root".to_string()));
        }
        if let Some(extra) = self.nodes.iter().skip(1).position(|n| n.parent.is_none()) {
            return Err(Error::Parse(format!(
                "node {} is a second root",
                extra + 1
            )));
        }

        let count = self.nodes.len();
        let mut hashes: Vec<Digest> = vec![[0; 16]; count];
        let mut shapes: Vec<Digest> = vec![[0; 16]; count];
        let mut sizes = vec![1usize; count];
        let mut heights = vec![1usize; count];

        // Children are always pushed after their parent, so walking the arena
        // backwards visits every child before its parent.
        for i in (0..count).rev() {
            let node = &self.nodes[i];
            let mut hasher = Md5::new();
            let mut shaper = Md5::new();
            hasher.update(node.kind.as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update(node.label.as_bytes());
            hasher.update([0u8]);
            shaper.update(node.kind.as_str().as_bytes());
            shaper.update([0u8]);
            for &c in &node.children {
                let c = c as usize;
                hasher.update(hashes[c]);
                shaper.update(shapes[c]);
                sizes[i] += sizes[c];
                heights[i] = heights[i].max(heights[c] + 1);
            }
            hashes[i] = hasher.finalize().into();
            shapes[i] = shaper.finalize().into();
        }

        let mut depths = vec![0usize; count];
        for i in 1..count {
            if let Some(p) = self.nodes[i].parent {
                depths[i] = depths[p as usize] + 1;
            }
        }

        let mut ranks = vec![0usize; count];
        let mut location_index = FxHashMap::default();
        let mut stack = vec![0u32];
        let mut rank = 0;
        while let Some(i) = stack.pop() {
            ranks[i as usize] = rank;
            rank += 1;
            let node = &self.nodes[i as usize];
            location_index.entry(node.range).or_insert(i);
            stack.extend(node.children.iter().rev());
        }

        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(i, n)| Node {
                kind: n.kind,
                label: n.label,
                range: n.range,
                parent: n.parent,
                children: n.children,
                hash: hashes[i],
                shape_hash: shapes[i],
                size: sizes[i],
                height: heights[i],
                depth: depths[i],
                pre_rank: ranks[i],
            })
            .collect();

        Ok(Tree {
            id: self.id,
            path: self.path,
            nodes,
            location_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_fails() {
        let err = TreeBuilder::new().finish().unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_second_root_fails() {
        let mut b = TreeBuilder::new();
        b.root(NodeKind::Block, "", SourceRange::default());
        b.root(NodeKind::Block, "", SourceRange::default());
        assert!(b.finish().is_err());
    }

    #[test]
    fn test_hash_depends_on_label() {
        let build = |label: &str| {
            let mut b = TreeBuilder::new();
            let r = b.root(NodeKind::ExpressionStatement, "", SourceRange::default());
            b.child(r, NodeKind::SimpleName, label, SourceRange::default());
            b.finish().unwrap()
        };
        let (x, y, z) = (build("x"), build("y"), build("x"));
        let (nx, ny, nz) = (x.node(x.root()), y.node(y.root()), z.node(z.root()));
        assert_ne!(nx.structural_hash(), ny.structural_hash());
        assert_eq!(nx.structural_hash(), nz.structural_hash());
        assert_eq!(nx.shape_hash(), ny.shape_hash());
    }

    #[test]
    fn test_copy_subtree_records_originals() {
        let mut b = TreeBuilder::new();
        let r = b.root(NodeKind::InfixExpression, "", SourceRange::new(0, 5));
        let left = b.child(r, NodeKind::SimpleName, "a", SourceRange::new(0, 1));
        b.child(r, NodeKind::InfixExpressionOperator, "+", SourceRange::new(2, 1));
        b.child(r, NodeKind::SimpleName, "b", SourceRange::new(4, 1));
        let tree = b.finish().unwrap();

        let mut copies = FxHashMap::default();
        let mut pb = TreeBuilder::new();
        let top = pb.copy_subtree(None, &tree, tree.root(), &mut copies);
        let copy = pb.finish().unwrap();

        assert_eq!(copies.len(), 4);
        assert_eq!(copies[&top], tree.root());
        assert!(copy.is_isomorphic(copy.root(), &tree, tree.root()));
        let copied_left = copy.child(copy.root(), 0).unwrap();
        assert_eq!(copies[&copied_left], left);
    }
}
