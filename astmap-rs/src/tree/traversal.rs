//! Tree traversal iterators.

use super::{NodeId, Tree};

/// Pre-order iterator over a subtree.
pub struct PreOrder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> PreOrder<'a> {
    /// Creates a pre-order iterator starting at `root`.
    pub fn new(tree: &'a Tree, root: NodeId) -> Self {
        PreOrder {
            tree,
            stack: vec![root],
        }
    }
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(self.tree.children(node).rev());
        Some(node)
    }
}

/// Post-order iterator over a subtree.
pub struct PostOrder<'a> {
    tree: &'a Tree,
    /// Stack of (node, next_child_index) pairs.
    stack: Vec<(NodeId, usize)>,
}

impl<'a> PostOrder<'a> {
    /// Creates a post-order iterator ending at `root`.
    pub fn new(tree: &'a Tree, root: NodeId) -> Self {
        PostOrder {
            tree,
            stack: vec![(root, 0)],
        }
    }
}

impl Iterator for PostOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, child_idx)) = self.stack.pop() {
            match self.tree.child(node, child_idx) {
                Some(child) => {
                    self.stack.push((node, child_idx + 1));
                    self.stack.push((child, 0));
                }
                None => return Some(node),
            }
        }
        None
    }
}

/// Iterator over the ancestors of a node, nearest first.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(tree: &'a Tree, start: Option<NodeId>) -> Self {
        Ancestors { tree, next: start }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = self.tree.parent(node);
        Some(node)
    }
}
