//! Height-ordered priority queue used by the greedy passes.

use std::collections::BTreeMap;

use crate::tree::{NodeId, Tree};

/// Queue of subtrees grouped by height, highest first.
#[derive(Debug, Clone)]
pub struct HeightQueue {
    levels: BTreeMap<usize, Vec<NodeId>>,
    min_priority: usize,
}

impl HeightQueue {
    /// Creates an empty queue ignoring subtrees lower than `min_priority`.
    pub fn new(min_priority: usize) -> Self {
        HeightQueue {
            levels: BTreeMap::new(),
            min_priority,
        }
    }

    /// Enqueues a subtree if it is high enough.
    pub fn push(&mut self, tree: &Tree, node: NodeId) {
        let height = tree.height(node);
        if height >= self.min_priority {
            self.levels.entry(height).or_default().push(node);
        }
    }

    /// Enqueues the children of `node`.
    pub fn open(&mut self, tree: &Tree, node: NodeId) {
        for child in tree.children(node) {
            self.push(tree, child);
        }
    }

    /// Highest priority in the queue.
    pub fn peek_max(&self) -> Option<usize> {
        self.levels.keys().next_back().copied()
    }

    /// Removes and returns every subtree of the highest priority.
    pub fn pop(&mut self) -> Vec<NodeId> {
        self.levels
            .pop_last()
            .map(|(_, nodes)| nodes)
            .unwrap_or_default()
    }

    /// Pops the highest level and opens each of its subtrees.
    pub fn pop_open(&mut self, tree: &Tree) {
        for node in self.pop() {
            self.open(tree, node);
        }
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Brings both queues to the same highest priority by opening the
    /// higher one. Returns false, leaving both empty, when either runs dry.
    pub fn synchronize(
        src: &mut HeightQueue,
        src_tree: &Tree,
        dst: &mut HeightQueue,
        dst_tree: &Tree,
    ) -> bool {
        while let (Some(a), Some(b)) = (src.peek_max(), dst.peek_max()) {
            if a == b {
                return true;
            }
            if a > b {
                src.pop_open(src_tree);
            } else {
                dst.pop_open(dst_tree);
            }
        }
        src.clear();
        dst.clear();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeKind, SourceRange, TreeBuilder};

    // Block
    //   ExpressionStatement
    //     SimpleName a
    //   EmptyStatement
    fn sample() -> Tree {
        let r = SourceRange::default();
        let mut b = TreeBuilder::new();
        let block = b.root(NodeKind::Block, "", r);
        let stmt = b.child(block, NodeKind::ExpressionStatement, "", r);
        b.child(stmt, NodeKind::SimpleName, "a", r);
        b.child(block, NodeKind::EmptyStatement, "", r);
        b.finish().unwrap()
    }

    #[test]
    fn test_pop_by_height() {
        let tree = sample();
        let mut q = HeightQueue::new(1);
        q.push(&tree, tree.root());
        assert_eq!(q.peek_max(), Some(3));
        q.pop_open(&tree);
        assert_eq!(q.peek_max(), Some(2));
        assert_eq!(q.pop().len(), 1);
        assert_eq!(q.peek_max(), Some(1));
    }

    #[test]
    fn test_min_priority_filters_leaves() {
        let tree = sample();
        let mut q = HeightQueue::new(2);
        q.open(&tree, tree.root());
        assert_eq!(q.pop().len(), 1);
        assert!(q.is_empty());
    }

    #[test]
    fn test_synchronize() {
        let (a, b) = (sample(), sample());
        let mut qa = HeightQueue::new(1);
        let mut qb = HeightQueue::new(1);
        qa.push(&a, a.root());
        let stmt = b.child(b.root(), 0).unwrap();
        qb.push(&b, stmt);
        assert!(HeightQueue::synchronize(&mut qa, &a, &mut qb, &b));
        assert_eq!(qa.peek_max(), Some(2));
        assert_eq!(qb.peek_max(), Some(2));

        let mut empty = HeightQueue::new(1);
        assert!(!HeightQueue::synchronize(&mut qa, &a, &mut empty, &b));
        assert!(qa.is_empty());
    }
}
