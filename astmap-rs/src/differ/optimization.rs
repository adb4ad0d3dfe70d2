//! Correspondences held back until a file pair has been fully processed.

use tracing::{debug, trace};

use super::model::LocationPair;
use crate::error::Result;
use crate::mapping::MappingStore;
use crate::matching::{Deadline, LeafMatcher, Matcher};
use crate::tree::{NodeId, NodeKind, Tree};

/// Deferred work of one file pair.
#[derive(Debug)]
pub(crate) struct OptimizationData<'t> {
    /// Expression-level pairs leaf-matched in the last step.
    last_step: Vec<LocationPair>,
    /// Variable references paired by rename refactorings.
    variable_pairs: MappingStore<'t>,
    /// Statement pairs that must win over anything found before them.
    final_pairs: MappingStore<'t>,
}

impl<'t> OptimizationData<'t> {
    pub(crate) fn new(src: &'t Tree, dst: &'t Tree) -> Self {
        OptimizationData {
            last_step: Vec::new(),
            variable_pairs: MappingStore::new(src, dst),
            final_pairs: MappingStore::new(src, dst),
        }
    }

    pub(crate) fn defer(&mut self, pair: LocationPair) {
        self.last_step.push(pair);
    }

    pub(crate) fn defer_all<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = LocationPair>,
    {
        self.last_step.extend(pairs);
    }

    pub(crate) fn add_variable_pair(&mut self, src: NodeId, dst: NodeId) {
        self.variable_pairs.add(src, dst);
    }

    pub(crate) fn add_final_pair(&mut self, src: NodeId, dst: NodeId) {
        self.final_pairs.add(src, dst);
    }

    pub(crate) fn deferred_len(&self) -> usize {
        self.last_step.len()
    }

    /// Runs the last step and installs the held-back pairs into `store`.
    ///
    /// String literal pairs are linked directly. Other pairs are
    /// leaf-matched into a separate store when the existing links of their
    /// roots disagree with them, and straight into `store` otherwise; the
    /// separate store then replaces the structurally different links.
    pub(crate) fn apply(self, store: &mut MappingStore<'t>, deadline: Deadline) -> Result<()> {
        let (src_tree, dst_tree) = (store.src_tree(), store.dst_tree());
        let leaf = LeafMatcher::new().with_deadline(deadline);
        let mut last_step = store.empty_like();

        for pair in &self.last_step {
            deadline.check()?;
            let literals = (
                src_tree.find_by_location_and_kind(&pair.src, NodeKind::StringLiteral),
                dst_tree.find_by_location_and_kind(&pair.dst, NodeKind::StringLiteral),
            );
            if let (Some(s), Some(d)) = literals {
                store.add(s, d);
                continue;
            }
            let (Some(s), Some(d)) = (
                src_tree.find_by_location(&pair.src),
                dst_tree.find_by_location(&pair.dst),
            ) else {
                debug!(src = %pair.src, dst = %pair.dst, "deferred pair not found, skipping");
                continue;
            };
            if needs_override(store, s, d) {
                leaf.match_trees(s, d, &mut last_step).into_result()?;
            } else {
                leaf.match_trees(s, d, store).into_result()?;
            }
        }
        trace!(pairs = last_step.len(), "last step matched");
        store.replace_with_optimized(&last_step);

        let mut variables = self.variable_pairs;
        for (s, d) in variables.pairs() {
            if store.contains(s, d) {
                variables.remove(s, d);
            }
        }
        store.replace_with_optimized(&variables);
        store.replace_with_optimized(&self.final_pairs);
        Ok(())
    }
}

/// A deferred pair overrides the store unless its roots are identical and
/// already linked only to identical counterparts.
fn needs_override(store: &MappingStore<'_>, src: NodeId, dst: NodeId) -> bool {
    let (src_tree, dst_tree) = (store.src_tree(), store.dst_tree());
    if !src_tree.is_isomorphic(src, dst_tree, dst) {
        return true;
    }
    if store.is_src_mapped(src) {
        return store
            .dsts(src)
            .any(|d| !src_tree.is_isomorphic(src, dst_tree, d));
    }
    match store.first_src(dst) {
        Some(s) => !src_tree.is_isomorphic(s, dst_tree, dst),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{LocationKey, SourceRange, TreeBuilder};

    // ReturnStatement [0, 20)
    //   InfixExpression [7, 12)
    //     SimpleName <a> [7, 1)
    //     INFIX_EXPRESSION_OPERATOR + [9, 1)
    //     StringLiteral <lit> [11, 8)
    fn statement(a: &str, lit: &str) -> Tree {
        let mut b = TreeBuilder::new();
        let ret = b.root(NodeKind::ReturnStatement, "", SourceRange::new(0, 20));
        let infix = b.child(ret, NodeKind::InfixExpression, "", SourceRange::new(7, 12));
        b.child(infix, NodeKind::SimpleName, a, SourceRange::new(7, 1));
        b.child(infix, NodeKind::InfixExpressionOperator, "+", SourceRange::new(9, 1));
        b.child(infix, NodeKind::StringLiteral, lit, SourceRange::new(11, 8));
        b.finish().unwrap()
    }

    fn key(pos: usize, length: usize) -> LocationKey {
        LocationKey::new("A.java", pos, length)
    }

    #[test]
    fn test_last_step_overrides_conflicting_links() {
        let (a, b) = (statement("x", "\"s\""), statement("y", "\"t\""));
        let mut store = MappingStore::new(&a, &b);
        let name_a = a.find_first_of_kind(a.root(), NodeKind::SimpleName).unwrap();
        let lit_b = b.find_first_of_kind(b.root(), NodeKind::StringLiteral).unwrap();
        store.add(name_a, lit_b);

        let mut data = OptimizationData::new(&a, &b);
        data.defer(LocationPair::new(key(7, 12), key(7, 12)));
        assert_eq!(data.deferred_len(), 1);
        data.apply(&mut store, Deadline::never()).unwrap();

        let name_b = b.find_first_of_kind(b.root(), NodeKind::SimpleName).unwrap();
        assert!(store.contains(name_a, name_b));
        assert!(!store.contains(name_a, lit_b));
    }

    #[test]
    fn test_string_literal_pairs_are_linked_directly() {
        let (a, b) = (statement("x", "\"s\""), statement("x", "\"t\""));
        let mut store = MappingStore::new(&a, &b);
        let mut data = OptimizationData::new(&a, &b);
        data.defer(LocationPair::new(key(11, 8), key(11, 8)));
        data.defer(LocationPair::new(key(40, 2), key(11, 8)));
        data.apply(&mut store, Deadline::never()).unwrap();

        let lit_a = a.find_first_of_kind(a.root(), NodeKind::StringLiteral).unwrap();
        let lit_b = b.find_first_of_kind(b.root(), NodeKind::StringLiteral).unwrap();
        assert_eq!(store.pairs(), vec![(lit_a, lit_b)]);
    }

    #[test]
    fn test_final_pairs_win() {
        let (a, b) = (statement("x", "\"s\""), statement("x", "\"s\""));
        let mut store = MappingStore::new(&a, &b);
        let infix_b = b.child(b.root(), 0).unwrap();
        store.add(a.root(), infix_b);

        let mut data = OptimizationData::new(&a, &b);
        data.add_final_pair(a.root(), b.root());
        data.add_variable_pair(a.root(), infix_b);
        data.apply(&mut store, Deadline::never()).unwrap();

        assert!(store.contains(a.root(), b.root()));
        assert!(!store.contains(a.root(), infix_b));
    }
}
