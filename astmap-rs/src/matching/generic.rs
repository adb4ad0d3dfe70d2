//! The standard two-phase matcher.

use super::bottom_up::BottomUpMatcher;
use super::greedy::GreedySubtreeMatcher;
use super::{check_roots, Deadline, MatchOutcome, Matcher};
use crate::error::Result;
use crate::mapping::MappingStore;
use crate::tree::NodeId;

/// Greedy anchors followed by bottom-up container matching.
///
/// The passes run on a private copy of the caller's store, so a cancelled or
/// failed run leaves it untouched. Only the pairs the copy gained are
/// returned.
#[derive(Debug, Clone, Default)]
pub struct GenericMatcher {
    greedy: GreedySubtreeMatcher,
    bottom_up: BottomUpMatcher,
}

impl GenericMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the anchor pass.
    pub fn with_greedy(mut self, greedy: GreedySubtreeMatcher) -> Self {
        self.greedy = greedy;
        self
    }

    /// Replaces the container pass.
    pub fn with_bottom_up(mut self, bottom_up: BottomUpMatcher) -> Self {
        self.bottom_up = bottom_up;
        self
    }

    /// Sets the deadline of the anchor pass.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.greedy = self.greedy.with_deadline(deadline);
        self
    }

    /// Computes the pairs between `src` and `dst` without touching `seed`.
    pub fn compute<'t>(
        &self,
        src: NodeId,
        dst: NodeId,
        seed: &MappingStore<'t>,
    ) -> Result<MappingStore<'t>> {
        check_roots(seed, src, dst)?;
        let local = self.greedy.anchors(src, dst, seed)?;

        // Containers are judged against everything known so far.
        let mut working = seed.clone();
        working.merge(&local);
        self.bottom_up.propagate(src, dst, &mut working);

        let mut found = local;
        for (s, d) in working.pairs() {
            if !seed.contains(s, d) {
                found.add(s, d);
            }
        }
        Ok(found)
    }
}

impl Matcher for GenericMatcher {
    fn match_trees(&self, src: NodeId, dst: NodeId, store: &mut MappingStore<'_>) -> MatchOutcome {
        MatchOutcome::from_result(self.compute(src, dst, store).map(|local| {
            store.merge(&local);
            local.len()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeKind, SourceRange, Tree, TreeBuilder};

    // IfStatement
    //   InfixExpression
    //     SimpleName <a>
    //     INFIX_EXPRESSION_OPERATOR >
    //     NumberLiteral 0
    //   ReturnStatement
    //     SimpleName <a>
    fn guard(a: &str) -> Tree {
        let r = SourceRange::default();
        let mut b = TreeBuilder::new();
        let stmt = b.root(NodeKind::IfStatement, "", r);
        let cond = b.child(stmt, NodeKind::InfixExpression, "", r);
        b.child(cond, NodeKind::SimpleName, a, r);
        b.child(cond, NodeKind::InfixExpressionOperator, ">", r);
        b.child(cond, NodeKind::NumberLiteral, "0", r);
        let ret = b.child(stmt, NodeKind::ReturnStatement, "", r);
        b.child(ret, NodeKind::SimpleName, a, r);
        b.finish().unwrap()
    }

    #[test]
    fn test_rename_maps_every_node() {
        let (a, b) = (guard("count"), guard("total"));
        let mut store = MappingStore::new(&a, &b);
        let outcome = GenericMatcher::new().match_trees(a.root(), b.root(), &mut store);
        assert_eq!(outcome, MatchOutcome::Matched { pairs: a.len() });
        for (s, d) in a.pre_order(a.root()).zip(b.pre_order(b.root())) {
            assert!(store.contains(s, d), "{} unmapped", a.kind(s));
        }
    }

    #[test]
    fn test_foreign_root_is_unmatched() {
        let (a, b) = (guard("x"), guard("x"));
        let other = guard("x");
        let mut store = MappingStore::new(&a, &b);
        let outcome = GenericMatcher::new().match_trees(other.root(), b.root(), &mut store);
        assert!(matches!(outcome, MatchOutcome::Unmatched { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_seeded_container_keeps_its_counterpart() {
        let (a, b) = (guard("count"), guard("total"));
        let cond_a = a.child(a.root(), 0).unwrap();
        let cond_b = b.child(b.root(), 0).unwrap();
        let ret_b = b.child(b.root(), 1).unwrap();
        let mut store = MappingStore::new(&a, &b);
        // An earlier pass sent the condition to the return statement.
        store.add(cond_a, ret_b);

        let found = GenericMatcher::new().compute(a.root(), b.root(), &store).unwrap();
        assert!(!found.contains(cond_a, cond_b));
        assert!(!found.contains(cond_a, ret_b));
        assert!(found.contains(a.root(), b.root()));

        GenericMatcher::new().match_trees(a.root(), b.root(), &mut store);
        assert_eq!(store.dsts(cond_a).collect::<Vec<_>>(), vec![ret_b]);
    }
}
