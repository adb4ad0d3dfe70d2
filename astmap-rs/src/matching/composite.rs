//! Matching of composite statements.
//!
//! A composite statement (if, loop, try, catch, switch, synchronized,
//! labeled) is matched on its own expressions only: the condition, the loop
//! header, the resources or the catch parameter. Nested statements carry
//! correspondences of their own and are left out of the projection.

use super::fragment::{Fragment, LeafMatcher, PrunePolicy};
use super::{Deadline, MatchOutcome, Matcher};
use crate::error::Error;
use crate::mapping::MappingStore;
use crate::tree::{NodeId, NodeKind, Tree};

/// Position of the else branch among the children of an if statement.
const ELSE_BRANCH: usize = 2;

/// Matcher for a pair of corresponding composite statements.
#[derive(Debug, Clone)]
pub struct CompositeMatcher {
    leaf: LeafMatcher,
}

impl Default for CompositeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeMatcher {
    pub fn new() -> Self {
        CompositeMatcher {
            leaf: LeafMatcher::new().with_policy(PrunePolicy::Composite),
        }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.leaf = self.leaf.with_deadline(deadline);
        self
    }

    /// Matches two composite fragments. Explicit parts, when given, stand
    /// for the statement's expressions.
    pub fn match_fragments(
        &self,
        src: &Fragment,
        dst: &Fragment,
        store: &mut MappingStore<'_>,
    ) -> MatchOutcome {
        let (src_tree, dst_tree) = (store.src_tree(), store.dst_tree());
        if !src_tree.contains(src.root) || !dst_tree.contains(dst.root) {
            return MatchOutcome::from_result(Err(Error::MalformedFragment(
                "composite root belongs to another tree".to_string(),
            )));
        }

        // Statements of different kinds share expressions but are never
        // each other's counterpart.
        let (src_kind, dst_kind) = (src_tree.kind(src.root), dst_tree.kind(dst.root));
        let same_kind = src_kind == dst_kind;
        let linked_before = store.contains(src.root, dst.root);
        if same_kind {
            store.add(src.root, dst.root);
        }
        if src_kind == NodeKind::Block || dst_kind == NodeKind::Block {
            return MatchOutcome::Matched {
                pairs: usize::from(same_kind),
            };
        }

        match_bodies(src_tree, src.root, dst_tree, dst.root, store);
        let outcome = self.leaf.match_fragments(src, dst, store);
        if same_kind || linked_before || !store.remove(src.root, dst.root) {
            return outcome;
        }
        match outcome {
            MatchOutcome::Matched { pairs } => MatchOutcome::Matched {
                pairs: pairs.saturating_sub(1),
            },
            other => other,
        }
    }
}

/// Pairs the blocks a composite owns directly and that no other
/// correspondence will cover: the body of a try or catch, and the else
/// block of an if.
fn match_bodies(
    src_tree: &Tree,
    src: NodeId,
    dst_tree: &Tree,
    dst: NodeId,
    store: &mut MappingStore<'_>,
) {
    match (src_tree.kind(src), dst_tree.kind(dst)) {
        (NodeKind::TryStatement, NodeKind::TryStatement)
        | (NodeKind::CatchClause, NodeKind::CatchClause) => {
            if let (Some(a), Some(b)) = (
                src_tree.find_child_of_kind(src, NodeKind::Block),
                dst_tree.find_child_of_kind(dst, NodeKind::Block),
            ) {
                store.add(a, b);
            }
        }
        (NodeKind::IfStatement, NodeKind::IfStatement) => {
            if let (Some(a), Some(b)) = (
                src_tree.child(src, ELSE_BRANCH),
                dst_tree.child(dst, ELSE_BRANCH),
            ) {
                if src_tree.kind(a) == NodeKind::Block && dst_tree.kind(b) == NodeKind::Block {
                    store.add(a, b);
                }
            }
        }
        _ => {}
    }
}

impl Matcher for CompositeMatcher {
    fn match_trees(&self, src: NodeId, dst: NodeId, store: &mut MappingStore<'_>) -> MatchOutcome {
        self.match_fragments(&Fragment::whole(src), &Fragment::whole(dst), store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{SourceRange, TreeBuilder};

    // IfStatement
    //   InfixExpression
    //     SimpleName <var>
    //     INFIX_EXPRESSION_OPERATOR >
    //     NumberLiteral 0
    //   Block
    //     ReturnStatement
    //       SimpleName <var>
    //   <else>
    fn branch(var: &str, else_block: bool) -> Tree {
        let r = SourceRange::default();
        let mut b = TreeBuilder::new();
        let stmt = b.root(NodeKind::IfStatement, "", r);
        let cond = b.child(stmt, NodeKind::InfixExpression, "", r);
        b.child(cond, NodeKind::SimpleName, var, r);
        b.child(cond, NodeKind::InfixExpressionOperator, ">", r);
        b.child(cond, NodeKind::NumberLiteral, "0", r);
        let then = b.child(stmt, NodeKind::Block, "", r);
        let ret = b.child(then, NodeKind::ReturnStatement, "", r);
        b.child(ret, NodeKind::SimpleName, var, r);
        if else_block {
            let other = b.child(stmt, NodeKind::Block, "", r);
            b.child(other, NodeKind::BreakStatement, "", r);
        } else {
            b.child(stmt, NodeKind::BreakStatement, "", r);
        }
        b.finish().unwrap()
    }

    #[test]
    fn test_condition_matched_body_left_alone() {
        let (a, b) = (branch("x", false), branch("y", false));
        let mut store = MappingStore::new(&a, &b);
        let outcome = CompositeMatcher::new().match_trees(a.root(), b.root(), &mut store);
        assert!(outcome.is_matched());
        let cond_a = a.child(a.root(), 0).unwrap();
        let cond_b = b.child(b.root(), 0).unwrap();
        assert!(store.contains(a.root(), b.root()));
        assert!(store.contains(cond_a, cond_b));
        assert!(store.contains(a.child(cond_a, 0).unwrap(), b.child(cond_b, 0).unwrap()));
        let then_a = a.child(a.root(), 1).unwrap();
        assert!(!store.is_src_mapped(then_a));
        assert!(!store.is_src_mapped(a.child(then_a, 0).unwrap()));
    }

    #[test]
    fn test_else_blocks_paired() {
        let (a, b) = (branch("x", true), branch("x", true));
        let mut store = MappingStore::new(&a, &b);
        CompositeMatcher::new().match_trees(a.root(), b.root(), &mut store);
        let else_a = a.child(a.root(), ELSE_BRANCH).unwrap();
        let else_b = b.child(b.root(), ELSE_BRANCH).unwrap();
        assert!(store.contains(else_a, else_b));
        assert!(!store.is_src_mapped(a.child(else_a, 0).unwrap()));
    }

    #[test]
    fn test_try_body_paired() {
        let r = SourceRange::default();
        let build = || {
            let mut t = TreeBuilder::new();
            let stmt = t.root(NodeKind::TryStatement, "", r);
            let body = t.child(stmt, NodeKind::Block, "", r);
            t.child(body, NodeKind::EmptyStatement, "", r);
            let catch = t.child(stmt, NodeKind::CatchClause, "", r);
            let param = t.child(catch, NodeKind::SingleVariableDeclaration, "", r);
            t.child(param, NodeKind::SimpleName, "e", r);
            t.child(catch, NodeKind::Block, "", r);
            t.finish().unwrap()
        };
        let (a, b) = (build(), build());
        let mut store = MappingStore::new(&a, &b);
        let outcome = CompositeMatcher::new().match_trees(a.root(), b.root(), &mut store);
        assert!(outcome.is_matched());
        let body_a = a.child(a.root(), 0).unwrap();
        let body_b = b.child(b.root(), 0).unwrap();
        assert!(store.contains(body_a, body_b));
        assert!(!store.is_src_mapped(a.child(body_a, 0).unwrap()));
        assert!(!store.is_src_mapped(a.child(a.root(), 1).unwrap()));
    }

    #[test]
    fn test_blocks_map_only_themselves() {
        let (a, b) = (branch("x", true), branch("x", true));
        let then_a = a.child(a.root(), 1).unwrap();
        let then_b = b.child(b.root(), 1).unwrap();
        let mut store = MappingStore::new(&a, &b);
        let outcome = CompositeMatcher::new().match_trees(then_a, then_b, &mut store);
        assert_eq!(outcome, MatchOutcome::Matched { pairs: 1 });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_different_kinds_share_only_expressions() {
        // WhileStatement
        //   InfixExpression (x > 0)
        //   Block
        //     ReturnStatement
        //       SimpleName x
        let r = SourceRange::default();
        let mut t = TreeBuilder::new();
        let stmt = t.root(NodeKind::WhileStatement, "", r);
        let cond = t.child(stmt, NodeKind::InfixExpression, "", r);
        t.child(cond, NodeKind::SimpleName, "x", r);
        t.child(cond, NodeKind::InfixExpressionOperator, ">", r);
        t.child(cond, NodeKind::NumberLiteral, "0", r);
        let body = t.child(stmt, NodeKind::Block, "", r);
        let ret = t.child(body, NodeKind::ReturnStatement, "", r);
        t.child(ret, NodeKind::SimpleName, "x", r);
        let b = t.finish().unwrap();
        let a = branch("x", false);

        let mut store = MappingStore::new(&a, &b);
        let outcome = CompositeMatcher::new().match_trees(a.root(), b.root(), &mut store);
        assert!(outcome.is_matched());
        let cond_a = a.child(a.root(), 0).unwrap();
        assert!(store.contains(cond_a, cond));
        assert!(!store.is_src_mapped(a.root()));
        assert!(!store.is_dst_mapped(b.root()));

        // A block never stands in for another statement kind.
        let then_a = a.child(a.root(), 1).unwrap();
        let outcome = CompositeMatcher::new().match_trees(then_a, b.root(), &mut store);
        assert_eq!(outcome, MatchOutcome::Matched { pairs: 0 });
        assert!(!store.is_src_mapped(then_a));
    }
}
