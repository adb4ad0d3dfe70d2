//! Candidate filters for the greedy pass.
//!
//! A filter sees one candidate pair together with the [`PairContext`] of the
//! running pass and decides whether the pair may be committed. The generic
//! passes know nothing about the grammar; these filters carry the rules that
//! do.

use super::greedy::PairContext;
use crate::constants::RESCUE_KINDS;
use crate::tree::{NodeId, NodeKind, Tree};

/// Identifiers inside a conditional expression must sit in the same branch
/// (condition, then or else) on both sides.
pub fn same_conditional_branch(ctx: &PairContext<'_, '_>, src: NodeId, dst: NodeId) -> bool {
    if ctx.src_tree.kind(src) != NodeKind::SimpleName {
        return true;
    }
    conditional_branch(ctx.src_tree, src) == conditional_branch(ctx.dst_tree, dst)
}

/// A node hanging directly off a call must be paired with a node that does
/// too. The matching roots are exempt.
pub fn symmetric_call_parent(ctx: &PairContext<'_, '_>, src: NodeId, dst: NodeId) -> bool {
    if src == ctx.src_root || dst == ctx.dst_root {
        return true;
    }
    is_call_part(ctx.src_tree, src) == is_call_part(ctx.dst_tree, dst)
}

/// Ambiguous string literals are only paired when their context anchors
/// are already paired with each other.
pub fn literal_context(ctx: &PairContext<'_, '_>, src: NodeId, dst: NodeId) -> bool {
    if ctx.src_tree.kind(src) != NodeKind::StringLiteral {
        return true;
    }
    match (
        context_anchor(ctx.src_tree, src),
        context_anchor(ctx.dst_tree, dst),
    ) {
        (Some(a), Some(b)) => ctx.is_linked(a, b),
        _ => false,
    }
}

/// Both subtrees must be entirely unknown to the seed store.
pub fn unmapped_in_seed(ctx: &PairContext<'_, '_>, src: NodeId, dst: NodeId) -> bool {
    ctx.seed.are_subtrees_unmapped(src, dst)
}

/// The pair's kind must be one worth rescuing on its own: a statement, a
/// documentation comment or a call.
pub fn rescuable_kind(ctx: &PairContext<'_, '_>, src: NodeId, _dst: NodeId) -> bool {
    ctx.src_tree.kind(src).is_any(RESCUE_KINDS)
}

/// Index of the conditional-expression branch holding `node`, if the
/// nearest enclosing conditional lies within the same statement.
fn conditional_branch(tree: &Tree, node: NodeId) -> Option<usize> {
    let mut current = node;
    for ancestor in tree.ancestors(node) {
        let kind = tree.kind(ancestor);
        if kind == NodeKind::ConditionalExpression {
            return tree.child_position(current);
        }
        if kind.is_statement() {
            return None;
        }
        current = ancestor;
    }
    None
}

fn is_call_part(tree: &Tree, node: NodeId) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    match tree.kind(parent) {
        NodeKind::MethodInvocation | NodeKind::SuperMethodInvocation => true,
        NodeKind::MethodInvocationReceiver | NodeKind::MethodInvocationArguments => true,
        _ => false,
    }
}

/// The node a literal is recognised by: its preceding sibling, or the
/// preceding sibling of the closest ancestor that has one, without leaving
/// the enclosing statement.
fn context_anchor(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        if let Some(previous) = tree.preceding_sibling(current) {
            return Some(previous);
        }
        if tree.kind(current).is_statement() {
            return None;
        }
        current = tree.parent(current)?;
    }
}
