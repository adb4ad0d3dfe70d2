//! astmap - Refactoring-aware AST correspondence
//!
//! This library computes fine-grained correspondences between the nodes of
//! two versions of a parsed source file, so that an edit script (insert,
//! delete, update, move) can be rendered from them.
//!
//! # Overview
//!
//! The engine does not parse source text. It takes two ASTs, built with
//! [`TreeBuilder`] or read from a tree dump with [`xml::parse_file`], plus
//! the declaration- and statement-level correspondences found by a
//! refactoring-mining analysis ([`differ::ClassCorrespondence`]). It extends
//! that partial knowledge into a complete, consistent node mapping:
//!
//! - a greedy top-down search anchors identical subtrees, with heuristics
//!   that resolve repeated names, calls and string literals,
//! - a bottom-up pass pairs containers whose contents mostly correspond,
//! - composite statements and leaf fragments are matched on pruned
//!   projections so that nested statements keep their own correspondences,
//! - a final rescue pass pairs statements every earlier pass left out.
//!
//! # Example Use Case
//!
//! A method is renamed and one of its local variables is renamed with it.
//! A line-based diff reports both lines as rewritten; astmap maps every
//! unchanged token to its counterpart and reports two label updates.

pub mod constants;
pub mod differ;
pub mod error;
pub mod mapping;
pub mod matching;
pub mod measure;
pub mod tree;
pub mod xml;

// Re-export commonly used types
pub use constants::*;
pub use error::{Error, Result};
pub use mapping::{MappingStore, MonoMappings};
pub use matching::{
    BottomUpMatcher, CompositeMatcher, Deadline, Fragment, GenericMatcher, GreedySubtreeMatcher,
    LeafMatcher, MatchOutcome, Matcher, MissingSubtreeMatcher,
};
pub use tree::{KindCategory, LocationKey, NodeId, NodeKind, SourceRange, Tree, TreeBuilder};
pub use xml::{parse_file, parse_str, TreeDumpParser};

// Re-export differ types
pub use differ::{AstDiff, ClassCorrespondence, FileDiffer, ProjectDiffer};
