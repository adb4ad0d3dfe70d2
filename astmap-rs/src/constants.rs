//! Constants used throughout astmap.

use crate::tree::KindCategory;

/// Lowest subtree height considered by the greedy anchor search.
/// A height of 1 means leaves take part.
pub const MIN_PRIORITY: usize = 1;

/// Dice similarity a bottom-up candidate must exceed to be accepted.
pub const SIMILARITY_THRESHOLD: f64 = 0.5;

/// Label of the `extends` inheritance keyword node.
pub const EXTENDS_KEYWORD: &str = "extends";

/// Label of the `implements` inheritance keyword node.
pub const IMPLEMENTS_KEYWORD: &str = "implements";

/// Label of the `permits` keyword node.
pub const PERMITS_KEYWORD: &str = "permits";

/// Root kinds the missing-subtree pass may rescue.
pub const RESCUE_KINDS: KindCategory = KindCategory::STATEMENT
    .union(KindCategory::DOC_COMMENT)
    .union(KindCategory::CALL);
