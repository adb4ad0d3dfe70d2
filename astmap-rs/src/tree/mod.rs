//! Arena-backed AST representation.
//!
//! A [`Tree`] owns all of its nodes in one vector. Children are owned index
//! lists, the parent link is a plain index used for upward navigation only.
//! Nodes are addressed from the outside through [`NodeId`], which also names
//! the tree the node belongs to so that correspondence stores can enforce
//! their scope.

mod builder;
mod kind;
mod location;
mod traversal;

pub use builder::TreeBuilder;
pub use kind::{KindCategory, NodeKind};
pub use location::{LocationKey, SourceRange};
pub use traversal::{Ancestors, PostOrder, PreOrder};

use rustc_hash::FxHashMap;
use uuid::Uuid;

/// An md5 digest of a subtree.
pub type Digest = [u8; 16];

/// Identity of one tree. Fresh for every built or cloned tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(Uuid);

impl TreeId {
    pub(crate) fn fresh() -> Self {
        TreeId(Uuid::new_v4())
    }
}

/// Address of a node: its tree plus its arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tree: TreeId,
    index: u32,
}

impl NodeId {
    pub(crate) fn new(tree: TreeId, index: u32) -> Self {
        NodeId { tree, index }
    }

    /// The tree this node belongs to.
    pub fn tree(&self) -> TreeId {
        self.tree
    }

    /// Arena index of the node inside its tree.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// One syntactic construct.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    label: String,
    range: SourceRange,
    parent: Option<u32>,
    children: Vec<u32>,
    hash: Digest,
    shape_hash: Digest,
    size: usize,
    height: usize,
    depth: usize,
    pre_rank: usize,
}

impl Node {
    /// Grammar kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Literal or identifier text, empty for most inner nodes.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Source range.
    pub fn range(&self) -> SourceRange {
        self.range
    }

    /// Hash of kind, label and children hashes.
    pub fn structural_hash(&self) -> &Digest {
        &self.hash
    }

    /// Hash of kind and children shape hashes, independent of labels.
    pub fn shape_hash(&self) -> &Digest {
        &self.shape_hash
    }

    /// Number of nodes in the subtree, this node included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Height of the subtree; a leaf has height 1.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance from the root; the root has depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// True if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// An immutable AST for one version of one file.
#[derive(Debug)]
pub struct Tree {
    id: TreeId,
    path: Option<String>,
    nodes: Vec<Node>,
    location_index: FxHashMap<SourceRange, u32>,
}

impl Tree {
    /// The identity of this tree.
    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Path of the file this tree was parsed from, if known.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.id_of(0)
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a built tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if `id` addresses a node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id.tree == self.id && id.index() < self.nodes.len()
    }

    /// Returns the node behind `id`.
    ///
    /// `id` must belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        debug_assert_eq!(id.tree, self.id, "node id from another tree");
        &self.nodes[id.index()]
    }

    pub(crate) fn id_of(&self, index: u32) -> NodeId {
        NodeId::new(self.id, index)
    }

    /// Grammar kind of a node.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Label of a node.
    pub fn label(&self, id: NodeId) -> &str {
        &self.node(id).label
    }

    /// Source range of a node.
    pub fn range(&self, id: NodeId) -> SourceRange {
        self.node(id).range
    }

    /// Subtree size of a node.
    pub fn size(&self, id: NodeId) -> usize {
        self.node(id).size
    }

    /// Subtree height of a node.
    pub fn height(&self, id: NodeId) -> usize {
        self.node(id).height
    }

    /// True if the node has no children.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).is_leaf()
    }

    /// Rank of a node in a pre-order walk of the whole tree.
    pub fn pre_order_rank(&self, id: NodeId) -> usize {
        self.node(id).pre_rank
    }

    /// Parent of a node, `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent.map(|p| self.id_of(p))
    }

    /// Children of a node in source order.
    pub fn children(
        &self,
        id: NodeId,
    ) -> impl DoubleEndedIterator<Item = NodeId> + ExactSizeIterator + '_ {
        self.node(id).children.iter().map(move |&c| self.id_of(c))
    }

    /// The `i`-th child of a node.
    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.node(id).children.get(i).map(|&c| self.id_of(c))
    }

    /// Number of children of a node.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    /// Position of a node among its siblings, `None` for the root.
    pub fn child_position(&self, id: NodeId) -> Option<usize> {
        let parent = self.node(id).parent?;
        self.nodes[parent as usize]
            .children
            .iter()
            .position(|&c| c == id.index)
    }

    /// The sibling immediately before a node.
    pub fn preceding_sibling(&self, id: NodeId) -> Option<NodeId> {
        let pos = self.child_position(id)?;
        if pos == 0 {
            return None;
        }
        let parent = self.parent(id)?;
        self.child(parent, pos - 1)
    }

    /// Pre-order traversal of the subtree rooted at `id`.
    pub fn pre_order(&self, id: NodeId) -> PreOrder<'_> {
        PreOrder::new(self, id)
    }

    /// Post-order traversal of the subtree rooted at `id`.
    pub fn post_order(&self, id: NodeId) -> PostOrder<'_> {
        PostOrder::new(self, id)
    }

    /// All nodes below `id`, in pre-order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.pre_order(id).skip(1)
    }

    /// Proper ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors::new(self, self.parent(id))
    }

    /// Returns true if `node` lies in the subtree rooted at `root`
    /// (`root` itself included).
    pub fn is_within(&self, node: NodeId, root: NodeId) -> bool {
        if node.tree != self.id || root.tree != self.id {
            return false;
        }
        let n = self.node(node).pre_rank;
        let r = self.node(root);
        n >= r.pre_rank && n < r.pre_rank + r.size
    }

    /// Exact isomorphism: same kind, label and shape at every depth.
    pub fn is_isomorphic(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        let (na, nb) = (self.node(a), other.node(b));
        if na.hash != nb.hash || na.size != nb.size {
            return false;
        }
        self.pre_order(a)
            .zip(other.pre_order(b))
            .all(|(x, y)| {
                let (nx, ny) = (self.node(x), other.node(y));
                nx.kind == ny.kind && nx.label == ny.label && nx.children.len() == ny.children.len()
            })
    }

    /// Shape isomorphism: same kind and arity at every depth, labels ignored.
    pub fn is_iso_structural(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        let (na, nb) = (self.node(a), other.node(b));
        if na.shape_hash != nb.shape_hash || na.size != nb.size {
            return false;
        }
        self.pre_order(a)
            .zip(other.pre_order(b))
            .all(|(x, y)| {
                let (nx, ny) = (self.node(x), other.node(y));
                nx.kind == ny.kind && nx.children.len() == ny.children.len()
            })
    }

    /// Looks a node up by its original location.
    ///
    /// Returns the outermost node whose range equals the key's range, or
    /// `None` when the key names another file or no node has that range.
    pub fn find_by_location(&self, key: &LocationKey) -> Option<NodeId> {
        if let Some(path) = &self.path {
            if path != &key.file {
                return None;
            }
        }
        self.find_by_range(key.range)
    }

    /// Outermost node covering exactly `range`.
    pub fn find_by_range(&self, range: SourceRange) -> Option<NodeId> {
        self.location_index.get(&range).map(|&i| self.id_of(i))
    }

    /// Outermost node of the given kind covering exactly the key's range.
    pub fn find_by_location_and_kind(&self, key: &LocationKey, kind: NodeKind) -> Option<NodeId> {
        let start = self.find_by_location(key)?;
        self.pre_order(start)
            .find(|&n| self.range(n) == key.range && self.kind(n) == kind)
    }

    /// First child of the given kind.
    pub fn find_child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id).find(|&c| self.kind(c) == kind)
    }

    /// First child of the given kind carrying the given label.
    pub fn find_child_with_label(&self, id: NodeId, kind: NodeKind, label: &str) -> Option<NodeId> {
        self.children(id)
            .find(|&c| self.kind(c) == kind && self.label(c) == label)
    }

    /// First node of the given kind in the subtree of `id`, in pre-order.
    pub fn find_first_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.pre_order(id).find(|&n| self.kind(n) == kind)
    }

    /// Nearest node of the given kind on the path from `id` to the root,
    /// `id` itself included.
    pub fn enclosing_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.kind(n) == kind)
    }

    /// Deep copy with a fresh identity.
    pub fn deep_clone(&self) -> Tree {
        Tree {
            id: TreeId::fresh(),
            path: self.path.clone(),
            nodes: self.nodes.clone(),
            location_index: self.location_index.clone(),
        }
    }
}
