//! Orchestration of the matchers over declaration-level correspondences.
//!
//! A [`FileDiffer`] owns the correspondence store of one file pair. It walks
//! the correspondences reported by the refactoring-mining analysis from the
//! coarsest to the finest (package and imports, the type declaration, its
//! fields, its methods and their bodies, then the refactorings) and picks
//! the matcher suited to each granularity. Expression-level work is held
//! back and run once everything else is in place, followed by the
//! missing-subtree rescue pass.
//!
//! A [`ProjectDiffer`] routes class correspondences to file differs so that
//! several classes of the same file pair accumulate into one store.

mod model;
mod optimization;

pub use model::{
    ClassCorrespondence, DeclarationCorrespondence, DeclarationKind, FragmentMapping,
    FragmentShape, LocationPair, MethodCorrespondence, Refactoring,
};

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info};

use self::optimization::OptimizationData;
use crate::constants::{EXTENDS_KEYWORD, IMPLEMENTS_KEYWORD, PERMITS_KEYWORD};
use crate::error::{Error, Result};
use crate::mapping::{MappingStore, MonoMappings};
use crate::matching::{
    CompositeMatcher, Deadline, Fragment, GenericMatcher, LeafMatcher, Matcher,
    MissingSubtreeMatcher,
};
use crate::tree::{LocationKey, NodeId, NodeKind, Tree};

/// The finalized correspondence of one file pair.
#[derive(Debug)]
pub struct AstDiff<'t> {
    src_path: String,
    dst_path: String,
    mappings: MappingStore<'t>,
}

impl<'t> AstDiff<'t> {
    pub fn src_path(&self) -> &str {
        &self.src_path
    }

    pub fn dst_path(&self) -> &str {
        &self.dst_path
    }

    /// All pairs, including the multi-mapped ones.
    pub fn mappings(&self) -> &MappingStore<'t> {
        &self.mappings
    }

    pub fn into_mappings(self) -> MappingStore<'t> {
        self.mappings
    }

    /// The 1:1 projection handed to edit script generation.
    pub fn mono(&self) -> MonoMappings {
        self.mappings.mono()
    }
}

/// Accumulates the correspondences of one (source file, destination file)
/// pair.
#[derive(Debug)]
pub struct FileDiffer<'t> {
    src_path: String,
    dst_path: String,
    store: MappingStore<'t>,
    optimization: OptimizationData<'t>,
    deadline: Deadline,
    started: Instant,
    roots_mapped: bool,
}

impl<'t> FileDiffer<'t> {
    pub fn new(
        src_path: impl Into<String>,
        src: &'t Tree,
        dst_path: impl Into<String>,
        dst: &'t Tree,
    ) -> Self {
        FileDiffer {
            src_path: src_path.into(),
            dst_path: dst_path.into(),
            store: MappingStore::new(src, dst),
            optimization: OptimizationData::new(src, dst),
            deadline: Deadline::never(),
            started: Instant::now(),
            roots_mapped: false,
        }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// The store as built so far.
    pub fn store(&self) -> &MappingStore<'t> {
        &self.store
    }

    fn src(&self) -> &'t Tree {
        self.store.src_tree()
    }

    fn dst(&self) -> &'t Tree {
        self.store.dst_tree()
    }

    /// Processes one class correspondence into the file pair's store.
    ///
    /// Only cancellation is reported as an error; lookups that miss and
    /// fragments that cannot be matched are skipped.
    pub fn process(&mut self, class: &ClassCorrespondence) -> Result<()> {
        self.map_roots();
        for decl in &class.declarations {
            if matches!(decl.kind, DeclarationKind::Package | DeclarationKind::Import) {
                self.process_import(decl)?;
            }
        }
        for decl in &class.declarations {
            if decl.kind == DeclarationKind::TypeDeclaration {
                self.process_type_declaration(decl)?;
            }
        }
        for decl in &class.declarations {
            if matches!(decl.kind, DeclarationKind::Field | DeclarationKind::EnumConstant) {
                self.process_field(decl)?;
            }
        }
        for method in &class.methods {
            self.process_method(method)?;
        }
        for refactoring in &class.refactorings {
            self.process_refactoring(refactoring)?;
        }
        Ok(())
    }

    /// Runs the held-back work and the rescue pass, and returns the
    /// finalized store.
    pub fn finish(self) -> Result<AstDiff<'t>> {
        let FileDiffer {
            src_path,
            dst_path,
            mut store,
            optimization,
            deadline,
            started,
            ..
        } = self;
        let deferred = optimization.deferred_len();
        optimization.apply(&mut store, deadline)?;
        let rescued = MissingSubtreeMatcher::new()
            .with_deadline(deadline)
            .rescue(&mut store)?;
        info!(
            src = %src_path,
            dst = %dst_path,
            pairs = store.len(),
            deferred,
            rescued,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "file pair matched"
        );
        Ok(AstDiff {
            src_path,
            dst_path,
            mappings: store,
        })
    }

    fn map_roots(&mut self) {
        if self.roots_mapped {
            return;
        }
        self.roots_mapped = true;
        let (src, dst) = (self.src(), self.dst());
        self.store.add(src.root(), dst.root());
        if let (Some(a), Some(b)) = (
            src.find_child_of_kind(src.root(), NodeKind::PackageDeclaration),
            dst.find_child_of_kind(dst.root(), NodeKind::PackageDeclaration),
        ) {
            if src.is_iso_structural(a, dst, b) {
                self.store.add_recursively(a, b);
            } else {
                self.store.add(a, b);
            }
        }
    }

    fn locate(&self, pair: &LocationPair) -> Option<(NodeId, NodeId)> {
        match (resolve(self.src(), &pair.src), resolve(self.dst(), &pair.dst)) {
            (Ok(s), Ok(d)) => Some((s, d)),
            (Err(e), _) | (_, Err(e)) => {
                debug!(error = %e, "lookup missed, skipping");
                None
            }
        }
    }

    fn leaf_matcher(&self) -> LeafMatcher {
        LeafMatcher::new().with_deadline(self.deadline)
    }

    fn match_leaf(&mut self, src: NodeId, dst: NodeId) -> Result<()> {
        let matcher = self.leaf_matcher();
        matcher.match_trees(src, dst, &mut self.store).into_result()?;
        Ok(())
    }

    fn match_generic(&mut self, src: NodeId, dst: NodeId) -> Result<()> {
        let matcher = GenericMatcher::new().with_deadline(self.deadline);
        matcher.match_trees(src, dst, &mut self.store).into_result()?;
        Ok(())
    }

    /// Identical shapes are paired node by node, anything else goes through
    /// the leaf matcher.
    fn match_part(&mut self, src: NodeId, dst: NodeId) -> Result<()> {
        if self.src().is_iso_structural(src, self.dst(), dst) {
            self.store.add_recursively(src, dst);
            Ok(())
        } else {
            self.match_leaf(src, dst)
        }
    }

    fn match_parts(&mut self, pairs: &[LocationPair]) -> Result<()> {
        for pair in pairs {
            if let Some((s, d)) = self.locate(pair) {
                self.match_part(s, d)?;
            }
        }
        Ok(())
    }

    fn match_unique_child(&mut self, src: NodeId, dst: NodeId, kind: NodeKind) {
        if let (Some(a), Some(b)) = (
            unique_child(self.src(), src, kind),
            unique_child(self.dst(), dst, kind),
        ) {
            self.store.add(a, b);
        }
    }

    fn match_modifiers(
        &mut self,
        src: NodeId,
        dst: NodeId,
        visibility: Option<&(String, String)>,
        shared: &[String],
    ) {
        let (src_tree, dst_tree) = (self.src(), self.dst());
        if let Some((v1, v2)) = visibility {
            if let (Some(a), Some(b)) = (
                src_tree.find_child_with_label(src, NodeKind::Modifier, v1),
                dst_tree.find_child_with_label(dst, NodeKind::Modifier, v2),
            ) {
                self.store.add_recursively(a, b);
            }
        }
        for label in shared {
            if let (Some(a), Some(b)) = (
                src_tree.find_child_with_label(src, NodeKind::Modifier, label),
                dst_tree.find_child_with_label(dst, NodeKind::Modifier, label),
            ) {
                self.store.add(a, b);
            }
        }
    }

    fn match_keyword(&mut self, src: NodeId, dst: NodeId, kind: NodeKind, label: &str) {
        if let (Some(a), Some(b)) = (
            self.src().find_child_with_label(src, kind, label),
            self.dst().find_child_with_label(dst, kind, label),
        ) {
            self.store.add(a, b);
        }
    }

    fn process_javadoc(&mut self, pair: &LocationPair) -> Result<()> {
        let Some((s, d)) = self.locate(pair) else {
            return Ok(());
        };
        if self.src().is_isomorphic(s, self.dst(), d) {
            self.store.add_recursively(s, d);
            Ok(())
        } else {
            self.match_generic(s, d)
        }
    }

    fn process_import(&mut self, decl: &DeclarationCorrespondence) -> Result<()> {
        match self.locate(&decl.pair) {
            Some((s, d)) => self.match_part(s, d),
            None => Ok(()),
        }
    }

    fn process_type_declaration(&mut self, decl: &DeclarationCorrespondence) -> Result<()> {
        self.deadline.check()?;
        let (src, dst) = (self.src(), self.dst());
        let (Some(s), Some(d)) = (
            find_type_declaration(src, &decl.pair.src),
            find_type_declaration(dst, &decl.pair.dst),
        ) else {
            debug!(src = %decl.pair.src, dst = %decl.pair.dst, "type declaration not found, skipping");
            return Ok(());
        };

        if let (Some(ps), Some(pd)) = (src.parent(s), dst.parent(d)) {
            if src.kind(ps) == NodeKind::TypeDeclarationStatement
                && dst.kind(pd) == NodeKind::TypeDeclarationStatement
            {
                self.store.add(ps, pd);
            }
        }
        self.store.add(s, d);
        self.match_modifiers(s, d, decl.visibility.as_ref(), &decl.shared_modifiers);
        self.match_unique_child(s, d, NodeKind::SimpleName);
        self.match_unique_child(s, d, NodeKind::TypeDeclarationKind);
        self.match_parts(&decl.parts)?;
        for label in [EXTENDS_KEYWORD, IMPLEMENTS_KEYWORD] {
            self.match_keyword(s, d, NodeKind::TypeInheritanceKeyword, label);
        }
        self.match_keyword(s, d, NodeKind::PermitsKeyword, PERMITS_KEYWORD);
        self.match_parts(&decl.annotations)?;
        if let Some(javadoc) = &decl.javadoc {
            self.process_javadoc(javadoc)?;
        }
        Ok(())
    }

    fn process_field(&mut self, decl: &DeclarationCorrespondence) -> Result<()> {
        self.deadline.check()?;
        let Some((s_attr, d_attr)) = self.locate(&decl.pair) else {
            return Ok(());
        };
        let (src, dst) = (self.src(), self.dst());
        let s_decl = enclosing_declaration(src, s_attr);
        let d_decl = enclosing_declaration(dst, d_attr);
        if let (Some(a), Some(b)) = (s_decl, d_decl) {
            if src.node(a).structural_hash() == dst.node(b).structural_hash() {
                self.store.add_recursively(a, b);
                return Ok(());
            }
        }
        if src.node(s_attr).structural_hash() == dst.node(d_attr).structural_hash() {
            self.store.add_recursively(s_attr, d_attr);
        }
        let (Some(s_decl), Some(d_decl)) = (s_decl, d_decl) else {
            debug!(src = %decl.pair.src, "no enclosing field declaration, skipping");
            return Ok(());
        };

        self.store.add(s_decl, d_decl);
        self.match_modifiers(s_decl, d_decl, decl.visibility.as_ref(), &decl.shared_modifiers);
        for pair in &decl.annotations {
            if let Some((a, b)) = self.locate(pair) {
                self.match_leaf(a, b)?;
            }
        }
        if decl.kind == DeclarationKind::EnumConstant {
            self.match_leaf(s_attr, d_attr)?;
        } else {
            self.match_parts(&decl.parts)?;
            self.store.add(s_attr, d_attr);
            self.match_leaf(s_attr, d_attr)?;
            if let (Some(a), Some(b)) = (src.child(s_attr, 0), dst.child(d_attr, 0)) {
                self.store.add(a, b);
            }
        }
        if let Some(javadoc) = &decl.javadoc {
            self.process_javadoc(javadoc)?;
        }
        Ok(())
    }

    fn process_method(&mut self, method: &MethodCorrespondence) -> Result<()> {
        self.process_method_with(method, false)
    }

    fn process_method_with(&mut self, method: &MethodCorrespondence, extracted: bool) -> Result<()> {
        self.deadline.check()?;
        let Some((s, d)) = self.locate(&method.pair) else {
            return Ok(());
        };
        let (src, dst) = (self.src(), self.dst());
        if !is_method_like(src.kind(s)) || !is_method_like(dst.kind(d)) {
            debug!(src = %src.kind(s), dst = %dst.kind(d), "not a method pair, skipping");
            return Ok(());
        }

        if let Some(javadoc) = &method.javadoc {
            self.process_javadoc(javadoc)?;
        }
        self.store.add(s, d);
        for kind in [NodeKind::SimpleName, NodeKind::PrimitiveType, NodeKind::Block] {
            self.match_unique_child(s, d, kind);
        }
        self.match_modifiers(s, d, method.visibility.as_ref(), &method.shared_modifiers);
        self.process_body(&method.body, extracted)?;

        self.match_parts(&method.annotations)?;
        if let (Some(a), Some(b)) = (
            src.find_child_of_kind(s, NodeKind::ThrowsKeyword),
            dst.find_child_of_kind(d, NodeKind::ThrowsKeyword),
        ) {
            self.store.add_recursively(a, b);
        }
        for pair in &method.thrown_exceptions {
            if let Some((a, b)) = self.locate(pair) {
                self.store.add_recursively(a, b);
            }
        }
        if let Some(return_type) = &method.return_type {
            if let Some((a, b)) = self.locate(return_type) {
                self.match_part(a, b)?;
            }
        }
        for pair in &method.parameters {
            let Some((a, b)) = self.locate(pair) else {
                continue;
            };
            if src.is_isomorphic(a, dst, b) {
                self.store.add_recursively(a, b);
            } else {
                self.match_leaf(a, b)?;
                self.store.add(a, b);
            }
        }
        Ok(())
    }

    fn process_body(&mut self, body: &[FragmentMapping], extracted: bool) -> Result<()> {
        for fragment in body {
            self.deadline.check()?;
            match fragment.shape {
                FragmentShape::Leaf => self.process_leaf(fragment, extracted)?,
                FragmentShape::Composite => self.process_composite(fragment)?,
            }
        }
        Ok(())
    }

    fn process_leaf(&mut self, fragment: &FragmentMapping, extracted: bool) -> Result<()> {
        let Some((s, d)) = self.locate(&fragment.pair) else {
            return Ok(());
        };
        let (src, dst) = (self.src(), self.dst());
        if src.kind(s) == dst.kind(d) {
            self.store.add(s, d);
        }
        if fragment.deferred {
            self.optimization.defer(fragment.pair.clone());
            self.optimization.defer_all(fragment.sub_mappings.iter().cloned());
        } else {
            self.match_leaf(s, d)?;
            for pair in &fragment.sub_mappings {
                if let Some((a, b)) = self.locate(pair) {
                    self.match_leaf(a, b)?;
                }
            }
        }
        // Returns of a method that lost statements to an extraction may
        // legitimately pair differently.
        if !extracted
            && src.kind(s) == NodeKind::ReturnStatement
            && dst.kind(d) == NodeKind::ReturnStatement
        {
            self.optimization.add_final_pair(s, d);
        }
        Ok(())
    }

    fn process_composite(&mut self, fragment: &FragmentMapping) -> Result<()> {
        let Some((s, d)) = self.locate(&fragment.pair) else {
            return Ok(());
        };
        let src_parts = locate_all(self.src(), &fragment.src_expressions);
        let dst_parts = locate_all(self.dst(), &fragment.dst_expressions);
        let matcher = CompositeMatcher::new().with_deadline(self.deadline);
        matcher
            .match_fragments(
                &Fragment::with_parts(s, src_parts),
                &Fragment::with_parts(d, dst_parts),
                &mut self.store,
            )
            .into_result()?;
        Ok(())
    }

    fn process_refactoring(&mut self, refactoring: &Refactoring) -> Result<()> {
        self.deadline.check()?;
        match refactoring {
            Refactoring::MoveOperation(method) | Refactoring::RenameOperation(method) => {
                self.process_method(method)
            }
            Refactoring::ExtractOperation {
                body,
                argument_mappings,
            } => {
                self.process_body(body, true)?;
                self.optimization.defer_all(argument_mappings.iter().cloned());
                Ok(())
            }
            Refactoring::InlineOperation {
                body,
                argument_mappings,
            } => {
                self.process_body(body, false)?;
                self.optimization.defer_all(argument_mappings.iter().cloned());
                Ok(())
            }
            Refactoring::MergeOperation { bodies } | Refactoring::SplitOperation { bodies } => {
                for method in bodies {
                    self.process_method_with(method, true)?;
                }
                Ok(())
            }
            Refactoring::MoveAttribute(decl) | Refactoring::RenameAttribute(decl) => {
                self.process_field(decl)
            }
            Refactoring::MoveCode {
                body,
                between_files,
            } => {
                if !between_files {
                    self.process_body(body, false)?;
                }
                Ok(())
            }
            Refactoring::ExtractVariable { sub_expressions }
            | Refactoring::InlineVariable { sub_expressions }
            | Refactoring::ExtractAttribute { sub_expressions }
            | Refactoring::InlineAttribute { sub_expressions }
            | Refactoring::MergeConditional { sub_expressions }
            | Refactoring::SplitConditional { sub_expressions }
            | Refactoring::ReplaceGenericWithDiamond { sub_expressions }
            | Refactoring::AssertThrows { sub_expressions } => {
                self.optimization.defer_all(sub_expressions.iter().cloned());
                Ok(())
            }
            Refactoring::MergeVariable {
                merged,
                new_variable,
            } => {
                let (src, dst) = (self.src(), self.dst());
                let Some(new_name) = self
                    .resolve_or_skip(dst, new_variable)
                    .and_then(|d| dst.children(d).next_back())
                else {
                    return Ok(());
                };
                for key in merged {
                    let name = self
                        .resolve_or_skip(src, key)
                        .and_then(|s| src.children(s).next_back());
                    if let Some(name) = name {
                        self.store.add(name, new_name);
                    }
                }
                Ok(())
            }
            Refactoring::RenameVariable {
                original,
                renamed,
                declaration,
                references,
            } => {
                if let Some(pair) = declaration {
                    if let Some((a, b)) = self.locate(pair) {
                        self.match_leaf(a, b)?;
                    }
                }
                let (src, dst) = (self.src(), self.dst());
                for pair in references {
                    let Some((s, d)) = self.locate(pair) else {
                        continue;
                    };
                    if let (Some(a), Some(b)) =
                        (first_name(src, s, original), first_name(dst, d, renamed))
                    {
                        self.optimization.add_variable_pair(a, b);
                    }
                }
                Ok(())
            }
            Refactoring::InvertCondition { original, inverted } => {
                if let (Some(s), Some(d)) = (
                    self.resolve_or_skip(self.src(), original),
                    self.resolve_or_skip(self.dst(), inverted),
                ) {
                    self.match_generic(s, d)?;
                }
                Ok(())
            }
            Refactoring::MergeCatch { merged, new_catch } => {
                let Some(d) = self.resolve_or_skip(self.dst(), new_catch) else {
                    return Ok(());
                };
                for key in merged {
                    if let Some(s) = self.resolve_or_skip(self.src(), key) {
                        self.match_generic(s, d)?;
                    }
                }
                Ok(())
            }
            Refactoring::SplitCatch { original, split } => {
                let Some(s) = self.resolve_or_skip(self.src(), original) else {
                    return Ok(());
                };
                for key in split {
                    if let Some(d) = self.resolve_or_skip(self.dst(), key) {
                        self.match_generic(s, d)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn resolve_or_skip(&self, tree: &Tree, key: &LocationKey) -> Option<NodeId> {
        resolve(tree, key)
            .map_err(|e| debug!(error = %e, "lookup missed, skipping"))
            .ok()
    }
}

/// Routes class correspondences to one [`FileDiffer`] per file pair.
#[derive(Debug, Default)]
pub struct ProjectDiffer<'t> {
    src_trees: BTreeMap<String, &'t Tree>,
    dst_trees: BTreeMap<String, &'t Tree>,
    deadline: Deadline,
}

impl<'t> ProjectDiffer<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the source version of a file.
    pub fn with_src_tree(mut self, path: impl Into<String>, tree: &'t Tree) -> Self {
        self.src_trees.insert(path.into(), tree);
        self
    }

    /// Registers the destination version of a file.
    pub fn with_dst_tree(mut self, path: impl Into<String>, tree: &'t Tree) -> Self {
        self.dst_trees.insert(path.into(), tree);
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Diffs every file pair named by `classes`, in order of first
    /// appearance. Correspondences naming an unregistered file are skipped.
    pub fn diff(&self, classes: &[ClassCorrespondence]) -> Result<Vec<AstDiff<'t>>> {
        let mut differs: Vec<FileDiffer<'t>> = Vec::new();
        for class in classes {
            let existing = differs
                .iter()
                .position(|f| f.src_path == class.src_file && f.dst_path == class.dst_file);
            let index = match existing {
                Some(index) => index,
                None => {
                    let (Some(src), Some(dst)) = (
                        self.src_trees.get(&class.src_file).copied(),
                        self.dst_trees.get(&class.dst_file).copied(),
                    ) else {
                        debug!(src = %class.src_file, dst = %class.dst_file, "no tree for file pair, skipping");
                        continue;
                    };
                    differs.push(
                        FileDiffer::new(class.src_file.clone(), src, class.dst_file.clone(), dst)
                            .with_deadline(self.deadline),
                    );
                    differs.len() - 1
                }
            };
            differs[index].process(class)?;
        }
        differs.into_iter().map(FileDiffer::finish).collect()
    }
}

fn resolve(tree: &Tree, key: &LocationKey) -> Result<NodeId> {
    tree.find_by_location(key)
        .ok_or_else(|| Error::LocationNotFound {
            file: key.file.clone(),
            range: key.range,
        })
}

fn locate_all(tree: &Tree, keys: &[LocationKey]) -> Vec<NodeId> {
    keys.iter()
        .filter_map(|key| match resolve(tree, key) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(error = %e, "expression not found, skipping");
                None
            }
        })
        .collect()
}

fn find_type_declaration(tree: &Tree, key: &LocationKey) -> Option<NodeId> {
    let start = tree.find_by_location(key)?;
    tree.pre_order(start)
        .find(|&n| tree.range(n) == key.range && tree.kind(n).is_type_declaration())
}

fn enclosing_declaration(tree: &Tree, id: NodeId) -> Option<NodeId> {
    tree.enclosing_of_kind(id, NodeKind::FieldDeclaration)
        .or_else(|| tree.enclosing_of_kind(id, NodeKind::EnumConstantDeclaration))
}

fn unique_child(tree: &Tree, id: NodeId, kind: NodeKind) -> Option<NodeId> {
    let mut matching = tree.children(id).filter(|&c| tree.kind(c) == kind);
    let first = matching.next()?;
    matching.next().is_none().then_some(first)
}

fn first_name(tree: &Tree, root: NodeId, name: &str) -> Option<NodeId> {
    tree.pre_order(root)
        .find(|&n| tree.kind(n) == NodeKind::SimpleName && tree.label(n) == name)
}

fn is_method_like(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::MethodDeclaration
            | NodeKind::AnnotationTypeMemberDeclaration
            | NodeKind::Initializer
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{SourceRange, TreeBuilder};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const FILE: &str = "src/Foo.java";

    fn key(pos: usize, length: usize) -> LocationKey {
        LocationKey::new(FILE, pos, length)
    }

    fn pair(pos: usize, length: usize) -> LocationPair {
        LocationPair::new(key(pos, length), key(pos, length))
    }

    // CompilationUnit
    //   PackageDeclaration
    //     SimpleName app
    //   ImportDeclaration
    //     QualifiedName java.util.List
    //   TypeDeclaration
    //     Modifier public
    //     TYPE_DECLARATION_KIND class
    //     SimpleName Foo
    //     FieldDeclaration
    //       PrimitiveType int
    //       VariableDeclarationFragment
    //         SimpleName <field>
    //     MethodDeclaration
    //       Modifier public
    //       PrimitiveType int
    //       SimpleName <method>
    //       Block
    //         ReturnStatement
    //           SimpleName <field>
    fn class(field: &str, method: &str) -> Tree {
        let mut b = TreeBuilder::new();
        let unit = b.root(NodeKind::CompilationUnit, "", SourceRange::new(0, 100));
        let package = b.child(unit, NodeKind::PackageDeclaration, "", SourceRange::new(0, 12));
        b.child(package, NodeKind::SimpleName, "app", SourceRange::new(8, 3));
        let import = b.child(unit, NodeKind::ImportDeclaration, "", SourceRange::new(13, 15));
        b.child(import, NodeKind::QualifiedName, "java.util.List", SourceRange::new(20, 7));
        let ty = b.child(unit, NodeKind::TypeDeclaration, "", SourceRange::new(30, 70));
        b.child(ty, NodeKind::Modifier, "public", SourceRange::new(30, 6));
        b.child(ty, NodeKind::TypeDeclarationKind, "class", SourceRange::new(37, 5));
        b.child(ty, NodeKind::SimpleName, "Foo", SourceRange::new(43, 3));
        let fd = b.child(ty, NodeKind::FieldDeclaration, "", SourceRange::new(48, 12));
        b.child(fd, NodeKind::PrimitiveType, "int", SourceRange::new(48, 3));
        let vdf = b.child(fd, NodeKind::VariableDeclarationFragment, "", SourceRange::new(52, 7));
        b.child(vdf, NodeKind::SimpleName, field, SourceRange::new(52, 5));
        let md = b.child(ty, NodeKind::MethodDeclaration, "", SourceRange::new(61, 38));
        b.child(md, NodeKind::Modifier, "public", SourceRange::new(61, 6));
        b.child(md, NodeKind::PrimitiveType, "int", SourceRange::new(68, 3));
        b.child(md, NodeKind::SimpleName, method, SourceRange::new(72, 4));
        let block = b.child(md, NodeKind::Block, "", SourceRange::new(79, 20));
        let ret = b.child(block, NodeKind::ReturnStatement, "", SourceRange::new(81, 13));
        b.child(ret, NodeKind::SimpleName, field, SourceRange::new(88, 5));
        b.finish().unwrap()
    }

    fn correspondence() -> ClassCorrespondence {
        let method = MethodCorrespondence::new(pair(61, 38))
            .with_visibility("public", "public")
            .with_return_type(pair(68, 3))
            .with_fragment(FragmentMapping::leaf(pair(81, 13)));
        ClassCorrespondence::new(FILE, FILE)
            .with_declaration(DeclarationCorrespondence::new(DeclarationKind::Package, pair(0, 12)))
            .with_declaration(DeclarationCorrespondence::new(DeclarationKind::Import, pair(13, 15)))
            .with_declaration(
                DeclarationCorrespondence::new(DeclarationKind::TypeDeclaration, pair(30, 70))
                    .with_visibility("public", "public"),
            )
            .with_declaration(
                DeclarationCorrespondence::new(DeclarationKind::Field, pair(52, 7))
                    .with_part(pair(48, 3)),
            )
            .with_method(method)
    }

    #[test]
    fn test_renamed_members_map_completely() {
        let (src, dst) = (class("count", "size"), class("total", "length"));
        let mut differ = FileDiffer::new(FILE, &src, FILE, &dst);
        differ.process(&correspondence()).unwrap();
        let diff = differ.finish().unwrap();

        let mono = diff.mono();
        assert_eq!(mono.len(), src.len());
        for (a, b) in src.pre_order(src.root()).zip(dst.pre_order(dst.root())) {
            assert_eq!(mono.dst(a), Some(b), "{} unmapped", src.kind(a));
        }
    }

    #[test]
    fn test_lookup_misses_are_skipped() {
        let (src, dst) = (class("count", "size"), class("count", "size"));
        let class = ClassCorrespondence::new(FILE, FILE)
            .with_method(MethodCorrespondence::new(pair(500, 3)))
            .with_declaration(DeclarationCorrespondence::new(DeclarationKind::Field, pair(501, 2)));
        let mut differ = FileDiffer::new(FILE, &src, FILE, &dst);
        differ.process(&class).unwrap();
        assert_eq!(differ.store().len(), 3);
    }

    #[test]
    fn test_expired_deadline_cancels() {
        let (src, dst) = (class("count", "size"), class("total", "size"));
        let mut differ =
            FileDiffer::new(FILE, &src, FILE, &dst).with_deadline(Deadline::after(Duration::ZERO));
        let err = differ.process(&correspondence()).unwrap_err();
        assert!(err.is_cancelled());
    }

    // ReturnStatement
    //   InfixExpression
    //     SimpleName a
    //     INFIX_EXPRESSION_OPERATOR +
    //     SimpleName <var>
    fn reference(var: &str) -> Tree {
        let mut b = TreeBuilder::new();
        let ret = b.root(NodeKind::ReturnStatement, "", SourceRange::new(0, 12));
        let infix = b.child(ret, NodeKind::InfixExpression, "", SourceRange::new(7, 5));
        b.child(infix, NodeKind::SimpleName, "a", SourceRange::new(7, 1));
        b.child(infix, NodeKind::InfixExpressionOperator, "+", SourceRange::new(9, 1));
        b.child(infix, NodeKind::SimpleName, var, SourceRange::new(11, 1));
        b.finish().unwrap()
    }

    #[test]
    fn test_rename_variable_pairs_references() {
        let (src, dst) = (reference("x"), reference("y"));
        let class = ClassCorrespondence::new(FILE, FILE).with_refactoring(Refactoring::RenameVariable {
            original: "x".to_string(),
            renamed: "y".to_string(),
            declaration: None,
            references: vec![pair(0, 12)],
        });
        let mut differ = FileDiffer::new(FILE, &src, FILE, &dst);
        differ.process(&class).unwrap();
        let diff = differ.finish().unwrap();

        let x = first_name(&src, src.root(), "x").unwrap();
        let y = first_name(&dst, dst.root(), "y").unwrap();
        assert!(diff.mappings().contains(x, y));
        let a = first_name(&src, src.root(), "a").unwrap();
        assert!(!diff.mappings().is_src_mapped(a));
    }

    #[test]
    fn test_project_groups_by_file_pair() {
        let (src, dst) = (class("count", "size"), class("count", "size"));
        let first = ClassCorrespondence::new(FILE, FILE)
            .with_declaration(DeclarationCorrespondence::new(DeclarationKind::Import, pair(13, 15)));
        let second = ClassCorrespondence::new(FILE, FILE)
            .with_declaration(DeclarationCorrespondence::new(DeclarationKind::Field, pair(52, 7)));
        let stray = ClassCorrespondence::new("src/Bar.java", "src/Bar.java");

        let diffs = ProjectDiffer::new()
            .with_src_tree(FILE, &src)
            .with_dst_tree(FILE, &dst)
            .diff(&[first, stray, second])
            .unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].src_path(), FILE);
        let field = src.find_first_of_kind(src.root(), NodeKind::FieldDeclaration).unwrap();
        let import = src.find_first_of_kind(src.root(), NodeKind::ImportDeclaration).unwrap();
        assert!(diffs[0].mappings().is_src_mapped(field));
        assert!(diffs[0].mappings().is_src_mapped(import));
    }

    #[test]
    fn test_extracted_expression_overrides_stale_link() {
        let (src, dst) = (reference("x"), reference("y"));
        let class = ClassCorrespondence::new(FILE, FILE).with_refactoring(Refactoring::ExtractVariable {
            sub_expressions: vec![pair(7, 5)],
        });
        let mut differ = FileDiffer::new(FILE, &src, FILE, &dst);
        differ.process(&class).unwrap();
        assert_eq!(differ.optimization.deferred_len(), 1);

        let infix_src = src.find_first_of_kind(src.root(), NodeKind::InfixExpression).unwrap();
        let infix_dst = dst.find_first_of_kind(dst.root(), NodeKind::InfixExpression).unwrap();
        let a_src = first_name(&src, src.root(), "a").unwrap();
        let a_dst = first_name(&dst, dst.root(), "a").unwrap();
        // An earlier pass put the name on the whole expression.
        differ.store.add(a_src, infix_dst);
        assert!(!differ.store.is_src_mapped(infix_src));

        let diff = differ.finish().unwrap();
        let store = diff.mappings();
        assert!(!store.contains(a_src, infix_dst));
        assert!(store.contains(a_src, a_dst));
        assert!(store.contains(infix_src, infix_dst));
    }

    #[test]
    fn test_move_code_within_file_only() {
        let (src, dst) = (reference("x"), reference("x"));
        let moved = |between_files| Refactoring::MoveCode {
            body: vec![FragmentMapping::leaf(pair(7, 5))],
            between_files,
        };
        let infix = src.find_first_of_kind(src.root(), NodeKind::InfixExpression).unwrap();

        let mut differ = FileDiffer::new(FILE, &src, FILE, &dst);
        differ
            .process(&ClassCorrespondence::new(FILE, FILE).with_refactoring(moved(true)))
            .unwrap();
        assert!(!differ.store().is_src_mapped(infix));

        let mut differ = FileDiffer::new(FILE, &src, FILE, &dst);
        differ
            .process(&ClassCorrespondence::new(FILE, FILE).with_refactoring(moved(false)))
            .unwrap();
        assert!(differ.store().is_src_mapped(infix));
    }

    // IfStatement
    //   InfixExpression
    //     SimpleName a
    //     INFIX_EXPRESSION_OPERATOR <op>
    //     NumberLiteral 0
    //   Block
    //     ReturnStatement
    //       SimpleName a
    fn conditional(op: &str) -> Tree {
        let mut b = TreeBuilder::new();
        let stmt = b.root(NodeKind::IfStatement, "", SourceRange::new(0, 30));
        let cond = b.child(stmt, NodeKind::InfixExpression, "", SourceRange::new(4, 6));
        b.child(cond, NodeKind::SimpleName, "a", SourceRange::new(4, 1));
        b.child(cond, NodeKind::InfixExpressionOperator, op, SourceRange::new(6, 2));
        b.child(cond, NodeKind::NumberLiteral, "0", SourceRange::new(9, 1));
        let block = b.child(stmt, NodeKind::Block, "", SourceRange::new(12, 18));
        let ret = b.child(block, NodeKind::ReturnStatement, "", SourceRange::new(14, 10));
        b.child(ret, NodeKind::SimpleName, "a", SourceRange::new(21, 1));
        b.finish().unwrap()
    }

    #[test]
    fn test_inverted_condition_pairs_operators() {
        let (src, dst) = (conditional(">"), conditional("<="));
        let class = ClassCorrespondence::new(FILE, FILE).with_refactoring(Refactoring::InvertCondition {
            original: key(0, 30),
            inverted: key(0, 30),
        });
        let mut differ = FileDiffer::new(FILE, &src, FILE, &dst);
        differ.process(&class).unwrap();
        let diff = differ.finish().unwrap();

        let op_src = src
            .find_first_of_kind(src.root(), NodeKind::InfixExpressionOperator)
            .unwrap();
        let op_dst = dst
            .find_first_of_kind(dst.root(), NodeKind::InfixExpressionOperator)
            .unwrap();
        assert!(diff.mappings().contains(op_src, op_dst));
        assert!(diff.mappings().contains(src.root(), dst.root()));
    }

    #[test]
    fn test_merged_variables_share_the_new_name() {
        // MethodDeclaration
        //   SimpleName m
        //   SingleVariableDeclaration (int a) / (Pair ab)
        //   SingleVariableDeclaration (int b)
        let r = |pos, length| SourceRange::new(pos, length);
        let mut b = TreeBuilder::new();
        let md = b.root(NodeKind::MethodDeclaration, "", r(0, 40));
        b.child(md, NodeKind::SimpleName, "m", r(5, 1));
        for (pos, name) in [(7, "a"), (14, "b")] {
            let param = b.child(md, NodeKind::SingleVariableDeclaration, "", r(pos, 5));
            b.child(param, NodeKind::PrimitiveType, "int", r(pos, 3));
            b.child(param, NodeKind::SimpleName, name, r(pos + 4, 1));
        }
        let src = b.finish().unwrap();

        let mut b = TreeBuilder::new();
        let md = b.root(NodeKind::MethodDeclaration, "", r(0, 40));
        b.child(md, NodeKind::SimpleName, "m", r(5, 1));
        let param = b.child(md, NodeKind::SingleVariableDeclaration, "", r(7, 7));
        b.child(param, NodeKind::SimpleType, "Pair", r(7, 4));
        b.child(param, NodeKind::SimpleName, "ab", r(12, 2));
        let dst = b.finish().unwrap();

        let class = ClassCorrespondence::new(FILE, FILE).with_refactoring(Refactoring::MergeVariable {
            merged: vec![key(7, 5), key(14, 5), key(90, 1)],
            new_variable: key(7, 7),
        });
        let mut differ = FileDiffer::new(FILE, &src, FILE, &dst);
        differ.process(&class).unwrap();

        let ab = first_name(&dst, dst.root(), "ab").unwrap();
        let store = differ.store();
        assert!(store.contains(first_name(&src, src.root(), "a").unwrap(), ab));
        assert!(store.contains(first_name(&src, src.root(), "b").unwrap(), ab));
        assert_eq!(store.srcs(ab).count(), 2);
    }
}
