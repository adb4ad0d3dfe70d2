//! Declaration-level correspondences fed to the differ.
//!
//! These types are the boundary with the refactoring-mining analysis. They
//! carry location keys only; the differ resolves them against the trees.

use crate::tree::LocationKey;

/// Locations of a corresponding (source, destination) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationPair {
    pub src: LocationKey,
    pub dst: LocationKey,
}

impl LocationPair {
    pub fn new(src: LocationKey, dst: LocationKey) -> Self {
        LocationPair { src, dst }
    }
}

/// Kind of a non-method declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Package,
    Import,
    TypeDeclaration,
    Field,
    EnumConstant,
}

/// A pair of corresponding declarations other than methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationCorrespondence {
    pub kind: DeclarationKind,
    /// The declarations themselves. For fields this is the declared
    /// variable; the enclosing field declaration is found from it.
    pub pair: LocationPair,
    /// Visibility labels on each side, such as `("public", "private")`.
    pub visibility: Option<(String, String)>,
    /// Modifier labels present on both sides.
    pub shared_modifiers: Vec<String>,
    pub javadoc: Option<LocationPair>,
    pub annotations: Vec<LocationPair>,
    /// Super types for type declarations, the declared type for fields.
    pub parts: Vec<LocationPair>,
}

impl DeclarationCorrespondence {
    /// A correspondence carrying only the declaration pair.
    pub fn new(kind: DeclarationKind, pair: LocationPair) -> Self {
        DeclarationCorrespondence {
            kind,
            pair,
            visibility: None,
            shared_modifiers: Vec::new(),
            javadoc: None,
            annotations: Vec::new(),
            parts: Vec::new(),
        }
    }

    pub fn with_visibility(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.visibility = Some((src.into(), dst.into()));
        self
    }

    pub fn with_shared_modifier(mut self, label: impl Into<String>) -> Self {
        self.shared_modifiers.push(label.into());
        self
    }

    pub fn with_javadoc(mut self, javadoc: LocationPair) -> Self {
        self.javadoc = Some(javadoc);
        self
    }

    pub fn with_annotation(mut self, annotation: LocationPair) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_part(mut self, part: LocationPair) -> Self {
        self.parts.push(part);
        self
    }
}

/// Shape of a statement-level correspondence inside a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentShape {
    /// A statement without nested statements, or an expression.
    Leaf,
    /// A statement owning nested statements.
    Composite,
}

/// A statement or expression correspondence found by the body mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentMapping {
    pub shape: FragmentShape,
    pub pair: LocationPair,
    /// Finer correspondences inside the pair, each leaf-matched on its own.
    pub sub_mappings: Vec<LocationPair>,
    /// Expressions of a composite statement taking part in the match. Empty
    /// means all of the statement's own expressions.
    pub src_expressions: Vec<LocationKey>,
    pub dst_expressions: Vec<LocationKey>,
    /// Expression-level correspondences are held back until every
    /// statement has been processed.
    pub deferred: bool,
}

impl FragmentMapping {
    pub fn leaf(pair: LocationPair) -> Self {
        FragmentMapping {
            shape: FragmentShape::Leaf,
            pair,
            sub_mappings: Vec::new(),
            src_expressions: Vec::new(),
            dst_expressions: Vec::new(),
            deferred: false,
        }
    }

    pub fn composite(pair: LocationPair) -> Self {
        FragmentMapping {
            shape: FragmentShape::Composite,
            ..FragmentMapping::leaf(pair)
        }
    }

    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    pub fn with_sub_mapping(mut self, pair: LocationPair) -> Self {
        self.sub_mappings.push(pair);
        self
    }

    pub fn with_expressions(mut self, src: Vec<LocationKey>, dst: Vec<LocationKey>) -> Self {
        self.src_expressions = src;
        self.dst_expressions = dst;
        self
    }
}

/// A pair of corresponding methods with their signature parts and body
/// mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCorrespondence {
    pub pair: LocationPair,
    pub visibility: Option<(String, String)>,
    pub shared_modifiers: Vec<String>,
    pub javadoc: Option<LocationPair>,
    pub annotations: Vec<LocationPair>,
    pub return_type: Option<LocationPair>,
    pub parameters: Vec<LocationPair>,
    pub thrown_exceptions: Vec<LocationPair>,
    pub body: Vec<FragmentMapping>,
}

impl MethodCorrespondence {
    pub fn new(pair: LocationPair) -> Self {
        MethodCorrespondence {
            pair,
            visibility: None,
            shared_modifiers: Vec::new(),
            javadoc: None,
            annotations: Vec::new(),
            return_type: None,
            parameters: Vec::new(),
            thrown_exceptions: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_visibility(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.visibility = Some((src.into(), dst.into()));
        self
    }

    pub fn with_shared_modifier(mut self, label: impl Into<String>) -> Self {
        self.shared_modifiers.push(label.into());
        self
    }

    pub fn with_javadoc(mut self, javadoc: LocationPair) -> Self {
        self.javadoc = Some(javadoc);
        self
    }

    pub fn with_annotation(mut self, annotation: LocationPair) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_return_type(mut self, return_type: LocationPair) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn with_parameter(mut self, parameter: LocationPair) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_thrown_exception(mut self, exception: LocationPair) -> Self {
        self.thrown_exceptions.push(exception);
        self
    }

    pub fn with_fragment(mut self, fragment: FragmentMapping) -> Self {
        self.body.push(fragment);
        self
    }
}

/// A refactoring reported by the mining analysis, reduced to the
/// correspondences it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refactoring {
    MoveOperation(MethodCorrespondence),
    RenameOperation(MethodCorrespondence),
    /// Statements moved from the source method into the extracted one.
    ExtractOperation {
        body: Vec<FragmentMapping>,
        argument_mappings: Vec<LocationPair>,
    },
    InlineOperation {
        body: Vec<FragmentMapping>,
        argument_mappings: Vec<LocationPair>,
    },
    MergeOperation {
        bodies: Vec<MethodCorrespondence>,
    },
    SplitOperation {
        bodies: Vec<MethodCorrespondence>,
    },
    MoveAttribute(DeclarationCorrespondence),
    RenameAttribute(DeclarationCorrespondence),
    /// Statements moved within a file. Moves between files are covered by
    /// the correspondences of the other file pair.
    MoveCode {
        body: Vec<FragmentMapping>,
        between_files: bool,
    },
    ExtractVariable {
        sub_expressions: Vec<LocationPair>,
    },
    InlineVariable {
        sub_expressions: Vec<LocationPair>,
    },
    ExtractAttribute {
        sub_expressions: Vec<LocationPair>,
    },
    InlineAttribute {
        sub_expressions: Vec<LocationPair>,
    },
    /// Several source variable declarations merged into one.
    MergeVariable {
        merged: Vec<LocationKey>,
        new_variable: LocationKey,
    },
    /// A renamed local variable or parameter. References are the pairs of
    /// statements using the variable on each side.
    RenameVariable {
        original: String,
        renamed: String,
        declaration: Option<LocationPair>,
        references: Vec<LocationPair>,
    },
    MergeConditional {
        sub_expressions: Vec<LocationPair>,
    },
    SplitConditional {
        sub_expressions: Vec<LocationPair>,
    },
    /// A conditional rewritten with its condition negated.
    InvertCondition {
        original: LocationKey,
        inverted: LocationKey,
    },
    ReplaceGenericWithDiamond {
        sub_expressions: Vec<LocationPair>,
    },
    /// A try/fail test rewritten as an `assertThrows` call.
    AssertThrows {
        sub_expressions: Vec<LocationPair>,
    },
    /// Several source catch clauses merged into one destination clause.
    MergeCatch {
        merged: Vec<LocationKey>,
        new_catch: LocationKey,
    },
    /// One source catch clause split into several destination clauses.
    SplitCatch {
        original: LocationKey,
        split: Vec<LocationKey>,
    },
}

/// Everything known about one pair of corresponding classes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassCorrespondence {
    pub src_file: String,
    pub dst_file: String,
    /// Package, imports, the type declaration, fields and enum constants.
    pub declarations: Vec<DeclarationCorrespondence>,
    pub methods: Vec<MethodCorrespondence>,
    pub refactorings: Vec<Refactoring>,
}

impl ClassCorrespondence {
    pub fn new(src_file: impl Into<String>, dst_file: impl Into<String>) -> Self {
        ClassCorrespondence {
            src_file: src_file.into(),
            dst_file: dst_file.into(),
            ..Default::default()
        }
    }

    pub fn with_declaration(mut self, declaration: DeclarationCorrespondence) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn with_method(mut self, method: MethodCorrespondence) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_refactoring(mut self, refactoring: Refactoring) -> Self {
        self.refactorings.push(refactoring);
        self
    }
}
