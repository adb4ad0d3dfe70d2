//! Grammar construct kinds.
//!
//! The kinds follow the node types of a Java AST as emitted by the external
//! parser, including the synthetic pseudo-nodes it inserts (call receivers and
//! argument lists, operators, keywords) so that every token carrying meaning
//! is a node of its own.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::Error;

bitflags! {
    /// Coarse categories a kind belongs to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindCategory: u16 {
        /// Statement-level construct.
        const STATEMENT = 1;
        /// Statement that owns nested statements.
        const COMPOSITE = 1 << 1;
        /// Documentation comment.
        const DOC_COMMENT = 1 << 2;
        /// Any comment, documentation included.
        const COMMENT = 1 << 3;
        /// Call expression.
        const CALL = 1 << 4;
        /// Type, member or package level declaration.
        const DECLARATION = 1 << 5;
        /// Type reference.
        const TYPE = 1 << 6;
        /// Literal value.
        const LITERAL = 1 << 7;
        /// Modifier or annotation.
        const MODIFIER = 1 << 8;
        /// Synthetic node inserted by the parser for a token or keyword.
        const PSEUDO = 1 << 9;
    }
}

const NONE: KindCategory = KindCategory::empty();
const STMT: KindCategory = KindCategory::STATEMENT;
const COMP: KindCategory = KindCategory::STATEMENT.union(KindCategory::COMPOSITE);
const DECL: KindCategory = KindCategory::DECLARATION;
const TYPE: KindCategory = KindCategory::TYPE;
const LIT: KindCategory = KindCategory::LITERAL;
const CALL: KindCategory = KindCategory::CALL;
const MODF: KindCategory = KindCategory::MODIFIER;
const PSEU: KindCategory = KindCategory::PSEUDO;
const CMNT: KindCategory = KindCategory::COMMENT;
const DOC: KindCategory = KindCategory::COMMENT.union(KindCategory::DOC_COMMENT);

macro_rules! node_kinds {
    ($($variant:ident => $label:literal, $cat:expr;)*) => {
        /// A grammar construct kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $(
                #[doc = concat!("`", $label, "`")]
                $variant,
            )*
        }

        impl NodeKind {
            /// Every kind of the grammar.
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$variant,)*];

            /// Returns the type label the parser uses for this kind.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(NodeKind::$variant => $label,)*
                }
            }

            /// Resolves a parser type label.
            pub fn from_label(label: &str) -> Option<NodeKind> {
                match label {
                    $($label => Some(NodeKind::$variant),)*
                    _ => None,
                }
            }

            /// Returns the categories of this kind.
            pub fn categories(self) -> KindCategory {
                match self {
                    $(NodeKind::$variant => $cat,)*
                }
            }
        }
    };
}

node_kinds! {
    CompilationUnit => "CompilationUnit", NONE;
    PackageDeclaration => "PackageDeclaration", DECL;
    ImportDeclaration => "ImportDeclaration", DECL;
    TypeDeclaration => "TypeDeclaration", DECL;
    EnumDeclaration => "EnumDeclaration", DECL;
    RecordDeclaration => "RecordDeclaration", DECL;
    AnnotationTypeDeclaration => "AnnotationTypeDeclaration", DECL;
    AnnotationTypeMemberDeclaration => "AnnotationTypeMemberDeclaration", DECL;
    AnonymousClassDeclaration => "AnonymousClassDeclaration", DECL;
    EnumConstantDeclaration => "EnumConstantDeclaration", DECL;
    FieldDeclaration => "FieldDeclaration", DECL;
    MethodDeclaration => "MethodDeclaration", DECL;
    Initializer => "Initializer", DECL;
    SingleVariableDeclaration => "SingleVariableDeclaration", NONE;
    VariableDeclarationFragment => "VariableDeclarationFragment", NONE;
    VariableDeclarationExpression => "VariableDeclarationExpression", NONE;
    TypeParameter => "TypeParameter", NONE;
    Modifier => "Modifier", MODF;
    MarkerAnnotation => "MarkerAnnotation", MODF;
    NormalAnnotation => "NormalAnnotation", MODF;
    SingleMemberAnnotation => "SingleMemberAnnotation", MODF;
    MemberValuePair => "MemberValuePair", NONE;
    Javadoc => "Javadoc", DOC;
    TagElement => "TagElement", NONE;
    TextElement => "TextElement", NONE;
    MemberRef => "MemberRef", NONE;
    MethodRef => "MethodRef", NONE;
    MethodRefParameter => "MethodRefParameter", NONE;
    LineComment => "LineComment", CMNT;
    BlockComment => "BlockComment", CMNT;
    PrimitiveType => "PrimitiveType", TYPE;
    SimpleType => "SimpleType", TYPE;
    QualifiedType => "QualifiedType", TYPE;
    NameQualifiedType => "NameQualifiedType", TYPE;
    ArrayType => "ArrayType", TYPE;
    ParameterizedType => "ParameterizedType", TYPE;
    WildcardType => "WildcardType", TYPE;
    UnionType => "UnionType", TYPE;
    IntersectionType => "IntersectionType", TYPE;
    Dimension => "Dimension", NONE;
    Block => "Block", COMP;
    AssertStatement => "AssertStatement", STMT;
    BreakStatement => "BreakStatement", STMT;
    ConstructorInvocation => "ConstructorInvocation", STMT.union(CALL);
    ContinueStatement => "ContinueStatement", STMT;
    DoStatement => "DoStatement", COMP;
    EmptyStatement => "EmptyStatement", STMT;
    EnhancedForStatement => "EnhancedForStatement", COMP;
    ExpressionStatement => "ExpressionStatement", STMT;
    ForStatement => "ForStatement", COMP;
    IfStatement => "IfStatement", COMP;
    LabeledStatement => "LabeledStatement", COMP;
    ReturnStatement => "ReturnStatement", STMT;
    SuperConstructorInvocation => "SuperConstructorInvocation", STMT.union(CALL);
    SwitchCase => "SwitchCase", STMT;
    SwitchStatement => "SwitchStatement", COMP;
    SynchronizedStatement => "SynchronizedStatement", COMP;
    ThrowStatement => "ThrowStatement", STMT;
    TryStatement => "TryStatement", COMP;
    CatchClause => "CatchClause", COMP;
    TypeDeclarationStatement => "TypeDeclarationStatement", STMT;
    VariableDeclarationStatement => "VariableDeclarationStatement", STMT;
    WhileStatement => "WhileStatement", COMP;
    YieldStatement => "YieldStatement", STMT;
    ArrayAccess => "ArrayAccess", NONE;
    ArrayCreation => "ArrayCreation", NONE;
    ArrayInitializer => "ArrayInitializer", NONE;
    Assignment => "Assignment", NONE;
    CastExpression => "CastExpression", NONE;
    ClassInstanceCreation => "ClassInstanceCreation", CALL;
    ConditionalExpression => "ConditionalExpression", NONE;
    FieldAccess => "FieldAccess", NONE;
    InfixExpression => "InfixExpression", NONE;
    InstanceofExpression => "InstanceofExpression", NONE;
    PatternInstanceofExpression => "PatternInstanceofExpression", NONE;
    TypePattern => "TypePattern", NONE;
    LambdaExpression => "LambdaExpression", NONE;
    MethodInvocation => "MethodInvocation", CALL;
    SuperMethodInvocation => "SuperMethodInvocation", CALL;
    ParenthesizedExpression => "ParenthesizedExpression", NONE;
    PostfixExpression => "PostfixExpression", NONE;
    PrefixExpression => "PrefixExpression", NONE;
    QualifiedName => "QualifiedName", NONE;
    SimpleName => "SimpleName", NONE;
    SuperFieldAccess => "SuperFieldAccess", NONE;
    ThisExpression => "ThisExpression", NONE;
    SwitchExpression => "SwitchExpression", NONE;
    ExpressionMethodReference => "ExpressionMethodReference", NONE;
    SuperMethodReference => "SuperMethodReference", NONE;
    TypeMethodReference => "TypeMethodReference", NONE;
    CreationReference => "CreationReference", NONE;
    BooleanLiteral => "BooleanLiteral", LIT;
    CharacterLiteral => "CharacterLiteral", LIT;
    NullLiteral => "NullLiteral", LIT;
    NumberLiteral => "NumberLiteral", LIT;
    StringLiteral => "StringLiteral", LIT;
    TextBlock => "TextBlock", LIT;
    TypeLiteral => "TypeLiteral", LIT;
    MethodInvocationReceiver => "METHOD_INVOCATION_RECEIVER", PSEU;
    MethodInvocationArguments => "METHOD_INVOCATION_ARGUMENTS", PSEU;
    InfixExpressionOperator => "INFIX_EXPRESSION_OPERATOR", PSEU;
    AssignmentOperator => "ASSIGNMENT_OPERATOR", PSEU;
    PrefixExpressionOperator => "PREFIX_EXPRESSION_OPERATOR", PSEU;
    PostfixExpressionOperator => "POSTFIX_EXPRESSION_OPERATOR", PSEU;
    TagName => "TAG_NAME", PSEU;
    TypeDeclarationKind => "TYPE_DECLARATION_KIND", PSEU;
    TypeInheritanceKeyword => "TYPE_INHERITANCE_KEYWORD", PSEU;
    PermitsKeyword => "PERMITS_KEYWORD", PSEU;
    ThrowsKeyword => "THROWS_KEYWORD", PSEU;
    VarargsType => "VARARGS_TYPE", PSEU;
}

impl NodeKind {
    /// Returns true if this kind has any of the given categories.
    pub fn is_any(self, categories: KindCategory) -> bool {
        self.categories().intersects(categories)
    }

    /// Statement-level construct.
    pub fn is_statement(self) -> bool {
        self.categories().contains(KindCategory::STATEMENT)
    }

    /// Statement owning nested statements (blocks included).
    pub fn is_composite(self) -> bool {
        self.categories().contains(KindCategory::COMPOSITE)
    }

    /// Any comment.
    pub fn is_comment(self) -> bool {
        self.categories().contains(KindCategory::COMMENT)
    }

    /// Call expression or explicit constructor call.
    pub fn is_call(self) -> bool {
        self.categories().contains(KindCategory::CALL)
    }

    /// Annotation node of any form.
    pub fn is_annotation(self) -> bool {
        matches!(
            self,
            NodeKind::MarkerAnnotation | NodeKind::NormalAnnotation | NodeKind::SingleMemberAnnotation
        )
    }

    /// Type, enum, record or annotation type declaration.
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::TypeDeclaration
                | NodeKind::EnumDeclaration
                | NodeKind::RecordDeclaration
                | NodeKind::AnnotationTypeDeclaration
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::from_label(s).ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_label(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn test_pseudo_labels() {
        assert_eq!(
            "METHOD_INVOCATION_ARGUMENTS".parse::<NodeKind>().unwrap(),
            NodeKind::MethodInvocationArguments
        );
        assert!(NodeKind::ThrowsKeyword.is_any(KindCategory::PSEUDO));
    }

    #[test]
    fn test_unknown_label() {
        let err = "Frobnicate".parse::<NodeKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownKind(ref s) if s == "Frobnicate"));
    }

    #[test]
    fn test_categories() {
        assert!(NodeKind::IfStatement.is_statement());
        assert!(NodeKind::IfStatement.is_composite());
        assert!(!NodeKind::ExpressionStatement.is_composite());
        assert!(NodeKind::Javadoc.is_comment());
        assert!(NodeKind::Javadoc.is_any(KindCategory::DOC_COMMENT));
        assert!(!NodeKind::LineComment.is_any(KindCategory::DOC_COMMENT));
        assert!(NodeKind::MethodInvocation.is_call());
        assert!(!NodeKind::InfixExpression.is_any(
            KindCategory::STATEMENT | KindCategory::DOC_COMMENT | KindCategory::CALL
        ));
    }
}
