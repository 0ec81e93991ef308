//! Canonical abstract syntax tree shared by every front-end and back-end
//!
//! Nodes live in an arena owned by [`Ast`]; children and parents are
//! [`NodeId`]s into it, so a tree has a single owner, no sharing and no
//! cycles. Trees are assembled with [`AstBuilder`] and immutable afterwards,
//! which makes one parsed file safe to emit to several targets at once.
//!
//! Child layout per kind:
//!
//! | kind | children |
//! |---|---|
//! | `Program` | top-level declarations |
//! | `Function` | parameters, then an optional body (`Block` or `Opaque`) |
//! | `Type` | fields, methods and opaque members in source order |
//! | `Field`, `Parameter` | optional default value expression |
//! | `If` | condition, then-block, optional else (`Block` or `If`) |
//! | `While`, `For` | condition or iterable, body |
//! | `Return` | optional value |
//! | `Assign` | target, optional value |
//! | `Binary` / `Unary` | operands |
//! | `Call` | callee, arguments |
//! | `FieldAccess` | object |

mod builder;
pub mod query;
mod visitor;

pub use builder::AstBuilder;
pub use visitor::Visitor;

use crate::error::Span;
use crate::types::TypeRef;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub return_type: TypeRef,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_async: bool,
    /// Declared without a body (interface or abstract member)
    pub is_abstract: bool,
    /// Initialises a new instance of the enclosing type
    pub is_constructor: bool,
    /// Checked/declared exceptions
    pub throws: Vec<TypeRef>,
    pub type_params: Vec<String>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseKind {
    Extends,
    Implements,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseRelation {
    pub ty: TypeRef,
    pub kind: BaseKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub visibility: Visibility,
    pub bases: Vec<BaseRelation>,
    pub type_params: Vec<String>,
    /// Unit variants of an enum, in order
    pub variants: Vec<String>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub visibility: Visibility,
    pub mutable: bool,
    /// May be omitted when constructing the owner. Nullability is carried
    /// by `ty` alone.
    pub optional: bool,
    pub is_static: bool,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
    pub mutable: bool,
    /// May be omitted by callers
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Binding strength, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }

    /// C-family spelling; logical operators are target-specific
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Literal {
    Int(i64),
    /// Kept as written to avoid float formatting drift
    Float(String),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    Program,
    Function(FunctionDecl),
    Type(TypeDecl),
    Field(FieldDecl),
    Parameter(ParamDecl),
    Block,
    If,
    While,
    /// For-each loop over an iterable
    For { binding: String },
    Return,
    /// Assignment; `declares` introduces a local
    Assign {
        declares: bool,
        mutable: bool,
        ty: Option<TypeRef>,
    },
    Binary { op: BinaryOp },
    Unary { op: UnaryOp },
    Call,
    FieldAccess { field: String },
    Literal { value: Literal },
    Identifier { name: String },
    /// The method receiver (`self`, `this`, a Go receiver name)
    SelfRef,
    /// Verbatim source text that matched no template
    Opaque { text: String },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Program => "program",
            NodeKind::Function(_) => "function",
            NodeKind::Type(_) => "type",
            NodeKind::Field(_) => "field",
            NodeKind::Parameter(_) => "parameter",
            NodeKind::Block => "block",
            NodeKind::If => "if",
            NodeKind::While => "while",
            NodeKind::For { .. } => "for",
            NodeKind::Return => "return",
            NodeKind::Assign { .. } => "assign",
            NodeKind::Binary { .. } => "binary",
            NodeKind::Unary { .. } => "unary",
            NodeKind::Call => "call",
            NodeKind::FieldAccess { .. } => "field_access",
            NodeKind::Literal { .. } => "literal",
            NodeKind::Identifier { .. } => "identifier",
            NodeKind::SelfRef => "self",
            NodeKind::Opaque { .. } => "opaque",
        }
    }

    /// Kinds that may appear at declaration level
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::Function(_) | NodeKind::Type(_) | NodeKind::Field(_)
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Binary { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Call
                | NodeKind::FieldAccess { .. }
                | NodeKind::Literal { .. }
                | NodeKind::Identifier { .. }
                | NodeKind::SelfRef
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<NodeId>,
    #[serde(skip)]
    pub(crate) parent: Option<NodeId>,
}

/// An immutable canonical tree for one source file
#[derive(Debug, Clone, Serialize)]
pub struct Ast {
    source_language: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { ast: self, id }
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Top-level declarations in source order
    pub fn declarations(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.root().children()
    }

    /// Serialize the tree for inspection
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// A cheap handle to one node of an [`Ast`]
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> std::fmt::Debug for NodeRef<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind().name(), self.id.0)
    }
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a Node {
        &self.ast.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn ast(&self) -> &'a Ast {
        self.ast
    }

    pub fn kind(&self) -> &'a NodeKind {
        &self.data().kind
    }

    pub fn span(&self) -> Span {
        self.data().span
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let ast = self.ast;
        self.data().parent.map(|id| ast.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let ast = self.ast;
        self.data().children.iter().map(move |&id| ast.node(id))
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        self.data().children.get(index).map(|&id| self.ast.node(id))
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn as_function(&self) -> Option<&'a FunctionDecl> {
        match self.kind() {
            NodeKind::Function(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&'a TypeDecl> {
        match self.kind() {
            NodeKind::Type(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&'a FieldDecl> {
        match self.kind() {
            NodeKind::Field(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_param(&self) -> Option<&'a ParamDecl> {
        match self.kind() {
            NodeKind::Parameter(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn opaque_text(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Opaque { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.kind(), NodeKind::Opaque { .. })
    }

    /// Parameters of a function
    pub fn params(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.children()
            .filter(|child| matches!(child.kind(), NodeKind::Parameter(_)))
    }

    /// Body of a function: its trailing block or opaque child
    pub fn body(&self) -> Option<NodeRef<'a>> {
        if self.as_function().is_none() {
            return None;
        }
        self.children()
            .last()
            .filter(|child| matches!(child.kind(), NodeKind::Block | NodeKind::Opaque { .. }))
    }

    /// Fields of a type, in order
    pub fn fields(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.children()
            .filter(|child| matches!(child.kind(), NodeKind::Field(_)))
    }

    /// Methods of a type, in order
    pub fn methods(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.children()
            .filter(|child| matches!(child.kind(), NodeKind::Function(_)))
    }

    /// Members of a type the front-end could not parse
    pub fn opaque_members(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.children()
            .filter(|child| matches!(child.kind(), NodeKind::Opaque { .. }))
    }

    /// Default value of a field or parameter
    pub fn default_value(&self) -> Option<NodeRef<'a>> {
        match self.kind() {
            NodeKind::Field(_) | NodeKind::Parameter(_) => self.child(0),
            _ => None,
        }
    }
}
