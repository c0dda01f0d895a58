//! The syntax tree of a C-minus program.
//!
//! The parser builds the tree once. Later stages annotate it in place
//! through slots that exist (unset) from construction:
//! * `declaration` on variable references and calls (set by resolution)
//! * `resolved_type` on every expression (set by type checking)
//! * `label` on string literals (set by labeling)
//!
//! Every declaration is stored once in the program's [`Declarations`]
//! arena. The tree and the annotation slots refer to declarations through
//! [`DeclId`] handles so that references never own what they point at.
use std::fmt;
use std::ops::Index;

use crate::core::{Id, Located, SourceSpan};
use crate::types::{BaseType, Type};

/// Handle to a declaration in the [`Declarations`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(usize);

impl DeclId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The shape of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// `int x;`
    Simple,
    /// `int *x;`
    Pointer,
    /// `int x[10];`
    Array(u64),
    /// `int f(int a) { ... }`
    Function(FunctionSignature),
}

/// The parts of a function declaration other than the body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// True when declared as `int *f(...)`.
    pub returns_pointer: bool,
    pub params: Vec<DeclId>,
}

/// A declared name: a global or local variable, a parameter or a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub base: BaseType,
    pub id: Id,
    pub kind: DeclKind,
}

impl Decl {
    pub fn simple(base: BaseType, id: Id) -> Self {
        Self {
            base,
            id,
            kind: DeclKind::Simple,
        }
    }

    pub fn pointer(base: BaseType, id: Id) -> Self {
        Self {
            base,
            id,
            kind: DeclKind::Pointer,
        }
    }

    pub fn array(base: BaseType, id: Id, size: u64) -> Self {
        Self {
            base,
            id,
            kind: DeclKind::Array(size),
        }
    }

    pub fn function(base: BaseType, id: Id, signature: FunctionSignature) -> Self {
        Self {
            base,
            id,
            kind: DeclKind::Function(signature),
        }
    }

    pub fn signature(&self) -> Option<&FunctionSignature> {
        match &self.kind {
            DeclKind::Function(signature) => Some(signature),
            _ => None,
        }
    }

    /// The type of the value a function returns.
    pub fn return_type(&self) -> Option<Type> {
        self.signature().map(|signature| {
            let base = Type::base(self.base);
            if signature.returns_pointer {
                base.pointer_to()
            } else {
                base
            }
        })
    }

    /// The type a parameter expects from its argument.
    pub fn value_type(&self) -> Type {
        let base = Type::base(self.base);
        match self.kind {
            DeclKind::Simple => base,
            DeclKind::Pointer => base.pointer_to(),
            DeclKind::Array(_) => base.array_of(),
            DeclKind::Function(_) => self.return_type().unwrap_or(base),
        }
    }
}

impl Located for Decl {
    fn span(&self) -> SourceSpan {
        self.id.span()
    }
}

/// Arena that owns every declaration in a program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    items: Vec<Decl>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decl: Decl) -> DeclId {
        self.items.push(decl);
        DeclId(self.items.len() - 1)
    }

    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.items.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, decl)| (DeclId(index), decl))
    }
}

impl Index<DeclId> for Declarations {
    type Output = Decl;

    fn index(&self, id: DeclId) -> &Self::Output {
        &self.items[id.0]
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Var(DeclId),
    Function(FunctionDeclaration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub decl: DeclId,
    pub body: CompoundStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundStmt {
    pub locals: Vec<DeclId>,
    pub stmts: Vec<Stmt>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Compound(CompoundStmt),
    Expression(ExpressionStmt),
    If(IfStmt),
    While(WhileStmt),
    Return(ReturnStmt),
    Write(WriteStmt),
    Writeln(SourceSpan),
}

/// An expression evaluated for its effect. `;` alone has no expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub exp: Option<Exp>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Exp,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub cond: Exp,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Exp>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteStmt {
    pub value: Exp,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Exp {
    Var(VarExp),
    Assign(AssignExp),
    Add(AddExp),
    Mul(MulExp),
    Neg(NegExp),
    Rel(RelExp),
    Call(CallExp),
    NumLit(NumLit),
    StrLit(StrLit),
}

impl Exp {
    /// The type assigned by type checking, if type checking has run.
    pub fn resolved_type(&self) -> Option<&Type> {
        match self {
            Exp::Var(node) => node.resolved_type.as_ref(),
            Exp::Assign(node) => node.resolved_type.as_ref(),
            Exp::Add(node) => node.resolved_type.as_ref(),
            Exp::Mul(node) => node.resolved_type.as_ref(),
            Exp::Neg(node) => node.resolved_type.as_ref(),
            Exp::Rel(node) => node.resolved_type.as_ref(),
            Exp::Call(node) => node.resolved_type.as_ref(),
            Exp::NumLit(node) => node.resolved_type.as_ref(),
            Exp::StrLit(node) => node.resolved_type.as_ref(),
        }
    }
}

impl Located for Exp {
    fn span(&self) -> SourceSpan {
        match self {
            Exp::Var(node) => node.span.clone(),
            Exp::Assign(node) => SourceSpan::join(&node.target.span, &node.value.span()),
            Exp::Add(node) => SourceSpan::join(&node.lhs.span(), &node.rhs.span()),
            Exp::Mul(node) => SourceSpan::join(&node.lhs.span(), &node.rhs.span()),
            Exp::Neg(node) => node.span.clone(),
            Exp::Rel(node) => SourceSpan::join(&node.lhs.span(), &node.rhs.span()),
            Exp::Call(node) => node.span.clone(),
            Exp::NumLit(node) => node.span.clone(),
            Exp::StrLit(node) => node.span.clone(),
        }
    }
}

/// The surface form of a variable reference.
#[derive(Debug, Clone, PartialEq)]
pub enum VarShape {
    /// `x`
    Simple,
    /// `*x`
    Pointer,
    /// `x[e]`
    Array(Box<Exp>),
    /// `&x`
    AddrOf,
    /// `&x[e]`
    AddrOfArray(Box<Exp>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarExp {
    pub id: Id,
    pub shape: VarShape,
    pub span: SourceSpan,
    pub declaration: Option<DeclId>,
    pub resolved_type: Option<Type>,
}

impl VarExp {
    pub fn new(id: Id, shape: VarShape, span: SourceSpan) -> Self {
        Self {
            id,
            shape,
            span,
            declaration: None,
            resolved_type: None,
        }
    }

    /// The index expression for `x[e]` and `&x[e]`.
    pub fn index(&self) -> Option<&Exp> {
        match &self.shape {
            VarShape::Array(index) | VarShape::AddrOfArray(index) => Some(index),
            VarShape::Simple | VarShape::Pointer | VarShape::AddrOf => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExp {
    pub target: VarExp,
    pub value: Box<Exp>,
    pub resolved_type: Option<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOp {
    Plus,
    Minus,
}

impl AddOp {
    pub fn verb(&self) -> &'static str {
        match self {
            AddOp::Plus => "plus",
            AddOp::Minus => "minus",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddExp {
    pub lhs: Box<Exp>,
    pub rhs: Box<Exp>,
    pub op: AddOp,
    pub resolved_type: Option<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulOp {
    Times,
    Div,
    Mod,
}

impl MulOp {
    pub fn verb(&self) -> &'static str {
        match self {
            MulOp::Times => "times",
            MulOp::Div => "divide",
            MulOp::Mod => "mod",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MulExp {
    pub lhs: Box<Exp>,
    pub rhs: Box<Exp>,
    pub op: MulOp,
    pub resolved_type: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NegExp {
    pub operand: Box<Exp>,
    pub span: SourceSpan,
    pub resolved_type: Option<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelExp {
    pub lhs: Box<Exp>,
    pub rhs: Box<Exp>,
    pub op: RelOp,
    pub resolved_type: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExp {
    pub id: Id,
    pub args: Vec<Exp>,
    pub span: SourceSpan,
    pub declaration: Option<DeclId>,
    pub resolved_type: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumLit {
    pub value: i32,
    pub span: SourceSpan,
    pub resolved_type: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrLit {
    pub value: String,
    pub span: SourceSpan,
    pub label: Option<String>,
    pub resolved_type: Option<Type>,
}

/// A string constant placed in the read-only data section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringConstant {
    pub label: String,
    pub value: String,
}

/// A complete translation unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    pub decls: Declarations,
    /// The labeled string literals in labeling order. Empty until labeling
    /// has run.
    pub string_literals: Vec<StringConstant>,
}

impl Program {
    /// Returns the function declarations in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDeclaration> {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Function(function) => Some(function),
            Declaration::Var(_) => None,
        })
    }

    /// Returns the global variables in source order.
    pub fn globals(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.declarations.iter().filter_map(|decl| match decl {
            Declaration::Var(id) => Some(*id),
            Declaration::Function(_) => None,
        })
    }

    /// Returns the handle of the top-level declaration, in source order.
    pub fn top_level(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.declarations.iter().map(|decl| match decl {
            Declaration::Var(id) => *id,
            Declaration::Function(function) => function.decl,
        })
    }
}
