//! AST node types for the plain (post-transpile) scripting language.
//!
//! Every node carries a [`Span`] for error reporting.
//! Large recursive types are boxed to keep enum sizes reasonable.
//! The parser only ever sees executable source — type annotations,
//! interfaces, and enums have already been erased or lowered.

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete snippet: a flat list of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A block of statements: `{ ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// `const` / `let` / `var` — all three are accepted; scoping does not
/// distinguish `var` hoisting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `function name(params) { ... }` (plain or async).
    FunctionDecl(FunctionDecl),
    /// `const x = expr;`
    VarDecl(VarDecl),
    /// `target = expr;` and compound forms (`+=`, `-=`, ...).
    Assign(AssignStmt),
    If(IfStmt),
    While(WhileStmt),
    /// C-style `for (init; cond; update) { ... }`.
    For(ForStmt),
    /// `for (const x of expr) { ... }`
    ForOf(ForOfStmt),
    /// `for (const k in expr) { ... }` — iterates object keys / array indices.
    ForIn(ForOfStmt),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Try(TryStmt),
    Break(Span),
    Continue(Span),
    Block(Block),
    Expr(ExprStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::FunctionDecl(d) => d.span,
            Stmt::VarDecl(d) => d.span,
            Stmt::Assign(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::ForOf(s) | Stmt::ForIn(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Throw(s) => s.span,
            Stmt::Try(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) => *span,
            Stmt::Block(b) => b.span,
            Stmt::Expr(s) => s.span,
        }
    }
}

/// A named function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub func: FunctionExpr,
    pub span: Span,
}

/// `const a = 1, b = 2;` — one or more declarators sharing a keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

/// `name = init` within a declaration (init optional for `let` / `var`).
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub init: Option<Expr>,
    pub span: Span,
}

/// Compound assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// `target op= value;` where target is an identifier, member access,
/// or index expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: Expr,
    pub op: AssignOp,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Block,
    pub else_branch: Option<ElseBranch>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    ElseIf(Box<IfStmt>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    /// Init clause: a var declaration, assignment, or expression.
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    /// Update clause: an assignment or expression (e.g. `i++`).
    pub update: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

/// Shared shape for `for..of` (values) and `for..in` (keys).
#[derive(Debug, Clone, PartialEq)]
pub struct ForOfStmt {
    pub decl_kind: DeclKind,
    pub binding: Ident,
    pub iterable: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub try_block: Block,
    /// `catch (e) { ... }` — binding optional (`catch { ... }`).
    pub catch_param: Option<Ident>,
    pub catch_block: Option<Block>,
    pub finally_block: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// One parameter: plain, defaulted (`x = 1`), or rest (`...xs`).
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub default: Option<Expr>,
    pub rest: bool,
}

/// Arrow or `function` expression body.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Block),
    /// Expression-bodied arrow: `x => x + 1`.
    Expr(Box<Expr>),
}

/// A function-valued expression: arrow function or function expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    /// Present for named function expressions; `None` for arrows.
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: FunctionBody,
    pub is_async: bool,
    pub span: Span,
}

impl FunctionExpr {
    /// Callable arity the way the host language reports it: the count
    /// of leading parameters before the first default or rest param.
    pub fn arity(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| p.default.is_none() && !p.rest)
            .count()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// One part of a template literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Expr(Expr),
}

/// Array literal element.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElem {
    Item(Expr),
    Spread(Expr),
}

/// Object literal entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEntry {
    /// `key: value` — key may be an identifier or string literal.
    Field { key: String, value: Expr },
    /// `{ x }` shorthand.
    Shorthand(Ident),
    /// `{ ...other }`.
    Spread(Expr),
}

/// Call argument (positional or spread).
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Item(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    /// Unary `+` — numeric coercion.
    Plus,
    Not,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// `==` (loose; also matches `null` against `undefined`).
    Eq,
    /// `===`
    StrictEq,
    NotEq,
    StrictNotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    And,
    Or,
    /// `??`
    Coalesce,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    NumberLit(f64),
    StringLit(String),
    BoolLit(bool),
    NullLit,
    UndefinedLit,
    TemplateLit(Vec<TemplatePart>),
    ArrayLit(Vec<ArrayElem>),
    ObjectLit(Vec<ObjectEntry>),

    Identifier(Ident),
    Function(Box<FunctionExpr>),

    Call {
        callee: Box<Expr>,
        args: Vec<Arg>,
    },
    /// `new Name(args)` — only builtin error constructors and in-scope
    /// callables are meaningful at runtime.
    New {
        callee: Ident,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `++x` / `x--` and friends.
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Await(Box<Expr>),
    Paren(Box<Expr>),
}
