//! Typed Java AST produced by the diet and body parsers.
//!
//! Node kinds are tagged sum types with a `Span` in every variant. Bodies of
//! methods, constructors and initializers are represented by [`BodyRef`]: the
//! diet pass records a [`BodyId`] into the skipped-span table, and the body
//! pass replaces it with a parsed [`Block`] without touching anything else in
//! the tree.

use quill_core::Span;

/// Index into [`crate::DietParse`]'s skipped-body-span table.
pub type BodyId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    pub name: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub is_static: bool,
    pub is_star: bool,
    pub path: String,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Annotation => "@interface",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    Default,
    Sealed,
    NonSealed,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Native => "native",
            Modifier::Synchronized => "synchronized",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Default => "default",
            Modifier::Sealed => "sealed",
            Modifier::NonSealed => "non-sealed",
        }
    }
}

/// A type reference as written in source, canonicalized to a single string
/// (`java.util.List<String>[]`). The parsers never interpret the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub text: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub name_range: Span,
    pub extends: Vec<TypeRef>,
    pub implements: Vec<TypeRef>,
    /// `permits` clause of a sealed type; empty otherwise.
    pub permits: Vec<TypeRef>,
    /// Record header components; empty for other kinds.
    pub components: Vec<ParamDecl>,
    /// Enum constants; empty for other kinds.
    pub constants: Vec<EnumConstant>,
    pub members: Vec<MemberDecl>,
    pub body_range: Span,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberDecl {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Initializer(InitializerDecl),
    Type(TypeDecl),
}

impl MemberDecl {
    pub fn range(&self) -> Span {
        match self {
            MemberDecl::Field(decl) => decl.range,
            MemberDecl::Method(decl) => decl.range,
            MemberDecl::Constructor(decl) => decl.range,
            MemberDecl::Initializer(decl) => decl.range,
            MemberDecl::Type(decl) => decl.range,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            MemberDecl::Field(decl) => Some(&decl.name),
            MemberDecl::Method(decl) => Some(&decl.name),
            MemberDecl::Constructor(decl) => Some(&decl.name),
            MemberDecl::Initializer(_) => None,
            MemberDecl::Type(decl) => Some(&decl.name),
        }
    }
}

/// Field initializer slot. The diet pass only balances the initializer
/// tokens; `Skipped` records the token range for the later promotion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInit {
    None,
    Skipped { tokens: (usize, usize), span: Span },
    Parsed(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub init: FieldInit,
    pub range: Span,
}

/// Body slot of a method/constructor/initializer.
///
/// `None` means there is no body at all (abstract/native methods);
/// `Skipped` points at the diet pass's skipped-span table; `Parsed` is the
/// attached statement list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyRef {
    None,
    Skipped(BodyId),
    Parsed(Block),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub varargs: bool,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub modifiers: Vec<Modifier>,
    pub return_ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub params: Vec<ParamDecl>,
    pub throws: Vec<TypeRef>,
    pub body: BodyRef,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDecl {
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub name_range: Span,
    pub params: Vec<ParamDecl>,
    pub throws: Vec<TypeRef>,
    pub body: BodyRef,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializerDecl {
    pub is_static: bool,
    pub body: BodyRef,
    pub range: Span,
}

/// Token range and byte span of a method/initializer body the diet pass
/// skipped. `terminated` is false when the closing brace was missing and the
/// span runs to end of input (recovery territory).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedBodySpan {
    /// Token indices of `{` .. `}` (inclusive of both braces when present).
    pub tokens: (usize, usize),
    pub span: Span,
    pub terminated: bool,
}

impl SkippedBodySpan {
    pub fn contains_offset(&self, offset: usize) -> bool {
        // Strictly inside the braces.
        self.span.start < offset && offset < self.span.end || !self.terminated && offset >= self.span.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Block(Block),
    LocalVar(LocalVarStmt),
    /// Local class/interface declaration; only produced when statement
    /// recovery is enabled.
    LocalType(TypeDecl),
    Expr(ExprStmt),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    ForEach(ForEachStmt),
    Switch(SwitchStmt),
    Labeled(LabeledStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Synchronized(SynchronizedStmt),
    Try(TryStmt),
    Assert(AssertStmt),
    Empty(Span),
}

impl Stmt {
    pub fn range(&self) -> Span {
        match self {
            Stmt::Block(block) => block.range,
            Stmt::LocalVar(stmt) => stmt.range,
            Stmt::LocalType(decl) => decl.range,
            Stmt::Expr(stmt) => stmt.range,
            Stmt::If(stmt) => stmt.range,
            Stmt::While(stmt) => stmt.range,
            Stmt::DoWhile(stmt) => stmt.range,
            Stmt::For(stmt) => stmt.range,
            Stmt::ForEach(stmt) => stmt.range,
            Stmt::Switch(stmt) => stmt.range,
            Stmt::Labeled(stmt) => stmt.range,
            Stmt::Break(stmt) => stmt.range,
            Stmt::Continue(stmt) => stmt.range,
            Stmt::Return(stmt) => stmt.range,
            Stmt::Throw(stmt) => stmt.range,
            Stmt::Synchronized(stmt) => stmt.range,
            Stmt::Try(stmt) => stmt.range,
            Stmt::Assert(stmt) => stmt.range,
            Stmt::Empty(range) => *range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVarStmt {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub initializer: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Box<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoWhileStmt {
    pub body: Box<Stmt>,
    pub cond: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForStmt {
    pub init: Vec<Stmt>,
    pub cond: Option<Expr>,
    pub update: Vec<Expr>,
    pub body: Box<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForEachStmt {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub iterable: Expr,
    pub body: Box<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchStmt {
    pub scrutinee: Expr,
    pub groups: Vec<SwitchGroup>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchGroup {
    pub labels: Vec<SwitchLabel>,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchLabel {
    Case(Expr),
    Default(Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledStmt {
    pub label: String,
    pub stmt: Box<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakStmt {
    pub label: Option<String>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinueStmt {
    pub label: Option<String>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStmt {
    pub expr: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowStmt {
    pub expr: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizedStmt {
    pub lock: Expr,
    pub body: Block,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryStmt {
    pub resources: Vec<LocalVarStmt>,
    pub block: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    /// Multi-catch types (`A | B`).
    pub types: Vec<TypeRef>,
    pub name: String,
    pub name_range: Span,
    pub body: Block,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertStmt {
    pub cond: Expr,
    pub detail: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    TextBlock,
    Bool,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    Inc,
    Dec,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::UShr => ">>>=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Simple or qualified name (`a`, `a.b.c`).
    Name(NameExpr),
    Literal(LiteralExpr),
    /// Message send: `receiver.name(args)` or unqualified `name(args)`.
    Call(CallExpr),
    New(NewExpr),
    ArrayNew(ArrayNewExpr),
    ArrayInit(ArrayInitExpr),
    FieldAccess(FieldAccessExpr),
    ArrayAccess(ArrayAccessExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Assign(AssignExpr),
    Conditional(ConditionalExpr),
    Cast(CastExpr),
    InstanceOf(InstanceOfExpr),
    ClassLiteral(ClassLiteralExpr),
    This(Span),
    Super(Span),
    Paren(ParenExpr),
    /// Sentinel for an expression recovery could not reconstruct.
    Missing(Span),
    /// Completion marker standing in for whatever is being typed at the
    /// cursor. At most one exists per parse.
    Completion(CompletionExpr),
}

impl Expr {
    pub fn range(&self) -> Span {
        match self {
            Expr::Name(e) => e.range,
            Expr::Literal(e) => e.range,
            Expr::Call(e) => e.range,
            Expr::New(e) => e.range,
            Expr::ArrayNew(e) => e.range,
            Expr::ArrayInit(e) => e.range,
            Expr::FieldAccess(e) => e.range,
            Expr::ArrayAccess(e) => e.range,
            Expr::Unary(e) => e.range,
            Expr::Binary(e) => e.range,
            Expr::Assign(e) => e.range,
            Expr::Conditional(e) => e.range,
            Expr::Cast(e) => e.range,
            Expr::InstanceOf(e) => e.range,
            Expr::ClassLiteral(e) => e.range,
            Expr::This(range) | Expr::Super(range) => *range,
            Expr::Paren(e) => e.range,
            Expr::Missing(range) => *range,
            Expr::Completion(e) => e.range,
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, Expr::Completion(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameExpr {
    pub name: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralExpr {
    pub kind: LiteralKind,
    /// Raw source text of the literal (quotes and escapes included).
    pub text: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub receiver: Option<Box<Expr>>,
    pub name: String,
    pub name_range: Span,
    pub args: Vec<Expr>,
    /// False when the argument list was never closed before end of input.
    pub closed: bool,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpr {
    /// Qualifier of a qualified allocation (`outer.new Inner()`).
    pub qualifier: Option<Box<Expr>>,
    pub ty: TypeRef,
    pub args: Vec<Expr>,
    /// Anonymous class body members; populated only under statement
    /// recovery, `Some(vec![])` for an empty body.
    pub anon_body: Option<Vec<MemberDecl>>,
    pub closed: bool,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayNewExpr {
    pub ty: TypeRef,
    /// One entry per dimension; `None` for empty dims (`new int[2][]`).
    pub dims: Vec<Option<Expr>>,
    pub initializer: Option<Box<Expr>>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayInitExpr {
    pub elements: Vec<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccessExpr {
    pub receiver: Box<Expr>,
    pub name: String,
    pub name_range: Span,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayAccessExpr {
    pub array: Box<Expr>,
    pub index: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub postfix: bool,
    pub operand: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignExpr {
    pub op: AssignOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalExpr {
    pub cond: Box<Expr>,
    pub then_expr: Box<Expr>,
    pub else_expr: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastExpr {
    pub ty: TypeRef,
    pub expr: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceOfExpr {
    pub expr: Box<Expr>,
    pub ty: TypeRef,
    /// Pattern binding name (`x instanceof String s`).
    pub binding: Option<String>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLiteralExpr {
    pub ty: TypeRef,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParenExpr {
    pub inner: Box<Expr>,
    pub range: Span,
}

/// Syntactic role of a completion marker. Determines both the reported
/// role and the `<CompleteOnXxx:...>` rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionRole {
    Name,
    Type,
    Class,
    Interface,
    Exception,
    Allocation,
    QualifiedAllocation,
    Label,
    MessageSend,
    FieldName,
    MethodName,
    ClassLiteralAccess,
    Keyword,
    StringLiteral,
}

impl CompletionRole {
    pub fn tag(self) -> &'static str {
        match self {
            CompletionRole::Name => "CompleteOnName",
            CompletionRole::Type => "CompleteOnType",
            CompletionRole::Class => "CompleteOnClass",
            CompletionRole::Interface => "CompleteOnInterface",
            CompletionRole::Exception => "CompleteOnException",
            CompletionRole::Allocation => "CompleteOnAllocationExpression",
            CompletionRole::QualifiedAllocation => "CompleteOnQualifiedAllocationExpression",
            CompletionRole::Label => "CompleteOnLabel",
            CompletionRole::MessageSend => "CompleteOnMessageSend",
            CompletionRole::FieldName => "CompleteOnFieldName",
            CompletionRole::MethodName => "CompleteOnMethodName",
            CompletionRole::ClassLiteralAccess => "CompleteOnClassLiteralAccess",
            CompletionRole::Keyword => "CompleteOnKeyword",
            CompletionRole::StringLiteral => "CompleteOnStringLiteral",
        }
    }
}

/// The completion marker node injected wherever the grammar consumed the
/// synthetic completion token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionExpr {
    pub role: CompletionRole,
    /// Already-typed qualifier rendered before the prefix (`"a."`).
    pub qualifier: String,
    /// Partial identifier typed before the cursor; may be empty.
    pub prefix: String,
    pub range: Span,
}
