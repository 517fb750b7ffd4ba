//! AST interface consumed by the middle end (spec §3.3, §6.1).
//!
//! Scanning and parsing are out of scope for this crate; a real pipeline's
//! parser produces exactly this shape and hands it to [`crate::checker::Checker`].
//! The definitions below are a flat, index-addressed pool so the checker,
//! lowerer, and SSA builder can all reference nodes by a small `Copy` handle
//! instead of holding borrows into a tree. `serde` derives let the `middlec`
//! CLI (see `main.rs`) deserialize an externally produced AST from JSON.

use serde::{Deserialize, Serialize};

/// Address of a node in an [`Ast`]'s flat pool. [`NodeIndex::NULL`] denotes
/// absence (e.g. a function with no declared return type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NULL: NodeIndex = NodeIndex(u32::MAX);

    pub fn is_null(self) -> bool {
        self == NodeIndex::NULL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExprKind {
    Named(String),
    Pointer(Box<TypeExprKind>),
    Optional(Box<TypeExprKind>),
    ErrorUnion(Box<TypeExprKind>),
    Slice(Box<TypeExprKind>),
    Array { size: u64, elem: Box<TypeExprKind> },
    Map { key: Box<TypeExprKind>, value: Box<TypeExprKind> },
    List(Box<TypeExprKind>),
    Function {
        params: Vec<TypeExprKind>,
        ret: Option<Box<TypeExprKind>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_expr: TypeExprKind,
    pub default_value: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariantSyntax {
    pub name: String,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructFieldSyntax {
    pub name: String,
    pub type_expr: TypeExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionVariantSyntax {
    pub name: String,
    /// `None` for a unit variant.
    pub payload: Option<TypeExprKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    FnDecl {
        name: String,
        params: Vec<Param>,
        return_type: Option<TypeExprKind>,
        body: Option<NodeIndex>,
        is_extern: bool,
    },
    VarDecl {
        name: String,
        type_expr: Option<TypeExprKind>,
        value: Option<NodeIndex>,
        is_const: bool,
    },
    StructDecl {
        name: String,
        fields: Vec<StructFieldSyntax>,
    },
    EnumDecl {
        name: String,
        backing_type: Option<TypeExprKind>,
        variants: Vec<EnumVariantSyntax>,
    },
    UnionDecl {
        name: String,
        variants: Vec<UnionVariantSyntax>,
    },
    TypeAlias {
        name: String,
        target: TypeExprKind,
    },
    ImportDecl {
        path: String,
    },
    ImplBlock {
        type_name: String,
        methods: Vec<NodeIndex>,
    },
    TestDecl {
        name: String,
        body: NodeIndex,
    },
    BadDecl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Return { value: Option<NodeIndex> },
    Var {
        name: String,
        type_expr: Option<TypeExprKind>,
        value: Option<NodeIndex>,
        is_const: bool,
    },
    Assign {
        target: NodeIndex,
        op: AssignOp,
        value: NodeIndex,
    },
    If {
        cond: NodeIndex,
        then_block: NodeIndex,
        else_block: Option<NodeIndex>,
    },
    While {
        cond: NodeIndex,
        body: NodeIndex,
    },
    For {
        binding: String,
        iterable: NodeIndex,
        body: NodeIndex,
    },
    Block { stmts: Vec<NodeIndex> },
    Break,
    Continue,
    Defer { expr: NodeIndex },
    Expr { expr: NodeIndex },
    BadStmt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
    Char(u8),
    True,
    False,
    Null,
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseArm {
    pub patterns: Vec<NodeIndex>,
    pub capture: Option<String>,
    pub body: NodeIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructInitField {
    pub name: String,
    pub value: NodeIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterpSegment {
    Text(String),
    Expr(NodeIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinName {
    SizeOf,
    AlignOf,
    StringMake,
    IntCast,
    PtrCast,
    PtrToInt,
    IntToPtr,
    Assert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(String),
    Literal(LiteralValue),
    Binary {
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    Unary {
        op: UnaryOp,
        operand: NodeIndex,
    },
    Call {
        callee: NodeIndex,
        args: Vec<NodeIndex>,
    },
    /// `print`/`println`/`eprint`/`eprintln` are syntactically calls in most
    /// front ends, but the checker treats them specially (spec §4.3); they
    /// get their own node so a reimplementation need not special-case a
    /// `Call` whose callee is a magic identifier.
    PrintCall {
        kind: PrintKind,
        arg: NodeIndex,
    },
    LenCall { arg: NodeIndex },
    BuiltinCall {
        name: BuiltinName,
        type_arg: Option<TypeExprKind>,
        args: Vec<NodeIndex>,
    },
    Index { base: NodeIndex, index: NodeIndex },
    SliceExpr {
        base: NodeIndex,
        start: Option<NodeIndex>,
        end: Option<NodeIndex>,
    },
    /// `base` is absent for an inferred `.Variant` pattern inside `switch`.
    FieldAccess {
        base: Option<NodeIndex>,
        field: String,
    },
    ArrayLiteral { elements: Vec<NodeIndex> },
    Paren(NodeIndex),
    IfExpr {
        cond: NodeIndex,
        then_expr: NodeIndex,
        else_expr: Option<NodeIndex>,
    },
    SwitchExpr {
        subject: NodeIndex,
        cases: Vec<CaseArm>,
        else_body: Option<NodeIndex>,
    },
    BlockExpr {
        stmts: Vec<NodeIndex>,
        expr: Option<NodeIndex>,
    },
    StructInit {
        type_name: String,
        fields: Vec<StructInitField>,
    },
    NewExpr { type_node: TypeExprKind },
    StringInterp { segments: Vec<InterpSegment> },
    AddrOf(NodeIndex),
    Deref(NodeIndex),
    /// `x.?` postfix optional-unwrap.
    OptUnwrap(NodeIndex),
    TypeExpr(TypeExprKind),
    BadExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintKind {
    Print,
    Println,
    EPrint,
    EPrintln,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Decl(Decl),
    Stmt(Stmt),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Flat pool of AST nodes. All cross-references inside `kind` are
/// [`NodeIndex`] handles into this same pool (spec §3.3).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Ast { nodes: Vec::new() }
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        idx
    }

    pub fn get(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.0 as usize]
    }

    pub fn as_decl(&self, idx: NodeIndex) -> Option<&Decl> {
        match &self.get(idx).kind {
            NodeKind::Decl(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_stmt(&self, idx: NodeIndex) -> Option<&Stmt> {
        match &self.get(idx).kind {
            NodeKind::Stmt(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_expr(&self, idx: NodeIndex) -> Option<&Expr> {
        match &self.get(idx).kind {
            NodeKind::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn span(&self, idx: NodeIndex) -> Span {
        self.get(idx).span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A whole source file: includes aren't modeled (out of scope — resolved
/// before the checker ever sees the program), so a `Program` is simply an
/// ordered list of top-level declarations plus the node pool that owns
/// their contents.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Program {
    pub ast: Ast,
    pub decls: Vec<NodeIndex>,
}

/// Convenience constructors used by tests (and, in spirit, by the
/// out-of-scope parser) to build an [`Ast`] by hand without a concrete
/// grammar, mirroring the teacher's hand-built `WordDef`/`Program` test
/// fixtures in `typechecker.rs`/`resolver.rs`.
pub struct AstBuilder {
    pub ast: Ast,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        AstBuilder { ast: Ast::new() }
    }

    pub fn push_expr(&mut self, expr: Expr) -> NodeIndex {
        self.ast.push(NodeKind::Expr(expr), Span::default())
    }

    pub fn push_stmt(&mut self, stmt: Stmt) -> NodeIndex {
        self.ast.push(NodeKind::Stmt(stmt), Span::default())
    }

    pub fn push_decl(&mut self, decl: Decl) -> NodeIndex {
        self.ast.push(NodeKind::Decl(decl), Span::default())
    }

    pub fn int_lit(&mut self, v: i64) -> NodeIndex {
        self.push_expr(Expr::Literal(LiteralValue::Int(v)))
    }

    pub fn bool_lit(&mut self, v: bool) -> NodeIndex {
        self.push_expr(Expr::Literal(if v { LiteralValue::True } else { LiteralValue::False }))
    }

    pub fn ident(&mut self, name: impl Into<String>) -> NodeIndex {
        self.push_expr(Expr::Ident(name.into()))
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.push_expr(Expr::Binary { op, left, right })
    }

    pub fn block(&mut self, stmts: Vec<NodeIndex>) -> NodeIndex {
        self.push_stmt(Stmt::Block { stmts })
    }

    pub fn ret(&mut self, value: Option<NodeIndex>) -> NodeIndex {
        self.push_stmt(Stmt::Return { value })
    }

    pub fn expr_stmt(&mut self, expr: NodeIndex) -> NodeIndex {
        self.push_stmt(Stmt::Expr { expr })
    }

    pub fn fn_decl(
        &mut self,
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: Option<TypeExprKind>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.push_decl(Decl::FnDecl {
            name: name.into(),
            params,
            return_type,
            body: Some(body),
            is_extern: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_pool_indices_are_stable() {
        let mut ast = Ast::new();
        let a = ast.push(NodeKind::Expr(Expr::Literal(LiteralValue::Int(1))), Span::default());
        let b = ast.push(NodeKind::Expr(Expr::Literal(LiteralValue::Int(2))), Span::default());
        assert_eq!(a.0, 0);
        assert_eq!(b.0, 1);
        assert_eq!(ast.as_expr(a), Some(&Expr::Literal(LiteralValue::Int(1))));
    }

    #[test]
    fn null_node_is_distinct() {
        assert!(NodeIndex::NULL.is_null());
        assert!(!NodeIndex(0).is_null());
    }

    #[test]
    fn variant_accessors_discriminate_kinds() {
        let mut ast = Ast::new();
        let expr = ast.push(NodeKind::Expr(Expr::Ident("x".to_string())), Span::default());
        let stmt = ast.push(NodeKind::Stmt(Stmt::Break), Span::default());
        assert!(ast.as_expr(expr).is_some());
        assert!(ast.as_stmt(expr).is_none());
        assert!(ast.as_stmt(stmt).is_some());
        assert!(ast.as_decl(stmt).is_none());
    }

    #[test]
    fn ast_round_trips_through_json() {
        let mut b = AstBuilder::new();
        let lit = b.int_lit(42);
        let ret = b.ret(Some(lit));
        let body = b.block(vec![ret]);
        let decl = b.fn_decl("answer", vec![], Some(TypeExprKind::Named("i64".to_string())), body);
        let program = Program {
            ast: b.ast,
            decls: vec![decl],
        };
        let json = serde_json::to_string(&program).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(back.decls.len(), 1);
        assert!(matches!(
            back.ast.as_decl(back.decls[0]),
            Some(Decl::FnDecl { name, .. }) if name == "answer"
        ));
    }
}
