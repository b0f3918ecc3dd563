//! Statements, including the branching and looping constructs the Resource
//! Tracker forks and merges state across.

use crate::expr::Expr;
use crate::kinds::Variability;
use crate::ty::TypeAnnotation;
use linchk_common::Span;

#[derive(Clone, Debug, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Clone, Debug)]
pub struct VarDecl {
    pub name: String,
    pub variability: Variability,
    pub declared_ty: Option<TypeAnnotation>,
    /// Whether `declared_ty` was written with the `@` resource sigil in
    /// source. Meaningless when `declared_ty` is `None` (the declared type
    /// is then inferred, and has no written annotation to check).
    pub is_resource_annotated: bool,
    pub value: Expr,
    pub span: Span,
}

/// An l-value: the subset of expressions that can appear on the left of an
/// assignment or swap. Kept distinct from `Expr` so the checker does not
/// need to re-derive "is this assignable" from the full expression grammar.
#[derive(Clone, Debug)]
pub enum Place {
    Identifier(String, Span),
    SelfField { field: String, span: Span },
    Member { receiver: Box<Expr>, member: String, span: Span },
    Index { receiver: Box<Expr>, index: Box<Expr>, span: Span },
}

impl Place {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Place::Identifier(_, s)
            | Place::SelfField { span: s, .. }
            | Place::Member { span: s, .. }
            | Place::Index { span: s, .. } => *s,
        }
    }
}

#[derive(Clone, Debug)]
pub struct IfLetBinding {
    pub name: String,
    /// The source expression, typically a failable downcast
    /// (`e as? @T`) but also a plain optional for non-resource binding.
    pub value: Expr,
    pub then_block: Block,
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    /// `None` represents the `default` case.
    pub pattern: Option<Expr>,
    pub body: Block,
}

#[derive(Clone, Debug)]
pub struct SwitchStmt {
    pub subject: Expr,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    VarDecl(VarDecl),
    Assignment { place: Place, value: Expr, span: Span },
    /// `a <-> b`
    Swap { left: Place, right: Place, span: Span },
    ExprStmt(Expr),
    Return { value: Option<Expr>, span: Span },
    If(IfStmt),
    IfLet(IfLetBinding),
    While(WhileStmt),
    Switch(SwitchStmt),
    Break(Span),
    Continue(Span),
    /// `destroy e` as a standalone statement (the common case; `destroy`
    /// may also appear as an `Expr::Destroy` nested in other positions per
    /// the grammar, but statement position is where the Resource Tracker
    /// most often observes it).
    Destroy { value: Expr, span: Span },
    Block(Block),
}

impl Stmt {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(v) => v.span,
            Stmt::Assignment { span, .. }
            | Stmt::Swap { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break(span)
            | Stmt::Continue(span)
            | Stmt::Destroy { span, .. } => *span,
            Stmt::ExprStmt(e) => e.span(),
            Stmt::If(i) => i.span,
            Stmt::IfLet(i) => i.span,
            Stmt::While(w) => w.span,
            Stmt::Switch(s) => s.span,
            Stmt::Block(b) => b.statements.first().map_or(Span::dummy(), Stmt::span),
        }
    }
}
