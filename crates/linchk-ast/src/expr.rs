//! Expressions. Transfer operators (`<-` move, bare copy) are represented
//! explicitly on the constructs where the grammar requires them, rather
//! than inferred — the Expression Checker validates the written operator
//! against `default_transfer(type)`.

use crate::kinds::TransferOperator;
use crate::ty::Path;
use linchk_common::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    And,
    Or,
    Less,
    Greater,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

/// The three cast forms: static (`as`), failable (`as?`), and forced
/// (`as!`). Only the failable form interacts with the optional-binding
/// requirement in §4.6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastKind {
    Static,
    Failable,
    Forced,
}

#[derive(Clone, Debug)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
    Void,
}

#[derive(Clone, Debug)]
pub enum Expr {
    Literal(Literal, Span),
    /// A bare identifier reference (variable, parameter, or nominal value
    /// such as an enum case accessed without a receiver).
    Identifier(String, Span),
    /// `self`, usable only inside a composite member body.
    SelfExpr(Span),
    /// `receiver.member`
    MemberAccess { receiver: Box<Expr>, member: String, span: Span },
    /// `receiver[index]`
    Index { receiver: Box<Expr>, index: Box<Expr>, span: Span },
    /// `callee(args)`, where each argument carries its own transfer and
    /// optional label.
    Call { callee: Box<Expr>, args: Vec<CallArg>, span: Span },
    /// `create T(args)`
    Create { ty: Path, args: Vec<CallArg>, span: Span },
    /// `destroy e` is modeled as an expression so it can appear in both
    /// statement and (for `if let`) binding position, matching how the
    /// specification discusses it alongside other transfer operations.
    Destroy { value: Box<Expr>, span: Span },
    /// `<-e` — explicit move transfer applied to a sub-expression.
    Move { value: Box<Expr>, span: Span },
    /// An expression with no explicit transfer operator written; the
    /// checker infers `TransferOperator::Copy` is what was written and
    /// validates it against the value's type.
    Bare { value: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr>, span: Span },
    Unary { op: UnaryOp, operand: Box<Expr>, span: Span },
    Cast { kind: CastKind, value: Box<Expr>, ty: crate::ty::TypeAnnotation, span: Span },
    ArrayLiteral { elements: Vec<Expr>, span: Span },
    DictionaryLiteral { entries: Vec<(Expr, Expr)>, span: Span },
    /// A binding of a resource-typed method as a first-class value, e.g.
    /// `let f = resourceValue.method` without a call — illegal per §4.6,
    /// represented explicitly rather than inferred from a `Call` that
    /// never happens so the checker can flag it directly.
    MethodBinding { receiver: Box<Expr>, member: String, span: Span },
}

impl Expr {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, s)
            | Expr::Identifier(_, s)
            | Expr::SelfExpr(s)
            | Expr::MemberAccess { span: s, .. }
            | Expr::Index { span: s, .. }
            | Expr::Call { span: s, .. }
            | Expr::Create { span: s, .. }
            | Expr::Destroy { span: s, .. }
            | Expr::Move { span: s, .. }
            | Expr::Binary { span: s, .. }
            | Expr::Unary { span: s, .. }
            | Expr::Cast { span: s, .. }
            | Expr::ArrayLiteral { span: s, .. }
            | Expr::DictionaryLiteral { span: s, .. }
            | Expr::MethodBinding { span: s, .. } => *s,
            Expr::Bare { value } => value.span(),
        }
    }

    /// The transfer operator as written: `Move` if wrapped in `Expr::Move`,
    /// `Copy` otherwise. Used by the Expression Checker to validate against
    /// `default_transfer(type)`.
    #[must_use]
    pub fn written_transfer(&self) -> TransferOperator {
        match self {
            Expr::Move { .. } => TransferOperator::Move,
            _ => TransferOperator::Copy,
        }
    }

    #[must_use]
    pub fn unwrap_transfer(&self) -> &Expr {
        match self {
            Expr::Move { value, .. } => value,
            Expr::Bare { value } => value,
            other => other,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CallArg {
    pub label: Option<String>,
    pub value: Expr,
}
