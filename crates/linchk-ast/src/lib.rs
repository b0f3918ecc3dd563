//! The syntax tree contract the checker consumes. The lexer and parser
//! that produce these trees are out of scope (§1) — this crate only fixes
//! the shape they hand to `linchk-checker`.

pub mod decl;
pub mod expr;
pub mod kinds;
pub mod member;
pub mod stmt;
pub mod ty;

pub use decl::{CompositeDecl, Declaration, EnumCase, ImportDecl, InterfaceDecl, NestedTypeRequirement, Program};
pub use expr::{BinaryOp, CallArg, CastKind, Expr, Literal, UnaryOp};
pub use kinds::{AccessModifier, CompositeKind, TransferOperator, Variability};
pub use member::{Conditions, FieldDecl, FunctionDecl, InitializerDecl, MemberDecl, Param};
pub use stmt::{Block, IfLetBinding, IfStmt, Place, Stmt, SwitchCase, SwitchStmt, VarDecl, WhileStmt};
pub use ty::{Path, TypeAnnotation};
