//! linchk: a semantic checker for a resource-oriented smart-contract
//! language. Re-exports the entry point and the elaboration types callers
//! need, so most consumers depend on this crate alone rather than reaching
//! into `linchk-common`/`linchk-ast`/`linchk-solver`/`linchk-binder`/
//! `linchk-checker` directly.

pub use linchk_ast::{CompositeDecl, Declaration, Program};
pub use linchk_checker::{check, BoundFunction, CheckResult, ImportResolver, NoImports};
pub use linchk_common::{
    AccessCheckMode, BaseValueActivation, CheckerConfig, Diagnostic, DiagnosticCollector, DiagnosticKind, Hint, Location, ProgramId, Span,
};
pub use linchk_solver::{CompositeType, InterfaceType, Primitive, TypeData, TypeId, TypeRegistry};
