//! Top-level entry point (§6): wires the Declaration Resolver, Member
//! Binder, Conformance Engine, Placement Checker, and Expression/Statement
//! Checker together in pipeline order and returns the accumulated
//! diagnostics.

use crate::functions::collect_functions;
use crate::placement::check_placement;
use crate::statements::check_function;
use linchk_ast::Program;
use linchk_binder::{bind_program, resolve_program, SymbolTable};
use linchk_common::{CheckerConfig, DiagnosticCollector, DiagnosticKind, Location, ProgramId, Span};
use linchk_solver::TypeRegistry;

/// Callback the host environment supplies to resolve an `import` statement
/// (§1, §7): given the imported program's id, returns the `TypeRegistry`
/// already produced by checking it, or `None` if that program is unknown.
/// Import resolution itself (fetching and checking the imported program)
/// stays outside this crate; only the boundary condition — a missing or
/// unresolvable import is an `ImportError`, not a panic — is handled here.
pub trait ImportResolver {
    fn resolve(&self, target: &ProgramId) -> Option<()>;
}

/// An `ImportResolver` that never finds anything, for programs known to
/// have no imports (most end-to-end test fixtures).
pub struct NoImports;

impl ImportResolver for NoImports {
    fn resolve(&self, _target: &ProgramId) -> Option<()> {
        None
    }
}

/// The result of a single `check()` call: the populated type registry (the
/// "elaboration" callers can inspect or hand to a downstream tool) plus
/// every diagnostic recorded across all passes.
pub struct CheckResult {
    pub registry: TypeRegistry,
    pub symbols: SymbolTable,
    pub diagnostics: DiagnosticCollector,
}

/// Runs every pass of the checker over `program` and returns the full
/// elaboration plus diagnostics. Passes run in a fixed order; a pass that
/// depends on a prior pass's output (e.g. conformance checking needs
/// member tables) only sees the partial results recorded so far, matching
/// how a single forward pipeline accumulates diagnostics without ever
/// discarding a program for containing them (§5: non-fatal diagnostics).
pub fn check(program: &Program, config: &CheckerConfig, import_resolver: &dyn ImportResolver) -> CheckResult {
    let _span = tracing::info_span!("check", program = %program.id).entered();

    let mut registry = TypeRegistry::new();
    let mut symbols = SymbolTable::new();
    let mut diagnostics = DiagnosticCollector::new();
    let root = symbols.root();

    for import in program.declarations.iter().filter_map(|d| match d {
        linchk_ast::Declaration::Import(i) => Some(i),
        _ => None,
    }) {
        if import_resolver.resolve(&import.target).is_none() {
            diagnostics.report(
                DiagnosticKind::ImportError,
                format!("cannot resolve import '{}'", import.target),
                Location::new(program.id.clone(), import.span),
            );
        }
    }

    let scopes = resolve_program(&mut registry, &mut symbols, &mut diagnostics, &program.id, root, &program.declarations);

    bind_program(&mut registry, &symbols, &mut diagnostics, config, &program.id, root, &program.declarations, &scopes);

    crate::conformance::check_conformance(&mut registry, &mut diagnostics, &program.id, config);

    check_placement(&registry, &mut diagnostics, &program.id);

    let bound_functions =
        collect_functions(&mut registry, &symbols, &mut diagnostics, &program.id, root, &program.declarations, &program.functions, &scopes);

    // Free functions have no symbol-table entry (only composites/interfaces
    // do), so a bare-identifier call to one is resolved through this map
    // instead, built once before any body is walked.
    let mut globals = rustc_hash::FxHashMap::default();
    for bound in &bound_functions {
        if bound.self_type.is_none() {
            let ty = linchk_solver::registry::function_type_of(&mut registry, &bound.signature);
            globals.insert(bound.name.clone(), ty);
        }
    }

    for bound in &bound_functions {
        check_function(&mut registry, &symbols, &mut diagnostics, &program.id, &globals, bound);
    }

    CheckResult { registry, symbols, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linchk_ast::{
        AccessModifier, CallArg, CompositeDecl, CompositeKind, Conditions, Declaration, Expr, FieldDecl, FunctionDecl, InitializerDecl,
        MemberDecl, Param, Place, Stmt, TypeAnnotation, VarDecl, Variability,
    };

    fn span() -> Span {
        Span::dummy()
    }

    fn program_with(declarations: Vec<Declaration>, functions: Vec<FunctionDecl>) -> Program {
        Program { id: ProgramId::from("test"), declarations, functions }
    }

    #[test]
    fn empty_program_has_no_diagnostics() {
        let program = program_with(Vec::new(), Vec::new());
        let result = check(&program, &CheckerConfig::default(), &NoImports);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn moving_a_resource_field_twice_is_a_use_after_invalidation() {
        // resource Vault {}
        // resource Holder {
        //     var vault: @Vault
        //     init(vault: @Vault) { self.vault <- vault }
        //     fun drainTwice() {
        //         let a <- self.vault
        //         let b <- self.vault
        //     }
        // }
        let vault = CompositeDecl {
            name: "Vault".to_string(),
            kind: CompositeKind::Resource,
            conformances: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
            initializer: None,
            has_destructor: false,
            event_parameters: Vec::new(),
            enum_cases: Vec::new(),
            span: span(),
        };

        let field = MemberDecl::Field(FieldDecl {
            name: "vault".to_string(),
            variability: Variability::Var,
            ty: TypeAnnotation::nominal("Vault", span()),
            is_resource_annotated: true,
            access: AccessModifier::PublicRead,
            span: span(),
        });

        let drain_twice = MemberDecl::Function(FunctionDecl {
            name: "drainTwice".to_string(),
            params: Vec::new(),
            return_ty: TypeAnnotation::nominal("Void", span()),
            access: AccessModifier::PublicRead,
            conditions: Conditions::default(),
            body: Some(linchk_ast::Block {
                statements: vec![
                    Stmt::VarDecl(VarDecl {
                        name: "a".to_string(),
                        variability: Variability::Let,
                        declared_ty: None,
                        is_resource_annotated: false,
                        value: Expr::Move {
                            value: Box::new(Expr::MemberAccess {
                                receiver: Box::new(Expr::SelfExpr(span())),
                                member: "vault".to_string(),
                                span: span(),
                            }),
                            span: span(),
                        },
                        span: span(),
                    }),
                    Stmt::VarDecl(VarDecl {
                        name: "b".to_string(),
                        variability: Variability::Let,
                        declared_ty: None,
                        is_resource_annotated: false,
                        value: Expr::Move {
                            value: Box::new(Expr::MemberAccess {
                                receiver: Box::new(Expr::SelfExpr(span())),
                                member: "vault".to_string(),
                                span: span(),
                            }),
                            span: span(),
                        },
                        span: span(),
                    }),
                    Stmt::Destroy { value: Expr::Identifier("a".to_string(), span()), span: span() },
                    Stmt::Destroy { value: Expr::Identifier("b".to_string(), span()), span: span() },
                ],
            }),
            span: span(),
        });

        let holder = CompositeDecl {
            name: "Holder".to_string(),
            kind: CompositeKind::Resource,
            conformances: Vec::new(),
            members: vec![field, drain_twice],
            nested: Vec::new(),
            initializer: Some(InitializerDecl {
                params: vec![Param {
                    label: None,
                    name: "vault".to_string(),
                    ty: TypeAnnotation::nominal("Vault", span()),
                    is_resource_annotated: true,
                    span: span(),
                }],
                access: AccessModifier::PublicRead,
                conditions: Conditions::default(),
                body: Some(linchk_ast::Block {
                    statements: vec![Stmt::Assignment {
                        place: Place::SelfField { field: "vault".to_string(), span: span() },
                        value: Expr::Move { value: Box::new(Expr::Identifier("vault".to_string(), span())), span: span() },
                        span: span(),
                    }],
                }),
                span: span(),
            }),
            has_destructor: false,
            event_parameters: Vec::new(),
            enum_cases: Vec::new(),
            span: span(),
        };

        let program = program_with(vec![Declaration::Composite(vault), Declaration::Composite(holder)], Vec::new());
        let result = check(&program, &CheckerConfig::default(), &NoImports);
        let diags = result.diagnostics.as_slice();
        assert!(
            diags.iter().any(|d| d.kind == DiagnosticKind::ResourceUseAfterInvalidationError),
            "expected a use-after-invalidation diagnostic, got {diags:?}"
        );
    }

    #[test]
    fn creating_a_structure_with_create_is_rejected() {
        let point = CompositeDecl {
            name: "Point".to_string(),
            kind: CompositeKind::Structure,
            conformances: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
            initializer: Some(InitializerDecl {
                params: Vec::new(),
                access: AccessModifier::PublicRead,
                conditions: Conditions::default(),
                body: Some(linchk_ast::Block::default()),
                span: span(),
            }),
            has_destructor: false,
            event_parameters: Vec::new(),
            enum_cases: Vec::new(),
            span: span(),
        };

        let main = FunctionDecl {
            name: "main".to_string(),
            params: Vec::new(),
            return_ty: TypeAnnotation::nominal("Void", span()),
            access: AccessModifier::PublicRead,
            conditions: Conditions::default(),
            body: Some(linchk_ast::Block {
                statements: vec![Stmt::ExprStmt(Expr::Create {
                    ty: linchk_ast::Path::simple("Point", span()),
                    args: Vec::<CallArg>::new(),
                    span: span(),
                })],
            }),
            span: span(),
        };

        let program = program_with(vec![Declaration::Composite(point)], vec![main]);
        let result = check(&program, &CheckerConfig::default(), &NoImports);
        let diags = result.diagnostics.as_slice();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::InvalidConstructionError), "{diags:?}");
    }

    #[test]
    fn unresolved_import_is_reported() {
        let import = linchk_ast::ImportDecl { target: ProgramId::from("Missing"), names: Vec::new(), span: span() };
        let program = program_with(vec![Declaration::Import(import)], Vec::new());
        let result = check(&program, &CheckerConfig::default(), &NoImports);
        assert!(result.diagnostics.as_slice().iter().any(|d| d.kind == DiagnosticKind::ImportError));
    }
}
