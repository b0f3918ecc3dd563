//! End-to-end fixtures built directly from the worked examples: whole
//! programs run through `check()`, asserting on the resulting diagnostic
//! kinds rather than any intermediate pass's output.

use linchk_ast::{
    AccessModifier, Block, CallArg, CompositeDecl, CompositeKind, Conditions, Declaration, Expr, FieldDecl, FunctionDecl, InitializerDecl,
    InterfaceDecl, MemberDecl, Param, Path, Place, Program, Stmt, TypeAnnotation, VarDecl, Variability,
};
use linchk_common::{CheckerConfig, DiagnosticKind, ProgramId, Span};
use linchk_checker::{check, NoImports};

fn span() -> Span {
    Span::dummy()
}

fn program_with(declarations: Vec<Declaration>, functions: Vec<FunctionDecl>) -> Program {
    Program { id: ProgramId::from("test"), declarations, functions }
}

fn int_returning(name: &str, return_ty: &str, body: Option<Expr>) -> FunctionDecl {
    FunctionDecl {
        name: name.to_string(),
        params: Vec::new(),
        return_ty: TypeAnnotation::nominal(return_ty, span()),
        access: AccessModifier::PublicRead,
        conditions: Conditions::default(),
        body: body.map(|value| Block { statements: vec![Stmt::Return { value: Some(value), span: span() }] }),
        span: span(),
    }
}

/// Scenario 3: `struct interface I { fun f(): Int } struct S: I { fun f():
/// Bool { return true } }` → `{ConformanceError}`. The mismatch is caught by
/// the Conformance Engine comparing declared signatures, not by walking the
/// `return true` body.
#[test]
fn scenario_three_return_type_mismatch_is_a_conformance_error() {
    let iface = InterfaceDecl {
        name: "I".to_string(),
        kind: CompositeKind::Structure,
        supers: Vec::new(),
        members: vec![MemberDecl::Function(int_returning("f", "Int", None))],
        nested: Vec::new(),
        nested_type_requirements: Vec::new(),
        initializer: None,
        span: span(),
    };
    let composite = CompositeDecl {
        name: "S".to_string(),
        kind: CompositeKind::Structure,
        conformances: vec![Path::simple("I", span())],
        members: vec![MemberDecl::Function(int_returning("f", "Bool", Some(Expr::Literal(linchk_ast::Literal::Bool(true), span()))))],
        nested: Vec::new(),
        initializer: None,
        has_destructor: false,
        event_parameters: Vec::new(),
        enum_cases: Vec::new(),
        span: span(),
    };
    let program = program_with(vec![Declaration::Interface(iface), Declaration::Composite(composite)], Vec::new());
    let result = check(&program, &CheckerConfig::default(), &NoImports);
    let diags = result.diagnostics.as_slice();
    assert!(diags.iter().any(|d| d.kind == DiagnosticKind::ConformanceError), "{diags:?}");
}

fn resource_x() -> CompositeDecl {
    CompositeDecl {
        name: "X".to_string(),
        kind: CompositeKind::Resource,
        conformances: Vec::new(),
        members: Vec::new(),
        nested: Vec::new(),
        initializer: None,
        has_destructor: false,
        event_parameters: Vec::new(),
        enum_cases: Vec::new(),
        span: span(),
    }
}

fn create_x() -> Expr {
    Expr::Create { ty: Path::simple("X", span()), args: Vec::new(), span: span() }
}

/// Scenario 4: `resource X {} fun test() { let x <- create X() }` →
/// `{ResourceLossError}`.
#[test]
fn scenario_four_resource_created_and_not_consumed_is_a_resource_loss() {
    let test_fn = FunctionDecl {
        name: "test".to_string(),
        params: Vec::new(),
        return_ty: TypeAnnotation::nominal("Void", span()),
        access: AccessModifier::PublicRead,
        conditions: Conditions::default(),
        body: Some(Block {
            statements: vec![Stmt::VarDecl(VarDecl {
                name: "x".to_string(),
                variability: Variability::Let,
                declared_ty: None,
                is_resource_annotated: false,
                value: Expr::Move { value: Box::new(create_x()), span: span() },
                span: span(),
            })],
        }),
        span: span(),
    };
    let program = program_with(vec![Declaration::Composite(resource_x())], vec![test_fn]);
    let result = check(&program, &CheckerConfig::default(), &NoImports);
    let diags = result.diagnostics.as_slice();
    assert!(diags.iter().any(|d| d.kind == DiagnosticKind::ResourceLossError), "{diags:?}");
}

/// Scenario 5: `resource X {} fun absorb(_ x: @X) { destroy x } fun test() {
/// let x <- create X(); absorb(<-x); absorb(<-x) }` →
/// `{ResourceUseAfterInvalidationError}`. Calling a sibling free function
/// exercises the global-function lookup the Expression Checker needs
/// alongside locals and the symbol table.
#[test]
fn scenario_five_resource_used_after_move_is_use_after_invalidation() {
    let absorb = FunctionDecl {
        name: "absorb".to_string(),
        params: vec![Param {
            label: None,
            name: "x".to_string(),
            ty: TypeAnnotation::nominal("X", span()),
            is_resource_annotated: true,
            span: span(),
        }],
        return_ty: TypeAnnotation::nominal("Void", span()),
        access: AccessModifier::PublicRead,
        conditions: Conditions::default(),
        body: Some(Block {
            statements: vec![Stmt::Destroy { value: Expr::Identifier("x".to_string(), span()), span: span() }],
        }),
        span: span(),
    };
    let absorb_call = |var: &str| {
        Stmt::ExprStmt(Expr::Call {
            callee: Box::new(Expr::Identifier("absorb".to_string(), span())),
            args: vec![CallArg {
                label: None,
                value: Expr::Move { value: Box::new(Expr::Identifier(var.to_string(), span())), span: span() },
            }],
            span: span(),
        })
    };
    let test_fn = FunctionDecl {
        name: "test".to_string(),
        params: Vec::new(),
        return_ty: TypeAnnotation::nominal("Void", span()),
        access: AccessModifier::PublicRead,
        conditions: Conditions::default(),
        body: Some(Block {
            statements: vec![
                Stmt::VarDecl(VarDecl {
                    name: "x".to_string(),
                    variability: Variability::Let,
                    declared_ty: None,
                    is_resource_annotated: false,
                    value: Expr::Move { value: Box::new(create_x()), span: span() },
                    span: span(),
                }),
                absorb_call("x"),
                absorb_call("x"),
            ],
        }),
        span: span(),
    };
    let program = program_with(vec![Declaration::Composite(resource_x())], vec![absorb, test_fn]);
    let result = check(&program, &CheckerConfig::default(), &NoImports);
    let diags = result.diagnostics.as_slice();
    assert!(diags.iter().any(|d| d.kind == DiagnosticKind::ResourceUseAfterInvalidationError), "{diags:?}");
}

/// Scenario 6: `resource R {} struct S { let r: @R; init(r: @R) { self.r <-
/// r } }` → `{InvalidResourceFieldError}` at least.
#[test]
fn scenario_six_resource_field_in_struct_is_invalid() {
    let resource_r = CompositeDecl {
        name: "R".to_string(),
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
    let field_r = MemberDecl::Field(FieldDecl {
        name: "r".to_string(),
        variability: Variability::Let,
        ty: TypeAnnotation::nominal("R", span()),
        is_resource_annotated: true,
        access: AccessModifier::PublicRead,
        span: span(),
    });
    let struct_s = CompositeDecl {
        name: "S".to_string(),
        kind: CompositeKind::Structure,
        conformances: Vec::new(),
        members: vec![field_r],
        nested: Vec::new(),
        initializer: Some(InitializerDecl {
            params: vec![Param {
                label: None,
                name: "r".to_string(),
                ty: TypeAnnotation::nominal("R", span()),
                is_resource_annotated: true,
                span: span(),
            }],
            access: AccessModifier::PublicRead,
            conditions: Conditions::default(),
            body: Some(Block {
                statements: vec![Stmt::Assignment {
                    place: Place::SelfField { field: "r".to_string(), span: span() },
                    value: Expr::Move { value: Box::new(Expr::Identifier("r".to_string(), span())), span: span() },
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
    let program = program_with(vec![Declaration::Composite(resource_r), Declaration::Composite(struct_s)], Vec::new());
    let result = check(&program, &CheckerConfig::default(), &NoImports);
    let diags = result.diagnostics.as_slice();
    assert!(diags.iter().any(|d| d.kind == DiagnosticKind::InvalidResourceFieldError), "{diags:?}");
}

/// Scenario 8: `contract interface T { struct N {} } contract C: T {}` →
/// `{ConformanceError}` (missing nested type requirement).
#[test]
fn scenario_eight_missing_nested_type_requirement_is_a_conformance_error() {
    let nested_requirement = linchk_ast::NestedTypeRequirement {
        name: "N".to_string(),
        kind: CompositeKind::Structure,
        members: Vec::new(),
        required_conformances: Vec::new(),
        span: span(),
    };
    let iface = InterfaceDecl {
        name: "T".to_string(),
        kind: CompositeKind::Contract,
        supers: Vec::new(),
        members: Vec::new(),
        nested: Vec::new(),
        nested_type_requirements: vec![nested_requirement],
        initializer: None,
        span: span(),
    };
    let contract_c = CompositeDecl {
        name: "C".to_string(),
        kind: CompositeKind::Contract,
        conformances: vec![Path::simple("T", span())],
        members: Vec::new(),
        nested: Vec::new(),
        initializer: None,
        has_destructor: false,
        event_parameters: Vec::new(),
        enum_cases: Vec::new(),
        span: span(),
    };
    let program = program_with(vec![Declaration::Interface(iface), Declaration::Composite(contract_c)], Vec::new());
    let result = check(&program, &CheckerConfig::default(), &NoImports);
    let diags = result.diagnostics.as_slice();
    assert!(diags.iter().any(|d| d.kind == DiagnosticKind::ConformanceError), "{diags:?}");
}
