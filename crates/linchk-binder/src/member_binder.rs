//! The Member Binder (§4.3): turns the syntax tree's field/function
//! declarations into `MemberTable` entries on the already-shelled composite
//! and interface types, resolving every declared type annotation along the
//! way.

use crate::resolver::DeclarationScopes;
use crate::symbol::{ScopeId, SymbolTable};
use crate::type_resolve::{resolve_type, TypeResolveCx};
use linchk_ast::{CompositeDecl, Declaration, InterfaceDecl, MemberDecl};
use linchk_common::{CheckerConfig, DiagnosticCollector, DiagnosticKind, Location, ProgramId};
use linchk_solver::{registry::function_type_of, FunctionSig, Member, MemberKind, ParamSig, TypeRegistry};

pub fn bind_program(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    config: &CheckerConfig,
    program: &ProgramId,
    root: ScopeId,
    declarations: &[Declaration],
    scopes: &DeclarationScopes,
) {
    let _span = tracing::debug_span!("member_binder", program = %program).entered();
    for decl in declarations {
        match decl {
            Declaration::Composite(c) => bind_composite(registry, symbols, diagnostics, config, program, root, c, scopes),
            Declaration::Interface(i) => bind_interface(registry, symbols, diagnostics, config, program, root, i, scopes),
            Declaration::Import(_) => {}
        }
    }
}

fn bind_composite(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    config: &CheckerConfig,
    program: &ProgramId,
    scope: ScopeId,
    decl: &CompositeDecl,
    scopes: &DeclarationScopes,
) {
    let Some(type_id) = symbols.lookup_local(scope, &decl.name).map(|id| symbols.symbol(id).type_id) else {
        return;
    };

    for member in &decl.members {
        let bound = bind_member(registry, symbols, diagnostics, program, scope, member);
        let (has_body, is_function) = match member {
            MemberDecl::Function(f) => (f.has_body(), true),
            MemberDecl::Field(_) => (true, false),
        };
        if is_function && !has_body {
            diagnostics.report(
                DiagnosticKind::InvalidImplementationError,
                format!("'{}' must have a body; composite functions cannot be abstract", member.name()),
                Location::new(program.clone(), member.span()),
            );
        }
        if let Some(composite) = registry.composite_mut(type_id) {
            composite.members.insert(bound);
        }
    }

    if let Some(init) = &decl.initializer {
        let sig = bind_signature(registry, symbols, diagnostics, program, scope, &init.params, None);
        if init.body.is_none() {
            diagnostics.report(
                DiagnosticKind::InvalidImplementationError,
                "composite initializers must have a body".to_string(),
                Location::new(program.clone(), init.span),
            );
        }
        if let Some(composite) = registry.composite_mut(type_id) {
            composite.initializer = Some(sig);
        }
    }

    if let Some(composite) = registry.composite_mut(type_id) {
        composite.has_destructor = decl.has_destructor;
    }

    if let Some(&child_scope) = scopes.scope_of.get(&type_id) {
        bind_program(registry, symbols, diagnostics, config, program, child_scope, &decl.nested, scopes);
    }
}

fn bind_interface(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    config: &CheckerConfig,
    program: &ProgramId,
    scope: ScopeId,
    decl: &InterfaceDecl,
    scopes: &DeclarationScopes,
) {
    let Some(type_id) = symbols.lookup_local(scope, &decl.name).map(|id| symbols.symbol(id).type_id) else {
        return;
    };

    for member in &decl.members {
        let bound = bind_member(registry, symbols, diagnostics, program, scope, member);
        if let MemberDecl::Function(f) = member {
            // A function body on an interface member is only legal as a
            // default implementation, gated by the same config flag that
            // governs default-implementation conflict resolution (§4.4
            // rule 6, §9).
            if f.has_body() && !config.default_implementations_enabled {
                diagnostics.report(
                    DiagnosticKind::InvalidImplementationError,
                    format!(
                        "'{}' may not declare a body; default implementations are disabled",
                        f.name
                    ),
                    Location::new(program.clone(), f.span),
                );
            }
        }
        if let Some(iface) = registry.interface_mut(type_id) {
            iface.members.insert(bound);
        }
    }

    if let Some(init) = &decl.initializer {
        let sig = bind_signature(registry, symbols, diagnostics, program, scope, &init.params, None);
        if init.body.is_some() && !config.default_implementations_enabled {
            diagnostics.report(
                DiagnosticKind::InvalidImplementationError,
                "interface initializers may not declare a body; default implementations are disabled".to_string(),
                Location::new(program.clone(), init.span),
            );
        }
        if let Some(iface) = registry.interface_mut(type_id) {
            iface.initializer = Some(sig);
        }
    }

    // Nested type requirements carry their own member obligation list,
    // resolved against the interface's own scope so sibling nested types
    // can be referenced.
    let requirement_members: Vec<(String, Vec<Member>)> = decl
        .nested_type_requirements
        .iter()
        .map(|req| {
            let members = req
                .members
                .iter()
                .map(|m| bind_member(registry, symbols, diagnostics, program, scope, m))
                .collect();
            (req.name.clone(), members)
        })
        .collect();
    if let Some(iface) = registry.interface_mut(type_id) {
        for (name, members) in requirement_members {
            if let Some(requirement) = iface.nested_type_requirements.get_mut(&name) {
                for member in members {
                    requirement.members.insert(member);
                }
            }
        }
    }

    if let Some(&child_scope) = scopes.scope_of.get(&type_id) {
        bind_program(registry, symbols, diagnostics, config, program, child_scope, &decl.nested, scopes);
    }
}

fn bind_member(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    member: &MemberDecl,
) -> Member {
    match member {
        MemberDecl::Field(field) => {
            let mut cx = TypeResolveCx { registry, symbols, diagnostics, program: program.clone() };
            let ty = resolve_type(&mut cx, scope, &field.ty);
            Member {
                name: field.name.clone(),
                kind: MemberKind::Field { variability: field.variability },
                ty,
                access: field.access,
                declared_at: field.span,
            }
        }
        MemberDecl::Function(func) => {
            let sig = bind_signature(registry, symbols, diagnostics, program, scope, &func.params, Some(&func.return_ty));
            let ty = function_type_of(registry, &sig);
            Member {
                name: func.name.clone(),
                kind: MemberKind::Function {
                    signature: sig,
                    has_body: func.has_body(),
                    conditions: func.conditions,
                    default_source: None,
                },
                ty,
                access: func.access,
                declared_at: func.span,
            }
        }
    }
}

fn bind_signature(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    params: &[linchk_ast::Param],
    return_ty: Option<&linchk_ast::TypeAnnotation>,
) -> FunctionSig {
    let mut cx = TypeResolveCx { registry, symbols, diagnostics, program: program.clone() };
    let param_sigs = params
        .iter()
        .map(|p| ParamSig { label: p.label.clone(), name: p.name.clone(), ty: resolve_type(&mut cx, scope, &p.ty) })
        .collect();
    let return_ty = match return_ty {
        Some(ty) => resolve_type(&mut cx, scope, ty),
        None => cx.registry.intern_primitive(linchk_solver::Primitive::Void),
    };
    FunctionSig { params: param_sigs, return_ty }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve_program;
    use linchk_ast::{AccessModifier, CompositeKind, FieldDecl, FunctionDecl, Variability};
    use linchk_common::{CheckerConfig, Span};

    fn span() -> Span {
        Span::dummy()
    }

    fn int_field(name: &str) -> MemberDecl {
        MemberDecl::Field(FieldDecl {
            name: name.to_string(),
            variability: Variability::Let,
            ty: linchk_ast::TypeAnnotation::nominal("Int", span()),
            is_resource_annotated: false,
            access: AccessModifier::PublicRead,
            span: span(),
        })
    }

    fn abstract_function(name: &str) -> MemberDecl {
        MemberDecl::Function(FunctionDecl {
            name: name.to_string(),
            params: Vec::new(),
            return_ty: linchk_ast::TypeAnnotation::nominal("Void", span()),
            access: AccessModifier::PublicRead,
            conditions: linchk_ast::Conditions::default(),
            body: None,
            span: span(),
        })
    }

    #[test]
    fn composite_function_without_body_is_rejected() {
        let mut registry = TypeRegistry::new();
        let mut symbols = SymbolTable::new();
        let mut diagnostics = DiagnosticCollector::new();
        let config = CheckerConfig::default();
        let program = ProgramId::from("test");
        let decl = CompositeDecl {
            name: "Widget".to_string(),
            kind: CompositeKind::Structure,
            conformances: Vec::new(),
            members: vec![int_field("amount"), abstract_function("noop")],
            nested: Vec::new(),
            initializer: None,
            has_destructor: false,
            event_parameters: Vec::new(),
            enum_cases: Vec::new(),
            span: span(),
        };
        let decls = vec![Declaration::Composite(decl)];
        let root = symbols.root();
        let scopes = resolve_program(&mut registry, &mut symbols, &mut diagnostics, &program, root, &decls);
        bind_program(&mut registry, &symbols, &mut diagnostics, &config, &program, root, &decls, &scopes);
        let diags = diagnostics.into_vec();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::InvalidImplementationError));
    }

    #[test]
    fn interface_function_body_allowed_by_default() {
        let mut registry = TypeRegistry::new();
        let mut symbols = SymbolTable::new();
        let mut diagnostics = DiagnosticCollector::new();
        let config = CheckerConfig::default();
        let program = ProgramId::from("test");
        let decl = InterfaceDecl {
            name: "HasAmount".to_string(),
            kind: CompositeKind::Structure,
            supers: Vec::new(),
            members: vec![int_field("amount")],
            nested: Vec::new(),
            nested_type_requirements: Vec::new(),
            initializer: None,
            span: span(),
        };
        let decls = vec![Declaration::Interface(decl)];
        let root = symbols.root();
        let scopes = resolve_program(&mut registry, &mut symbols, &mut diagnostics, &program, root, &decls);
        bind_program(&mut registry, &symbols, &mut diagnostics, &config, &program, root, &decls, &scopes);
        assert!(diagnostics.is_empty());
        let type_id = symbols.symbol(symbols.lookup(root, "HasAmount").unwrap()).type_id;
        let iface = registry.interface(type_id).unwrap();
        assert!(iface.members.contains("amount"));
    }
}
