//! The Declaration Resolver (§4.2): a two-pass walk that first registers
//! every composite/interface name (so forward references resolve), then
//! resolves conformance and super-interface lists against the now-complete
//! symbol table.

use crate::symbol::{ScopeId, SymbolKind, SymbolTable};
use crate::type_resolve::{resolve_path, TypeResolveCx};
use linchk_ast::{CompositeDecl, Declaration, InterfaceDecl, NestedTypeRequirement as AstNestedTypeRequirement};
use linchk_common::limits::MAX_NESTED_DECLARATION_DEPTH;
use linchk_common::{DiagnosticCollector, DiagnosticKind, Location, ProgramId};
use linchk_solver::{CompositeType, InterfaceType, NestedTypeRequirement, TypeId, TypeRegistry};
use rustc_hash::FxHashMap;

/// Per-composite/interface bookkeeping threaded between the two sub-passes:
/// which scope its nested declarations live in, so pass 2 can resolve
/// conformance lists using the right lookup scope for each container.
pub struct DeclarationScopes {
    pub scope_of: FxHashMap<TypeId, ScopeId>,
}

pub fn resolve_program(
    registry: &mut TypeRegistry,
    symbols: &mut SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    root: ScopeId,
    declarations: &[Declaration],
) -> DeclarationScopes {
    let _span = tracing::debug_span!("declaration_resolver", program = %program).entered();
    let mut scopes = DeclarationScopes { scope_of: FxHashMap::default() };
    register_declarations(registry, symbols, diagnostics, program, root, declarations, 0, &mut scopes);
    resolve_obligations(registry, symbols, diagnostics, program, root, declarations, &scopes);
    scopes
}

fn register_declarations(
    registry: &mut TypeRegistry,
    symbols: &mut SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    declarations: &[Declaration],
    depth: usize,
    scopes: &mut DeclarationScopes,
) {
    if depth > MAX_NESTED_DECLARATION_DEPTH {
        for decl in declarations {
            diagnostics.report(
                DiagnosticKind::InvalidNestedDeclarationError,
                "declaration nesting exceeds the maximum supported depth".to_string(),
                Location::new(program.clone(), decl.span()),
            );
        }
        return;
    }
    for decl in declarations {
        match decl {
            Declaration::Composite(c) => register_composite(registry, symbols, diagnostics, program, scope, c, depth, scopes),
            Declaration::Interface(i) => register_interface(registry, symbols, diagnostics, program, scope, i, depth, scopes),
            Declaration::Import(_) => {}
        }
    }
}

fn declare_or_report_redeclaration(
    symbols: &mut SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    name: &str,
    kind: SymbolKind,
    type_id: TypeId,
    span: linchk_common::Span,
) {
    if let Err(existing) = symbols.declare(scope, name, kind, type_id, span) {
        let existing_span = symbols.symbol(existing).span;
        diagnostics.push(
            linchk_common::Diagnostic::new(
                DiagnosticKind::RedeclarationError,
                format!("'{name}' is already declared in this scope"),
                Location::new(program.clone(), span),
            )
            .with_secondary(Location::new(program.clone(), existing_span)),
        );
    }
}

fn register_composite(
    registry: &mut TypeRegistry,
    symbols: &mut SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    decl: &CompositeDecl,
    depth: usize,
    scopes: &mut DeclarationScopes,
) {
    let type_id = registry.declare_composite(CompositeType::new(decl.name.clone(), decl.kind, decl.span));
    declare_or_report_redeclaration(
        symbols,
        diagnostics,
        program,
        scope,
        &decl.name,
        SymbolKind::Composite,
        type_id,
        decl.span,
    );
    let child_scope = symbols.new_scope(scope);
    scopes.scope_of.insert(type_id, child_scope);
    register_declarations(registry, symbols, diagnostics, program, child_scope, &decl.nested, depth + 1, scopes);
    // Link resolved nested declarations into the composite's nested table.
    let nested_ids: Vec<(String, TypeId)> = decl
        .nested
        .iter()
        .filter_map(|n| n.name().map(|name| (name.to_string(), symbols.lookup_local(child_scope, name))))
        .filter_map(|(name, id)| id.map(|id| (name, symbols.symbol(id).type_id)))
        .collect();
    if let Some(composite) = registry.composite_mut(type_id) {
        for (name, nested_id) in nested_ids {
            composite.nested.insert(name, nested_id);
        }
    }
}

fn register_interface(
    registry: &mut TypeRegistry,
    symbols: &mut SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    decl: &InterfaceDecl,
    depth: usize,
    scopes: &mut DeclarationScopes,
) {
    let type_id = registry.declare_interface(InterfaceType::new(decl.name.clone(), decl.kind, decl.span));
    declare_or_report_redeclaration(
        symbols,
        diagnostics,
        program,
        scope,
        &decl.name,
        SymbolKind::Interface,
        type_id,
        decl.span,
    );
    let child_scope = symbols.new_scope(scope);
    scopes.scope_of.insert(type_id, child_scope);
    register_declarations(registry, symbols, diagnostics, program, child_scope, &decl.nested, depth + 1, scopes);
    let nested_ids: Vec<(String, TypeId)> = decl
        .nested
        .iter()
        .filter_map(|n| n.name().map(|name| (name.to_string(), symbols.lookup_local(child_scope, name))))
        .filter_map(|(name, id)| id.map(|id| (name, symbols.symbol(id).type_id)))
        .collect();
    if let Some(iface) = registry.interface_mut(type_id) {
        for (name, nested_id) in nested_ids {
            iface.nested.insert(name, nested_id);
        }
    }
}

fn resolve_obligations(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    declarations: &[Declaration],
    scopes: &DeclarationScopes,
) {
    for decl in declarations {
        match decl {
            Declaration::Composite(c) => {
                let type_id = symbols
                    .lookup_local(scope, &c.name)
                    .map(|id| symbols.symbol(id).type_id);
                if let Some(type_id) = type_id {
                    let mut cx = TypeResolveCx { registry, symbols, diagnostics, program: program.clone() };
                    let conformances: Vec<TypeId> =
                        c.conformances.iter().filter_map(|p| resolve_path(&mut cx, scope, p)).collect();
                    if let Some(composite) = registry.composite_mut(type_id) {
                        composite.declared_conformances = conformances;
                    }
                    if let Some(&child_scope) = scopes.scope_of.get(&type_id) {
                        resolve_obligations(registry, symbols, diagnostics, program, child_scope, &c.nested, scopes);
                    }
                }
            }
            Declaration::Interface(i) => {
                let type_id = symbols
                    .lookup_local(scope, &i.name)
                    .map(|id| symbols.symbol(id).type_id);
                if let Some(type_id) = type_id {
                    let mut cx = TypeResolveCx { registry, symbols, diagnostics, program: program.clone() };
                    let supers: Vec<TypeId> = i.supers.iter().filter_map(|p| resolve_path(&mut cx, scope, p)).collect();
                    if let Some(iface) = registry.interface_mut(type_id) {
                        iface.supers = supers;
                    }
                    resolve_nested_type_requirements(registry, symbols, diagnostics, program, scope, type_id, &i.nested_type_requirements);
                    if let Some(&child_scope) = scopes.scope_of.get(&type_id) {
                        resolve_obligations(registry, symbols, diagnostics, program, child_scope, &i.nested, scopes);
                    }
                }
            }
            Declaration::Import(_) => {}
        }
    }
}

fn resolve_nested_type_requirements(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    interface_id: TypeId,
    requirements: &[AstNestedTypeRequirement],
) {
    let mut resolved = Vec::new();
    for req in requirements {
        let mut cx = TypeResolveCx { registry, symbols, diagnostics, program: program.clone() };
        let required_conformances: Vec<TypeId> =
            req.required_conformances.iter().filter_map(|p| resolve_path(&mut cx, scope, p)).collect();
        resolved.push((
            req.name.clone(),
            NestedTypeRequirement {
                kind: req.kind,
                members: linchk_solver::MemberTable::new(),
                required_conformances,
                declared_at: req.span,
            },
        ));
    }
    if let Some(iface) = registry.interface_mut(interface_id) {
        for (name, requirement) in resolved {
            iface.nested_type_requirements.insert(name, requirement);
        }
    }
}
