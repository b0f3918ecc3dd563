//! Gathers every executable body the Expression/Statement Checker and
//! Resource Tracker need to walk: composite methods, composite
//! initializers, and top-level free functions. Interface default-body
//! templates are not re-walked here — they are checked once, against the
//! interface's own member table, as part of member binding; see DESIGN.md.

use linchk_ast::{Block, CompositeDecl, Declaration, FunctionDecl, MemberDecl, Param, TypeAnnotation};
use linchk_binder::{resolve_type, DeclarationScopes, ScopeId, SymbolTable, TypeResolveCx};
use linchk_common::{DiagnosticCollector, ProgramId, Span};
use linchk_solver::{FunctionSig, ParamSig, TypeId, TypeRegistry};

/// A function/initializer body bound to its enclosing type (if any), ready
/// for the Expression/Statement Checker to walk.
pub struct BoundFunction {
    pub name: String,
    /// `Some(composite)` for a method or initializer; `None` for a
    /// top-level free function, which has no `self`.
    pub self_type: Option<TypeId>,
    /// The scope nominal type annotations written in this body's local
    /// variable declarations and casts resolve against.
    pub scope: ScopeId,
    pub signature: FunctionSig,
    pub body: Block,
    pub span: Span,
}

pub fn collect_functions(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    root: ScopeId,
    declarations: &[Declaration],
    top_level_functions: &[FunctionDecl],
    scopes: &DeclarationScopes,
) -> Vec<BoundFunction> {
    let mut out = Vec::new();
    collect_from_declarations(registry, symbols, diagnostics, program, root, declarations, scopes, &mut out);
    for f in top_level_functions {
        if let Some(body) = &f.body {
            let sig = bind_signature(registry, symbols, diagnostics, program, root, &f.params, Some(&f.return_ty));
            out.push(BoundFunction {
                name: f.name.clone(),
                self_type: None,
                scope: root,
                signature: sig,
                body: body.clone(),
                span: f.span,
            });
        }
    }
    out
}

fn collect_from_declarations(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    declarations: &[Declaration],
    scopes: &DeclarationScopes,
    out: &mut Vec<BoundFunction>,
) {
    for decl in declarations {
        match decl {
            Declaration::Composite(c) => collect_composite(registry, symbols, diagnostics, program, scope, c, scopes, out),
            Declaration::Interface(i) => {
                let type_id = symbols.lookup_local(scope, &i.name).map(|id| symbols.symbol(id).type_id);
                if let Some(type_id) = type_id {
                    if let Some(&child_scope) = scopes.scope_of.get(&type_id) {
                        collect_from_declarations(registry, symbols, diagnostics, program, child_scope, &i.nested, scopes, out);
                    }
                }
            }
            Declaration::Import(_) => {}
        }
    }
}

fn collect_composite(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    decl: &CompositeDecl,
    scopes: &DeclarationScopes,
    out: &mut Vec<BoundFunction>,
) {
    let Some(type_id) = symbols.lookup_local(scope, &decl.name).map(|id| symbols.symbol(id).type_id) else {
        return;
    };

    for member in &decl.members {
        if let MemberDecl::Function(f) = member {
            if let Some(body) = &f.body {
                let sig = bind_signature(registry, symbols, diagnostics, program, scope, &f.params, Some(&f.return_ty));
                out.push(BoundFunction {
                    name: f.name.clone(),
                    self_type: Some(type_id),
                    scope,
                    signature: sig,
                    body: body.clone(),
                    span: f.span,
                });
            }
        }
    }

    if let Some(init) = &decl.initializer {
        if let Some(body) = &init.body {
            let sig = bind_signature(registry, symbols, diagnostics, program, scope, &init.params, None);
            out.push(BoundFunction {
                name: "init".to_string(),
                self_type: Some(type_id),
                scope,
                signature: sig,
                body: body.clone(),
                span: init.span,
            });
        }
    }

    if let Some(&child_scope) = scopes.scope_of.get(&type_id) {
        collect_from_declarations(registry, symbols, diagnostics, program, child_scope, &decl.nested, scopes, out);
    }
}

fn bind_signature(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    scope: ScopeId,
    params: &[Param],
    return_ty: Option<&TypeAnnotation>,
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
#[allow(unused_imports)]
mod tests {
    use super::*;
    use linchk_ast::{AccessModifier, CompositeKind, Conditions};
    use linchk_binder::resolve_program;

    fn span() -> Span {
        Span::dummy()
    }

    #[test]
    fn top_level_function_with_body_is_collected() {
        let mut registry = TypeRegistry::new();
        let mut symbols = SymbolTable::new();
        let mut diagnostics = DiagnosticCollector::new();
        let program = ProgramId::from("test");
        let root = symbols.root();
        let decls: Vec<Declaration> = Vec::new();
        let scopes = resolve_program(&mut registry, &mut symbols, &mut diagnostics, &program, root, &decls);
        let free_fn = FunctionDecl {
            name: "test".to_string(),
            params: Vec::new(),
            return_ty: TypeAnnotation::nominal("Void", span()),
            access: AccessModifier::PublicRead,
            conditions: Conditions::default(),
            body: Some(Block::default()),
            span: span(),
        };
        let bound = collect_functions(&mut registry, &symbols, &mut diagnostics, &program, root, &decls, &[free_fn], &scopes);
        assert_eq!(bound.len(), 1);
        assert!(bound[0].self_type.is_none());
    }
}
