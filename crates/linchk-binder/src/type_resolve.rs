//! Resolves `linchk_ast::TypeAnnotation` (as written in source) against a
//! scope into an interned `linchk_solver::TypeId`.

use crate::symbol::{ScopeId, SymbolKind, SymbolTable};
use linchk_ast::{Path, TypeAnnotation};
use linchk_common::{DiagnosticCollector, DiagnosticKind, Hint, Location, ProgramId};
use linchk_solver::{Primitive, TypeRegistry};

pub struct TypeResolveCx<'a> {
    pub registry: &'a mut TypeRegistry,
    pub symbols: &'a SymbolTable,
    pub diagnostics: &'a mut DiagnosticCollector,
    pub program: ProgramId,
}

/// Resolves a (possibly qualified) nominal path to a `TypeId`. Reports
/// `NotDeclaredError` and returns `None` when no symbol matches.
pub fn resolve_path(cx: &mut TypeResolveCx, scope: ScopeId, path: &Path) -> Option<linchk_solver::TypeId> {
    if path.segments.len() == 1 {
        if let Some(primitive) = Primitive::from_name(&path.segments[0]) {
            return Some(cx.registry.intern_primitive(primitive));
        }
    }
    let mut segments = path.segments.iter();
    let first = segments.next().expect("path always has a first segment");
    let Some(symbol_id) = cx.symbols.lookup(scope, first) else {
        cx.diagnostics.report(
            DiagnosticKind::NotDeclaredError,
            format!("cannot find type '{first}' in this scope"),
            Location::new(cx.program.clone(), path.span),
        );
        return None;
    };
    let mut current = cx.symbols.symbol(symbol_id).type_id;
    for segment in segments {
        let nested = match (cx.registry.composite(current), cx.registry.interface(current)) {
            (Some(c), _) => c.nested.get(segment).copied(),
            (_, Some(i)) => i.nested.get(segment).copied(),
            (None, None) => None,
        };
        match nested {
            Some(id) => current = id,
            None => {
                cx.diagnostics.report(
                    DiagnosticKind::NotDeclaredError,
                    format!("'{segment}' is not declared in '{}'", path.qualified()),
                    Location::new(cx.program.clone(), path.span),
                );
                return None;
            }
        }
    }
    Some(current)
}

/// Resolves a full type annotation. A bare nominal reference to an
/// interface (not wrapped in a restricted-type annotation) is flagged per
/// invariant 7: interface types are not usable as runtime value types.
pub fn resolve_type(
    cx: &mut TypeResolveCx,
    scope: ScopeId,
    annotation: &TypeAnnotation,
) -> linchk_solver::TypeId {
    match annotation {
        TypeAnnotation::Nominal(path) => match resolve_path(cx, scope, path) {
            Some(id) => {
                if cx.registry.interface(id).is_some() {
                    let kind = cx.registry.interface(id).map(|i| i.kind);
                    let suggestion = match kind {
                        Some(k) if k.is_resource() => format!("AnyResource{{{}}}", path.last()),
                        _ => format!("AnyStruct{{{}}}", path.last()),
                    };
                    cx.diagnostics.push(
                        linchk_common::Diagnostic::new(
                            DiagnosticKind::InvalidInterfaceTypeError,
                            format!("'{}' is an interface and cannot be used as a type directly", path.last()),
                            Location::new(cx.program.clone(), path.span),
                        )
                        .with_hint(Hint::new(format!("use `{suggestion}` instead"))),
                    );
                }
                id
            }
            None => cx.registry.intern_primitive(Primitive::AnyStruct),
        },
        TypeAnnotation::Optional(inner) => {
            let inner_id = resolve_type(cx, scope, inner);
            cx.registry.intern_optional(inner_id)
        }
        TypeAnnotation::Array(elem) => {
            let elem_id = resolve_type(cx, scope, elem);
            cx.registry.intern_array(elem_id)
        }
        TypeAnnotation::Dictionary(key, value) => {
            let key_id = resolve_type(cx, scope, key);
            let value_id = resolve_type(cx, scope, value);
            cx.registry.intern_dictionary(key_id, value_id)
        }
        TypeAnnotation::Function { params, ret } => {
            let param_ids = params.iter().map(|p| resolve_type(cx, scope, p)).collect();
            let ret_id = resolve_type(cx, scope, ret);
            cx.registry.intern_function(param_ids, ret_id)
        }
        TypeAnnotation::Restricted { base, interfaces } => {
            let base_id = base.as_ref().map(|b| resolve_type(cx, scope, b));
            let interface_ids = interfaces
                .iter()
                .filter_map(|p| resolve_path(cx, scope, p))
                .collect();
            cx.registry.intern_restricted(base_id, interface_ids)
        }
        TypeAnnotation::Reference { of, .. } => resolve_type(cx, scope, of),
    }
}
