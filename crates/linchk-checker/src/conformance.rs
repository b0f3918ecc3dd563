//! The Conformance Engine (§4.4): kind matching, deduplication, transitive
//! closure over interface inheritance, cycle detection, member obligation
//! matching, default-implementation conflict resolution, and nested-type
//! requirements for contract interfaces.

use linchk_ast::{AccessModifier, CompositeKind, Variability};
use linchk_common::limits::MAX_INTERFACE_INHERITANCE_DEPTH;
use linchk_common::{CheckerConfig, DiagnosticCollector, DiagnosticKind, Location, ProgramId};
use linchk_solver::{FunctionSig, Member, MemberKind, TypeId, TypeRegistry};
use rustc_hash::{FxHashMap, FxHashSet};

pub fn check_conformance(
    registry: &mut TypeRegistry,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    config: &CheckerConfig,
) {
    let _span = tracing::debug_span!("conformance_engine", program = %program).entered();
    detect_interface_cycles(registry, diagnostics, program);
    check_interface_conflicts(registry, diagnostics, program);

    let composite_ids: Vec<TypeId> = registry.composite_ids().collect();
    for composite_id in composite_ids {
        check_composite(registry, diagnostics, program, config, composite_id);
    }
}

/// Three-color DFS over the interface-inheritance graph (§9 design note).
/// Every interface on a discovered cycle is reported, not just the entry
/// point, and the traversal continues past a cycle rather than aborting.
fn detect_interface_cycles(registry: &TypeRegistry, diagnostics: &mut DiagnosticCollector, program: &ProgramId) {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let interfaces: Vec<TypeId> = registry.interface_ids().collect();
    let mut color: FxHashMap<TypeId, Color> = interfaces.iter().map(|&i| (i, Color::White)).collect();
    let mut reported: FxHashSet<TypeId> = FxHashSet::default();

    fn visit(
        registry: &TypeRegistry,
        diagnostics: &mut DiagnosticCollector,
        program: &ProgramId,
        color: &mut FxHashMap<TypeId, Color>,
        reported: &mut FxHashSet<TypeId>,
        stack: &mut Vec<TypeId>,
        node: TypeId,
    ) {
        color.insert(node, Color::Gray);
        stack.push(node);
        let supers = registry.interface(node).map(|i| i.supers.clone()).unwrap_or_default();
        for sup in supers {
            match color.get(&sup).copied() {
                Some(Color::Gray) => {
                    // Found a cycle: report every node currently on the
                    // stack from `sup` onward.
                    if let Some(start) = stack.iter().position(|&t| t == sup) {
                        for &cyclic in &stack[start..] {
                            if reported.insert(cyclic) {
                                let span = registry
                                    .interface(cyclic)
                                    .map(|i| i.declared_at)
                                    .unwrap_or_else(linchk_common::Span::dummy);
                                diagnostics.report(
                                    DiagnosticKind::CyclicConformanceError,
                                    format!(
                                        "interface '{}' participates in a cyclic inheritance chain",
                                        registry.interface(cyclic).map(|i| i.name.as_str()).unwrap_or("?")
                                    ),
                                    Location::new(program.clone(), span),
                                );
                            }
                        }
                    }
                }
                Some(Color::White) | None => {
                    visit(registry, diagnostics, program, color, reported, stack, sup);
                }
                Some(Color::Black) => {}
            }
        }
        stack.pop();
        color.insert(node, Color::Black);
    }

    let mut stack = Vec::new();
    for iface in interfaces {
        if color.get(&iface).copied() == Some(Color::White) {
            visit(registry, diagnostics, program, &mut color, &mut reported, &mut stack, iface);
        }
    }
}

/// A sub-interface may add members freely, but a conflicting redeclaration
/// (different kind or signature) of a name already present in a super is
/// reported against both interfaces.
fn check_interface_conflicts(registry: &TypeRegistry, diagnostics: &mut DiagnosticCollector, program: &ProgramId) {
    for iface_id in registry.interface_ids() {
        let Some(iface) = registry.interface(iface_id) else { continue };
        for sup_id in &iface.supers {
            let Some(sup) = registry.interface(*sup_id) else { continue };
            for member in iface.members.iter() {
                let Some(sup_member) = sup.members.get(&member.name) else { continue };
                if !members_compatible(member, sup_member) {
                    diagnostics.push(
                        linchk_common::Diagnostic::new(
                            DiagnosticKind::InterfaceMemberConflictError,
                            format!(
                                "'{}' conflicts between interface '{}' and super-interface '{}'",
                                member.name, iface.name, sup.name
                            ),
                            Location::new(program.clone(), member.declared_at),
                        )
                        .with_secondary(Location::new(program.clone(), sup_member.declared_at)),
                    );
                }
            }
        }
    }
}

/// Two declarations of the same member name are compatible if they agree on
/// field-vs-function and, for functions, on signature. A default body on
/// one side and an abstract declaration on the other is still compatible —
/// that combination is resolved later by conformance, not flagged here.
fn members_compatible(a: &Member, b: &Member) -> bool {
    match (&a.kind, &b.kind) {
        (MemberKind::Field { variability: v1 }, MemberKind::Field { variability: v2 }) => a.ty == b.ty && v1 == v2,
        (MemberKind::Function { signature: s1, .. }, MemberKind::Function { signature: s2, .. }) => {
            s1.labels_match(s2)
                && s1.params.iter().zip(&s2.params).all(|(p1, p2)| p1.ty == p2.ty)
                && s1.return_ty == s2.return_ty
        }
        _ => false,
    }
}

struct FieldObligation {
    iface: TypeId,
    name: String,
    ty: TypeId,
    access: AccessModifier,
    variability: Variability,
    declared_at: linchk_common::Span,
}

struct FunctionObligation {
    iface: TypeId,
    name: String,
    signature: FunctionSig,
    has_body: bool,
    access: AccessModifier,
    declared_at: linchk_common::Span,
}

fn collect_obligations(
    registry: &TypeRegistry,
    closure: &[TypeId],
) -> (FxHashMap<String, Vec<FieldObligation>>, FxHashMap<String, Vec<FunctionObligation>>) {
    let mut fields: FxHashMap<String, Vec<FieldObligation>> = FxHashMap::default();
    let mut functions: FxHashMap<String, Vec<FunctionObligation>> = FxHashMap::default();
    for &iface_id in closure {
        let Some(iface) = registry.interface(iface_id) else { continue };
        for member in iface.members.iter() {
            match &member.kind {
                MemberKind::Field { variability } => {
                    fields.entry(member.name.clone()).or_default().push(FieldObligation {
                        iface: iface_id,
                        name: member.name.clone(),
                        ty: member.ty,
                        access: member.access,
                        variability: *variability,
                        declared_at: member.declared_at,
                    });
                }
                MemberKind::Function { signature, has_body, .. } => {
                    functions.entry(member.name.clone()).or_default().push(FunctionObligation {
                        iface: iface_id,
                        name: member.name.clone(),
                        signature: signature.clone(),
                        has_body: *has_body,
                        access: member.access,
                        declared_at: member.declared_at,
                    });
                }
            }
        }
    }
    (fields, functions)
}

fn check_composite(
    registry: &mut TypeRegistry,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    config: &CheckerConfig,
    composite_id: TypeId,
) {
    let Some(composite) = registry.composite(composite_id) else { return };
    let composite_kind = composite.kind;
    let composite_span = composite.declared_at;
    let declared = composite.declared_conformances.clone();

    let mut effective = Vec::new();
    for iface_id in declared {
        match (registry.interface(iface_id), registry.kind_of(iface_id)) {
            (None, _) => {
                diagnostics.report(
                    DiagnosticKind::InvalidConformanceError,
                    "conformance list entries must name an interface".to_string(),
                    Location::new(program.clone(), composite_span),
                );
            }
            (Some(_), Some(k)) if k != composite_kind => {
                diagnostics.report(
                    DiagnosticKind::CompositeKindMismatchError,
                    format!("'{}' cannot conform to a {} interface", composite_kind.name(), k.name()),
                    Location::new(program.clone(), composite_span),
                );
            }
            (Some(_), _) => {
                if effective.contains(&iface_id) {
                    diagnostics.report(
                        DiagnosticKind::DuplicateConformanceError,
                        "duplicate interface in conformance list".to_string(),
                        Location::new(program.clone(), composite_span),
                    );
                } else {
                    effective.push(iface_id);
                }
            }
        }
    }

    let mut closure: FxHashSet<TypeId> = FxHashSet::default();
    for &iface in &effective {
        closure.insert(iface);
        if config.interface_inheritance_enabled {
            if let Some(supers) = registry.transitive_supers(iface, MAX_INTERFACE_INHERITANCE_DEPTH) {
                closure.extend(supers);
            }
        }
    }
    let mut closure: Vec<TypeId> = closure.into_iter().collect();
    closure.sort_unstable();
    if let Some(composite) = registry.composite_mut(composite_id) {
        composite.conformances = closure.clone();
    }

    let (field_obligations, function_obligations) = collect_obligations(registry, &closure);

    for (name, obligations) in &field_obligations {
        check_field_obligations(registry, diagnostics, program, composite_id, name, obligations);
    }
    let mut pending_defaults = Vec::new();
    for (name, obligations) in &function_obligations {
        check_function_obligations(
            registry,
            diagnostics,
            program,
            composite_id,
            name,
            obligations,
            &mut pending_defaults,
        );
    }
    for pending in pending_defaults {
        let ty = linchk_solver::registry::function_type_of(registry, &pending.signature);
        if let Some(composite) = registry.composite_mut(composite_id) {
            composite.members.insert(Member {
                name: pending.name,
                kind: MemberKind::Function {
                    signature: pending.signature,
                    has_body: true,
                    conditions: linchk_ast::Conditions::default(),
                    default_source: Some(pending.source_iface),
                },
                ty,
                access: pending.access,
                declared_at: pending.declared_at,
            });
        }
    }

    check_initializer_obligation(registry, diagnostics, program, composite_id, &closure);

    if composite_kind == CompositeKind::Contract {
        check_nested_type_requirements(registry, diagnostics, program, composite_id, &closure);
    }
}

fn check_field_obligations(
    registry: &TypeRegistry,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    composite_id: TypeId,
    name: &str,
    obligations: &[FieldObligation],
) {
    let Some(composite) = registry.composite(composite_id) else { return };
    for ob in obligations {
        match composite.members.get(name) {
            None => diagnostics.report(
                DiagnosticKind::ConformanceError,
                format!("missing field '{name}' required by interface"),
                Location::new(program.clone(), composite.declared_at),
            ),
            Some(member) if !member.is_field() => diagnostics.report(
                DiagnosticKind::ConformanceError,
                format!("'{name}' is declared as a function but the interface requires a field"),
                Location::new(program.clone(), member.declared_at),
            ),
            Some(member) => {
                if member.ty != ob.ty {
                    diagnostics.report(
                        DiagnosticKind::ConformanceError,
                        format!("field '{name}' does not match the interface's declared type"),
                        Location::new(program.clone(), member.declared_at),
                    );
                }
                if !member.variability().is_some_and(|v| v.satisfies(ob.variability)) {
                    diagnostics.report(
                        DiagnosticKind::ConformanceError,
                        format!("field '{name}' variability does not satisfy the interface"),
                        Location::new(program.clone(), member.declared_at),
                    );
                }
                if !member.access.satisfies(ob.access) {
                    diagnostics.report(
                        DiagnosticKind::ConformanceError,
                        format!("field '{name}' access is more restrictive than the interface"),
                        Location::new(program.clone(), member.declared_at),
                    );
                }
                let _ = ob.iface;
            }
        }
    }
}

fn check_function_obligations(
    registry: &TypeRegistry,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    composite_id: TypeId,
    name: &str,
    obligations: &[FunctionObligation],
    pending_defaults: &mut Vec<PendingDefault>,
) {
    let Some(composite) = registry.composite(composite_id) else { return };
    match composite.members.get(name) {
        Some(member) if member.is_function() => {
            let signature = member.signature().expect("function member has a signature").clone();
            for ob in obligations {
                if !signature.labels_match(&ob.signature)
                    || signature.params.iter().zip(&ob.signature.params).any(|(p1, p2)| p1.ty != p2.ty)
                    || signature.return_ty != ob.signature.return_ty
                {
                    diagnostics.report(
                        DiagnosticKind::ConformanceError,
                        format!("function '{name}' does not match the interface's declared signature"),
                        Location::new(program.clone(), member.declared_at),
                    );
                }
                if !member.access.satisfies(ob.access) {
                    diagnostics.report(
                        DiagnosticKind::ConformanceError,
                        format!("function '{name}' access is more restrictive than the interface"),
                        Location::new(program.clone(), member.declared_at),
                    );
                }
            }
        }
        Some(non_function) => diagnostics.report(
            DiagnosticKind::ConformanceError,
            format!("'{name}' is declared as a field but the interface requires a function"),
            Location::new(program.clone(), non_function.declared_at),
        ),
        None => {
            let defaults: Vec<&FunctionObligation> = obligations.iter().filter(|o| o.has_body).collect();
            let abstracts = obligations.len() - defaults.len();
            match defaults.len() {
                0 => diagnostics.report(
                    DiagnosticKind::ConformanceError,
                    format!("missing function '{name}' required by interface"),
                    Location::new(program.clone(), composite.declared_at),
                ),
                1 if abstracts == 0 => {
                    let winner = defaults[0];
                    pending_defaults.push(PendingDefault {
                        name: name.to_string(),
                        signature: winner.signature.clone(),
                        access: winner.access,
                        declared_at: winner.declared_at,
                        source_iface: winner.iface,
                    });
                }
                1 => diagnostics.report(
                    DiagnosticKind::DefaultFunctionConflictError,
                    format!("'{name}' has a default implementation from one interface but is abstract in another"),
                    Location::new(program.clone(), composite.declared_at),
                ),
                _ => diagnostics.report(
                    DiagnosticKind::MultipleInterfaceDefaultImplementationsError,
                    format!("'{name}' has conflicting default implementations and is not overridden"),
                    Location::new(program.clone(), composite.declared_at),
                ),
            }
        }
    }
}

/// A default implementation a composite inherits unmodified from an
/// interface; the function type is interned once the registry is available
/// mutably again (it cannot be interned while `composite.members` is
/// borrowed immutably above).
struct PendingDefault {
    name: String,
    signature: FunctionSig,
    access: AccessModifier,
    declared_at: linchk_common::Span,
    source_iface: TypeId,
}

fn check_initializer_obligation(
    registry: &TypeRegistry,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    composite_id: TypeId,
    closure: &[TypeId],
) {
    let Some(composite) = registry.composite(composite_id) else { return };
    for &iface_id in closure {
        let Some(required) = registry.interface(iface_id).and_then(|i| i.initializer.as_ref()) else { continue };
        match &composite.initializer {
            None => diagnostics.report(
                DiagnosticKind::ConformanceError,
                "missing initializer required by interface".to_string(),
                Location::new(program.clone(), composite.declared_at),
            ),
            Some(actual) => {
                if !actual.labels_match(required)
                    || actual.params.iter().zip(&required.params).any(|(p1, p2)| p1.ty != p2.ty)
                {
                    diagnostics.report(
                        DiagnosticKind::ConformanceError,
                        "initializer does not match the interface's declared signature".to_string(),
                        Location::new(program.clone(), composite.declared_at),
                    );
                }
            }
        }
    }
}

fn check_nested_type_requirements(
    registry: &TypeRegistry,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    composite_id: TypeId,
    closure: &[TypeId],
) {
    let Some(composite) = registry.composite(composite_id) else { return };
    for &iface_id in closure {
        let Some(iface) = registry.interface(iface_id) else { continue };
        for (req_name, requirement) in &iface.nested_type_requirements {
            let nested_id = composite.nested.get(req_name).copied();
            let Some(nested_id) = nested_id else {
                diagnostics.report(
                    DiagnosticKind::ConformanceError,
                    format!("missing nested type '{req_name}' required by interface"),
                    Location::new(program.clone(), composite.declared_at),
                );
                continue;
            };
            let Some(nested_composite) = registry.composite(nested_id) else {
                diagnostics.report(
                    DiagnosticKind::ConformanceError,
                    format!("'{req_name}' must be a nested composite, not an interface"),
                    Location::new(program.clone(), composite.declared_at),
                );
                continue;
            };
            if nested_composite.kind != requirement.kind {
                diagnostics.report(
                    DiagnosticKind::ConformanceError,
                    format!("nested type '{req_name}' has kind {}, expected {}", nested_composite.kind.name(), requirement.kind.name()),
                    Location::new(program.clone(), nested_composite.declared_at),
                );
            }
            for required_conformance in &requirement.required_conformances {
                if !nested_composite.declared_conformances.contains(required_conformance) {
                    diagnostics.report(
                        DiagnosticKind::MissingConformanceError,
                        format!("nested type '{req_name}' must additionally conform to the interface required by the nested type requirement"),
                        Location::new(program.clone(), nested_composite.declared_at),
                    );
                }
            }
            for member in requirement.members.iter() {
                match &member.kind {
                    MemberKind::Field { variability } => {
                        let ob = FieldObligation {
                            iface: iface_id,
                            name: member.name.clone(),
                            ty: member.ty,
                            access: member.access,
                            variability: *variability,
                            declared_at: member.declared_at,
                        };
                        check_field_obligations(registry, diagnostics, program, nested_id, &member.name, std::slice::from_ref(&ob));
                    }
                    MemberKind::Function { .. } => {
                        // Function obligations on nested-type requirements follow the
                        // same matching rules as ordinary interface conformance, but
                        // never resolve to a default (requirements name a kind, not an
                        // interface with inheritable bodies) — caught directly here.
                        if nested_composite.members.get(&member.name).is_none() {
                            diagnostics.report(
                                DiagnosticKind::ConformanceError,
                                format!("nested type '{req_name}' is missing function '{}'", member.name),
                                Location::new(program.clone(), nested_composite.declared_at),
                            );
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linchk_binder::{bind_program, resolve_program, SymbolTable};
    use linchk_ast::{CompositeDecl, Declaration, FieldDecl, FunctionDecl, InterfaceDecl};
    use linchk_common::Span;

    fn span() -> Span {
        Span::dummy()
    }

    fn int_return_fn(name: &str, body: bool) -> FunctionDecl {
        FunctionDecl {
            name: name.to_string(),
            params: Vec::new(),
            return_ty: linchk_ast::TypeAnnotation::nominal("Int", span()),
            access: AccessModifier::PublicRead,
            conditions: linchk_ast::Conditions::default(),
            body: body.then(Block::default),
            span: span(),
        }
    }

    use linchk_ast::Block;

    fn run(decls: Vec<Declaration>) -> (TypeRegistry, DiagnosticCollector) {
        let mut registry = TypeRegistry::new();
        let mut symbols = SymbolTable::new();
        let mut diagnostics = DiagnosticCollector::new();
        let config = CheckerConfig::default();
        let program = ProgramId::from("test");
        let root = symbols.root();
        let scopes = resolve_program(&mut registry, &mut symbols, &mut diagnostics, &program, root, &decls);
        bind_program(&mut registry, &symbols, &mut diagnostics, &config, &program, root, &decls, &scopes);
        check_conformance(&mut registry, &mut diagnostics, &program, &config);
        (registry, diagnostics)
    }

    #[test]
    fn scenario_one_satisfied_interface_reports_nothing() {
        let iface = InterfaceDecl {
            name: "I".to_string(),
            kind: CompositeKind::Structure,
            supers: Vec::new(),
            members: vec![linchk_ast::MemberDecl::Function(int_return_fn("f", false))],
            nested: Vec::new(),
            nested_type_requirements: Vec::new(),
            initializer: None,
            span: span(),
        };
        let composite = CompositeDecl {
            name: "S".to_string(),
            kind: CompositeKind::Structure,
            conformances: vec![linchk_ast::Path::simple("I", span())],
            members: vec![linchk_ast::MemberDecl::Function(int_return_fn("f", true))],
            nested: Vec::new(),
            initializer: None,
            has_destructor: false,
            event_parameters: Vec::new(),
            enum_cases: Vec::new(),
            span: span(),
        };
        let (_, diagnostics) = run(vec![Declaration::Interface(iface), Declaration::Composite(composite)]);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.as_slice());
    }

    #[test]
    fn scenario_two_missing_function_is_conformance_error() {
        let iface = InterfaceDecl {
            name: "I".to_string(),
            kind: CompositeKind::Structure,
            supers: Vec::new(),
            members: vec![linchk_ast::MemberDecl::Function(int_return_fn("f", false))],
            nested: Vec::new(),
            nested_type_requirements: Vec::new(),
            initializer: None,
            span: span(),
        };
        let composite = CompositeDecl {
            name: "S".to_string(),
            kind: CompositeKind::Structure,
            conformances: vec![linchk_ast::Path::simple("I", span())],
            members: Vec::new(),
            nested: Vec::new(),
            initializer: None,
            has_destructor: false,
            event_parameters: Vec::new(),
            enum_cases: Vec::new(),
            span: span(),
        };
        let (_, diagnostics) = run(vec![Declaration::Interface(iface), Declaration::Composite(composite)]);
        let diags = diagnostics.into_vec();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::ConformanceError));
    }

    #[test]
    fn scenario_seven_conflicting_defaults_are_reported() {
        let a = InterfaceDecl {
            name: "A".to_string(),
            kind: CompositeKind::Structure,
            supers: Vec::new(),
            members: vec![linchk_ast::MemberDecl::Function(int_return_fn("m", true))],
            nested: Vec::new(),
            nested_type_requirements: Vec::new(),
            initializer: None,
            span: span(),
        };
        let b = InterfaceDecl {
            name: "B".to_string(),
            kind: CompositeKind::Structure,
            supers: Vec::new(),
            members: vec![linchk_ast::MemberDecl::Function(int_return_fn("m", true))],
            nested: Vec::new(),
            nested_type_requirements: Vec::new(),
            initializer: None,
            span: span(),
        };
        let composite = CompositeDecl {
            name: "S".to_string(),
            kind: CompositeKind::Structure,
            conformances: vec![linchk_ast::Path::simple("A", span()), linchk_ast::Path::simple("B", span())],
            members: Vec::new(),
            nested: Vec::new(),
            initializer: None,
            has_destructor: false,
            event_parameters: Vec::new(),
            enum_cases: Vec::new(),
            span: span(),
        };
        let (_, diagnostics) = run(vec![
            Declaration::Interface(a),
            Declaration::Interface(b),
            Declaration::Composite(composite),
        ]);
        let diags = diagnostics.into_vec();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::MultipleInterfaceDefaultImplementationsError));
    }
}
