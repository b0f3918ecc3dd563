//! The Nested-composite Placement Checker (§4.5): which composite kinds may
//! hold which value kinds as fields, and the contract-cannot-be-passed-by-
//! value rule for function signatures.

use linchk_ast::CompositeKind;
use linchk_common::{DiagnosticCollector, DiagnosticKind, Location, ProgramId};
use linchk_solver::{Member, MemberKind, TypeData, TypeId, TypeRegistry};

pub fn check_placement(registry: &TypeRegistry, diagnostics: &mut DiagnosticCollector, program: &ProgramId) {
    let _span = tracing::debug_span!("placement_checker", program = %program).entered();
    for composite_id in registry.composite_ids() {
        let Some(composite) = registry.composite(composite_id) else { continue };
        for member in composite.members.iter() {
            check_member_placement(registry, diagnostics, program, composite.kind, member);
        }
    }
}

/// The value kind resolved through optionals and restricted-type wrappers,
/// the way the field-placement table in §4.5 means "value kind" — an
/// `@R?` field is still a resource field.
fn resolved_kind(registry: &TypeRegistry, ty: TypeId) -> Option<CompositeKind> {
    match registry.get(ty) {
        TypeData::Composite(_) | TypeData::Interface(_) => registry.kind_of(ty),
        TypeData::Optional(inner) => resolved_kind(registry, *inner),
        TypeData::Restricted { base: Some(base), .. } => resolved_kind(registry, *base),
        TypeData::Restricted { base: None, interfaces } => {
            interfaces.first().and_then(|i| registry.kind_of(*i))
        }
        _ => None,
    }
}

fn check_member_placement(
    registry: &TypeRegistry,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    container_kind: CompositeKind,
    member: &Member,
) {
    match &member.kind {
        MemberKind::Field { .. } => {
            check_field_placement(registry, diagnostics, program, container_kind, member);
        }
        MemberKind::Function { signature, .. } => {
            for param in &signature.params {
                check_contract_not_passable(registry, diagnostics, program, param.ty, member.declared_at);
            }
            check_contract_not_passable(registry, diagnostics, program, signature.return_ty, member.declared_at);
        }
    }
}

fn check_field_placement(
    registry: &TypeRegistry,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    container_kind: CompositeKind,
    member: &Member,
) {
    let Some(value_kind) = resolved_kind(registry, member.ty) else { return };
    match (container_kind, value_kind) {
        (CompositeKind::Structure | CompositeKind::Event, CompositeKind::Resource) => {
            diagnostics.report(
                DiagnosticKind::InvalidResourceFieldError,
                format!(
                    "'{}' is a resource and cannot be a field of a {}",
                    member.name,
                    container_kind.name()
                ),
                Location::new(program.clone(), member.declared_at),
            );
        }
        (CompositeKind::Event, CompositeKind::Contract) => {
            diagnostics.report(
                DiagnosticKind::FieldTypeNotStorableError,
                format!("'{}' names a contract, which cannot be stored as an event field", member.name),
                Location::new(program.clone(), member.declared_at),
            );
        }
        _ => {}
    }
}

/// Contracts are singleton and location-bound (`CompositeKind::is_passable_by_value`
/// is `false` only for `Contract`); naming one as a parameter or return type
/// implies passing it by value, which is never legal.
fn check_contract_not_passable(
    registry: &TypeRegistry,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    ty: TypeId,
    declared_at: linchk_common::Span,
) {
    if resolved_kind(registry, ty) == Some(CompositeKind::Contract) {
        diagnostics.report(
            DiagnosticKind::InvalidMoveError,
            "a contract cannot be passed by value".to_string(),
            Location::new(program.clone(), declared_at),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linchk_ast::{AccessModifier, Variability};
    use linchk_common::Span;
    use linchk_solver::{CompositeType, InterfaceType};

    fn span() -> Span {
        Span::dummy()
    }

    fn field(name: &str, ty: TypeId) -> Member {
        Member {
            name: name.to_string(),
            kind: MemberKind::Field { variability: Variability::Let },
            ty,
            access: AccessModifier::PublicRead,
            declared_at: span(),
        }
    }

    #[test]
    fn resource_field_in_structure_is_rejected() {
        let mut registry = TypeRegistry::new();
        let resource_id = registry.declare_composite(CompositeType::new("R".into(), CompositeKind::Resource, span()));
        let mut structure = CompositeType::new("S".into(), CompositeKind::Structure, span());
        structure.members.insert(field("r", resource_id));
        let structure_id = registry.declare_composite(structure);
        let _ = structure_id;

        let mut diagnostics = DiagnosticCollector::new();
        let program = ProgramId::from("test");
        check_placement(&registry, &mut diagnostics, &program);
        let diags = diagnostics.into_vec();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::InvalidResourceFieldError));
    }

    #[test]
    fn resource_field_in_resource_is_accepted() {
        let mut registry = TypeRegistry::new();
        let resource_id = registry.declare_composite(CompositeType::new("R".into(), CompositeKind::Resource, span()));
        let mut outer = CompositeType::new("Vault".into(), CompositeKind::Resource, span());
        outer.members.insert(field("inner", resource_id));
        registry.declare_composite(outer);

        let mut diagnostics = DiagnosticCollector::new();
        let program = ProgramId::from("test");
        check_placement(&registry, &mut diagnostics, &program);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn contract_field_in_event_is_not_storable() {
        let mut registry = TypeRegistry::new();
        let contract_id = registry.declare_composite(CompositeType::new("C".into(), CompositeKind::Contract, span()));
        let mut event = CompositeType::new("E".into(), CompositeKind::Event, span());
        event.members.insert(field("c", contract_id));
        registry.declare_composite(event);

        let mut diagnostics = DiagnosticCollector::new();
        let program = ProgramId::from("test");
        check_placement(&registry, &mut diagnostics, &program);
        let diags = diagnostics.into_vec();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::FieldTypeNotStorableError));
    }

    #[test]
    fn interface_typed_resource_field_is_detected_through_kind() {
        let mut registry = TypeRegistry::new();
        let iface_id = registry.declare_interface(InterfaceType::new("HasId".into(), CompositeKind::Resource, span()));
        let mut structure = CompositeType::new("S".into(), CompositeKind::Structure, span());
        structure.members.insert(field("r", iface_id));
        registry.declare_composite(structure);

        let mut diagnostics = DiagnosticCollector::new();
        let program = ProgramId::from("test");
        check_placement(&registry, &mut diagnostics, &program);
        let diags = diagnostics.into_vec();
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::InvalidResourceFieldError));
    }
}
