//! Small shared enums used throughout the syntax tree and, later, the type
//! system: composite kind, field variability, access modifiers, and the
//! transfer operator a value position requires.

/// The five composite kinds the language admits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    Structure,
    Resource,
    Contract,
    Event,
    Enum,
}

impl CompositeKind {
    /// All kinds except `enum` support declaring interface conformance.
    #[must_use]
    pub const fn supports_interfaces(self) -> bool {
        !matches!(self, CompositeKind::Enum)
    }

    /// Structures, resources, and contracts carry fields and functions;
    /// events carry only parameters, enums only cases.
    #[must_use]
    pub const fn is_instantiable_with_fields_and_functions(self) -> bool {
        matches!(self, CompositeKind::Structure | CompositeKind::Resource | CompositeKind::Contract)
    }

    #[must_use]
    pub const fn is_resource(self) -> bool {
        matches!(self, CompositeKind::Resource)
    }

    /// Contracts are singleton and location-bound: they can never be moved
    /// or copied by value.
    #[must_use]
    pub const fn is_passable_by_value(self) -> bool {
        !matches!(self, CompositeKind::Contract)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CompositeKind::Structure => "struct",
            CompositeKind::Resource => "resource",
            CompositeKind::Contract => "contract",
            CompositeKind::Event => "event",
            CompositeKind::Enum => "enum",
        }
    }
}

/// Field mutability as written (`let` vs `var`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variability {
    Let,
    Var,
}

impl Variability {
    /// `let` in an interface is satisfiable by either `let` or `var` in the
    /// implementor; `var` in an interface requires `var`.
    #[must_use]
    pub const fn satisfies(self, required_by_interface: Variability) -> bool {
        match required_by_interface {
            Variability::Let => true,
            Variability::Var => matches!(self, Variability::Var),
        }
    }
}

/// The access-modifier lattice, ordered most to least restrictive. Derives
/// `PartialOrd`/`Ord` in declaration order so `implementor >= interface`
/// (no more restrictive) reads as a direct comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessModifier {
    Private,
    ContractRestricted,
    PublicRead,
    PublicWrite,
}

impl AccessModifier {
    /// `self` (the implementor's modifier) is no more restrictive than
    /// `required` (the interface's modifier) iff `self >= required` in the
    /// lattice ordering above.
    #[must_use]
    pub fn satisfies(self, required: AccessModifier) -> bool {
        self >= required
    }
}

/// The transfer operator a value position demands: `move` for resources,
/// `copy` for everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferOperator {
    Move,
    Copy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_enum_lacks_interface_support() {
        assert!(!CompositeKind::Enum.supports_interfaces());
        for kind in [
            CompositeKind::Structure,
            CompositeKind::Resource,
            CompositeKind::Contract,
            CompositeKind::Event,
        ] {
            assert!(kind.supports_interfaces());
        }
    }

    #[test]
    fn variability_satisfaction() {
        assert!(Variability::Var.satisfies(Variability::Let));
        assert!(Variability::Let.satisfies(Variability::Let));
        assert!(!Variability::Let.satisfies(Variability::Var));
        assert!(Variability::Var.satisfies(Variability::Var));
    }

    #[test]
    fn access_lattice_ordering() {
        assert!(AccessModifier::PublicWrite.satisfies(AccessModifier::Private));
        assert!(!AccessModifier::Private.satisfies(AccessModifier::PublicWrite));
        assert!(AccessModifier::Private.satisfies(AccessModifier::Private));
    }
}
