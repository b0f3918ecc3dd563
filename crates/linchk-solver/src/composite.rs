//! Nominal composite and interface types.

use crate::member::{FunctionSig, MemberTable};
use crate::type_id::TypeId;
use indexmap::IndexMap;
use linchk_ast::CompositeKind;
use linchk_common::Span;

#[derive(Clone, Debug)]
pub struct CompositeType {
    pub name: String,
    pub kind: CompositeKind,
    /// Declared conformance list in source order, duplicates retained —
    /// the Conformance Engine deduplicates into `conformances`.
    pub declared_conformances: Vec<TypeId>,
    /// Transitively-closed, deduplicated conformance set. Empty until the
    /// Conformance Engine has run.
    pub conformances: Vec<TypeId>,
    pub members: MemberTable,
    /// Nested type table: name -> nested composite/interface `TypeId`.
    pub nested: IndexMap<String, TypeId>,
    pub initializer: Option<FunctionSig>,
    pub has_destructor: bool,
    pub declared_at: Span,
}

impl CompositeType {
    #[must_use]
    pub fn new(name: String, kind: CompositeKind, declared_at: Span) -> Self {
        CompositeType {
            name,
            kind,
            declared_conformances: Vec::new(),
            conformances: Vec::new(),
            members: MemberTable::new(),
            nested: IndexMap::new(),
            initializer: None,
            has_destructor: false,
            declared_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NestedTypeRequirement {
    pub kind: CompositeKind,
    pub members: MemberTable,
    pub required_conformances: Vec<TypeId>,
    pub declared_at: Span,
}

#[derive(Clone, Debug)]
pub struct InterfaceType {
    pub name: String,
    pub kind: CompositeKind,
    pub members: MemberTable,
    /// Super-interfaces, in source order. Populated by the Declaration
    /// Resolver; the Conformance Engine walks this for transitive closure
    /// and cycle detection.
    pub supers: Vec<TypeId>,
    pub nested_type_requirements: IndexMap<String, NestedTypeRequirement>,
    /// Nested concrete declarations (composites or nested interfaces), as
    /// opposed to the abstract `nested_type_requirements` above.
    pub nested: IndexMap<String, TypeId>,
    pub initializer: Option<FunctionSig>,
    pub declared_at: Span,
}

impl InterfaceType {
    #[must_use]
    pub fn new(name: String, kind: CompositeKind, declared_at: Span) -> Self {
        InterfaceType {
            name,
            kind,
            members: MemberTable::new(),
            supers: Vec::new(),
            nested_type_requirements: IndexMap::new(),
            nested: IndexMap::new(),
            initializer: None,
            declared_at,
        }
    }
}
