//! Member tables, shared by composite and interface types. Filled in by
//! the Member Binder (`linchk-binder`); this crate only defines the shape.

use crate::type_id::TypeId;
use indexmap::IndexMap;
use linchk_ast::{AccessModifier, Conditions, Variability};
use linchk_common::Span;

#[derive(Clone, Debug)]
pub struct ParamSig {
    pub label: Option<String>,
    pub name: String,
    pub ty: TypeId,
}

#[derive(Clone, Debug)]
pub struct FunctionSig {
    pub params: Vec<ParamSig>,
    pub return_ty: TypeId,
}

impl FunctionSig {
    /// Parameter types and labels must match exactly for conformance
    /// (§4.4 rule 5): same count, same labels in order, assignable types.
    #[must_use]
    pub fn labels_match(&self, other: &FunctionSig) -> bool {
        self.params.len() == other.params.len()
            && self.params.iter().zip(&other.params).all(|(a, b)| a.label == b.label)
    }
}

#[derive(Clone, Debug)]
pub enum MemberKind {
    Field {
        variability: Variability,
    },
    Function {
        signature: FunctionSig,
        has_body: bool,
        conditions: Conditions,
        /// When this member was inherited unmodified from an interface's
        /// default implementation, the interface `TypeId` that provided
        /// it. `None` for members declared directly on this type.
        default_source: Option<TypeId>,
    },
}

#[derive(Clone, Debug)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    /// Field type, or the member's function type for a `Function` member.
    pub ty: TypeId,
    pub access: AccessModifier,
    pub declared_at: Span,
}

impl Member {
    #[must_use]
    pub fn is_field(&self) -> bool {
        matches!(self.kind, MemberKind::Field { .. })
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        matches!(self.kind, MemberKind::Function { .. })
    }

    #[must_use]
    pub fn signature(&self) -> Option<&FunctionSig> {
        match &self.kind {
            MemberKind::Function { signature, .. } => Some(signature),
            MemberKind::Field { .. } => None,
        }
    }

    #[must_use]
    pub fn variability(&self) -> Option<Variability> {
        match &self.kind {
            MemberKind::Field { variability } => Some(*variability),
            MemberKind::Function { .. } => None,
        }
    }
}

/// Ordered by declaration order (`IndexMap`), keyed by name. Members
/// accrete during binding and are frozen before conformance checking.
#[derive(Clone, Debug, Default)]
pub struct MemberTable {
    members: IndexMap<String, Member>,
}

impl MemberTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, member: Member) {
        self.members.insert(member.name.clone(), member);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.members.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
