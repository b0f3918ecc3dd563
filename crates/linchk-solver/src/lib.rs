//! The Type Registry (§4.1): interning, subtype/join/default-transfer
//! relations, and the nominal composite/interface type tables that the
//! Member Binder and Conformance Engine fill in and read.

pub mod composite;
pub mod member;
pub mod registry;
pub mod type_id;

pub use composite::{CompositeType, InterfaceType, NestedTypeRequirement};
pub use member::{FunctionSig, Member, MemberKind, MemberTable, ParamSig};
pub use registry::{TypeData, TypeRegistry};
pub use type_id::{Primitive, TypeId};
