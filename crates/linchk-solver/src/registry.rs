//! The Type Registry (§4.1): interns type values with structural equality,
//! and provides the subtype, join, and default-transfer relations.
//!
//! Nominal types (composites, interfaces) are *not* structurally interned —
//! each declaration gets its own `TypeId` via `declare_composite`/
//! `declare_interface`, since two distinct declarations of the same name in
//! different scopes are different types. Structural shapes (optional,
//! array, dictionary, function, restricted, primitive) are deduplicated by
//! a `TypeShape` key.

use crate::composite::{CompositeType, InterfaceType};
use crate::member::FunctionSig;
use crate::type_id::{Primitive, TypeId};
use linchk_ast::{CompositeKind, TransferOperator};
use rustc_hash::FxHashMap;

#[derive(Clone, Debug)]
pub enum TypeData {
    Primitive(Primitive),
    Composite(u32),
    Interface(u32),
    Optional(TypeId),
    Array(TypeId),
    Dictionary { key: TypeId, value: TypeId },
    Function { params: Vec<TypeId>, ret: TypeId },
    /// `base{I1, I2, ...}` — `base` is `None` for the bare `{I1, ...}`
    /// spelling, which defaults to `AnyStruct`/`AnyResource` depending on
    /// the interfaces' kind.
    Restricted { base: Option<TypeId>, interfaces: Vec<TypeId> },
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum ShapeKey {
    Primitive(Primitive),
    Optional(TypeId),
    Array(TypeId),
    Dictionary(TypeId, TypeId),
    Function(Vec<TypeId>, TypeId),
    Restricted(Option<TypeId>, Vec<TypeId>),
}

#[derive(Default)]
pub struct TypeRegistry {
    types: Vec<TypeData>,
    composites: Vec<CompositeType>,
    interfaces: Vec<InterfaceType>,
    shape_intern: FxHashMap<ShapeKey, TypeId>,
    primitive_cache: FxHashMap<Primitive, TypeId>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> &TypeData {
        self.types.get(id.0 as usize).unwrap_or_else(|| {
            unreachable!("TypeId {:?} does not resolve in this registry", id)
        })
    }

    // ---- nominal declarations ----

    pub fn declare_composite(&mut self, composite: CompositeType) -> TypeId {
        let idx = self.composites.len() as u32;
        self.composites.push(composite);
        self.push(TypeData::Composite(idx))
    }

    pub fn declare_interface(&mut self, interface: InterfaceType) -> TypeId {
        let idx = self.interfaces.len() as u32;
        self.interfaces.push(interface);
        self.push(TypeData::Interface(idx))
    }

    #[must_use]
    pub fn composite(&self, id: TypeId) -> Option<&CompositeType> {
        match self.get(id) {
            TypeData::Composite(idx) => Some(&self.composites[*idx as usize]),
            _ => None,
        }
    }

    pub fn composite_mut(&mut self, id: TypeId) -> Option<&mut CompositeType> {
        match self.types.get(id.0 as usize) {
            Some(TypeData::Composite(idx)) => Some(&mut self.composites[*idx as usize]),
            _ => None,
        }
    }

    #[must_use]
    pub fn interface(&self, id: TypeId) -> Option<&InterfaceType> {
        match self.get(id) {
            TypeData::Interface(idx) => Some(&self.interfaces[*idx as usize]),
            _ => None,
        }
    }

    pub fn interface_mut(&mut self, id: TypeId) -> Option<&mut InterfaceType> {
        match self.types.get(id.0 as usize) {
            Some(TypeData::Interface(idx)) => Some(&mut self.interfaces[*idx as usize]),
            _ => None,
        }
    }

    /// Every composite `TypeId` declared so far, in declaration order.
    /// Used by passes that sweep the whole program (conformance checking).
    pub fn composite_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.types.iter().enumerate().filter_map(|(i, data)| match data {
            TypeData::Composite(_) => Some(TypeId(i as u32)),
            _ => None,
        })
    }

    /// Every interface `TypeId` declared so far, in declaration order.
    pub fn interface_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.types.iter().enumerate().filter_map(|(i, data)| match data {
            TypeData::Interface(_) => Some(TypeId(i as u32)),
            _ => None,
        })
    }

    #[must_use]
    pub fn kind_of(&self, id: TypeId) -> Option<CompositeKind> {
        match self.get(id) {
            TypeData::Composite(idx) => Some(self.composites[*idx as usize].kind),
            TypeData::Interface(idx) => Some(self.interfaces[*idx as usize].kind),
            _ => None,
        }
    }

    // ---- structural interning ----

    pub fn intern_primitive(&mut self, primitive: Primitive) -> TypeId {
        if let Some(&id) = self.primitive_cache.get(&primitive) {
            return id;
        }
        let id = self.push(TypeData::Primitive(primitive));
        self.primitive_cache.insert(primitive, id);
        id
    }

    pub fn intern_optional(&mut self, inner: TypeId) -> TypeId {
        self.intern_shape(ShapeKey::Optional(inner), |_| TypeData::Optional(inner))
    }

    pub fn intern_array(&mut self, element: TypeId) -> TypeId {
        self.intern_shape(ShapeKey::Array(element), |_| TypeData::Array(element))
    }

    pub fn intern_dictionary(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern_shape(ShapeKey::Dictionary(key, value), |_| TypeData::Dictionary { key, value })
    }

    pub fn intern_function(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern_shape(ShapeKey::Function(params.clone(), ret), move |_| TypeData::Function {
            params,
            ret,
        })
    }

    pub fn intern_restricted(&mut self, base: Option<TypeId>, mut interfaces: Vec<TypeId>) -> TypeId {
        interfaces.sort_unstable();
        interfaces.dedup();
        self.intern_shape(ShapeKey::Restricted(base, interfaces.clone()), move |_| {
            TypeData::Restricted { base, interfaces }
        })
    }

    fn intern_shape(&mut self, key: ShapeKey, make: impl FnOnce(&Self) -> TypeData) -> TypeId {
        if let Some(&id) = self.shape_intern.get(&key) {
            return id;
        }
        let data = make(self);
        let id = self.push(data);
        self.shape_intern.insert(key, id);
        id
    }

    // ---- relations ----

    /// Reflexive, transitive. See §4.1 for the composite/container/function
    /// cases.
    #[must_use]
    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            // T <= T?
            (_, TypeData::Optional(b_inner)) => {
                if self.is_subtype(a, *b_inner) {
                    return true;
                }
                if let TypeData::Optional(a_inner) = self.get(a) {
                    return self.is_subtype(*a_inner, *b_inner);
                }
                false
            }
            (TypeData::Composite(_), TypeData::Interface(_)) => self.transitive_conformances(a).contains(&b),
            (TypeData::Restricted { interfaces, .. }, TypeData::Interface(_)) => interfaces.contains(&b),
            (TypeData::Restricted { base: Some(base), .. }, _) if *base == b => true,
            (
                TypeData::Restricted { base: base_a, interfaces: ifaces_a },
                TypeData::Restricted { base: base_b, interfaces: ifaces_b },
            ) => base_a == base_b && ifaces_b.iter().all(|i| ifaces_a.contains(i)),
            (TypeData::Array(e1), TypeData::Array(e2)) => e1 == e2,
            (TypeData::Dictionary { key: k1, value: v1 }, TypeData::Dictionary { key: k2, value: v2 }) => {
                k1 == k2 && v1 == v2
            }
            (
                TypeData::Function { params: p1, ret: r1 },
                TypeData::Function { params: p2, ret: r2 },
            ) => {
                // contravariant in parameters, covariant in result
                p1.len() == p2.len()
                    && p1.iter().zip(p2).all(|(p1, p2)| self.is_subtype(*p2, *p1))
                    && self.is_subtype(*r1, *r2)
            }
            _ => false,
        }
    }

    /// Every interface transitively satisfied by a composite, by walking
    /// its declared (closed) conformance set. Requires the Conformance
    /// Engine to have already populated `CompositeType::conformances`.
    #[must_use]
    pub fn transitive_conformances(&self, composite: TypeId) -> &[TypeId] {
        match self.composite(composite) {
            Some(c) => &c.conformances,
            None => &[],
        }
    }

    /// Every super-interface transitively reachable from `interface`,
    /// computed on demand (used before the closure is cached, e.g. during
    /// cycle detection). Returns `None` if a cycle prevents termination
    /// within the configured depth bound.
    #[must_use]
    pub fn transitive_supers(&self, interface: TypeId, max_depth: usize) -> Option<Vec<TypeId>> {
        let mut result = Vec::new();
        let mut seen = rustc_hash::FxHashSet::default();
        let mut stack: Vec<(TypeId, usize)> = match self.interface(interface) {
            Some(i) => i.supers.iter().map(|&s| (s, 0)).collect(),
            None => return Some(result),
        };
        while let Some((current, depth)) = stack.pop() {
            if depth > max_depth {
                return None;
            }
            if !seen.insert(current) {
                continue;
            }
            result.push(current);
            if let Some(iface) = self.interface(current) {
                for &s in &iface.supers {
                    stack.push((s, depth + 1));
                }
            }
        }
        Some(result)
    }

    /// `move` if `ty` is (transitively) a resource type, `copy` otherwise.
    #[must_use]
    pub fn default_transfer(&self, ty: TypeId) -> TransferOperator {
        match self.get(ty) {
            TypeData::Composite(idx) if self.composites[*idx as usize].kind.is_resource() => {
                TransferOperator::Move
            }
            TypeData::Optional(inner) => self.default_transfer(*inner),
            TypeData::Restricted { base: Some(base), .. } => self.default_transfer(*base),
            TypeData::Restricted { base: None, interfaces } => {
                if interfaces
                    .iter()
                    .any(|i| self.interface(*i).is_some_and(|iface| iface.kind.is_resource()))
                {
                    TransferOperator::Move
                } else {
                    TransferOperator::Copy
                }
            }
            TypeData::Primitive(Primitive::AnyResource) => TransferOperator::Move,
            _ => TransferOperator::Copy,
        }
    }

    #[must_use]
    pub fn is_resource_type(&self, ty: TypeId) -> bool {
        self.default_transfer(ty) == TransferOperator::Move
    }

    /// Least upper bound used by branch-merge type inference. Falls back
    /// to the `AnyStruct`/`AnyResource` top type when no common named
    /// supertype exists, per §4.1.
    pub fn join(&mut self, a: TypeId, b: TypeId) -> TypeId {
        if a == b {
            return a;
        }
        if self.is_subtype(a, b) {
            return b;
        }
        if self.is_subtype(b, a) {
            return a;
        }
        let common = self.common_conformances(a, b);
        if !common.is_empty() {
            return self.intern_restricted(None, common);
        }
        let top = if self.is_resource_type(a) || self.is_resource_type(b) {
            Primitive::AnyResource
        } else {
            Primitive::AnyStruct
        };
        self.intern_primitive(top)
    }

    fn common_conformances(&self, a: TypeId, b: TypeId) -> Vec<TypeId> {
        let a_set: Vec<TypeId> = match self.get(a) {
            TypeData::Composite(_) => self.transitive_conformances(a).to_vec(),
            TypeData::Restricted { interfaces, .. } => interfaces.clone(),
            _ => return Vec::new(),
        };
        let b_set: Vec<TypeId> = match self.get(b) {
            TypeData::Composite(_) => self.transitive_conformances(b).to_vec(),
            TypeData::Restricted { interfaces, .. } => interfaces.clone(),
            _ => return Vec::new(),
        };
        a_set.into_iter().filter(|i| b_set.contains(i)).collect()
    }
}

/// Convenience constructor used by callers building signatures outside the
/// registry (e.g. the Member Binder assembling a `FunctionSig` before
/// storing it on a member).
#[must_use]
pub fn function_type_of(registry: &mut TypeRegistry, sig: &FunctionSig) -> TypeId {
    let params = sig.params.iter().map(|p| p.ty).collect();
    registry.intern_function(params, sig.return_ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linchk_common::Span;

    fn dummy_span() -> Span {
        Span::dummy()
    }

    #[test]
    fn primitive_interning_deduplicates() {
        let mut reg = TypeRegistry::new();
        let a = reg.intern_primitive(Primitive::Int);
        let b = reg.intern_primitive(Primitive::Int);
        let c = reg.intern_primitive(Primitive::Bool);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn is_subtype_is_reflexive_and_transitive_over_optionals() {
        let mut reg = TypeRegistry::new();
        let int_ty = reg.intern_primitive(Primitive::Int);
        let opt = reg.intern_optional(int_ty);
        let opt_opt_base = reg.intern_optional(opt);
        assert!(reg.is_subtype(int_ty, int_ty));
        assert!(reg.is_subtype(int_ty, opt));
        assert!(reg.is_subtype(opt, opt_opt_base));
        assert!(reg.is_subtype(int_ty, opt_opt_base));
        assert!(!reg.is_subtype(opt, int_ty));
    }

    #[test]
    fn composite_is_subtype_of_transitive_conformance() {
        let mut reg = TypeRegistry::new();
        let iface = reg.declare_interface(InterfaceType::new(
            "HasId".into(),
            CompositeKind::Structure,
            dummy_span(),
        ));
        let mut composite = CompositeType::new("Widget".into(), CompositeKind::Structure, dummy_span());
        composite.conformances.push(iface);
        let widget = reg.declare_composite(composite);
        assert!(reg.is_subtype(widget, iface));
        assert!(!reg.is_subtype(iface, widget));
    }

    #[test]
    fn default_transfer_follows_resource_kind() {
        let mut reg = TypeRegistry::new();
        let int_ty = reg.intern_primitive(Primitive::Int);
        assert_eq!(reg.default_transfer(int_ty), TransferOperator::Copy);

        let vault = reg.declare_composite(CompositeType::new("Vault".into(), CompositeKind::Resource, dummy_span()));
        assert_eq!(reg.default_transfer(vault), TransferOperator::Move);

        let opt_vault = reg.intern_optional(vault);
        assert_eq!(reg.default_transfer(opt_vault), TransferOperator::Move);
    }

    #[test]
    fn function_subtyping_is_contravariant_in_params_covariant_in_result() {
        let mut reg = TypeRegistry::new();
        let int_ty = reg.intern_primitive(Primitive::Int);
        let any_struct = reg.intern_primitive(Primitive::AnyStruct);
        // (AnyStruct) -> Int  <:  (Int) -> AnyStruct
        let narrow = reg.intern_function(vec![any_struct], int_ty);
        let wide = reg.intern_function(vec![int_ty], any_struct);
        assert!(reg.is_subtype(narrow, wide));
        assert!(!reg.is_subtype(wide, narrow));
    }

    #[test]
    fn restricted_type_is_subtype_of_each_listed_interface_and_of_base() {
        let mut reg = TypeRegistry::new();
        let i1 = reg.declare_interface(InterfaceType::new("I1".into(), CompositeKind::Structure, dummy_span()));
        let i2 = reg.declare_interface(InterfaceType::new("I2".into(), CompositeKind::Structure, dummy_span()));
        let base = reg.declare_composite(CompositeType::new("Base".into(), CompositeKind::Structure, dummy_span()));
        let restricted = reg.intern_restricted(Some(base), vec![i1, i2]);
        assert!(reg.is_subtype(restricted, i1));
        assert!(reg.is_subtype(restricted, i2));
        assert!(reg.is_subtype(restricted, base));
    }
}
