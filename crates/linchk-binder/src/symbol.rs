//! Scoped symbol activations. The Declaration Resolver registers every
//! composite and interface name here before any type annotation is
//! resolved, which is what makes forward references work: a name is
//! visible to lookups from the moment its containing scope finishes its
//! first sub-pass, regardless of where in that scope it was written.

use indexmap::IndexMap;
use linchk_common::Span;
use linchk_solver::TypeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Composite,
    Interface,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub type_id: TypeId,
    pub span: Span,
}

#[derive(Default)]
struct Scope {
    parent: Option<ScopeId>,
    names: IndexMap<String, SymbolId>,
}

/// Scoped symbol table. Scopes form a tree rooted at `SymbolTable::root()`;
/// lookups walk from a scope up through its ancestors.
#[derive(Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        let mut table = SymbolTable::default();
        table.scopes.push(Scope::default());
        table
    }

    #[must_use]
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope { parent: Some(parent), names: IndexMap::new() });
        id
    }

    /// Declares `name` in `scope`. Returns `Err(existing)` without
    /// inserting when the name is already declared *in this exact scope*
    /// (shadowing an ancestor scope's name is not a redeclaration).
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        type_id: TypeId,
        span: Span,
    ) -> Result<SymbolId, SymbolId> {
        if let Some(&existing) = self.scopes[scope.0 as usize].names.get(name) {
            return Err(existing);
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol { name: name.to_string(), kind, type_id, span });
        self.scopes[scope.0 as usize].names.insert(name.to_string(), id);
        Ok(id)
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    /// Looks up `name` starting at `scope`, walking up through ancestors.
    #[must_use]
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(&id) = self.scopes[s.0 as usize].names.get(name) {
                return Some(id);
            }
            current = self.scopes[s.0 as usize].parent;
        }
        None
    }

    /// Looks up `name` only within `scope` itself, not ancestors. Used to
    /// detect redeclarations and to resolve a qualified path segment
    /// against a specific nested scope.
    #[must_use]
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.0 as usize].names.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linchk_common::Span;

    #[test]
    fn forward_reference_resolves_via_same_scope_lookup() {
        let mut table = SymbolTable::new();
        let root = table.root();
        // Declare B before A is looked up — but A refers to B, which is
        // registered regardless of declaration order within the scope.
        let b = table
            .declare(root, "B", SymbolKind::Interface, TypeId(1), Span::dummy())
            .unwrap();
        assert_eq!(table.lookup(root, "B"), Some(b));
        assert_eq!(table.lookup(root, "A"), None);
    }

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let first = table
            .declare(root, "S", SymbolKind::Composite, TypeId(0), Span::dummy())
            .unwrap();
        let result = table.declare(root, "S", SymbolKind::Composite, TypeId(2), Span::dummy());
        assert_eq!(result, Err(first));
    }

    #[test]
    fn nested_scope_sees_parent_names() {
        let mut table = SymbolTable::new();
        let root = table.root();
        table.declare(root, "Outer", SymbolKind::Composite, TypeId(0), Span::dummy()).unwrap();
        let child = table.new_scope(root);
        assert!(table.lookup(child, "Outer").is_some());
        assert!(table.lookup_local(child, "Outer").is_none());
    }
}
