//! Declaration Resolver, Member Binder, and the scoped symbol table that
//! sits between them (§4.2, §4.3).

pub mod member_binder;
pub mod resolver;
pub mod symbol;
pub mod type_resolve;

pub use member_binder::bind_program;
pub use resolver::{resolve_program, DeclarationScopes};
pub use symbol::{ScopeId, Symbol, SymbolId, SymbolKind, SymbolTable};
pub use type_resolve::{resolve_path, resolve_type, TypeResolveCx};
