//! Top-level and nested declarations: composites, interfaces, imports, and
//! the program that contains them.

use crate::kinds::CompositeKind;
use crate::member::{FieldDecl, FunctionDecl, InitializerDecl, MemberDecl, Param};
use crate::ty::Path;
use linchk_common::{ProgramId, Span};

/// A single `case` of an `enum` declaration. Enums carry only cases; they
/// are never constructed via `create`/direct-call syntax (§9), only
/// referenced via member-syntax literals (`Direction.north`).
#[derive(Clone, Debug)]
pub struct EnumCase {
    pub name: String,
    pub span: Span,
}

/// A nested type requirement declared inside a contract interface (§4.4
/// rule 7): implementors must declare a matching nested composite, not a
/// nested interface.
#[derive(Clone, Debug)]
pub struct NestedTypeRequirement {
    pub name: String,
    pub kind: CompositeKind,
    pub members: Vec<MemberDecl>,
    pub required_conformances: Vec<Path>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct CompositeDecl {
    pub name: String,
    pub kind: CompositeKind,
    /// Declared conformance list, in source order (duplicates retained —
    /// the Conformance Engine deduplicates and reports).
    pub conformances: Vec<Path>,
    pub members: Vec<MemberDecl>,
    pub nested: Vec<Declaration>,
    pub initializer: Option<InitializerDecl>,
    pub has_destructor: bool,
    /// Only populated for `event` composites.
    pub event_parameters: Vec<Param>,
    /// Only populated for `enum` composites.
    pub enum_cases: Vec<EnumCase>,
    pub span: Span,
}

impl CompositeDecl {
    #[must_use]
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            MemberDecl::Field(f) => Some(f),
            MemberDecl::Function(_) => None,
        })
    }

    #[must_use]
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.members.iter().filter_map(|m| match m {
            MemberDecl::Function(f) => Some(f),
            MemberDecl::Field(_) => None,
        })
    }
}

#[derive(Clone, Debug)]
pub struct InterfaceDecl {
    pub name: String,
    pub kind: CompositeKind,
    /// Super-interfaces, in source order.
    pub supers: Vec<Path>,
    pub members: Vec<MemberDecl>,
    pub nested: Vec<Declaration>,
    pub nested_type_requirements: Vec<NestedTypeRequirement>,
    pub initializer: Option<InitializerDecl>,
    pub span: Span,
}

/// An import statement; resolution is delegated to the caller-supplied
/// `import_resolver` (out of scope, §1) but the declaration itself is part
/// of the syntax tree contract.
#[derive(Clone, Debug)]
pub struct ImportDecl {
    pub target: ProgramId,
    /// Empty means "import everything publicly visible".
    pub names: Vec<String>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Declaration {
    Composite(CompositeDecl),
    Interface(InterfaceDecl),
    Import(ImportDecl),
}

impl Declaration {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Composite(c) => Some(&c.name),
            Declaration::Interface(i) => Some(&i.name),
            Declaration::Import(_) => None,
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Declaration::Composite(c) => c.span,
            Declaration::Interface(i) => i.span,
            Declaration::Import(i) => i.span,
        }
    }
}

/// The parsed syntax tree handed to `check()`.
#[derive(Clone, Debug)]
pub struct Program {
    pub id: ProgramId,
    pub declarations: Vec<Declaration>,
    /// Free functions at the top level, as in the specification's
    /// end-to-end scenarios (`fun test() { ... }`). Not composite members.
    pub functions: Vec<FunctionDecl>,
}

impl Program {
    #[must_use]
    pub fn new(id: ProgramId) -> Self {
        Program { id, declarations: Vec::new(), functions: Vec::new() }
    }
}
