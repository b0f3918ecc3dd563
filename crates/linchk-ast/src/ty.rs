//! Type annotations as written in source, prior to resolution by the Type
//! Registry. `linchk-solver` turns these into interned `TypeId`s.

use linchk_common::Span;

/// A (possibly qualified) path to a declared name, e.g. `A.B.C`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<String>,
    pub span: Span,
}

impl Path {
    #[must_use]
    pub fn simple(name: impl Into<String>, span: Span) -> Self {
        Path { segments: vec![name.into()], span }
    }

    #[must_use]
    pub fn last(&self) -> &str {
        self.segments.last().expect("path always has at least one segment")
    }

    #[must_use]
    pub fn qualified(&self) -> String {
        self.segments.join(".")
    }
}

/// Names for the primitive/built-in types; the concrete set is a registry
/// concern (out of scope, §1) but the checker needs to recognize the ones
/// referenced by spec invariants (`Int`, `Bool`, `String`, `Void`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeAnnotation {
    /// A nominal reference to a composite or interface, or a primitive name.
    Nominal(Path),
    /// `T?`
    Optional(Box<TypeAnnotation>),
    /// `[T]`
    Array(Box<TypeAnnotation>),
    /// `{K: V}`
    Dictionary(Box<TypeAnnotation>, Box<TypeAnnotation>),
    /// `T{I1, I2, ...}` — base type restricted by a set of interfaces.
    Restricted { base: Option<Box<TypeAnnotation>>, interfaces: Vec<Path> },
    /// `((P1, P2) -> R)`
    Function { params: Vec<TypeAnnotation>, ret: Box<TypeAnnotation> },
    /// `&T` — an authorized or unauthorized reference; references are
    /// always copy-transferred regardless of what they reference.
    Reference { authorized: bool, of: Box<TypeAnnotation> },
}

impl TypeAnnotation {
    #[must_use]
    pub fn nominal(name: impl Into<String>, span: Span) -> Self {
        TypeAnnotation::Nominal(Path::simple(name, span))
    }
}
