//! Structured diagnostics and the collector that accumulates them.
//!
//! All semantic violations are recorded as non-fatal diagnostics; the
//! checker continues past the failing site to surface further errors.
//! Fatal conditions (internal bugs) are not diagnostics at all — they are
//! Rust panics raised via `unreachable!`/`debug_assert!` at the call site.

use crate::span::Location;
use serde::Serialize;

/// The full error taxonomy, grouped the way the specification groups it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    // Declaration
    RedeclarationError,
    InvalidDeclarationError,
    InvalidNestedDeclarationError,
    NotDeclaredError,
    InvalidConformanceError,

    // Conformance
    ConformanceError,
    CompositeKindMismatchError,
    DeclarationKindMismatchError,
    DuplicateConformanceError,
    MissingConformanceError,
    CyclicConformanceError,
    InterfaceMemberConflictError,
    MultipleInterfaceDefaultImplementationsError,
    DefaultFunctionConflictError,
    SpecialFunctionDefaultImplementationError,

    // Types
    TypeMismatchError,
    NotDeclaredMemberError,
    InvalidInterfaceTypeError,
    UnsupportedTypeError,
    NotEquatableTypeError,
    InvalidDictionaryKeyTypeError,
    FieldTypeNotStorableError,

    // Implementation bodies
    InvalidImplementationError,

    // Access
    AssignmentToConstantMemberError,

    // Resources
    MissingResourceAnnotationError,
    InvalidResourceAnnotationError,
    MissingMoveOperationError,
    InvalidMoveOperationError,
    MissingMoveAnnotationError,
    InvalidMoveAnnotationError,
    IncorrectTransferOperationError,
    MissingCreateError,
    InvalidConstructionError,
    InvalidDestructionError,
    InvalidMoveError,
    InvalidResourceAssignmentError,
    InvalidResourceFieldError,
    InvalidNestedResourceMoveError,
    InvalidSelfInvalidationError,
    InvalidSwapExpressionError,
    ResourceLossError,
    ResourceUseAfterInvalidationError,
    ResourceMethodBindingError,
    InvalidResourceArrayMemberError,
    InvalidResourceDictionaryMemberError,
    CreateImportedResourceError,
    InvalidFailableResourceDowncastOutsideOptionalBindingError,
    InvalidEventUsageError,

    // Control flow
    UnreachableStatementError,

    // Import (the one condition that also crosses the Result boundary)
    ImportError,
}

/// A suggested replacement type, attached to diagnostics like
/// `InvalidInterfaceTypeError` (e.g. "use `AnyResource{I}` instead").
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Hint {
    pub message: String,
}

impl Hint {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Hint { message: message.into() }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub primary_location: Location,
    pub secondary_locations: Vec<Location>,
    pub hint: Option<Hint>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, primary_location: Location) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            primary_location,
            secondary_locations: Vec::new(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_secondary(mut self, location: Location) -> Self {
        self.secondary_locations.push(location);
        self
    }

    #[must_use]
    pub fn with_secondaries(mut self, locations: impl IntoIterator<Item = Location>) -> Self {
        self.secondary_locations.extend(locations);
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hint = Some(hint);
        self
    }
}

/// Accumulates diagnostics across all passes of a single `check()` call.
///
/// The check is "successful" only if no errors were recorded — callers
/// should not treat a non-empty diagnostic vector containing only warnings
/// (there are none in this taxonomy today, but the type allows for them) as
/// failure without checking `kind`.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(
            kind = ?diagnostic.kind,
            span = ?diagnostic.primary_location.span,
            "diagnostic emitted"
        );
        self.diagnostics.push(diagnostic);
    }

    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        primary_location: Location,
    ) {
        self.push(Diagnostic::new(kind, message, primary_location));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{ProgramId, Span};

    fn loc() -> Location {
        Location::new(ProgramId::from("test.rsl"), Span::new(0, 1))
    }

    #[test]
    fn collector_starts_empty() {
        let collector = DiagnosticCollector::new();
        assert!(collector.is_empty());
    }

    #[test]
    fn collector_accumulates_in_order() {
        let mut collector = DiagnosticCollector::new();
        collector.report(DiagnosticKind::ResourceLossError, "lost", loc());
        collector.report(DiagnosticKind::ConformanceError, "missing member", loc());
        let diags = collector.into_vec();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].kind, DiagnosticKind::ResourceLossError);
        assert_eq!(diags[1].kind, DiagnosticKind::ConformanceError);
    }

    #[test]
    fn diagnostic_builder_attaches_hint_and_secondaries() {
        let d = Diagnostic::new(DiagnosticKind::InvalidInterfaceTypeError, "bad", loc())
            .with_secondary(loc())
            .with_hint(Hint::new("use AnyResource{I} instead"));
        assert_eq!(d.secondary_locations.len(), 1);
        assert_eq!(d.hint.unwrap().message, "use AnyResource{I} instead");
    }
}
