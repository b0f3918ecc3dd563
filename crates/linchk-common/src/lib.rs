//! Common types shared across the checker crates.
//!
//! This crate provides foundational types with no dependency on the syntax
//! tree or type system: source locations, string interning, the diagnostic
//! taxonomy and collector, centralized limits, and the `CheckerConfig`
//! surface.

pub mod config;
pub mod diagnostics;
pub mod interner;
pub mod limits;
pub mod span;

pub use config::{AccessCheckMode, BaseValueActivation, CheckerConfig};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind, Hint};
pub use interner::{Atom, Interner};
pub use span::{Location, ProgramId, Span};
