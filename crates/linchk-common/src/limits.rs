//! Centralized limits and thresholds, kept in one place so callers can see
//! at a glance what the checker bounds to avoid runaway recursion.

/// Upper bound on fixed-point iterations the Resource Tracker will run over
/// a single loop body before concluding the state map cannot stabilize.
/// The state lattice has three points per location, so in practice this is
/// never approached; it exists as a hard backstop against a bug in the join
/// implementation turning into an infinite loop.
pub const MAX_RESOURCE_TRACKER_FIXPOINT_ITERATIONS: usize = 64;

/// Upper bound on the depth of nested declarations (composites nested in
/// composites nested in composites, ...) the Declaration Resolver will
/// follow before giving up and reporting `InvalidNestedDeclarationError`.
pub const MAX_NESTED_DECLARATION_DEPTH: usize = 32;

/// Upper bound on interface-inheritance chain depth explored by cycle
/// detection before treating the graph as pathological.
pub const MAX_INTERFACE_INHERITANCE_DEPTH: usize = 64;
