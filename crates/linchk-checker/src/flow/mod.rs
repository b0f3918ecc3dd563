//! The Resource Tracker's state lattice and per-body state map (§4.7).

pub mod resource_state;
pub mod tracker;

pub use resource_state::{InvalidationKind, ResourceState};
pub use tracker::{FlowState, Loc};
