//! The per-body resource state map and its fork/merge operations (§4.7).
//! One `FlowState` is threaded through a single function/initializer body;
//! separate bodies never share one (§5).

use super::resource_state::{InvalidationKind, ResourceState};
use linchk_common::Span;
use rustc_hash::FxHashMap;

/// A storage location the tracker watches: a local (including function
/// parameters), or a field reached through `self`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Loc {
    Local(String),
    SelfField(String),
}

#[derive(Clone, Debug)]
struct Fact {
    state: ResourceState,
    /// Every invalidating operation's span contributing to the current
    /// state; more than one only once `state` is `MaybeInvalidated`.
    sites: Vec<Span>,
}

#[derive(Clone, Default, Debug)]
pub struct FlowState {
    facts: FxHashMap<Loc, Fact>,
}

impl FlowState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings a resource-typed location under tracking, starting `Valid`.
    pub fn declare(&mut self, loc: Loc) {
        self.facts.insert(loc, Fact { state: ResourceState::Valid, sites: Vec::new() });
    }

    #[must_use]
    pub fn is_tracked(&self, loc: &Loc) -> bool {
        self.facts.contains_key(loc)
    }

    #[must_use]
    pub fn state(&self, loc: &Loc) -> ResourceState {
        self.facts.get(loc).map_or(ResourceState::Valid, |f| f.state)
    }

    #[must_use]
    pub fn sites(&self, loc: &Loc) -> &[Span] {
        self.facts.get(loc).map_or(&[], |f| f.sites.as_slice())
    }

    /// Marks `loc` invalidated at `span`. Returns the state it was in
    /// immediately before, so the caller can decide whether this is a
    /// legal first invalidation or a use-after-invalidation.
    pub fn invalidate(&mut self, loc: Loc, kind: InvalidationKind, span: Span) -> ResourceState {
        let previous = self.state(&loc);
        self.facts.insert(loc, Fact { state: ResourceState::Invalidated(kind), sites: vec![span] });
        previous
    }

    /// Removes tracking for a location entirely — used when a `while` loop
    /// re-creates a binding that shadows an outer one, or when a location
    /// goes out of scope mid-body (block exit).
    pub fn forget(&mut self, loc: &Loc) {
        self.facts.remove(loc);
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&Loc, ResourceState)> {
        self.facts.iter().map(|(loc, fact)| (loc, fact.state))
    }

    /// A cheap equality check over states only (ignoring invalidation
    /// sites), used by the `while`-loop fixed-point search to detect when
    /// another iteration stops changing anything.
    #[must_use]
    pub fn states_equal(&self, other: &FlowState) -> bool {
        if self.facts.len() != other.facts.len() {
            return false;
        }
        self.facts.iter().all(|(loc, fact)| other.facts.get(loc).is_some_and(|o| o.state == fact.state))
    }

    /// Joins two branch-end states into the state after an `if`/`switch`
    /// with no further branches, merging per-location per §4.7.
    #[must_use]
    pub fn merge(branches: &[FlowState]) -> FlowState {
        let mut keys: Vec<Loc> = Vec::new();
        for branch in branches {
            for loc in branch.facts.keys() {
                if !keys.contains(loc) {
                    keys.push(loc.clone());
                }
            }
        }
        let mut merged = FlowState::default();
        for loc in keys {
            let mut state: Option<ResourceState> = None;
            let mut sites = Vec::new();
            for branch in branches {
                let branch_state = branch.state(&loc);
                sites.extend(branch.sites(&loc).iter().copied());
                state = Some(match state {
                    None => branch_state,
                    Some(existing) => existing.join(branch_state),
                });
            }
            if let Some(state) = state {
                merged.facts.insert(loc, Fact { state, sites });
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_location_starts_valid() {
        let mut state = FlowState::new();
        state.declare(Loc::Local("x".to_string()));
        assert_eq!(state.state(&Loc::Local("x".to_string())), ResourceState::Valid);
    }

    #[test]
    fn merge_of_agreeing_invalidated_branches_stays_invalidated() {
        let mut a = FlowState::new();
        a.declare(Loc::Local("x".to_string()));
        a.invalidate(Loc::Local("x".to_string()), InvalidationKind::Moved, Span::dummy());
        let mut b = FlowState::new();
        b.declare(Loc::Local("x".to_string()));
        b.invalidate(Loc::Local("x".to_string()), InvalidationKind::Destroyed, Span::dummy());
        let merged = FlowState::merge(&[a, b]);
        assert!(merged.state(&Loc::Local("x".to_string())).is_invalidated());
    }

    #[test]
    fn merge_of_disagreeing_branches_is_maybe_invalidated() {
        let mut a = FlowState::new();
        a.declare(Loc::Local("x".to_string()));
        let mut b = FlowState::new();
        b.declare(Loc::Local("x".to_string()));
        b.invalidate(Loc::Local("x".to_string()), InvalidationKind::Moved, Span::dummy());
        let merged = FlowState::merge(&[a, b]);
        assert_eq!(merged.state(&Loc::Local("x".to_string())), ResourceState::MaybeInvalidated);
    }
}
