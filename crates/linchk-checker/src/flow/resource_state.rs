//! The three-point resource-state lattice (§4.7, §3).

/// How a location was invalidated. Tracked so diagnostics can say whether
/// the resource was moved away or destroyed outright, even though the two
/// merge to the same lattice point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidationKind {
    Moved,
    Destroyed,
}

/// `Valid` ⊏ `MaybeInvalidated` ⊏ `Invalidated` is not a total order the
/// way the name suggests — `MaybeInvalidated` is the join of `Valid` and
/// `Invalidated` disagreeing across branches, not a point "between" them in
/// a chain. Three points, one join rule (§4.7 merge semantics).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Valid,
    Invalidated(InvalidationKind),
    MaybeInvalidated,
}

impl ResourceState {
    #[must_use]
    pub fn join(self, other: ResourceState) -> ResourceState {
        match (self, other) {
            (ResourceState::Valid, ResourceState::Valid) => ResourceState::Valid,
            (ResourceState::Invalidated(_), ResourceState::Invalidated(_)) => self,
            _ => ResourceState::MaybeInvalidated,
        }
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, ResourceState::Valid)
    }

    #[must_use]
    pub const fn is_invalidated(self) -> bool {
        matches!(self, ResourceState::Invalidated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agreeing_branches_join_to_the_same_state() {
        assert_eq!(ResourceState::Valid.join(ResourceState::Valid), ResourceState::Valid);
        assert_eq!(
            ResourceState::Invalidated(InvalidationKind::Moved).join(ResourceState::Invalidated(InvalidationKind::Destroyed)),
            ResourceState::Invalidated(InvalidationKind::Moved)
        );
    }

    #[test]
    fn disagreeing_branches_join_to_maybe_invalidated() {
        assert_eq!(
            ResourceState::Valid.join(ResourceState::Invalidated(InvalidationKind::Moved)),
            ResourceState::MaybeInvalidated
        );
    }
}
