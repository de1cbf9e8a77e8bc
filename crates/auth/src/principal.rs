use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use stockroom_core::{ActorId, LocationId};

use crate::Role;

/// An authenticated caller of the engine.
///
/// Attribution for every movement comes from `actor_id`; `roles` feed the
/// [`crate::RolePolicy`] to decide permissions and location scoping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: ActorId,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn new(actor_id: ActorId, roles: Vec<Role>) -> Self {
        Self { actor_id, roles }
    }
}

/// Locations an actor is attached to.
///
/// An actor is attached to a location either by managing it directly or by
/// being assigned to its staff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAssignments {
    pub managed: BTreeSet<LocationId>,
    pub staffed: BTreeSet<LocationId>,
}

impl LocationAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn managing(mut self, location: LocationId) -> Self {
        self.managed.insert(location);
        self
    }

    pub fn staffing(mut self, location: LocationId) -> Self {
        self.staffed.insert(location);
        self
    }

    pub fn covers(&self, location: LocationId) -> bool {
        self.managed.contains(&location) || self.staffed.contains(&location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_and_staff_assignments_both_cover_a_location() {
        let managed = LocationId::new();
        let staffed = LocationId::new();
        let other = LocationId::new();

        let assignments = LocationAssignments::new()
            .managing(managed)
            .staffing(staffed);

        assert!(assignments.covers(managed));
        assert!(assignments.covers(staffed));
        assert!(!assignments.covers(other));
    }
}
