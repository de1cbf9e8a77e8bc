use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use thiserror::Error;

use stockroom_core::{ActorId, LocationId, StockError};

use crate::{Actor, LocationAssignments, Permission, Role};

/// How far an actor's authority reaches across locations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationScope {
    /// May act on any location.
    Unrestricted,
    /// May only act on locations the actor manages or staffs.
    Assigned,
}

/// What a single role grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub scope: LocationScope,
    pub permissions: BTreeSet<Permission>,
}

impl RoleGrant {
    pub fn new(scope: LocationScope, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            scope,
            permissions: permissions.into_iter().collect(),
        }
    }
}

/// Role → capability mapping.
///
/// New role types are added by registering a grant; nothing downstream
/// compares role names.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    grants: HashMap<Role, RoleGrant>,
}

impl RolePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in roles for a multi-outlet retail deployment.
    pub fn standard() -> Self {
        use LocationScope::{Assigned, Unrestricted};

        Self::new()
            .grant(Role::ADMIN, RoleGrant::new(Unrestricted, [Permission::ALL]))
            .grant(
                Role::OWNER,
                RoleGrant::new(
                    Unrestricted,
                    [
                        Permission::INVENTORY_READ,
                        Permission::INVENTORY_RESERVE,
                        Permission::INVENTORY_ADJUST,
                    ],
                ),
            )
            .grant(
                Role::WAREHOUSE_MANAGER,
                RoleGrant::new(
                    Assigned,
                    [
                        Permission::INVENTORY_READ,
                        Permission::INVENTORY_RESERVE,
                        Permission::INVENTORY_ADJUST,
                    ],
                ),
            )
            .grant(
                Role::STORE_MANAGER,
                RoleGrant::new(
                    Assigned,
                    [
                        Permission::INVENTORY_READ,
                        Permission::INVENTORY_RESERVE,
                        Permission::INVENTORY_ADJUST,
                    ],
                ),
            )
            .grant(
                Role::STAFF,
                RoleGrant::new(
                    Assigned,
                    [Permission::INVENTORY_READ, Permission::INVENTORY_RESERVE],
                ),
            )
            .grant(
                Role::SALES,
                RoleGrant::new(
                    Unrestricted,
                    [Permission::INVENTORY_READ, Permission::INVENTORY_RESERVE],
                ),
            )
    }

    pub fn grant(mut self, role: Role, grant: RoleGrant) -> Self {
        self.grants.insert(role, grant);
        self
    }

    /// Resolve an actor into an authorization principal.
    ///
    /// The actor is unrestricted only when a role known to the policy grants
    /// `Unrestricted`. Everyone else, including actors with no roles or only
    /// unknown roles, is limited to assigned locations.
    pub fn resolve(&self, actor: &Actor) -> Principal {
        let mut permissions = BTreeSet::new();
        let mut any_unrestricted = false;

        for role in &actor.roles {
            let Some(grant) = self.grants.get(role) else {
                continue;
            };
            permissions.extend(grant.permissions.iter().cloned());
            if grant.scope == LocationScope::Unrestricted {
                any_unrestricted = true;
            }
        }

        let scope = if any_unrestricted {
            LocationScope::Unrestricted
        } else {
            LocationScope::Assigned
        };

        Principal {
            actor_id: actor.actor_id,
            roles: actor.roles.clone(),
            permissions,
            scope,
        }
    }
}

/// A fully resolved actor for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub actor_id: ActorId,
    pub roles: Vec<Role>,
    pub permissions: BTreeSet<Permission>,
    pub scope: LocationScope,
}

impl Principal {
    pub fn is_location_scoped(&self) -> bool {
        self.scope == LocationScope::Assigned
    }

    /// Check that this principal may act on `location`.
    ///
    /// Unrestricted principals pass without consulting `assignments`.
    pub fn authorize_location(
        &self,
        location: LocationId,
        assignments: &LocationAssignments,
    ) -> Result<(), AuthzError> {
        match self.scope {
            LocationScope::Unrestricted => Ok(()),
            LocationScope::Assigned if assignments.covers(location) => Ok(()),
            LocationScope::Assigned => Err(AuthzError::LocationNotAssigned {
                actor_id: self.actor_id,
                location_id: location,
            }),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("actor {actor_id} is not assigned to location {location_id}")]
    LocationNotAssigned {
        actor_id: ActorId,
        location_id: LocationId,
    },
}

impl From<AuthzError> for StockError {
    fn from(value: AuthzError) -> Self {
        StockError::unauthorized(value.to_string())
    }
}

/// Check a principal holds `required` (or the wildcard).
///
/// - No IO
/// - No panics
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(roles: Vec<Role>) -> Actor {
        Actor::new(ActorId::new(), roles)
    }

    #[test]
    fn admin_holds_every_permission_and_is_unrestricted() {
        let policy = RolePolicy::standard();
        let principal = policy.resolve(&actor(vec![Role::ADMIN]));

        assert!(authorize(&principal, &Permission::INVENTORY_ADJUST).is_ok());
        assert!(authorize(&principal, &Permission::new("anything.else")).is_ok());
        assert_eq!(principal.scope, LocationScope::Unrestricted);
    }

    #[test]
    fn store_manager_is_scoped_to_assigned_locations() {
        let policy = RolePolicy::standard();
        let principal = policy.resolve(&actor(vec![Role::STORE_MANAGER]));
        let assigned = LocationId::new();
        let elsewhere = LocationId::new();
        let assignments = LocationAssignments::new().managing(assigned);

        assert!(principal.is_location_scoped());
        assert!(principal.authorize_location(assigned, &assignments).is_ok());
        assert!(matches!(
            principal.authorize_location(elsewhere, &assignments),
            Err(AuthzError::LocationNotAssigned { .. })
        ));
    }

    #[test]
    fn unrestricted_role_lifts_location_scope() {
        let policy = RolePolicy::standard();
        let principal = policy.resolve(&actor(vec![Role::STAFF, Role::OWNER]));

        assert_eq!(principal.scope, LocationScope::Unrestricted);
        assert!(
            principal
                .authorize_location(LocationId::new(), &LocationAssignments::new())
                .is_ok()
        );
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let policy = RolePolicy::standard();
        let principal = policy.resolve(&actor(vec![Role::new("auditor")]));

        assert!(principal.permissions.is_empty());
        assert_eq!(
            authorize(&principal, &Permission::INVENTORY_READ),
            Err(AuthzError::Forbidden("inventory.read".to_string()))
        );
    }

    #[test]
    fn actors_without_known_roles_are_location_scoped() {
        let policy = RolePolicy::standard();
        let location = LocationId::new();

        for roles in [vec![], vec![Role::new("auditor")]] {
            let principal = policy.resolve(&actor(roles));
            assert_eq!(principal.scope, LocationScope::Assigned);
            assert!(matches!(
                principal.authorize_location(location, &LocationAssignments::new()),
                Err(AuthzError::LocationNotAssigned { .. })
            ));
        }
    }

    #[test]
    fn custom_roles_can_be_registered_without_code_changes() {
        let policy = RolePolicy::standard().grant(
            Role::new("regional_lead"),
            RoleGrant::new(LocationScope::Assigned, [Permission::INVENTORY_ADJUST]),
        );
        let principal = policy.resolve(&actor(vec![Role::new("regional_lead")]));

        assert!(principal.is_location_scoped());
        assert!(authorize(&principal, &Permission::INVENTORY_ADJUST).is_ok());
    }

    #[test]
    fn denied_location_maps_to_unauthorized_stock_error() {
        let err: StockError = AuthzError::LocationNotAssigned {
            actor_id: ActorId::new(),
            location_id: LocationId::new(),
        }
        .into();
        assert_eq!(err.code(), "unauthorized");
    }
}
