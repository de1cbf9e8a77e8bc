//! API-side permission guard for inventory operations.
//!
//! Enforced at the dispatch boundary (before the engine runs). Location scope
//! is checked later by the engine, which owns the assignment directory.

use stockroom_auth::{AuthzError, Permission, RolePolicy, authorize};
use stockroom_inventory::Operation;

use crate::context::ActorContext;

/// Permission an operation needs.
pub fn required_permission(operation: Operation) -> Permission {
    match operation {
        Operation::CheckAvailability | Operation::CheckBundleAvailability => {
            Permission::INVENTORY_READ
        }
        Operation::ReserveStock
        | Operation::ReleaseStock
        | Operation::RecordSale
        | Operation::ProcessReturn
        | Operation::ReserveBundleStock
        | Operation::ReleaseBundleStock
        | Operation::RecordBundleSale => Permission::INVENTORY_RESERVE,
        Operation::AdjustStock | Operation::TransferStock | Operation::AdjustPackagingStock => {
            Permission::INVENTORY_ADJUST
        }
    }
}

/// Check the caller may run `operation`.
pub fn authorize_operation(
    policy: &RolePolicy,
    ctx: &ActorContext,
    operation: Operation,
) -> Result<(), AuthzError> {
    authorize_permission(policy, ctx, &required_permission(operation))
}

pub fn authorize_permission(
    policy: &RolePolicy,
    ctx: &ActorContext,
    permission: &Permission,
) -> Result<(), AuthzError> {
    let principal = policy.resolve(ctx.actor());
    authorize(&principal, permission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_auth::{Actor, Role};
    use stockroom_core::ActorId;

    fn ctx(roles: Vec<Role>) -> ActorContext {
        ActorContext::new(Actor::new(ActorId::new(), roles))
    }

    #[test]
    fn every_operation_maps_to_an_inventory_permission() {
        for op in Operation::ALL {
            let permission = required_permission(op);
            assert!(permission.as_str().starts_with("inventory."));
            if op.is_read_only() {
                assert_eq!(permission, Permission::INVENTORY_READ);
            }
        }
    }

    #[test]
    fn sales_may_reserve_but_not_adjust() {
        let policy = RolePolicy::standard();
        let sales = ctx(vec![Role::SALES]);
        assert!(authorize_operation(&policy, &sales, Operation::ReserveStock).is_ok());
        assert!(authorize_operation(&policy, &sales, Operation::AdjustStock).is_err());
    }

    #[test]
    fn unknown_roles_get_nothing() {
        let policy = RolePolicy::standard();
        let viewer = ctx(vec![Role::new("viewer")]);
        assert!(authorize_operation(&policy, &viewer, Operation::CheckAvailability).is_err());
    }
}
