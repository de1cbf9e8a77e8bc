//! `stockroom-auth`: actor identity, capability policy and location scoping.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, LocationScope, Principal, RoleGrant, RolePolicy, authorize};
pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use permissions::Permission;
pub use principal::{Actor, LocationAssignments};
pub use roles::Role;
