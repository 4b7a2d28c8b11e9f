//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod admin;
mod authorization;
mod role;
mod security;
mod system_role;

pub use admin::{AccessLevel, AdminAccount, AdminId, AdminStatus};
pub use authorization::{
    AccessDenial, AccessRequirement, Authorization, DenialKind, GrantSource, PermissionMatrixRow,
    authorize, effective_permissions, permission_matrix,
};
pub use role::{NewRole, Role, RoleId, RoleLevel, RoleName, SubordinateLimit};
pub use security::{Action, AuditAction, Permission, PermissionSet, Resource, WILDCARD_PERMISSION};
pub use system_role::{SYSTEM_ROLE_COUNT, SystemRole};
