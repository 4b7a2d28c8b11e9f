use async_trait::async_trait;
use chrono::{DateTime, Utc};

use quicklink_core::AppResult;
use quicklink_domain::{
    AdminAccount, AdminId, AdminStatus, AuditAction, NewRole, Role, RoleId, RoleName,
};

/// Repository port for the `roles` collection.
///
/// Role names are unique. `create_role` is the store's create-if-absent
/// primitive: it fails with `AppError::Conflict` when the name is taken and
/// never overwrites the existing document.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role by its unique name.
    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>>;

    /// Finds a role by identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists all roles ordered by level, then name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Creates a role unless one with the same name exists.
    async fn create_role(&self, role: NewRole) -> AppResult<Role>;

    /// Deletes a role document.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;
}

/// Partial update applied to one admin document. `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPatch {
    /// New lifecycle state.
    pub status: Option<AdminStatus>,
    /// New sign-in timestamp.
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Repository port for the `admins` collection.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Finds an admin by principal identifier.
    async fn find_admin(&self, admin_id: &AdminId) -> AppResult<Option<AdminAccount>>;

    /// Lists all admins ordered by identifier.
    async fn list_admins(&self) -> AppResult<Vec<AdminAccount>>;

    /// Creates an admin document, failing with `AppError::Conflict` if the id exists.
    async fn create_admin(&self, account: AdminAccount) -> AppResult<()>;

    /// Applies a partial update and returns the stored result.
    async fn update_admin(&self, admin_id: &AdminId, patch: AdminPatch) -> AppResult<AdminAccount>;

    /// Assigns `role` only when the admin has no `role_id` yet, mirroring the
    /// role's name into `access_level` and its cap into `max_sub_users_allowed`.
    /// Returns whether it was written; fails with `AppError::NotFound` when the
    /// admin or the role no longer exists.
    async fn backfill_role(&self, admin_id: &AdminId, role: &Role) -> AppResult<bool>;

    /// Increments the subordinate counter if it stays within the cap; returns whether it did.
    async fn reserve_subordinate_slot(&self, admin_id: &AdminId) -> AppResult<bool>;

    /// Undoes one reservation after a failed subordinate creation.
    async fn release_subordinate_slot(&self, admin_id: &AdminId) -> AppResult<()>;

    /// Counts admins referencing the role.
    async fn count_admins_with_role(&self, role_id: RoleId) -> AppResult<u64>;
}

/// Canonical audit event payload emitted by application use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Subject that performed the action.
    pub subject: String,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Resource kind targeted by the action.
    pub resource_type: String,
    /// Stable resource identifier.
    pub resource_id: String,
    /// Optional human-readable detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
