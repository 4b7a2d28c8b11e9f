use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use quicklink_core::{AppError, AppResult, NonEmptyString, Principal};
use quicklink_domain::{
    AccessRequirement, Action, AuditAction, NewRole, PermissionSet, Resource, Role, RoleId,
    RoleLevel, RoleName, SubordinateLimit, SystemRole,
};

use crate::{AccessGate, AdminContext, AdminRepository, AuditEvent, AuditRepository, RoleRepository};

/// Token an operator must pass to confirm a custom role purge.
pub const PURGE_CONFIRMATION_TOKEN: &str = "delete-all-custom-roles";

/// Subject recorded on audit events written by the purge.
pub const ROLE_PURGE_SUBJECT: &str = "system:role-purge";

/// Input payload for custom role creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoleInput {
    /// Unique machine key.
    pub name: String,
    /// Human label.
    pub display_name: String,
    /// Requested hierarchy position.
    pub level: u16,
    /// Requested grants.
    pub permissions: PermissionSet,
    /// Subordinate cap; `None` means unlimited.
    pub max_subordinates: Option<u32>,
}

/// Outcome of a custom role purge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// Custom roles removed.
    pub deleted: Vec<RoleName>,
    /// Custom roles kept because admins still reference them.
    pub blocked: Vec<RoleName>,
}

/// Application service for role administration.
#[derive(Clone)]
pub struct RoleAdminService {
    access_gate: AccessGate,
    role_repository: Arc<dyn RoleRepository>,
    admin_repository: Arc<dyn AdminRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleAdminService {
    /// Creates a new role administration service.
    #[must_use]
    pub fn new(
        access_gate: AccessGate,
        role_repository: Arc<dyn RoleRepository>,
        admin_repository: Arc<dyn AdminRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            access_gate,
            role_repository,
            admin_repository,
            audit_repository,
        }
    }

    /// Lists roles ordered by level, then name.
    pub async fn list_roles(&self, actor: &Principal) -> AppResult<Vec<Role>> {
        self.require(actor, Resource::Roles, Action::Read).await?;
        self.role_repository.list_roles().await
    }

    /// Creates a custom role below the actor's own level.
    pub async fn create_custom_role(
        &self,
        actor: &Principal,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        let context = self.require(actor, Resource::Roles, Action::Write).await?;

        let name = RoleName::new(input.name)?;
        if SystemRole::from_name(name.as_str()).is_some() {
            return Err(AppError::Conflict(format!(
                "role name '{name}' is reserved for a system role"
            )));
        }

        let level = RoleLevel::new(input.level);
        if level.is_super_admin() {
            return Err(AppError::Validation(
                "custom roles cannot be created at level 0".to_owned(),
            ));
        }
        if !context.outranks(level) {
            return Err(AppError::Forbidden(format!(
                "cannot create a role at level {level}; it must be less privileged than your own"
            )));
        }
        if input.permissions.has_wildcard() && !context.is_super_admin() {
            return Err(AppError::Forbidden(
                "only a super admin can grant the wildcard permission".to_owned(),
            ));
        }

        let role = self
            .role_repository
            .create_role(NewRole {
                name,
                display_name: NonEmptyString::new(input.display_name)?,
                level,
                permissions: input.permissions,
                is_system_role: false,
                max_subordinates: SubordinateLimit::from_option(input.max_subordinates),
            })
            .await?;

        info!(
            actor = %context.account.id,
            role = %role.name(),
            level = %role.level(),
            "created custom role"
        );
        self.audit_repository
            .append_event(AuditEvent {
                subject: context.account.id.to_string(),
                action: AuditAction::SecurityRoleCreated,
                resource_type: "role".to_owned(),
                resource_id: role.id().to_string(),
                detail: Some(format!(
                    "created custom role '{}' at level {}",
                    role.name(),
                    role.level()
                )),
            })
            .await?;

        Ok(role)
    }

    /// Deletes an unreferenced custom role.
    pub async fn delete_role(&self, actor: &Principal, role_id: RoleId) -> AppResult<()> {
        let role = self
            .role_repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        if role.is_system_role() {
            return Err(AppError::Forbidden(format!(
                "system role '{}' cannot be deleted",
                role.name()
            )));
        }

        let context = self.require(actor, Resource::Roles, Action::Delete).await?;
        self.ensure_unreferenced(&role).await?;
        self.role_repository.delete_role(role_id).await?;

        info!(actor = %context.account.id, role = %role.name(), "deleted custom role");
        self.audit_repository
            .append_event(AuditEvent {
                subject: context.account.id.to_string(),
                action: AuditAction::SecurityRoleDeleted,
                resource_type: "role".to_owned(),
                resource_id: role_id.to_string(),
                detail: Some(format!("deleted custom role '{}'", role.name())),
            })
            .await
    }

    /// Deletes every custom role no admin references.
    ///
    /// Runs outside the request path and requires the literal
    /// [`PURGE_CONFIRMATION_TOKEN`]. System roles are never touched.
    pub async fn purge_custom_roles(&self, confirmation: &str) -> AppResult<PurgeReport> {
        if confirmation != PURGE_CONFIRMATION_TOKEN {
            return Err(AppError::Validation(format!(
                "purge requires the confirmation token '{PURGE_CONFIRMATION_TOKEN}'"
            )));
        }

        let mut report = PurgeReport::default();
        for role in self.role_repository.list_roles().await? {
            if role.is_system_role() {
                continue;
            }

            if self.ensure_unreferenced(&role).await.is_err() {
                warn!(role = %role.name(), "custom role is still assigned; kept");
                report.blocked.push(role.name().clone());
                continue;
            }

            self.role_repository.delete_role(role.id()).await?;
            self.audit_repository
                .append_event(AuditEvent {
                    subject: ROLE_PURGE_SUBJECT.to_owned(),
                    action: AuditAction::SecurityRoleDeleted,
                    resource_type: "role".to_owned(),
                    resource_id: role.id().to_string(),
                    detail: Some(format!("purged custom role '{}'", role.name())),
                })
                .await?;
            report.deleted.push(role.name().clone());
        }

        info!(
            deleted = report.deleted.len(),
            blocked = report.blocked.len(),
            "custom role purge finished"
        );

        Ok(report)
    }

    async fn ensure_unreferenced(&self, role: &Role) -> AppResult<()> {
        let assigned = self
            .admin_repository
            .count_admins_with_role(role.id())
            .await?;
        if assigned > 0 {
            return Err(AppError::Conflict(format!(
                "role '{}' is assigned to {assigned} admin(s)",
                role.name()
            )));
        }

        Ok(())
    }

    async fn require(
        &self,
        actor: &Principal,
        resource: Resource,
        action: Action,
    ) -> AppResult<AdminContext> {
        self.access_gate
            .require(actor, AccessRequirement::Permission { resource, action })
            .await
    }
}
