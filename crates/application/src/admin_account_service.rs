use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use quicklink_core::{AppError, AppResult, Principal};
use quicklink_domain::{
    AccessLevel, AccessRequirement, Action, AdminAccount, AdminId, AdminStatus, AuditAction,
    PermissionSet, Resource, RoleId, RoleLevel,
};

use crate::{
    AccessGate, AdminContext, AdminPatch, AdminRepository, AuditEvent, AuditRepository,
    RoleRepository,
};

/// Input payload for subordinate account creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubordinateInput {
    /// Identity-provider subject of the new admin.
    pub id: String,
    /// Contact email.
    pub email: String,
    /// Human label.
    pub display_name: String,
    /// Role to assign.
    pub role_id: RoleId,
}

/// Application service for admin account lifecycle.
#[derive(Clone)]
pub struct AdminAccountService {
    access_gate: AccessGate,
    role_repository: Arc<dyn RoleRepository>,
    admin_repository: Arc<dyn AdminRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AdminAccountService {
    /// Creates a new admin account service.
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

    /// Creates an admin managed by the actor, consuming one subordinate slot.
    pub async fn create_subordinate(
        &self,
        actor: &Principal,
        input: CreateSubordinateInput,
    ) -> AppResult<AdminAccount> {
        let context = self.require_admin_write(actor).await?;

        let role = self
            .role_repository
            .find_role(input.role_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("role '{}' was not found", input.role_id))
            })?;

        if !context.is_super_admin() && !context.outranks(role.level()) {
            return Err(AppError::Forbidden(format!(
                "cannot assign role '{}'; it must be less privileged than your own",
                role.name()
            )));
        }

        let subordinate = AdminAccount {
            id: AdminId::new(input.id)?,
            email: input.email.trim().to_owned(),
            display_name: input.display_name.trim().to_owned(),
            role_id: Some(role.id()),
            access_level: AccessLevel::from_storage(role.name().as_str()),
            status: AdminStatus::Active,
            permissions: PermissionSet::new(),
            manager_id: Some(context.account.id.clone()),
            created_sub_users_count: 0,
            max_sub_users_allowed: role.max_subordinates(),
            last_login_at: None,
        };

        if subordinate.email.is_empty() {
            return Err(AppError::Validation("email must not be empty".to_owned()));
        }

        if !self
            .admin_repository
            .reserve_subordinate_slot(&context.account.id)
            .await?
        {
            return Err(AppError::Forbidden(format!(
                "'{}' has reached the subordinate limit of their role",
                context.account.id
            )));
        }

        if let Err(error) = self.admin_repository.create_admin(subordinate.clone()).await {
            warn!(
                actor = %context.account.id,
                admin_id = %subordinate.id,
                error = %error,
                "subordinate creation failed; releasing slot"
            );
            self.admin_repository
                .release_subordinate_slot(&context.account.id)
                .await?;
            return Err(error);
        }

        info!(
            actor = %context.account.id,
            admin_id = %subordinate.id,
            role = %role.name(),
            "created subordinate admin"
        );
        self.audit_repository
            .append_event(AuditEvent {
                subject: context.account.id.to_string(),
                action: AuditAction::AdminSubordinateCreated,
                resource_type: "admin".to_owned(),
                resource_id: subordinate.id.to_string(),
                detail: Some(format!("assigned role '{}'", role.name())),
            })
            .await?;

        Ok(subordinate)
    }

    /// Stamps `last_login_at` for an active account.
    pub async fn record_login(&self, principal: &Principal) -> AppResult<AdminAccount> {
        let context = self
            .access_gate
            .require(principal, AccessRequirement::Authenticated)
            .await?;

        let account = self
            .admin_repository
            .update_admin(
                &context.account.id,
                AdminPatch {
                    last_login_at: Some(Utc::now()),
                    ..AdminPatch::default()
                },
            )
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: account.id.to_string(),
                action: AuditAction::AdminLoggedIn,
                resource_type: "admin".to_owned(),
                resource_id: account.id.to_string(),
                detail: None,
            })
            .await?;

        Ok(account)
    }

    /// Level of the target's role, falling back to the role its legacy access
    /// level migrates to. `None` only when neither exists.
    async fn target_level(&self, target: &AdminAccount) -> AppResult<Option<RoleLevel>> {
        let role = match target.role_id {
            Some(role_id) => self.role_repository.find_role(role_id).await?,
            None => None,
        };

        Ok(role
            .map(|role| role.level())
            .or_else(|| {
                target
                    .access_level
                    .migration_target()
                    .map(|system_role| system_role.level())
            }))
    }

    /// Suspends, disables or reactivates another admin.
    ///
    /// Accounts are never hard-deleted; `Disabled` is the terminal state used
    /// in place of deletion.
    pub async fn change_status(
        &self,
        actor: &Principal,
        admin_id: &AdminId,
        status: AdminStatus,
    ) -> AppResult<AdminAccount> {
        let context = self.require_admin_write(actor).await?;

        if &context.account.id == admin_id {
            return Err(AppError::Forbidden(
                "you cannot change the status of your own account".to_owned(),
            ));
        }

        let target = self
            .admin_repository
            .find_admin(admin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("admin '{admin_id}' was not found")))?;

        if !context.is_super_admin()
            && let Some(target_level) = self.target_level(&target).await?
            && !context.outranks(target_level)
        {
            return Err(AppError::Forbidden(format!(
                "cannot change the status of '{admin_id}'; their role is not below yours"
            )));
        }

        let updated = self
            .admin_repository
            .update_admin(
                admin_id,
                AdminPatch {
                    status: Some(status),
                    ..AdminPatch::default()
                },
            )
            .await?;

        info!(
            actor = %context.account.id,
            admin_id = %admin_id,
            from = %target.status,
            to = %status,
            "changed admin status"
        );
        self.audit_repository
            .append_event(AuditEvent {
                subject: context.account.id.to_string(),
                action: AuditAction::AdminStatusChanged,
                resource_type: "admin".to_owned(),
                resource_id: admin_id.to_string(),
                detail: Some(format!("{} -> {status}", target.status)),
            })
            .await?;

        Ok(updated)
    }

    async fn require_admin_write(&self, actor: &Principal) -> AppResult<AdminContext> {
        self.access_gate
            .require(
                actor,
                AccessRequirement::Permission {
                    resource: Resource::Admins,
                    action: Action::Write,
                },
            )
            .await
    }
}
