use std::sync::Arc;

use quicklink_core::{AppResult, Principal};
use quicklink_domain::{
    Action, AdminAccount, AdminId, Authorization, PermissionSet, Resource, Role, RoleLevel,
    authorize, effective_permissions,
};
use tracing::warn;

use crate::{AdminRepository, RoleRepository};

/// Point-in-time view of an admin account and its assigned role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    /// Stored admin document.
    pub account: AdminAccount,
    /// Referenced role, absent when unassigned or dangling.
    pub role: Option<Role>,
}

impl AdminContext {
    /// Returns the role level, if a role is resolved.
    #[must_use]
    pub fn level(&self) -> Option<RoleLevel> {
        self.role.as_ref().map(Role::level)
    }

    /// Returns whether the account holds structural super admin authority.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.level().is_some_and(|level| level.is_super_admin())
    }

    /// Resolves one resource/action pair for this account.
    #[must_use]
    pub fn authorize(&self, resource: Resource, action: Action) -> Authorization {
        authorize(
            self.role.as_ref(),
            &self.account.permissions,
            resource,
            action,
        )
    }

    /// Returns the union of role and direct grants.
    #[must_use]
    pub fn effective_permissions(&self) -> PermissionSet {
        effective_permissions(self.role.as_ref(), &self.account.permissions)
    }

    /// Returns whether this account strictly outranks the given level.
    #[must_use]
    pub fn outranks(&self, other: RoleLevel) -> bool {
        self.level().is_some_and(|level| level.outranks(other))
    }
}

/// Application service resolving principals against the role store.
#[derive(Clone)]
pub struct AuthorizationService {
    role_repository: Arc<dyn RoleRepository>,
    admin_repository: Arc<dyn AdminRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from repository implementations.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        admin_repository: Arc<dyn AdminRepository>,
    ) -> Self {
        Self {
            role_repository,
            admin_repository,
        }
    }

    /// Loads the admin account and role backing an authenticated principal.
    pub async fn load_context(&self, principal: &Principal) -> AppResult<Option<AdminContext>> {
        if !principal.is_authenticated() {
            return Ok(None);
        }

        let Ok(admin_id) = AdminId::new(principal.subject()) else {
            return Ok(None);
        };

        let Some(account) = self.admin_repository.find_admin(&admin_id).await? else {
            return Ok(None);
        };

        let role = match account.role_id {
            Some(role_id) => {
                let role = self.role_repository.find_role(role_id).await?;
                if role.is_none() {
                    warn!(
                        admin_id = %account.id,
                        role_id = %role_id,
                        "admin references a role that does not exist"
                    );
                }
                role
            }
            None => None,
        };

        Ok(Some(AdminContext { account, role }))
    }

    /// Decides whether the principal may perform the action on the resource.
    ///
    /// Inactive and unknown accounts are always denied.
    pub async fn authorize(
        &self,
        principal: &Principal,
        resource: Resource,
        action: Action,
    ) -> AppResult<Authorization> {
        let Some(context) = self.load_context(principal).await? else {
            return Ok(Authorization::Denied {
                reason: "no admin account is registered for this sign-in".to_owned(),
            });
        };

        if !context.account.is_active() {
            return Ok(Authorization::Denied {
                reason: format!("account is {}", context.account.status),
            });
        }

        Ok(context.authorize(resource, action))
    }

    /// Returns whether the principal may perform the action on the resource.
    pub async fn has_permission(
        &self,
        principal: &Principal,
        resource: Resource,
        action: Action,
    ) -> AppResult<bool> {
        Ok(self
            .authorize(principal, resource, action)
            .await?
            .is_allowed())
    }
}
