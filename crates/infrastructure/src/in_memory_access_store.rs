use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use quicklink_application::{
    AdminPatch, AdminRepository, AuditEvent, AuditRepository, RoleRepository,
};
use quicklink_core::{AppError, AppResult};
use quicklink_domain::{AccessLevel, AdminAccount, AdminId, NewRole, Role, RoleId, RoleName};

/// In-memory role, admin and audit store.
///
/// Mirrors the conditional writes of the PostgreSQL adapters so services
/// behave identically against either backend.
#[derive(Debug, Default)]
pub struct InMemoryAccessStore {
    roles: RwLock<BTreeMap<RoleId, Role>>,
    admins: RwLock<BTreeMap<AdminId, AdminAccount>>,
    audit_events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAccessStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of appended audit events.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit_events.read().await.clone()
    }
}

fn admin_not_found(admin_id: &AdminId) -> AppError {
    AppError::NotFound(format!("admin '{admin_id}' was not found"))
}

#[async_trait]
impl RoleRepository for InMemoryAccessStore {
    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|role| role.name() == name)
            .cloned())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.read().await.values().cloned().collect();
        roles.sort_by(|left, right| {
            left.level()
                .cmp(&right.level())
                .then_with(|| left.name().cmp(right.name()))
        });
        Ok(roles)
    }

    async fn create_role(&self, role: NewRole) -> AppResult<Role> {
        let mut roles = self.roles.write().await;
        if roles.values().any(|stored| stored.name() == &role.name) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name
            )));
        }

        let created = Role::new(RoleId::new(), role);
        roles.insert(created.id(), created.clone());
        Ok(created)
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let in_use = self
            .admins
            .read()
            .await
            .values()
            .any(|account| account.role_id == Some(role_id));
        if in_use {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is still assigned"
            )));
        }

        self.roles
            .write()
            .await
            .remove(&role_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }
}

#[async_trait]
impl AdminRepository for InMemoryAccessStore {
    async fn find_admin(&self, admin_id: &AdminId) -> AppResult<Option<AdminAccount>> {
        Ok(self.admins.read().await.get(admin_id).cloned())
    }

    async fn list_admins(&self) -> AppResult<Vec<AdminAccount>> {
        Ok(self.admins.read().await.values().cloned().collect())
    }

    async fn create_admin(&self, account: AdminAccount) -> AppResult<()> {
        if let Some(role_id) = account.role_id
            && !self.roles.read().await.contains_key(&role_id)
        {
            return Err(AppError::Validation(format!(
                "role '{role_id}' does not exist"
            )));
        }

        let mut admins = self.admins.write().await;
        if admins.contains_key(&account.id) {
            return Err(AppError::Conflict(format!(
                "admin '{}' already exists",
                account.id
            )));
        }

        admins.insert(account.id.clone(), account);
        Ok(())
    }

    async fn update_admin(&self, admin_id: &AdminId, patch: AdminPatch) -> AppResult<AdminAccount> {
        let mut admins = self.admins.write().await;
        let account = admins
            .get_mut(admin_id)
            .ok_or_else(|| admin_not_found(admin_id))?;

        if let Some(status) = patch.status {
            account.status = status;
        }
        if let Some(last_login_at) = patch.last_login_at {
            account.last_login_at = Some(last_login_at);
        }

        Ok(account.clone())
    }

    async fn backfill_role(&self, admin_id: &AdminId, role: &Role) -> AppResult<bool> {
        if !self.roles.read().await.contains_key(&role.id()) {
            return Err(AppError::NotFound(format!(
                "role '{}' no longer exists",
                role.id()
            )));
        }

        let mut admins = self.admins.write().await;
        let account = admins
            .get_mut(admin_id)
            .ok_or_else(|| admin_not_found(admin_id))?;

        if account.role_id.is_some() {
            return Ok(false);
        }

        account.role_id = Some(role.id());
        account.access_level = AccessLevel::from_storage(role.name().as_str());
        account.max_sub_users_allowed = role.max_subordinates();
        Ok(true)
    }

    async fn reserve_subordinate_slot(&self, admin_id: &AdminId) -> AppResult<bool> {
        let mut admins = self.admins.write().await;
        let account = admins
            .get_mut(admin_id)
            .ok_or_else(|| admin_not_found(admin_id))?;

        if !account.can_create_subordinate() {
            return Ok(false);
        }

        account.created_sub_users_count += 1;
        Ok(true)
    }

    async fn release_subordinate_slot(&self, admin_id: &AdminId) -> AppResult<()> {
        let mut admins = self.admins.write().await;
        let account = admins
            .get_mut(admin_id)
            .ok_or_else(|| admin_not_found(admin_id))?;

        account.created_sub_users_count = account.created_sub_users_count.saturating_sub(1);
        Ok(())
    }

    async fn count_admins_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        let count = self
            .admins
            .read()
            .await
            .values()
            .filter(|account| account.role_id == Some(role_id))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl AuditRepository for InMemoryAccessStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_events.write().await.push(event);
        Ok(())
    }
}
