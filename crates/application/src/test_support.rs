//! In-process fakes shared by service tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use quicklink_core::{AppError, AppResult, NonEmptyString};
use quicklink_domain::{
    AccessLevel, AdminAccount, AdminId, AdminStatus, NewRole, PermissionSet, Role, RoleId,
    RoleLevel, RoleName, SubordinateLimit, SystemRole,
};

use crate::{AdminPatch, AdminRepository, AuditEvent, AuditRepository, RoleRepository};

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    pub(crate) roles: Mutex<Vec<Role>>,
    pub(crate) fail_creates_after: Mutex<Option<usize>>,
    pub(crate) create_calls: Mutex<usize>,
    /// Names that lookups by name do not see, as if another writer raced.
    pub(crate) hidden_names: Mutex<Vec<String>>,
}

impl FakeRoleRepository {
    pub(crate) async fn with_system_roles(roles: &[SystemRole]) -> Self {
        let repository = Self::default();
        for role in roles {
            let definition = role.definition().unwrap_or_else(|error| panic!("{error}"));
            repository
                .create_role(definition)
                .await
                .unwrap_or_else(|error| panic!("{error}"));
        }
        repository
    }

    pub(crate) async fn role_named(&self, name: &str) -> Role {
        self.roles
            .lock()
            .await
            .iter()
            .find(|role| role.name().as_str() == name)
            .cloned()
            .unwrap_or_else(|| panic!("role '{name}' missing"))
    }
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        if self
            .hidden_names
            .lock()
            .await
            .iter()
            .any(|hidden| hidden == name.as_str())
        {
            return Ok(None);
        }

        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.name() == name)
            .cloned())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.id() == role_id)
            .cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles = self.roles.lock().await.clone();
        roles.sort_by(|left, right| {
            left.level()
                .cmp(&right.level())
                .then_with(|| left.name().cmp(right.name()))
        });
        Ok(roles)
    }

    async fn create_role(&self, role: NewRole) -> AppResult<Role> {
        let mut create_calls = self.create_calls.lock().await;
        if let Some(limit) = *self.fail_creates_after.lock().await
            && *create_calls >= limit
        {
            return Err(AppError::Unavailable("connection reset".to_owned()));
        }
        *create_calls += 1;

        let mut roles = self.roles.lock().await;
        if roles.iter().any(|stored| stored.name() == &role.name) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name
            )));
        }

        let created = Role::new(RoleId::new(), role);
        roles.push(created.clone());
        Ok(created)
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        let before = roles.len();
        roles.retain(|role| role.id() != role_id);
        if roles.len() == before {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAdminRepository {
    pub(crate) admins: Mutex<BTreeMap<AdminId, AdminAccount>>,
    pub(crate) update_calls: Mutex<usize>,
    /// Roles removed after the caller looked them up.
    pub(crate) deleted_roles: Mutex<Vec<RoleId>>,
}

impl FakeAdminRepository {
    pub(crate) async fn insert(&self, account: AdminAccount) {
        self.admins.lock().await.insert(account.id.clone(), account);
    }

    pub(crate) async fn get(&self, admin_id: &str) -> AdminAccount {
        self.admins
            .lock()
            .await
            .get(&admin_id_of(admin_id))
            .cloned()
            .unwrap_or_else(|| panic!("admin '{admin_id}' missing"))
    }
}

#[async_trait]
impl AdminRepository for FakeAdminRepository {
    async fn find_admin(&self, admin_id: &AdminId) -> AppResult<Option<AdminAccount>> {
        Ok(self.admins.lock().await.get(admin_id).cloned())
    }

    async fn list_admins(&self) -> AppResult<Vec<AdminAccount>> {
        Ok(self.admins.lock().await.values().cloned().collect())
    }

    async fn create_admin(&self, account: AdminAccount) -> AppResult<()> {
        let mut admins = self.admins.lock().await;
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
        *self.update_calls.lock().await += 1;
        let mut admins = self.admins.lock().await;
        let account = admins
            .get_mut(admin_id)
            .ok_or_else(|| AppError::NotFound(format!("admin '{admin_id}' was not found")))?;

        if let Some(status) = patch.status {
            account.status = status;
        }
        if let Some(last_login_at) = patch.last_login_at {
            account.last_login_at = Some(last_login_at);
        }

        Ok(account.clone())
    }

    async fn backfill_role(&self, admin_id: &AdminId, role: &Role) -> AppResult<bool> {
        *self.update_calls.lock().await += 1;
        if self.deleted_roles.lock().await.contains(&role.id()) {
            return Err(AppError::NotFound(format!(
                "role '{}' no longer exists",
                role.id()
            )));
        }

        let mut admins = self.admins.lock().await;
        let account = admins
            .get_mut(admin_id)
            .ok_or_else(|| AppError::NotFound(format!("admin '{admin_id}' was not found")))?;

        if account.role_id.is_some() {
            return Ok(false);
        }
        account.role_id = Some(role.id());
        account.access_level = AccessLevel::from_storage(role.name().as_str());
        account.max_sub_users_allowed = role.max_subordinates();
        Ok(true)
    }

    async fn reserve_subordinate_slot(&self, admin_id: &AdminId) -> AppResult<bool> {
        let mut admins = self.admins.lock().await;
        let account = admins
            .get_mut(admin_id)
            .ok_or_else(|| AppError::NotFound(format!("admin '{admin_id}' was not found")))?;

        if !account.can_create_subordinate() {
            return Ok(false);
        }
        account.created_sub_users_count += 1;
        Ok(true)
    }

    async fn release_subordinate_slot(&self, admin_id: &AdminId) -> AppResult<()> {
        let mut admins = self.admins.lock().await;
        if let Some(account) = admins.get_mut(admin_id) {
            account.created_sub_users_count = account.created_sub_users_count.saturating_sub(1);
        }
        Ok(())
    }

    async fn count_admins_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        Ok(self
            .admins
            .lock()
            .await
            .values()
            .filter(|account| account.role_id == Some(role_id))
            .count() as u64)
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

pub(crate) fn admin_id_of(value: &str) -> AdminId {
    AdminId::new(value).unwrap_or_else(|error| panic!("{error}"))
}

pub(crate) fn admin(id: &str, role: Option<&Role>) -> AdminAccount {
    AdminAccount {
        id: admin_id_of(id),
        email: format!("{id}@quicklink.test"),
        display_name: id.to_owned(),
        role_id: role.map(Role::id),
        access_level: role.map_or(AccessLevel::Other("none".to_owned()), |role| {
            AccessLevel::from_storage(role.name().as_str())
        }),
        status: AdminStatus::Active,
        permissions: PermissionSet::new(),
        manager_id: None,
        created_sub_users_count: 0,
        max_sub_users_allowed: role.map_or(SubordinateLimit::NONE, Role::max_subordinates),
        last_login_at: None,
    }
}

pub(crate) fn custom_role(name: &str, level: u16, permissions: PermissionSet) -> NewRole {
    NewRole {
        name: RoleName::new(name).unwrap_or_else(|error| panic!("{error}")),
        display_name: NonEmptyString::new(name).unwrap_or_else(|error| panic!("{error}")),
        level: RoleLevel::new(level),
        permissions,
        is_system_role: false,
        max_subordinates: SubordinateLimit::AtMost(3),
    }
}
