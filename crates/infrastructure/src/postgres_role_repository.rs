use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use quicklink_application::RoleRepository;
use quicklink_core::{AppError, AppResult, NonEmptyString};
use quicklink_domain::{
    NewRole, PermissionSet, Role, RoleId, RoleLevel, RoleName, SubordinateLimit,
};

use crate::database::{
    FOREIGN_KEY_VIOLATION, from_db_count, sql_state, store_error, to_db_count,
};

/// PostgreSQL-backed repository for the `roles` table.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    display_name: String,
    level: i32,
    permissions: Vec<String>,
    is_system_role: bool,
    max_subordinates: Option<i32>,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        let level = u16::try_from(self.level).map_err(|_| {
            AppError::Internal(format!(
                "role '{}' has out-of-range level {}",
                self.name, self.level
            ))
        })?;
        let max_subordinates = match self.max_subordinates {
            Some(value) => SubordinateLimit::AtMost(from_db_count(value, "max_subordinates")?),
            None => SubordinateLimit::Unlimited,
        };

        Ok(Role::new(
            RoleId::from_uuid(self.id),
            NewRole {
                name: RoleName::new(self.name)?,
                display_name: NonEmptyString::new(self.display_name)?,
                level: RoleLevel::new(level),
                permissions: PermissionSet::from_storage(self.permissions.as_slice())?,
                is_system_role: self.is_system_role,
                max_subordinates,
            },
        ))
    }
}

const ROLE_COLUMNS: &str =
    "id, name, display_name, level, permissions, is_system_role, max_subordinates";

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1"
        ))
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("find role by name", error))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("find role", error))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles ORDER BY level, name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("list roles", error))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }

    async fn create_role(&self, role: NewRole) -> AppResult<Role> {
        let max_subordinates = role
            .max_subordinates
            .as_option()
            .map(|value| to_db_count(value, "max_subordinates"))
            .transpose()?;

        let row = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            INSERT INTO roles (
                id,
                name,
                display_name,
                level,
                permissions,
                is_system_role,
                max_subordinates
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(RoleId::new().as_uuid())
        .bind(role.name.as_str())
        .bind(role.display_name.as_str())
        .bind(i32::from(role.level.value()))
        .bind(role.permissions.to_storage())
        .bind(role.is_system_role)
        .bind(max_subordinates)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("create role", error))?;

        match row {
            Some(row) => row.into_role(),
            None => Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name
            ))),
        }
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                if sql_state(&error).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    return AppError::Conflict(format!("role '{role_id}' is still assigned"));
                }
                store_error("delete role", error)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            )));
        }

        Ok(())
    }
}
