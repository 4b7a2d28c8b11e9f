use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use quicklink_application::{AdminPatch, AdminRepository};
use quicklink_core::{AppError, AppResult};
use quicklink_domain::{
    AccessLevel, AdminAccount, AdminId, AdminStatus, PermissionSet, Role, RoleId, SubordinateLimit,
};

use crate::database::{
    FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION, from_db_count, sql_state, store_error, to_db_count,
};

/// PostgreSQL-backed repository for the `admins` table.
#[derive(Clone)]
pub struct PostgresAdminRepository {
    pool: PgPool,
}

impl PostgresAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn admin_exists(&self, admin_id: &AdminId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM admins WHERE id = $1)")
            .bind(admin_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|error| store_error("check admin existence", error))
    }

    /// Resolves an unmatched conditional update into `false` or `NotFound`.
    async fn conditional_outcome(&self, admin_id: &AdminId, rows_affected: u64) -> AppResult<bool> {
        if rows_affected > 0 {
            return Ok(true);
        }

        if self.admin_exists(admin_id).await? {
            Ok(false)
        } else {
            Err(AppError::NotFound(format!(
                "admin '{admin_id}' was not found"
            )))
        }
    }
}

#[derive(Debug, FromRow)]
struct AdminRow {
    id: String,
    email: String,
    display_name: String,
    role_id: Option<Uuid>,
    access_level: String,
    status: String,
    permissions: Vec<String>,
    manager_id: Option<String>,
    created_sub_users_count: i32,
    max_sub_users_allowed: Option<i32>,
    last_login_at: Option<DateTime<Utc>>,
}

impl AdminRow {
    fn into_account(self) -> AppResult<AdminAccount> {
        let max_sub_users_allowed = match self.max_sub_users_allowed {
            Some(value) => {
                SubordinateLimit::AtMost(from_db_count(value, "max_sub_users_allowed")?)
            }
            None => SubordinateLimit::Unlimited,
        };

        Ok(AdminAccount {
            id: AdminId::new(self.id)?,
            email: self.email,
            display_name: self.display_name,
            role_id: self.role_id.map(RoleId::from_uuid),
            access_level: AccessLevel::from_storage(self.access_level.as_str()),
            status: AdminStatus::from_str(self.status.as_str())?,
            permissions: PermissionSet::from_storage(self.permissions.as_slice())?,
            manager_id: self.manager_id.map(AdminId::new).transpose()?,
            created_sub_users_count: from_db_count(
                self.created_sub_users_count,
                "created_sub_users_count",
            )?,
            max_sub_users_allowed,
            last_login_at: self.last_login_at,
        })
    }
}

const ADMIN_COLUMNS: &str = "id, email, display_name, role_id, access_level, status, permissions, \
     manager_id, created_sub_users_count, max_sub_users_allowed, last_login_at";

#[async_trait]
impl AdminRepository for PostgresAdminRepository {
    async fn find_admin(&self, admin_id: &AdminId) -> AppResult<Option<AdminAccount>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"
        ))
        .bind(admin_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("find admin", error))?;

        row.map(AdminRow::into_account).transpose()
    }

    async fn list_admins(&self) -> AppResult<Vec<AdminAccount>> {
        let rows = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("list admins", error))?;

        rows.into_iter().map(AdminRow::into_account).collect()
    }

    async fn create_admin(&self, account: AdminAccount) -> AppResult<()> {
        let max_sub_users_allowed = account
            .max_sub_users_allowed
            .as_option()
            .map(|value| to_db_count(value, "max_sub_users_allowed"))
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO admins (
                id,
                email,
                display_name,
                role_id,
                access_level,
                status,
                permissions,
                manager_id,
                created_sub_users_count,
                max_sub_users_allowed,
                last_login_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(account.id.as_str())
        .bind(account.email.as_str())
        .bind(account.display_name.as_str())
        .bind(account.role_id.map(|role_id| role_id.as_uuid()))
        .bind(account.access_level.as_str())
        .bind(account.status.as_str())
        .bind(account.permissions.to_storage())
        .bind(account.manager_id.as_ref().map(AdminId::as_str))
        .bind(to_db_count(
            account.created_sub_users_count,
            "created_sub_users_count",
        )?)
        .bind(max_sub_users_allowed)
        .bind(account.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(|error| match sql_state(&error).as_deref() {
            Some(UNIQUE_VIOLATION) => {
                AppError::Conflict(format!("admin '{}' already exists", account.id))
            }
            Some(FOREIGN_KEY_VIOLATION) => AppError::Validation(format!(
                "admin '{}' references a missing role or manager",
                account.id
            )),
            _ => store_error("create admin", error),
        })?;

        Ok(())
    }

    async fn update_admin(&self, admin_id: &AdminId, patch: AdminPatch) -> AppResult<AdminAccount> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            r#"
            UPDATE admins
            SET
                status = COALESCE($2, status),
                last_login_at = COALESCE($3, last_login_at)
            WHERE id = $1
            RETURNING {ADMIN_COLUMNS}
            "#
        ))
        .bind(admin_id.as_str())
        .bind(patch.status.map(|status| status.as_str()))
        .bind(patch.last_login_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("update admin", error))?;

        match row {
            Some(row) => row.into_account(),
            None => Err(AppError::NotFound(format!(
                "admin '{admin_id}' was not found"
            ))),
        }
    }

    async fn backfill_role(&self, admin_id: &AdminId, role: &Role) -> AppResult<bool> {
        let max_sub_users_allowed = role
            .max_subordinates()
            .as_option()
            .map(|value| to_db_count(value, "max_sub_users_allowed"))
            .transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE admins
            SET
                role_id = $2,
                access_level = $3,
                max_sub_users_allowed = $4
            WHERE id = $1 AND role_id IS NULL
            "#,
        )
        .bind(admin_id.as_str())
        .bind(role.id().as_uuid())
        .bind(role.name().as_str())
        .bind(max_sub_users_allowed)
        .execute(&self.pool)
        .await
        .map_err(|error| match sql_state(&error).as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => {
                AppError::NotFound(format!("role '{}' no longer exists", role.id()))
            }
            _ => store_error("backfill admin role", error),
        })?;

        self.conditional_outcome(admin_id, result.rows_affected())
            .await
    }

    async fn reserve_subordinate_slot(&self, admin_id: &AdminId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE admins
            SET created_sub_users_count = created_sub_users_count + 1
            WHERE id = $1
              AND (
                max_sub_users_allowed IS NULL
                OR created_sub_users_count < max_sub_users_allowed
              )
            "#,
        )
        .bind(admin_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("reserve subordinate slot", error))?;

        self.conditional_outcome(admin_id, result.rows_affected())
            .await
    }

    async fn release_subordinate_slot(&self, admin_id: &AdminId) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE admins
            SET created_sub_users_count = GREATEST(created_sub_users_count - 1, 0)
            WHERE id = $1
            "#,
        )
        .bind(admin_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("release subordinate slot", error))?;

        Ok(())
    }

    async fn count_admins_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins WHERE role_id = $1")
                .bind(role_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|error| store_error("count role assignments", error))?;

        u64::try_from(count)
            .map_err(|_| AppError::Internal(format!("negative role assignment count {count}")))
    }
}
