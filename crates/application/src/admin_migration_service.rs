use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use quicklink_core::{AppError, AppResult};
use quicklink_domain::{AdminId, AuditAction, Role, RoleName, SystemRole};

use crate::{AdminRepository, AuditEvent, AuditRepository, RoleRepository};

/// Subject recorded on audit events written by the migrator.
pub const ADMIN_MIGRATOR_SUBJECT: &str = "system:admin-migrator";

/// Outcome of one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Admins that received a role reference in this run.
    pub migrated: usize,
    /// Admins that already held a role reference.
    pub skipped: usize,
    /// Admins left unmodified because no target role could be resolved.
    pub errors: Vec<AdminId>,
}

/// Backfills `role_id` on legacy admin records from their `access_level`.
///
/// Admins that already hold a role are never touched, so the procedure is
/// safe to re-run. Unmapped labels and roles missing from the store are
/// reported per admin and do not abort the batch.
#[derive(Clone)]
pub struct AdminMigrationService {
    role_repository: Arc<dyn RoleRepository>,
    admin_repository: Arc<dyn AdminRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AdminMigrationService {
    /// Creates a new migration service.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        admin_repository: Arc<dyn AdminRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            role_repository,
            admin_repository,
            audit_repository,
        }
    }

    /// Migrates every admin without a role reference.
    pub async fn migrate_admins(&self) -> AppResult<MigrationReport> {
        let mut report = MigrationReport::default();
        let mut resolved_roles: HashMap<SystemRole, Option<Role>> = HashMap::new();

        for admin in self.admin_repository.list_admins().await? {
            if admin.role_id.is_some() {
                report.skipped += 1;
                continue;
            }

            let Some(target) = admin.access_level.migration_target() else {
                warn!(
                    admin_id = %admin.id,
                    access_level = %admin.access_level.as_str(),
                    "legacy access level has no role mapping"
                );
                report.errors.push(admin.id);
                continue;
            };

            let role = match resolved_roles.get(&target) {
                Some(role) => role.clone(),
                None => {
                    let role = self
                        .role_repository
                        .find_role_by_name(&RoleName::new(target.name())?)
                        .await?;
                    resolved_roles.insert(target, role.clone());
                    role
                }
            };

            let Some(role) = role else {
                warn!(
                    admin_id = %admin.id,
                    role = %target.name(),
                    "target role does not exist; run role seeding first"
                );
                report.errors.push(admin.id);
                continue;
            };

            match self.admin_repository.backfill_role(&admin.id, &role).await {
                Ok(true) => {
                    info!(admin_id = %admin.id, role = %role.name(), "migrated admin role");
                    self.audit_repository
                        .append_event(AuditEvent {
                            subject: ADMIN_MIGRATOR_SUBJECT.to_owned(),
                            action: AuditAction::AdminRoleMigrated,
                            resource_type: "admin".to_owned(),
                            resource_id: admin.id.to_string(),
                            detail: Some(format!(
                                "assigned role '{}' from access level '{}'",
                                role.name(),
                                admin.access_level.as_str()
                            )),
                        })
                        .await?;
                    report.migrated += 1;
                }
                Ok(false) => {
                    report.skipped += 1;
                }
                Err(AppError::NotFound(message)) => {
                    warn!(
                        admin_id = %admin.id,
                        %message,
                        "admin or role vanished during migration"
                    );
                    report.errors.push(admin.id);
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            migrated = report.migrated,
            skipped = report.skipped,
            errors = report.errors.len(),
            "admin role migration finished"
        );

        Ok(report)
    }
}
