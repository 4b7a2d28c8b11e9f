use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use quicklink_core::{AppError, AppResult};
use quicklink_domain::{AuditAction, RoleName, SystemRole};

use crate::{AuditEvent, AuditRepository, RoleRepository};

/// Subject recorded on audit events written by the seeder.
pub const ROLE_SEEDER_SUBJECT: &str = "system:role-seeder";

/// Outcome of one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// System roles created by this run.
    pub created: usize,
    /// System roles that already existed and were left untouched.
    pub skipped: usize,
}

/// Ensures the fixed system role catalog exists.
///
/// Existing roles are never overwritten or deleted, so the procedure can be
/// re-run after a partial failure until it reports `created: 0`.
#[derive(Clone)]
pub struct RoleSeedService {
    role_repository: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleSeedService {
    /// Creates a new seeding service.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            role_repository,
            audit_repository,
        }
    }

    /// Creates every missing system role.
    ///
    /// Store outages abort the run with `AppError::Unavailable`; roles created
    /// before the failure stay in place and are skipped by the next run.
    pub async fn seed_roles(&self) -> AppResult<SeedReport> {
        let mut report = SeedReport::default();

        for system_role in SystemRole::all() {
            let name = RoleName::new(system_role.name())?;

            if let Some(existing) = self.role_repository.find_role_by_name(&name).await? {
                if !existing.is_system_role() || existing.level() != system_role.level() {
                    warn!(
                        role = %name,
                        stored_level = %existing.level(),
                        expected_level = %system_role.level(),
                        is_system_role = existing.is_system_role(),
                        "existing role shadows a system role and was left untouched"
                    );
                }
                report.skipped += 1;
                continue;
            }

            match self.role_repository.create_role(system_role.definition()?).await {
                Ok(role) => {
                    info!(role = %role.name(), level = %role.level(), "seeded system role");
                    self.audit_repository
                        .append_event(AuditEvent {
                            subject: ROLE_SEEDER_SUBJECT.to_owned(),
                            action: AuditAction::SecurityRoleSeeded,
                            resource_type: "role".to_owned(),
                            resource_id: role.id().to_string(),
                            detail: Some(format!("seeded system role '{}'", role.name())),
                        })
                        .await?;
                    report.created += 1;
                }
                Err(AppError::Conflict(message)) => {
                    warn!(role = %name, %message, "system role was created concurrently");
                    report.skipped += 1;
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            created = report.created,
            skipped = report.skipped,
            "system role seeding finished"
        );

        Ok(report)
    }
}
