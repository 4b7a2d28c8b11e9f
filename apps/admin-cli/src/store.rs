use std::sync::Arc;

use quicklink_application::{
    AccessGate, AdminMigrationService, AdminRepository, AuditRepository, AuthorizationService,
    RoleAdminService, RoleRepository, RoleSeedService,
};
use quicklink_core::{AppError, AppResult};
use quicklink_infrastructure::{
    InMemoryAccessStore, PostgresAdminRepository, PostgresAuditRepository,
    PostgresRoleRepository, connect_pool, run_migrations,
};
use tracing::{info, warn};

use crate::cli_config::{AdminCliConfig, StoreKind};

/// Repository handles shared by every command.
#[derive(Clone)]
pub struct AccessStore {
    pub roles: Arc<dyn RoleRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

impl AccessStore {
    pub async fn open(config: &AdminCliConfig, apply_migrations: bool) -> AppResult<Self> {
        match config.store {
            StoreKind::Postgres => {
                let database_url = config.database_url.as_deref().ok_or_else(|| {
                    AppError::Validation("DATABASE_URL is required".to_owned())
                })?;
                let pool = connect_pool(database_url, config.max_connections).await?;
                if apply_migrations {
                    run_migrations(&pool).await?;
                }
                info!(max_connections = config.max_connections, "connected to postgres store");

                Ok(Self {
                    roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
                    admins: Arc::new(PostgresAdminRepository::new(pool.clone())),
                    audit: Arc::new(PostgresAuditRepository::new(pool)),
                })
            }
            StoreKind::Memory => {
                warn!("using the in-memory store; changes are discarded on exit");
                Ok(Self::in_memory(Arc::new(InMemoryAccessStore::new())))
            }
        }
    }

    pub fn in_memory(store: Arc<InMemoryAccessStore>) -> Self {
        Self {
            roles: store.clone(),
            admins: store.clone(),
            audit: store,
        }
    }

    pub fn role_seed_service(&self) -> RoleSeedService {
        RoleSeedService::new(self.roles.clone(), self.audit.clone())
    }

    pub fn admin_migration_service(&self) -> AdminMigrationService {
        AdminMigrationService::new(self.roles.clone(), self.admins.clone(), self.audit.clone())
    }

    pub fn access_gate(&self) -> AccessGate {
        AccessGate::new(AuthorizationService::new(
            self.roles.clone(),
            self.admins.clone(),
        ))
    }

    pub fn role_admin_service(&self) -> RoleAdminService {
        RoleAdminService::new(
            self.access_gate(),
            self.roles.clone(),
            self.admins.clone(),
            self.audit.clone(),
        )
    }
}
