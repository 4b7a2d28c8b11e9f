//! Application services and ports for the admin access control core.

#![forbid(unsafe_code)]

mod access_gate;
mod access_ports;
mod admin_account_service;
mod admin_migration_service;
mod authorization_service;
mod role_admin_service;
mod role_seed_service;

#[cfg(test)]
mod test_support;

pub use access_gate::{AccessDecision, AccessGate};
pub use access_ports::{
    AdminPatch, AdminRepository, AuditEvent, AuditRepository, RoleRepository,
};
pub use admin_account_service::{AdminAccountService, CreateSubordinateInput};
pub use admin_migration_service::{
    ADMIN_MIGRATOR_SUBJECT, AdminMigrationService, MigrationReport,
};
pub use authorization_service::{AdminContext, AuthorizationService};
pub use role_admin_service::{
    CreateRoleInput, PURGE_CONFIRMATION_TOKEN, PurgeReport, ROLE_PURGE_SUBJECT, RoleAdminService,
};
pub use role_seed_service::{ROLE_SEEDER_SUBJECT, RoleSeedService, SeedReport};
