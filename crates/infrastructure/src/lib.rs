//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod database;
mod in_memory_access_store;
mod postgres_admin_repository;
mod postgres_audit_repository;
mod postgres_role_repository;

pub use database::{MIGRATOR, connect_pool, run_migrations};
pub use in_memory_access_store::InMemoryAccessStore;
pub use postgres_admin_repository::PostgresAdminRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_role_repository::PostgresRoleRepository;
