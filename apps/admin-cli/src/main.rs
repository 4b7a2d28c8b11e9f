//! QuickLink Pay admin access control operator CLI.

#![forbid(unsafe_code)]

mod cli_config;
mod commands;
mod store;

use clap::{Parser, Subcommand};
use quicklink_core::AppError;
use tracing::info;

use crate::cli_config::{AdminCliConfig, StoreKind, init_tracing};
use crate::store::AccessStore;

#[derive(Debug, Parser)]
#[command(name = "quicklink-admin")]
#[command(about = "QuickLink Pay super admin access control tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,

    /// Create any missing system roles
    SeedRoles,

    /// Backfill role references on legacy admin records
    MigrateAdmins,

    /// Print all roles ordered by level
    ListRoles,

    /// Evaluate the access gate for one admin
    CheckAccess {
        /// Identity-provider subject of the admin
        subject: String,

        /// Require a role at this level or more privileged
        #[arg(long, conflicts_with = "permission")]
        max_level: Option<u16>,

        /// Require a permission such as `payouts.approve`
        #[arg(long)]
        permission: Option<String>,
    },

    /// Print every role's decision for every resource/action pair
    PermissionMatrix,

    /// Delete every custom role that no admin references
    PurgeCustomRoles {
        /// Confirmation token; must equal the documented purge token
        #[arg(long)]
        confirm: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AdminCliConfig::load()?;

    if matches!(cli.command, Command::Migrate) && config.store == StoreKind::Memory {
        return Err(AppError::Validation(
            "migrate requires QUICKLINK_STORE=postgres".to_owned(),
        ));
    }

    let store = AccessStore::open(&config, matches!(cli.command, Command::Migrate)).await?;

    match cli.command {
        Command::Migrate => {
            info!("migrations applied");
            Ok(())
        }
        Command::SeedRoles => commands::seed_roles(&store).await,
        Command::MigrateAdmins => commands::migrate_admins(&store).await,
        Command::ListRoles => commands::list_roles(&store).await,
        Command::CheckAccess {
            subject,
            max_level,
            permission,
        } => {
            let requirement =
                commands::requirement_from_flags(max_level, permission.as_deref())?;
            let report = commands::check_access(&store, subject.as_str(), requirement).await?;
            commands::print_json(&report)
        }
        Command::PermissionMatrix => commands::permission_matrix_report(&store).await,
        Command::PurgeCustomRoles { confirm } => {
            commands::purge_custom_roles(&store.role_admin_service(), confirm.as_str()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn check_access_flags_are_exclusive() {
        let parsed = Cli::try_parse_from([
            "quicklink-admin",
            "check-access",
            "ops-lead",
            "--max-level",
            "10",
            "--permission",
            "payouts.read",
        ]);

        assert!(parsed.is_err());
    }

    #[test]
    fn purge_requires_confirmation_flag() {
        assert!(Cli::try_parse_from(["quicklink-admin", "purge-custom-roles"]).is_err());

        let parsed = Cli::try_parse_from([
            "quicklink-admin",
            "purge-custom-roles",
            "--confirm",
            "delete-all-custom-roles",
        ]);
        assert!(matches!(
            parsed.map(|cli| cli.command),
            Ok(Command::PurgeCustomRoles { confirm }) if confirm == "delete-all-custom-roles"
        ));
    }
}
