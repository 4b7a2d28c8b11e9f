use std::str::FromStr;

use serde::Serialize;

use quicklink_application::{AccessDecision, RoleAdminService};
use quicklink_core::{AppError, AppResult, Principal};
use quicklink_domain::{
    AccessDenial, AccessRequirement, Permission, PermissionSet, RoleLevel, permission_matrix,
};

use crate::store::AccessStore;

/// Result of an access check as printed to the operator.
#[derive(Debug, Serialize)]
pub struct AccessReport {
    pub subject: String,
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<RoleLevel>,
    /// Union of role and direct grants; present only when granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<AccessDenial>,
}

pub fn print_json(value: &impl Serialize) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| AppError::Internal(format!("failed to render report: {error}")))?;
    println!("{rendered}");
    Ok(())
}

pub async fn seed_roles(store: &AccessStore) -> AppResult<()> {
    let report = store.role_seed_service().seed_roles().await?;
    print_json(&report)
}

pub async fn migrate_admins(store: &AccessStore) -> AppResult<()> {
    let report = store.admin_migration_service().migrate_admins().await?;
    print_json(&report)
}

pub async fn list_roles(store: &AccessStore) -> AppResult<()> {
    let roles = store.roles.list_roles().await?;
    print_json(&roles)
}

pub async fn permission_matrix_report(store: &AccessStore) -> AppResult<()> {
    let roles = store.roles.list_roles().await?;
    print_json(&permission_matrix(&roles))
}

pub async fn purge_custom_roles(service: &RoleAdminService, confirmation: &str) -> AppResult<()> {
    let report = service.purge_custom_roles(confirmation).await?;
    print_json(&report)
}

/// Builds the gate requirement from the mutually exclusive CLI flags.
pub fn requirement_from_flags(
    max_level: Option<u16>,
    permission: Option<&str>,
) -> AppResult<AccessRequirement> {
    match (max_level, permission) {
        (Some(_), Some(_)) => Err(AppError::Validation(
            "use either --max-level or --permission, not both".to_owned(),
        )),
        (Some(level), None) => Ok(AccessRequirement::MaxLevel {
            level: RoleLevel::new(level),
        }),
        (None, Some(value)) => match Permission::from_str(value)? {
            Permission::Scoped { resource, action } => {
                Ok(AccessRequirement::Permission { resource, action })
            }
            Permission::Wildcard => Err(AppError::Validation(
                "check a concrete resource.action pair, not the wildcard".to_owned(),
            )),
        },
        (None, None) => Ok(AccessRequirement::Authenticated),
    }
}

pub async fn check_access(
    store: &AccessStore,
    subject: &str,
    requirement: AccessRequirement,
) -> AppResult<AccessReport> {
    let decision = store
        .access_gate()
        .check_access(&Principal::authenticated(subject), requirement)
        .await?;

    Ok(match decision {
        AccessDecision::Granted(context) => AccessReport {
            subject: subject.to_owned(),
            granted: true,
            role: context.role.as_ref().map(|role| role.name().to_string()),
            level: context.level(),
            permissions: Some(context.effective_permissions()),
            denial: None,
        },
        AccessDecision::Denied(denial) => AccessReport {
            subject: subject.to_owned(),
            granted: false,
            role: None,
            level: None,
            permissions: None,
            denial: Some(denial),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quicklink_application::AdminRepository;
    use quicklink_core::AppError;
    use quicklink_domain::{
        AccessLevel, AccessRequirement, Action, AdminAccount, AdminId, AdminStatus, DenialKind,
        PermissionSet, Resource, RoleLevel, SubordinateLimit,
    };
    use quicklink_infrastructure::InMemoryAccessStore;

    use super::{check_access, requirement_from_flags};
    use crate::store::AccessStore;

    #[test]
    fn flags_map_to_requirements() {
        assert!(matches!(
            requirement_from_flags(None, None),
            Ok(AccessRequirement::Authenticated)
        ));
        assert!(matches!(
            requirement_from_flags(Some(20), None),
            Ok(AccessRequirement::MaxLevel { level }) if level == RoleLevel::new(20)
        ));
        assert!(matches!(
            requirement_from_flags(None, Some("payouts.approve")),
            Ok(AccessRequirement::Permission {
                resource: Resource::Payouts,
                action: Action::Approve,
            })
        ));
        assert!(matches!(
            requirement_from_flags(None, Some("*")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            requirement_from_flags(Some(1), Some("payouts.read")),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn migrated_system_admin_passes_level_gate() {
        let store = AccessStore::in_memory(Arc::new(InMemoryAccessStore::new()));
        let created = store
            .admins
            .create_admin(AdminAccount {
                id: AdminId::new("ops-lead").unwrap_or_else(|error| panic!("{error}")),
                email: "ops-lead@quicklink.test".to_owned(),
                display_name: "Ops Lead".to_owned(),
                role_id: None,
                access_level: AccessLevel::from_storage("system_admin"),
                status: AdminStatus::Active,
                permissions: PermissionSet::new(),
                manager_id: None,
                created_sub_users_count: 0,
                max_sub_users_allowed: SubordinateLimit::NONE,
                last_login_at: None,
            })
            .await;
        assert!(created.is_ok());

        let before = check_access(
            &store,
            "ops-lead",
            AccessRequirement::MaxLevel {
                level: RoleLevel::new(10),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));
        assert!(!before.granted);
        assert!(before.permissions.is_none());
        assert_eq!(
            before.denial.map(|denial| denial.kind),
            Some(DenialKind::InsufficientPermission)
        );

        assert!(store.role_seed_service().seed_roles().await.is_ok());
        assert!(store.admin_migration_service().migrate_admins().await.is_ok());

        let after = check_access(
            &store,
            "ops-lead",
            AccessRequirement::MaxLevel {
                level: RoleLevel::new(10),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));
        assert!(after.granted);
        assert_eq!(after.role.as_deref(), Some("system_admin"));
        assert_eq!(
            after.permissions,
            Some(quicklink_domain::SystemRole::SystemAdmin.permissions())
        );
    }
}
