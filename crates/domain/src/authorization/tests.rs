use proptest::prelude::*;
use quicklink_core::{AppError, NonEmptyString};

use crate::{
    Action, AdminStatus, NewRole, Permission, PermissionSet, Resource, Role, RoleId, RoleLevel,
    RoleName, SubordinateLimit, SystemRole,
};

use super::{
    AccessDenial, Authorization, GrantSource, authorize, effective_permissions, permission_matrix,
};

fn role(name: &str, level: u16, permissions: PermissionSet) -> Role {
    let definition = NewRole {
        name: RoleName::new(name).unwrap_or_else(|error| panic!("{error}")),
        display_name: NonEmptyString::new(name).unwrap_or_else(|error| panic!("{error}")),
        level: RoleLevel::new(level),
        permissions,
        is_system_role: false,
        max_subordinates: SubordinateLimit::NONE,
    };
    Role::new(RoleId::new(), definition)
}

fn seeded(system_role: SystemRole) -> Role {
    let definition = system_role
        .definition()
        .unwrap_or_else(|error| panic!("{error}"));
    Role::new(RoleId::new(), definition)
}

fn resource_strategy() -> impl Strategy<Value = Resource> {
    proptest::sample::select(Resource::all().to_vec())
}

fn action_strategy() -> impl Strategy<Value = Action> {
    proptest::sample::select(Action::all().to_vec())
}

#[test]
fn role_wildcard_matches_before_exact_pairs() {
    let role = role(
        "wild",
        5,
        PermissionSet::from_iter([
            Permission::Wildcard,
            Permission::scoped(Resource::Merchants, Action::Read),
        ]),
    );

    assert_eq!(
        authorize(
            Some(&role),
            &PermissionSet::new(),
            Resource::Merchants,
            Action::Read
        ),
        Authorization::Allowed {
            source: GrantSource::RoleWildcard
        }
    );
}

#[test]
fn exact_role_pair_is_allowed() {
    let role = seeded(SystemRole::SupportAgent);
    assert_eq!(
        authorize(
            Some(&role),
            &PermissionSet::new(),
            Resource::SupportTickets,
            Action::Write
        ),
        Authorization::Allowed {
            source: GrantSource::RolePermission
        }
    );
}

#[test]
fn direct_grants_are_additive() {
    let empty_role = role("empty", 80, PermissionSet::new());
    let grants = PermissionSet::from_iter([Permission::scoped(Resource::Merchants, Action::Write)]);

    let write = authorize(Some(&empty_role), &grants, Resource::Merchants, Action::Write);
    assert_eq!(
        write,
        Authorization::Allowed {
            source: GrantSource::DirectGrant
        }
    );

    let read = authorize(Some(&empty_role), &grants, Resource::Merchants, Action::Read);
    assert_eq!(
        read,
        Authorization::Denied {
            reason: "missing permission `merchants.read`".to_owned()
        }
    );
}

#[test]
fn account_without_role_relies_on_direct_grants_only() {
    let grants = PermissionSet::from_iter([Permission::scoped(Resource::Reports, Action::Export)]);
    assert!(authorize(None, &grants, Resource::Reports, Action::Export).is_allowed());
    assert!(!authorize(None, &grants, Resource::Reports, Action::Read).is_allowed());
}

#[test]
fn super_admin_level_does_not_depend_on_stored_wildcard() {
    let stripped = role("owner", 0, PermissionSet::new());
    assert!(
        authorize(
            Some(&stripped),
            &PermissionSet::new(),
            Resource::Roles,
            Action::Delete
        )
        .is_allowed()
    );
}

#[test]
fn effective_permissions_union_role_and_direct_grants() {
    let agent = seeded(SystemRole::SupportAgent);
    let grants = PermissionSet::from_iter([Permission::scoped(Resource::Payouts, Action::Read)]);

    let effective = effective_permissions(Some(&agent), &grants);
    assert!(effective.contains_pair(Resource::Payouts, Action::Read));
    assert!(effective.contains_pair(Resource::SupportTickets, Action::Write));
    assert!(!effective.has_wildcard());

    let owner = seeded(SystemRole::SuperAdmin);
    assert_eq!(
        effective_permissions(Some(&owner), &PermissionSet::new()),
        PermissionSet::wildcard()
    );
}

#[test]
fn denial_maps_to_app_error_category() {
    let inactive: AppError = AccessDenial::account_inactive(AdminStatus::Suspended).into();
    assert!(matches!(inactive, AppError::Unauthorized(message) if message.contains("suspended")));

    let forbidden: AppError = AccessDenial::insufficient_permission("nope").into();
    assert!(matches!(forbidden, AppError::Forbidden(_)));
}

#[test]
fn matrix_rows_partition_every_pair() {
    let roles: Vec<Role> = SystemRole::all().iter().copied().map(seeded).collect();
    let matrix = permission_matrix(&roles);
    let pair_count = Resource::all().len() * Action::all().len();

    assert_eq!(matrix.len(), roles.len());
    for row in &matrix {
        assert_eq!(row.allowed.len() + row.denied.len(), pair_count);
    }

    let owner_row = &matrix[0];
    assert_eq!(owner_row.role_name, "super_admin");
    assert!(owner_row.denied.is_empty());
}

proptest! {
    #[test]
    fn level_zero_allows_everything(
        resource in resource_strategy(),
        action in action_strategy(),
        stored in proptest::collection::vec((resource_strategy(), action_strategy()), 0..6),
    ) {
        let permissions = stored
            .into_iter()
            .map(|(resource, action)| Permission::scoped(resource, action))
            .collect();
        let owner = role("owner", 0, permissions);

        prop_assert!(authorize(Some(&owner), &PermissionSet::new(), resource, action).is_allowed());
    }

    #[test]
    fn resolver_is_deterministic(
        level in 1_u16..200,
        resource in resource_strategy(),
        action in action_strategy(),
    ) {
        let role = role("custom", level, PermissionSet::product(&[Resource::Merchants], &[Action::Read]));
        let first = authorize(Some(&role), &PermissionSet::new(), resource, action);
        let second = authorize(Some(&role), &PermissionSet::new(), resource, action);

        prop_assert_eq!(first.clone(), second);
        prop_assert_eq!(
            first.is_allowed(),
            resource == Resource::Merchants && action == Action::Read
        );
    }
}
