//! Pure permission resolution shared by the access gate and role tooling.
//!
//! Resolution order, first match wins:
//! 1. the role holds wildcard authority (level 0 always does),
//! 2. the role grants the exact resource/action pair,
//! 3. a direct grant on the account covers the pair,
//! 4. otherwise the request is denied.

use std::fmt::{Display, Formatter};

use quicklink_core::AppError;
use serde::{Deserialize, Serialize};

use crate::{Action, AdminStatus, Permission, PermissionSet, Resource, Role, RoleLevel};

/// Which rule allowed a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantSource {
    /// Role wildcard or super admin level.
    RoleWildcard,
    /// Exact pair on the role.
    RolePermission,
    /// Direct grant on the account.
    DirectGrant,
}

/// Outcome of a permission resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum Authorization {
    /// The request is allowed.
    Allowed {
        /// Rule that matched.
        source: GrantSource,
    },
    /// The request is denied.
    Denied {
        /// Message suitable for direct display.
        reason: String,
    },
}

impl Authorization {
    /// Returns whether the request is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Decides whether a role plus direct grants authorize a resource/action pair.
#[must_use]
pub fn authorize(
    role: Option<&Role>,
    direct_grants: &PermissionSet,
    resource: Resource,
    action: Action,
) -> Authorization {
    if let Some(role) = role {
        if role.has_wildcard_authority() {
            return Authorization::Allowed {
                source: GrantSource::RoleWildcard,
            };
        }

        if role.permissions().contains_pair(resource, action) {
            return Authorization::Allowed {
                source: GrantSource::RolePermission,
            };
        }
    }

    if direct_grants.covers(resource, action) {
        return Authorization::Allowed {
            source: GrantSource::DirectGrant,
        };
    }

    Authorization::Denied {
        reason: format!(
            "missing permission `{}`",
            Permission::scoped(resource, action)
        ),
    }
}

/// Returns every grant a role plus direct grants effectively hold.
#[must_use]
pub fn effective_permissions(role: Option<&Role>, direct_grants: &PermissionSet) -> PermissionSet {
    if role.is_some_and(Role::has_wildcard_authority) || direct_grants.has_wildcard() {
        return PermissionSet::wildcard();
    }

    let mut permissions = direct_grants.clone();
    if let Some(role) = role {
        permissions.extend(role.permissions().iter().copied());
    }

    permissions
}

/// What a protected view requires beyond an active, authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AccessRequirement {
    /// Any authenticated, active account.
    Authenticated,
    /// Role level must be at most this value.
    MaxLevel {
        /// Least privileged level still admitted.
        level: RoleLevel,
    },
    /// A specific resource/action pair must be authorized.
    Permission {
        /// Guarded resource.
        resource: Resource,
        /// Requested action.
        action: Action,
    },
}

/// Category of an access gate denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// No authenticated principal, or no matching admin account.
    Unauthenticated,
    /// Account exists but is suspended or disabled.
    AccountInactive,
    /// Account is active but lacks the required authority.
    InsufficientPermission,
}

/// Denial returned by the access gate, displayed verbatim by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDenial {
    /// Denial category.
    pub kind: DenialKind,
    /// Message suitable for direct display.
    pub message: String,
}

impl AccessDenial {
    /// Creates an unauthenticated denial.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            kind: DenialKind::Unauthenticated,
            message: message.into(),
        }
    }

    /// Creates an inactive-account denial naming the current status.
    #[must_use]
    pub fn account_inactive(status: AdminStatus) -> Self {
        Self {
            kind: DenialKind::AccountInactive,
            message: format!("your account is {status}; contact a super admin to restore access"),
        }
    }

    /// Creates an insufficient-permission denial.
    #[must_use]
    pub fn insufficient_permission(message: impl Into<String>) -> Self {
        Self {
            kind: DenialKind::InsufficientPermission,
            message: message.into(),
        }
    }
}

impl Display for AccessDenial {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.message.as_str())
    }
}

impl From<AccessDenial> for AppError {
    fn from(value: AccessDenial) -> Self {
        match value.kind {
            DenialKind::Unauthenticated | DenialKind::AccountInactive => {
                AppError::Unauthorized(value.message)
            }
            DenialKind::InsufficientPermission => AppError::Forbidden(value.message),
        }
    }
}

/// Resolver decisions for one role, used for security-rule parity checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMatrixRow {
    /// Role name.
    pub role_name: String,
    /// Role level.
    pub level: RoleLevel,
    /// Pairs the resolver allows, as `resource.action`.
    pub allowed: Vec<String>,
    /// Pairs the resolver denies, as `resource.action`.
    pub denied: Vec<String>,
}

/// Evaluates every resource/action pair for every role.
#[must_use]
pub fn permission_matrix(roles: &[Role]) -> Vec<PermissionMatrixRow> {
    let no_direct_grants = PermissionSet::new();

    roles
        .iter()
        .map(|role| {
            let mut allowed = Vec::new();
            let mut denied = Vec::new();

            for resource in Resource::all() {
                for action in Action::all() {
                    let pair = Permission::scoped(*resource, *action).storage_value();
                    if authorize(Some(role), &no_direct_grants, *resource, *action).is_allowed() {
                        allowed.push(pair);
                    } else {
                        denied.push(pair);
                    }
                }
            }

            PermissionMatrixRow {
                role_name: role.name().to_string(),
                level: role.level(),
                allowed,
                denied,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests;
