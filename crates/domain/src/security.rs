use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use quicklink_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Storage value of the wildcard permission.
pub const WILDCARD_PERMISSION: &str = "*";

/// Resources guarded by the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Dashboard overview widgets.
    Dashboard,
    /// Admin accounts.
    Admins,
    /// Role definitions.
    Roles,
    /// Merchant accounts.
    Merchants,
    /// Payment transactions.
    Transactions,
    /// Merchant payouts.
    Payouts,
    /// Settlement batches.
    Settlements,
    /// Financial and operational reports.
    Reports,
    /// KYC and compliance reviews.
    Compliance,
    /// Customer support tickets.
    SupportTickets,
    /// Platform settings.
    Settings,
    /// Audit log entries.
    AuditLogs,
}

impl Resource {
    /// Returns a stable storage value for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Admins => "admins",
            Self::Roles => "roles",
            Self::Merchants => "merchants",
            Self::Transactions => "transactions",
            Self::Payouts => "payouts",
            Self::Settlements => "settlements",
            Self::Reports => "reports",
            Self::Compliance => "compliance",
            Self::SupportTickets => "support_tickets",
            Self::Settings => "settings",
            Self::AuditLogs => "audit_logs",
        }
    }

    /// Returns all known resources.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Resource] = &[
            Resource::Dashboard,
            Resource::Admins,
            Resource::Roles,
            Resource::Merchants,
            Resource::Transactions,
            Resource::Payouts,
            Resource::Settlements,
            Resource::Reports,
            Resource::Compliance,
            Resource::SupportTickets,
            Resource::Settings,
            Resource::AuditLogs,
        ];

        ALL
    }
}

impl FromStr for Resource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|resource| resource.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown resource '{value}'")))
    }
}

/// Actions that can be performed on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// View records.
    Read,
    /// Create or modify records.
    Write,
    /// Remove records.
    Delete,
    /// Approve pending records.
    Approve,
    /// Export records.
    Export,
}

impl Action {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Approve => "approve",
            Self::Export => "export",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Action] = &[
            Action::Read,
            Action::Write,
            Action::Delete,
            Action::Approve,
            Action::Export,
        ];

        ALL
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "delete" => Ok(Self::Delete),
            "approve" => Ok(Self::Approve),
            "export" => Ok(Self::Export),
            _ => Err(AppError::Validation(format!("unknown action '{value}'"))),
        }
    }
}

/// A single grant: one resource/action pair, or every pair at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Permission {
    /// Matches every resource and action.
    Wildcard,
    /// Matches exactly one resource/action pair.
    Scoped {
        /// Guarded resource.
        resource: Resource,
        /// Permitted action.
        action: Action,
    },
}

impl Permission {
    /// Creates a grant for one resource/action pair.
    #[must_use]
    pub const fn scoped(resource: Resource, action: Action) -> Self {
        Self::Scoped { resource, action }
    }

    /// Returns whether this grant covers the requested pair.
    #[must_use]
    pub fn covers(&self, resource: Resource, action: Action) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Scoped {
                resource: granted_resource,
                action: granted_action,
            } => *granted_resource == resource && *granted_action == action,
        }
    }

    /// Returns a stable storage value, `resource.action` or `*`.
    #[must_use]
    pub fn storage_value(&self) -> String {
        match self {
            Self::Wildcard => WILDCARD_PERMISSION.to_owned(),
            Self::Scoped { resource, action } => {
                format!("{}.{}", resource.as_str(), action.as_str())
            }
        }
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.storage_value().as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value == WILDCARD_PERMISSION {
            return Ok(Self::Wildcard);
        }

        let Some((resource, action)) = value.rsplit_once('.') else {
            return Err(AppError::Validation(format!(
                "permission '{value}' must use the form 'resource.action'"
            )));
        };

        Ok(Self::Scoped {
            resource: Resource::from_str(resource)?,
            action: Action::from_str(action)?,
        })
    }
}

impl TryFrom<String> for Permission {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.storage_value()
    }
}

/// Ordered, duplicate-free collection of grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Creates an empty permission set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Creates a set holding only the wildcard grant.
    #[must_use]
    pub fn wildcard() -> Self {
        Self(BTreeSet::from([Permission::Wildcard]))
    }

    /// Creates a set granting each listed action on each listed resource.
    #[must_use]
    pub fn product(resources: &[Resource], actions: &[Action]) -> Self {
        resources
            .iter()
            .flat_map(|resource| {
                actions
                    .iter()
                    .map(|action| Permission::scoped(*resource, *action))
            })
            .collect()
    }

    /// Parses stored permission values, rejecting unknown entries.
    pub fn from_storage<S: AsRef<str>>(values: &[S]) -> AppResult<Self> {
        values
            .iter()
            .map(|value| Permission::from_str(value.as_ref()))
            .collect()
    }

    /// Returns stable storage values in set order.
    #[must_use]
    pub fn to_storage(&self) -> Vec<String> {
        self.0.iter().map(Permission::storage_value).collect()
    }

    /// Adds a grant to the set.
    pub fn insert(&mut self, permission: Permission) {
        self.0.insert(permission);
    }

    /// Returns whether the set holds the wildcard grant.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.0.contains(&Permission::Wildcard)
    }

    /// Returns whether the set holds exactly this resource/action pair.
    #[must_use]
    pub fn contains_pair(&self, resource: Resource, action: Action) -> bool {
        self.0.contains(&Permission::scoped(resource, action))
    }

    /// Returns whether any grant in the set covers the pair.
    #[must_use]
    pub fn covers(&self, resource: Resource, action: Action) -> bool {
        self.0
            .iter()
            .any(|permission| permission.covers(resource, action))
    }

    /// Iterates the grants in set order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// Returns the number of grants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the set holds no grants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PermissionSet {
    type Item = Permission;
    type IntoIter = std::collections::btree_set::IntoIter<Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<Permission> for PermissionSet {
    fn extend<I: IntoIterator<Item = Permission>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a system role is created by the seeder.
    SecurityRoleSeeded,
    /// Emitted when a custom role is created.
    SecurityRoleCreated,
    /// Emitted when a custom role is deleted.
    SecurityRoleDeleted,
    /// Emitted when a legacy admin record receives a role reference.
    AdminRoleMigrated,
    /// Emitted when an admin creates a subordinate account.
    AdminSubordinateCreated,
    /// Emitted when an admin account status changes.
    AdminStatusChanged,
    /// Emitted when an admin signs in.
    AdminLoggedIn,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecurityRoleSeeded => "security.role.seeded",
            Self::SecurityRoleCreated => "security.role.created",
            Self::SecurityRoleDeleted => "security.role.deleted",
            Self::AdminRoleMigrated => "admin.role.migrated",
            Self::AdminSubordinateCreated => "admin.subordinate.created",
            Self::AdminStatusChanged => "admin.status.changed",
            Self::AdminLoggedIn => "admin.logged_in",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Action, Permission, PermissionSet, Resource};

    #[test]
    fn permission_roundtrip_storage_value() {
        let permission = Permission::scoped(Resource::SupportTickets, Action::Write);
        assert_eq!(permission.storage_value(), "support_tickets.write");

        let restored = Permission::from_str(permission.storage_value().as_str());
        assert!(restored.is_ok());
        assert_eq!(restored.unwrap_or(Permission::Wildcard), permission);
    }

    #[test]
    fn wildcard_parses_from_star() {
        let parsed = Permission::from_str("*");
        assert!(matches!(parsed, Ok(Permission::Wildcard)));
    }

    #[test]
    fn typos_are_rejected_instead_of_silently_denying() {
        assert!(Permission::from_str("merchant.read").is_err());
        assert!(Permission::from_str("merchants.reed").is_err());
        assert!(Permission::from_str("merchants").is_err());
        assert!(Permission::from_str("").is_err());
    }

    #[test]
    fn permission_set_storage_rejects_unknown_entries() {
        let parsed = PermissionSet::from_storage(&["merchants.read", "payouts.steal"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn wildcard_covers_every_pair_but_is_not_an_exact_pair() {
        let set = PermissionSet::wildcard();
        assert!(set.covers(Resource::Settings, Action::Delete));
        assert!(!set.contains_pair(Resource::Settings, Action::Delete));
    }

    #[test]
    fn permission_serializes_as_storage_string() {
        let permission = Permission::scoped(Resource::Merchants, Action::Write);
        let encoded = serde_json::to_string(&permission).unwrap_or_default();
        assert_eq!(encoded, "\"merchants.write\"");

        let decoded: Result<Permission, _> = serde_json::from_str("\"audit_logs.export\"");
        assert!(decoded.is_ok());
    }
}
