//! Fixed catalog of protected system roles.

use quicklink_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{
    Action, NewRole, Permission, PermissionSet, Resource, RoleLevel, RoleName, SubordinateLimit,
};

/// Number of entries in the system role catalog.
pub const SYSTEM_ROLE_COUNT: usize = 9;

/// Predefined roles created by the seeder. They are never mutated or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Unrestricted platform owner.
    SuperAdmin,
    /// Platform administrator below the owner.
    SystemAdmin,
    /// Runs day-to-day merchant and payment operations.
    OperationsManager,
    /// Owns payouts, settlements and financial reporting.
    FinanceManager,
    /// Reviews merchants for KYC and regulatory compliance.
    ComplianceOfficer,
    /// Leads the customer support team.
    SupportManager,
    /// Handles customer support tickets.
    SupportAgent,
    /// Maintains platform settings.
    TechnicalAdmin,
    /// Read-only access for internal and external audits.
    Auditor,
}

impl SystemRole {
    /// Returns the catalog in hierarchy order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SystemRole] = &[
            SystemRole::SuperAdmin,
            SystemRole::SystemAdmin,
            SystemRole::OperationsManager,
            SystemRole::FinanceManager,
            SystemRole::ComplianceOfficer,
            SystemRole::SupportManager,
            SystemRole::SupportAgent,
            SystemRole::TechnicalAdmin,
            SystemRole::Auditor,
        ];

        ALL
    }

    /// Returns the unique role name stored for this catalog entry.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::SystemAdmin => "system_admin",
            Self::OperationsManager => "operations_manager",
            Self::FinanceManager => "finance_manager",
            Self::ComplianceOfficer => "compliance_officer",
            Self::SupportManager => "support_manager",
            Self::SupportAgent => "support_agent",
            Self::TechnicalAdmin => "technical_admin",
            Self::Auditor => "auditor",
        }
    }

    /// Returns the human label.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super Admin",
            Self::SystemAdmin => "System Admin",
            Self::OperationsManager => "Operations Manager",
            Self::FinanceManager => "Finance Manager",
            Self::ComplianceOfficer => "Compliance Officer",
            Self::SupportManager => "Support Manager",
            Self::SupportAgent => "Support Agent",
            Self::TechnicalAdmin => "Technical Admin",
            Self::Auditor => "Auditor",
        }
    }

    /// Returns the fixed hierarchy level.
    #[must_use]
    pub fn level(&self) -> RoleLevel {
        RoleLevel::new(match self {
            Self::SuperAdmin => 0,
            Self::SystemAdmin => 10,
            Self::OperationsManager => 20,
            Self::FinanceManager => 30,
            Self::ComplianceOfficer => 40,
            Self::SupportManager => 50,
            Self::SupportAgent => 60,
            Self::TechnicalAdmin => 70,
            Self::Auditor => 90,
        })
    }

    /// Returns the subordinate management cap.
    #[must_use]
    pub fn max_subordinates(&self) -> SubordinateLimit {
        match self {
            Self::SuperAdmin => SubordinateLimit::Unlimited,
            Self::SystemAdmin => SubordinateLimit::AtMost(50),
            Self::OperationsManager => SubordinateLimit::AtMost(25),
            Self::FinanceManager | Self::SupportManager => SubordinateLimit::AtMost(10),
            Self::ComplianceOfficer => SubordinateLimit::AtMost(5),
            Self::SupportAgent | Self::TechnicalAdmin | Self::Auditor => SubordinateLimit::NONE,
        }
    }

    /// Returns the grants stored for this catalog entry.
    #[must_use]
    pub fn permissions(&self) -> PermissionSet {
        use Action::{Approve, Delete, Export, Read, Write};
        use Resource::{
            Admins, AuditLogs, Compliance, Dashboard, Merchants, Payouts, Reports, Roles,
            Settings, Settlements, SupportTickets, Transactions,
        };

        match self {
            Self::SuperAdmin => PermissionSet::wildcard(),
            Self::SystemAdmin => {
                let mut permissions = PermissionSet::product(
                    &[
                        Dashboard,
                        Admins,
                        Merchants,
                        Transactions,
                        Payouts,
                        Settlements,
                        Reports,
                        Compliance,
                        SupportTickets,
                    ],
                    Action::all(),
                );
                permissions.extend(PermissionSet::product(&[Roles, Settings], &[Read, Write]));
                permissions.extend(PermissionSet::product(&[AuditLogs], &[Read, Export]));
                permissions
            }
            Self::OperationsManager => {
                let mut permissions = PermissionSet::product(
                    &[Merchants, Transactions, Payouts],
                    &[Read, Write, Approve],
                );
                permissions.extend(PermissionSet::product(&[Reports], &[Read, Export]));
                permissions.extend(PermissionSet::product(
                    &[Dashboard, Admins, SupportTickets],
                    &[Read],
                ));
                permissions.insert(Permission::scoped(Admins, Write));
                permissions
            }
            Self::FinanceManager => {
                let mut permissions = PermissionSet::product(
                    &[Transactions, Payouts, Settlements],
                    &[Read, Write, Approve, Export],
                );
                permissions.extend(PermissionSet::product(&[Reports], &[Read, Export]));
                permissions.extend(PermissionSet::product(
                    &[Dashboard, Merchants, Admins],
                    &[Read],
                ));
                permissions.insert(Permission::scoped(Admins, Write));
                permissions
            }
            Self::ComplianceOfficer => {
                let mut permissions =
                    PermissionSet::product(&[Compliance], &[Read, Write, Approve, Export]);
                permissions.extend(PermissionSet::product(&[Merchants], &[Read, Approve]));
                permissions.extend(PermissionSet::product(
                    &[AuditLogs, Transactions, Dashboard, Admins],
                    &[Read],
                ));
                permissions.insert(Permission::scoped(Admins, Write));
                permissions
            }
            Self::SupportManager => {
                let mut permissions =
                    PermissionSet::product(&[SupportTickets], &[Read, Write, Delete, Export]);
                permissions.extend(PermissionSet::product(
                    &[Merchants, Transactions, Dashboard, Admins],
                    &[Read],
                ));
                permissions.insert(Permission::scoped(Admins, Write));
                permissions
            }
            Self::SupportAgent => {
                let mut permissions = PermissionSet::product(&[SupportTickets], &[Read, Write]);
                permissions.extend(PermissionSet::product(&[Merchants, Dashboard], &[Read]));
                permissions
            }
            Self::TechnicalAdmin => {
                let mut permissions = PermissionSet::product(&[Settings], &[Read, Write]);
                permissions.extend(PermissionSet::product(&[AuditLogs, Dashboard], &[Read]));
                permissions
            }
            Self::Auditor => PermissionSet::product(Resource::all(), &[Read, Export]),
        }
    }

    /// Returns the creation fields used by the seeder.
    pub fn definition(&self) -> AppResult<NewRole> {
        Ok(NewRole {
            name: RoleName::new(self.name())?,
            display_name: NonEmptyString::new(self.display_name())?,
            level: self.level(),
            permissions: self.permissions(),
            is_system_role: true,
            max_subordinates: self.max_subordinates(),
        })
    }

    /// Finds the catalog entry with the given role name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::{Action, Resource, SubordinateLimit};

    use super::{SYSTEM_ROLE_COUNT, SystemRole};

    #[test]
    fn catalog_has_nine_roles_with_fixed_levels() {
        let levels: Vec<u16> = SystemRole::all()
            .iter()
            .map(|role| role.level().value())
            .collect();

        assert_eq!(SystemRole::all().len(), SYSTEM_ROLE_COUNT);
        assert_eq!(levels, vec![0, 10, 20, 30, 40, 50, 60, 70, 90]);
    }

    #[test]
    fn catalog_names_are_unique_and_valid() {
        let names: BTreeSet<&str> = SystemRole::all().iter().map(SystemRole::name).collect();
        assert_eq!(names.len(), SYSTEM_ROLE_COUNT);

        for role in SystemRole::all() {
            let definition = role.definition();
            assert!(definition.is_ok(), "invalid definition for {}", role.name());
        }
    }

    #[test]
    fn only_super_admin_stores_the_wildcard() {
        for role in SystemRole::all() {
            assert_eq!(
                role.permissions().has_wildcard(),
                *role == SystemRole::SuperAdmin
            );
        }
    }

    #[test]
    fn technical_and_audit_roles_cannot_manage_subordinates() {
        assert_eq!(
            SystemRole::TechnicalAdmin.max_subordinates(),
            SubordinateLimit::NONE
        );
        assert_eq!(SystemRole::Auditor.max_subordinates(), SubordinateLimit::NONE);
        assert_eq!(
            SystemRole::SuperAdmin.max_subordinates(),
            SubordinateLimit::Unlimited
        );
    }

    #[test]
    fn auditor_is_read_only() {
        let permissions = SystemRole::Auditor.permissions();
        for resource in Resource::all() {
            assert!(permissions.contains_pair(*resource, Action::Read));
            assert!(!permissions.contains_pair(*resource, Action::Write));
            assert!(!permissions.contains_pair(*resource, Action::Delete));
        }
    }

    #[test]
    fn system_admin_cannot_delete_roles() {
        let permissions = SystemRole::SystemAdmin.permissions();
        assert!(permissions.contains_pair(Resource::Roles, Action::Write));
        assert!(!permissions.contains_pair(Resource::Roles, Action::Delete));
    }

    #[test]
    fn managers_can_administer_admins() {
        for role in [
            SystemRole::OperationsManager,
            SystemRole::FinanceManager,
            SystemRole::ComplianceOfficer,
            SystemRole::SupportManager,
        ] {
            let permissions = role.permissions();
            assert!(permissions.contains_pair(Resource::Admins, Action::Read));
            assert!(permissions.contains_pair(Resource::Admins, Action::Write));
            assert!(!permissions.contains_pair(Resource::Admins, Action::Delete));
        }
        assert!(
            !SystemRole::SupportAgent
                .permissions()
                .contains_pair(Resource::Admins, Action::Write)
        );
    }

    #[test]
    fn from_name_matches_catalog() {
        assert_eq!(
            SystemRole::from_name("system_admin"),
            Some(SystemRole::SystemAdmin)
        );
        assert_eq!(SystemRole::from_name("root"), None);
    }
}
