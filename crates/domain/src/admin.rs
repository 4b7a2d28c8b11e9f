use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use quicklink_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{PermissionSet, RoleId, SubordinateLimit, SystemRole};

/// Admin account identifier, equal to the external auth principal id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminId(NonEmptyString);

impl AdminId {
    /// Creates a validated admin identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        NonEmptyString::new(value.trim()).map(Self)
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for AdminId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Lifecycle state of an admin account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    /// Account may sign in and act.
    Active,
    /// Temporarily blocked by an administrator.
    Suspended,
    /// Permanently retired; replaces hard deletion.
    Disabled,
}

impl AdminStatus {
    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Disabled => "disabled",
        }
    }
}

impl Display for AdminStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AdminStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "disabled" => Ok(Self::Disabled),
            _ => Err(AppError::Validation(format!(
                "unknown admin status '{value}'"
            ))),
        }
    }
}

/// Coarse access label carried by admin records created before roles existed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccessLevel {
    /// Legacy super admin label.
    SuperAdmin,
    /// Legacy system admin label.
    SystemAdmin,
    /// Any other stored label.
    Other(String),
}

impl AccessLevel {
    /// Parses a stored label. Unknown labels are kept verbatim.
    #[must_use]
    pub fn from_storage(value: &str) -> Self {
        match value.trim() {
            "super_admin" => Self::SuperAdmin,
            "system_admin" => Self::SystemAdmin,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the stored label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::SystemAdmin => "system_admin",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Returns the system role a legacy label migrates to, if any.
    #[must_use]
    pub fn migration_target(&self) -> Option<SystemRole> {
        match self {
            Self::SuperAdmin => Some(SystemRole::SuperAdmin),
            Self::SystemAdmin => Some(SystemRole::SystemAdmin),
            Self::Other(_) => None,
        }
    }
}

impl From<String> for AccessLevel {
    fn from(value: String) -> Self {
        Self::from_storage(value.as_str())
    }
}

impl From<AccessLevel> for String {
    fn from(value: AccessLevel) -> Self {
        value.as_str().to_owned()
    }
}

/// Admin account document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    /// Principal identifier.
    pub id: AdminId,
    /// Contact email.
    pub email: String,
    /// Human label.
    pub display_name: String,
    /// Assigned role, absent on unmigrated legacy records.
    pub role_id: Option<RoleId>,
    /// Legacy access label mirrored from the role name.
    pub access_level: AccessLevel,
    /// Lifecycle state.
    pub status: AdminStatus,
    /// Direct grants layered on top of role grants.
    pub permissions: PermissionSet,
    /// Managing admin, if the account was created as a subordinate.
    pub manager_id: Option<AdminId>,
    /// Number of subordinates created by this account.
    pub created_sub_users_count: u32,
    /// Subordinate cap mirrored from the role at creation time.
    pub max_sub_users_allowed: SubordinateLimit,
    /// Most recent sign-in.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl AdminAccount {
    /// Returns whether the account may act at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AdminStatus::Active
    }

    /// Returns whether the account has room for another subordinate.
    #[must_use]
    pub fn can_create_subordinate(&self) -> bool {
        self.max_sub_users_allowed
            .permits_another(self.created_sub_users_count)
    }
}
