use std::fmt::{Display, Formatter};

use quicklink_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PermissionSet;

const ROLE_NAME_MAX_LENGTH: usize = 64;

/// Store-generated role identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique machine key of a role, such as `super_admin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    /// Creates a validated lowercase snake_case role name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "role name must not be empty".to_owned(),
            ));
        }

        if trimmed.len() > ROLE_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "role name must not exceed {ROLE_NAME_MAX_LENGTH} characters"
            )));
        }

        let mut characters = trimmed.chars();
        let starts_with_letter = characters
            .next()
            .is_some_and(|character| character.is_ascii_lowercase());
        let rest_is_valid = characters.all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        });

        if !starts_with_letter || !rest_is_valid {
            return Err(AppError::Validation(format!(
                "role name '{trimmed}' must be lowercase snake_case starting with a letter"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for RoleName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

/// Position in the role hierarchy. Lower values are more privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleLevel(u16);

impl RoleLevel {
    /// Level held by the super admin role.
    pub const SUPER_ADMIN: Self = Self(0);

    /// Creates a level from its numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns whether this level carries unconditional authority.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        *self == Self::SUPER_ADMIN
    }

    /// Returns whether this level is strictly more privileged than `other`.
    #[must_use]
    pub fn outranks(&self, other: RoleLevel) -> bool {
        self.0 < other.0
    }
}

impl Display for RoleLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Cap on how many accounts a role holder may directly create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum SubordinateLimit {
    /// No cap.
    Unlimited,
    /// At most this many subordinates; zero means no capability.
    AtMost(u32),
}

impl SubordinateLimit {
    /// Role holders cannot manage subordinates.
    pub const NONE: Self = Self::AtMost(0);

    /// Maps a nullable stored cap, where `None` means unlimited.
    #[must_use]
    pub fn from_option(value: Option<u32>) -> Self {
        value.map_or(Self::Unlimited, Self::AtMost)
    }

    /// Returns the nullable stored cap.
    #[must_use]
    pub fn as_option(&self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::AtMost(value) => Some(*value),
        }
    }

    /// Returns whether one more subordinate fits after `created` existing ones.
    #[must_use]
    pub fn permits_another(&self, created: u32) -> bool {
        match self {
            Self::Unlimited => true,
            Self::AtMost(limit) => created < *limit,
        }
    }
}

/// Role fields supplied when a role is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRole {
    /// Unique machine key.
    pub name: RoleName,
    /// Human label.
    pub display_name: NonEmptyString,
    /// Hierarchy position.
    pub level: RoleLevel,
    /// Granted permissions.
    pub permissions: PermissionSet,
    /// Whether the role belongs to the protected system catalog.
    pub is_system_role: bool,
    /// Subordinate management cap.
    pub max_subordinates: SubordinateLimit,
}

/// Persisted role definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: RoleName,
    display_name: NonEmptyString,
    level: RoleLevel,
    permissions: PermissionSet,
    is_system_role: bool,
    max_subordinates: SubordinateLimit,
}

impl Role {
    /// Binds creation fields to a store-assigned identifier.
    #[must_use]
    pub fn new(id: RoleId, definition: NewRole) -> Self {
        Self {
            id,
            name: definition.name,
            display_name: definition.display_name,
            level: definition.level,
            permissions: definition.permissions,
            is_system_role: definition.is_system_role,
            max_subordinates: definition.max_subordinates,
        }
    }

    /// Returns the stable identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the unique machine key.
    #[must_use]
    pub fn name(&self) -> &RoleName {
        &self.name
    }

    /// Returns the human label.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the hierarchy position.
    #[must_use]
    pub fn level(&self) -> RoleLevel {
        self.level
    }

    /// Returns the stored grants.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns whether the role is protected from mutation and deletion.
    #[must_use]
    pub fn is_system_role(&self) -> bool {
        self.is_system_role
    }

    /// Returns the subordinate management cap.
    #[must_use]
    pub fn max_subordinates(&self) -> SubordinateLimit {
        self.max_subordinates
    }

    /// Returns whether the role holds wildcard authority, structurally or by data.
    #[must_use]
    pub fn has_wildcard_authority(&self) -> bool {
        self.level.is_super_admin() || self.permissions.has_wildcard()
    }
}
