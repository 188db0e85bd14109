//! Role and permission vocabulary.
//!
//! Roles bundle permission keys; both are opaque strings to the rest of
//! the platform except for the handful of designated shortcuts below.

use sqlx::FromRow;

/// Top-level roles that pass every role check unconditionally.
pub const ROLE_CEO: &str = "CEO";
pub const ROLE_ADMIN: &str = "Admin";

/// Manager tier - combined with [`PERM_READ_ALL`] it unlocks every team.
pub const ROLE_MANAGER: &str = "Manager";

/// Permission keys that pass every permission check unconditionally.
pub const PERM_WILDCARD: &str = "*";
pub const PERM_MANAGE_ALL: &str = "manage:all";

/// Grants read access across team boundaries when held by a manager.
pub const PERM_READ_ALL: &str = "read:all";

pub fn is_global_admin_role(role: &str) -> bool {
    role == ROLE_CEO || role == ROLE_ADMIN
}

pub fn is_admin_permission(key: &str) -> bool {
    key == PERM_WILDCARD || key == PERM_MANAGE_ALL
}

/// One row of the role/permission join for a user. A role with no
/// permissions still produces a row, with `permission_key` absent.
#[derive(Debug, Clone, FromRow)]
pub struct RoleGrant {
    pub role_name: String,
    pub permission_key: Option<String>,
}
