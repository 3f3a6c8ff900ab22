//! Role-conditioned session policy.
//!
//! Policy lives in lookup tables so a policy change never touches protocol
//! logic.

use crate::modules::users::model::UserRole;

/// Refresh token lifetime overrides in days. Roles not listed here use the
/// configured default.
const REFRESH_TTL_DAYS: &[(UserRole, i64)] = &[
    (UserRole::SystemAdmin, 365),
    (UserRole::Admin, 365),
];

/// Roles whose login forcibly revokes every prior session, not just the
/// one on the same device.
const SINGLE_SESSION_ROLES: &[UserRole] = &[UserRole::SystemAdmin, UserRole::Admin];

/// Roles allowed on the control-panel surface.
const PANEL_ALLOWED_ROLES: &[UserRole] = &[UserRole::SystemAdmin, UserRole::Admin];

pub fn refresh_ttl_days(role: UserRole, default_days: i64) -> i64 {
    REFRESH_TTL_DAYS
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, days)| *days)
        .unwrap_or(default_days)
}

pub fn single_session_enforced(role: UserRole) -> bool {
    SINGLE_SESSION_ROLES.contains(&role)
}

pub fn panel_allows(role: UserRole) -> bool {
    PANEL_ALLOWED_ROLES.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_roles_get_long_ttl() {
        assert_eq!(refresh_ttl_days(UserRole::SystemAdmin, 30), 365);
        assert_eq!(refresh_ttl_days(UserRole::Admin, 30), 365);
    }

    #[test]
    fn test_other_roles_use_configured_default() {
        assert_eq!(refresh_ttl_days(UserRole::Teacher, 30), 30);
        assert_eq!(refresh_ttl_days(UserRole::Student, 14), 14);
    }

    #[test]
    fn test_panel_allow_list() {
        assert!(panel_allows(UserRole::SystemAdmin));
        assert!(panel_allows(UserRole::Admin));
        assert!(!panel_allows(UserRole::Teacher));
        assert!(!panel_allows(UserRole::Student));
    }

    #[test]
    fn test_single_session_matches_privileged_set() {
        assert!(single_session_enforced(UserRole::Admin));
        assert!(!single_session_enforced(UserRole::Student));
    }
}
