use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a registered account.
///
/// The set is closed. Privilege is compared through [`Role::power_level`],
/// never through declaration order: a lower power level means strictly more
/// privilege.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Moderator,
    User,
    Guest,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: '{0}'")]
pub struct UnknownRoleError(pub String);

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Moderator, Role::User, Role::Guest];

    pub const fn power_level(self) -> u8 {
        match self {
            Role::Admin => 0,
            Role::Moderator => 1,
            Role::User => 2,
            Role::Guest => 3,
        }
    }

    /// `true` iff `self` carries at least the privilege of `other`.
    pub const fn at_least_as_privileged(self, other: Role) -> bool {
        self.power_level() <= other.power_level()
    }

    pub const fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Stable external identifier.
    pub const fn code(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Moderator => "MODERATOR",
            Role::User => "USER",
            Role::Guest => "GUEST",
        }
    }

    /// Human-facing name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Moderator => "Moderator",
            Role::User => "User",
            Role::Guest => "Guest",
        }
    }

    /// Parse a display name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(name: &str) -> Result<Role, UnknownRoleError> {
        let wanted = name.trim();
        if wanted.is_empty() {
            return Err(UnknownRoleError(name.to_string()));
        }

        Role::ALL
            .into_iter()
            .find(|r| r.display_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownRoleError(name.to_string()))
    }
}

impl FromStr for Role {
    type Err = UnknownRoleError;

    /// Parse a stable identifier such as `"ADMIN"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.code() == s)
            .ok_or_else(|| UnknownRoleError(s.to_string()))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn power_levels_are_distinct_and_admin_is_lowest() {
        let mut levels: Vec<u8> = Role::ALL.iter().map(|r| r.power_level()).collect();
        levels.sort();
        levels.dedup();
        assert_eq!(levels.len(), Role::ALL.len());
        assert!(Role::ALL.iter().all(|r| Role::Admin.power_level() <= r.power_level()));
    }

    #[test]
    fn admin_outranks_everyone_and_guest_no_one() {
        for role in Role::ALL {
            assert!(Role::Admin.at_least_as_privileged(role));
            assert!(role.at_least_as_privileged(Role::Guest));
        }
        assert!(!Role::User.at_least_as_privileged(Role::Moderator));
        assert!(Role::Moderator.at_least_as_privileged(Role::User));
    }

    #[test]
    fn parse_matches_display_names_case_insensitively() {
        assert_eq!(Role::parse("administrator"), Ok(Role::Admin));
        assert_eq!(Role::parse("  MODERATOR "), Ok(Role::Moderator));
        assert_eq!(Role::parse("User"), Ok(Role::User));
        assert_eq!(Role::parse("gUeSt"), Ok(Role::Guest));
    }

    #[test]
    fn parse_rejects_empty_and_unknown() {
        assert!(Role::parse("").is_err());
        assert!(Role::parse("   ").is_err());
        assert!(Role::parse("superuser").is_err());
        // Identifiers are not display names.
        assert!(Role::parse("ADMIN").is_err());
    }

    #[test]
    fn codes_round_trip_through_from_str_and_serde() {
        for role in Role::ALL {
            assert_eq!(role.code().parse::<Role>(), Ok(role));
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.code()));
        }
        assert!("admin".parse::<Role>().is_err());
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        /// Property: privilege comparison is a total order consistent with power levels.
        #[test]
        fn privilege_is_total_and_transitive(a in any_role(), b in any_role(), c in any_role()) {
            prop_assert!(a.at_least_as_privileged(b) || b.at_least_as_privileged(a));
            prop_assert_eq!(a.at_least_as_privileged(b), a.power_level() <= b.power_level());
            if a.at_least_as_privileged(b) && b.at_least_as_privileged(c) {
                prop_assert!(a.at_least_as_privileged(c));
            }
            if a.at_least_as_privileged(b) && b.at_least_as_privileged(a) {
                prop_assert_eq!(a, b);
            }
        }
    }
}
