use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of an authenticated user.
///
/// `Externo` users own challenges, `Unsa` users own research capacities and
/// `Admin` users operate the platform. Only the first two can be a party to a
/// match request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Externo,
    Unsa,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Externo => "externo",
            Role::Unsa => "unsa",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "externo" => Some(Role::Externo),
            "unsa" => Some(Role::Unsa),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("unknown role '{s}' (expected externo, unsa or admin)"))
    }
}

/// The authenticated caller of a core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrips_through_str() {
        for role in [Role::Externo, Role::Unsa, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert_eq!(Role::parse("Externo"), None);
        assert!("researcher".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_uses_lowercase() {
        let json = serde_json::to_string(&Role::Unsa).unwrap();
        assert_eq!(json, "\"unsa\"");
    }
}
