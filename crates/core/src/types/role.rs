//! Session role.

use serde::{Deserialize, Serialize};

/// Role attached to a logged-in session.
///
/// The backend hands back a free-form role string. Only `"admin"` grants
/// access to the management screens; every other value is an ordinary
/// customer. Keeping the set closed means route guards match exhaustively
/// instead of comparing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Store administrator: may manage products and orders.
    Admin,
    /// Ordinary shopper.
    #[default]
    Customer,
}

impl Role {
    /// The role string stored in the session.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
        }
    }

    /// Whether this role may open the management screens.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::Customer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admin_string_is_admin() {
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from(" Admin "), Role::Admin);
        assert_eq!(Role::from("user"), Role::Customer);
        assert_eq!(Role::from("cliente"), Role::Customer);
        assert_eq!(Role::from(""), Role::Customer);
    }

    #[test]
    fn test_round_trips_through_storage_string() {
        for role in [Role::Admin, Role::Customer] {
            assert_eq!(Role::from(role.as_str()), role);
        }
    }
}
