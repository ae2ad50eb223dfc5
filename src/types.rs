/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Roles a principal can hold. A principal always holds at least CUSTOMER;
/// SELLER and ADMIN are added by privileged workflows outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    /// All recognized role names, in display order.
    pub const ALL: [Role; 3] = [Role::Customer, Role::Seller, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Seller => "SELLER",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse a wire-format role name. Returns `None` for anything outside
    /// the fixed allow-list, including case variants.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "CUSTOMER" => Some(Role::Customer),
            "SELLER" => Some(Role::Seller),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse account tier gating which permission-table partition applies.
/// `Sophisticated` is required for wildcard/admin escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SophisticationLevel {
    Unsophisticated,
    Sophisticated,
}

impl SophisticationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SophisticationLevel::Unsophisticated => "unsophisticated",
            SophisticationLevel::Sophisticated => "sophisticated",
        }
    }
}

impl std::fmt::Display for SophisticationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
