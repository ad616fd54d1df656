//! Authentication module
//!
//! Roles, signed token handling, password hashing and password-reset tokens.

mod jwt;
mod password;
mod reset;

pub use jwt::{Claims, TokenCodec, TokenError, TokenSubject};
pub use password::{hash_password, verify_password};
pub use reset::{PasswordResetToken, RESET_TOKEN_TTL_MINUTES};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Principal roles. Each role has its own credential collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Platform operator, may act on any hotel
    SuperAdmin,
    /// Tenant operator, bound to a single hotel
    HotelOwner,
}

impl Role {
    /// Resolution order used when a token does not name a role
    pub const FALLBACK_ORDER: [Role; 2] = [Role::SuperAdmin, Role::HotelOwner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::HotelOwner => "HotelOwner",
        }
    }

    /// Collection (table) holding principals of this role
    pub fn collection(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmins",
            Role::HotelOwner => "hotelowners",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SuperAdmin" => Ok(Role::SuperAdmin),
            "HotelOwner" => Ok(Role::HotelOwner),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
