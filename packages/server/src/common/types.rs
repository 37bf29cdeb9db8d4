//! Shared domain types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role on the marketplace.
///
/// Closed enumeration: every authorization decision matches on this
/// exhaustively, so adding a role forces a review of the policy in
/// `common::auth::capability`.
///
/// Stored as the Postgres enum type `user_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    /// Pet owner - the default role for new accounts.
    Owner,
    /// Pet lover offering sitting/walking services.
    Lover,
    Vet,
    Groomer,
    Supplier,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Lover => "lover",
            Role::Vet => "vet",
            Role::Groomer => "groomer",
            Role::Supplier => "supplier",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
