//! Identity resolution: token claims to an [`Actor`].
//!
//! Resolution is pure. It never touches storage; the role carried in the
//! credential was derived when the credential was issued.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("missing identity claim")]
    MissingClaim,
    #[error("malformed identity claim: {0}")]
    MalformedClaim(String),
}

/// Role carried by a credential. Ordered by privilege: an administrator
/// passes every check, a plain `User` only self-scoped ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Administrator,
    Broker,
    Buyer,
    User,
}

impl Role {
    /// Parses a role claim. Unrecognized values degrade to `User`
    /// rather than failing authentication.
    pub fn from_claim(value: &str) -> Role {
        match value {
            "Administrator" => Role::Administrator,
            "Broker" => Role::Broker,
            "Buyer" => Role::Buyer,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::Broker => "Broker",
            Role::Buyer => "Buyer",
            Role::User => "User",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Actor {
        Actor { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    /// Resolves the identity claims of a verified credential. `id` is
    /// the raw subject claim; `role` the raw role claim, if present.
    pub fn from_claims(id: Option<&str>, role: Option<&str>) -> Result<Actor, IdentityError> {
        let raw = id.ok_or(IdentityError::MissingClaim)?;
        let user_id = raw
            .parse::<i64>()
            .map_err(|_| IdentityError::MalformedClaim(raw.to_string()))?;
        let role = role.map(Role::from_claim).unwrap_or(Role::User);
        Ok(Actor { user_id, role })
    }
}
