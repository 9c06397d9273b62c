use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use bustas_core::model::Session;
use bustas_core::{Actor, Role};
use bustas_storage::{AccountStore, StorageError};

use crate::config::AuthConfig;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,

    #[error("invalid authorization format")]
    InvalidHeader,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("internal authentication error: {0}")]
    Internal(String),
}

/// Access-token claims. The subject id is carried as a decimal string;
/// the role is derived once, when the token is issued.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub role: String,
    pub iss: String,
    pub exp: i64,
}

/// Issues and verifies HS256 access tokens.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: String,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.issuer.clone(),
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_ttl_days),
        }
    }

    pub fn issue_access_token(&self, user_id: i64, role: Role) -> Result<String, AuthError> {
        let claims = Claims {
            id: user_id.to_string(),
            role: role.as_str().to_string(),
            iss: self.issuer.clone(),
            exp: (Utc::now() + self.access_ttl).timestamp(),
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(e.to_string()))
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Actor, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Actor::from_claims(Some(&data.claims.id), Some(&data.claims.role))
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Builds a fresh refresh-token session row for a user.
    pub fn new_session(&self, user_id: i64, remember: bool) -> Session {
        let now = Utc::now();
        Session {
            id: uuid::Uuid::new_v4().as_simple().to_string(),
            created: now,
            remember,
            last_activity: now,
            expires: now + self.refresh_ttl,
            revoked: false,
            fk_user: user_id,
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Derives the role baked into a credential at issuance. Highest role
/// wins: administrator, then broker, then buyer, else plain user.
pub async fn derive_role<S: AccountStore>(store: &S, user_id: i64) -> Result<Role, StorageError> {
    if store.find_administrator(user_id).await?.is_some() {
        return Ok(Role::Administrator);
    }
    if store.find_broker(user_id).await?.is_some() {
        return Ok(Role::Broker);
    }
    if store.find_buyer(user_id).await?.is_some() {
        return Ok(Role::Buyer);
    }
    Ok(Role::User)
}
