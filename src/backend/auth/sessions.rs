/**
 * Bearer Token Verification
 *
 * `AuthGate` turns a bearer token into an authenticated user and fails
 * closed. The default gate verifies HS256 JWTs signed with the configured
 * secret.
 */

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::error::RegistrationError;
use crate::backend::middleware::AuthenticatedUser;

/// Default token lifetime: 30 days
const DEFAULT_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("invalid user id in token: {0}")]
    InvalidSubject(String),
}

impl From<AuthError> for RegistrationError {
    fn from(err: AuthError) -> Self {
        RegistrationError::unauthorized(err.to_string())
    }
}

/// Verifies bearer tokens
pub trait AuthGate: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// HS256 JWT gate
pub struct JwtAuthGate {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtAuthGate {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    /// Lifetime of tokens issued by `create_token`
    pub fn with_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self
    }

    /// Issue a token for a user
    pub fn create_token(&self, user_id: Uuid, email: Option<String>) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email,
            exp: now.saturating_add(self.ttl_secs).max(0) as u64,
            iat: now.max(0) as u64,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify and decode a token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

impl AuthGate for JwtAuthGate {
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let claims = self.verify_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|e| AuthError::InvalidSubject(e.to_string()))?;
        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
        })
    }
}
