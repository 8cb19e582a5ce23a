//! Credential and session-token ports.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Claims carried by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub remember: bool,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub remember: bool,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies the client-held session token.
pub trait SessionTokenService: Send + Sync {
    /// Issue a token for a user. `remember` selects the extended lifetime.
    fn issue(&self, user_id: Uuid, remember: bool) -> Result<IssuedSession, AuthError>;

    /// Verify signature, issuer and expiry, and decode the claims.
    fn validate(&self, token: &str) -> Result<SessionClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password with a fresh salt.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a stored hash. A malformed hash never matches.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}
