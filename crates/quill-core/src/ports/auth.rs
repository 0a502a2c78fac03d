//! Authentication ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::CacheError;

/// Claims carried by a session token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub email: String,
    /// Unique token id; the key of the invalidation set.
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues, validates, revokes and rotates signed session tokens.
///
/// Tokens are self-describing; revocation goes through a side store that
/// every `validate` consults.
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Sign a new token for a user.
    fn issue(&self, user_id: Uuid, email: &str) -> Result<String, AuthError>;

    /// Decode a token, rejecting expired, malformed and revoked ones.
    async fn validate(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Add a token to the invalidation set. Invalidating twice is not an error.
    async fn invalidate(&self, token: &str) -> Result<(), AuthError>;

    /// Invalidate `token` and issue a replacement for the same identity.
    ///
    /// Expired tokens are accepted while still inside the refresh window;
    /// revoked or malformed tokens fail with [`AuthError::InvalidToken`].
    async fn refresh(&self, token: &str) -> Result<String, AuthError>;

    /// Lifetime of issued tokens in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Revocation store error: {0}")]
    Backend(String),
}

impl From<CacheError> for AuthError {
    fn from(err: CacheError) -> Self {
        AuthError::Backend(err.to_string())
    }
}
