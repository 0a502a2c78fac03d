//! JWT token service implementation.
//!
//! Tokens are HS256-signed and carry a unique `jti`. Revocation stores the
//! `jti` in a [`Cache`] until the token can no longer be refreshed, so the
//! invalidation set never grows past the number of live tokens.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::ports::{AuthError, Cache, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";
const REVOKED_PREFIX: &str = "jwt:revoked:";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    /// How long after issuance a token may still be exchanged via refresh.
    pub refresh_ttl_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 1,
            refresh_ttl_hours: 336,
            issuer: "quill-api".to_string(),
        }
    }
}

impl JwtConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret = std::env::var("JWT_SECRET").unwrap_or(defaults.secret);

        // Warn if using default secret in production
        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.expiration_hours),
            refresh_ttl_hours: std::env::var("JWT_REFRESH_TTL_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.refresh_ttl_hours),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        }
    }
}

/// Wire format of the token payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    email: String,
    jti: String,
    iat: i64,
    exp: i64,
    iss: String,
}

/// JWT-based token service with a cache-backed invalidation set.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
    revoked: Arc<dyn Cache>,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig, revoked: Arc<dyn Cache>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
            revoked,
        }
    }

    pub fn from_env(revoked: Arc<dyn Cache>) -> Self {
        Self::new(JwtConfig::from_env(), revoked)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and issuer. Expiry is only enforced when `check_exp` is set.
    fn decode_claims(&self, token: &str, check_exp: bool) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;
        validation.validate_exp = check_exp;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }

    fn revocation_key(jti: &str) -> String {
        format!("{REVOKED_PREFIX}{jti}")
    }

    /// Unix time after which a token cannot be refreshed.
    fn refresh_deadline(&self, claims: &Claims) -> i64 {
        claims.iat + self.config.refresh_ttl_hours * 3600
    }

    async fn is_revoked(&self, claims: &Claims) -> Result<bool, AuthError> {
        Ok(self
            .revoked
            .exists(&Self::revocation_key(&claims.jti))
            .await?)
    }

    async fn revoke(&self, claims: &Claims) -> Result<(), AuthError> {
        let remaining = self.refresh_deadline(claims) - Utc::now().timestamp();
        if remaining <= 0 {
            // Already unusable for both validation and refresh.
            return Ok(());
        }

        self.revoked
            .set(
                &Self::revocation_key(&claims.jti),
                &claims.sub,
                Some(Duration::from_secs(remaining as u64)),
            )
            .await?;

        tracing::debug!(jti = %claims.jti, ttl_secs = remaining, "Token revoked");
        Ok(())
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, AuthError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| AuthError::InvalidToken("timestamp out of range".to_string()))
}

#[async_trait]
impl TokenService for JwtTokenService {
    fn issue(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        self.sign(&claims)
    }

    async fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.decode_claims(token, true)?;

        if self.is_revoked(&claims).await? {
            return Err(AuthError::TokenRevoked);
        }

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims {
            user_id,
            email: claims.email,
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
            token_id: claims.jti,
        })
    }

    async fn invalidate(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.decode_claims(token, false)?;
        self.revoke(&claims).await
    }

    async fn refresh(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.decode_claims(token, false)?;

        let remaining = self.refresh_deadline(&claims) - Utc::now().timestamp();
        if remaining < 0 {
            return Err(AuthError::TokenExpired);
        }

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        // Revoking and checking in one write lets exactly one concurrent
        // refresh of the same token through.
        let claimed = self
            .revoked
            .set_if_absent(
                &Self::revocation_key(&claims.jti),
                &claims.sub,
                Some(Duration::from_secs(remaining.max(1) as u64)),
            )
            .await?;
        if !claimed {
            return Err(AuthError::InvalidToken(
                "token has been revoked".to_string(),
            ));
        }

        tracing::debug!(jti = %claims.jti, "Token rotated");
        self.issue(user_id, &claims.email)
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}
