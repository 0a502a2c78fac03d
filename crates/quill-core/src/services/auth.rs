//! Registration, login and session lifecycle.

use std::sync::Arc;

use crate::domain::User;
use crate::error::{DomainError, RepoError};
use crate::ports::{AuthError, BaseRepository, PasswordService, TokenService, UserRepository};
use crate::validation::{self, ValidationErrors};

const NAME_MAX: usize = 255;
const EMAIL_MAX: usize = 255;
const PASSWORD_MIN: usize = 6;

/// Raw registration input. Missing fields are reported as validation errors.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Raw login input.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A user together with a freshly issued token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Auth flow over the credential store, token service and password hasher.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        Self {
            users,
            tokens,
            passwords,
        }
    }

    /// Lifetime of issued tokens in seconds.
    pub fn token_lifetime(&self) -> i64 {
        self.tokens.expiration_seconds()
    }

    /// Create an account and sign the new user in.
    pub async fn register(&self, input: Registration) -> Result<AuthSession, DomainError> {
        let mut errors = ValidationErrors::new();

        let name = validation::required(&mut errors, "name", input.name.as_deref()).map(str::trim);
        if let Some(name) = name {
            validation::max_chars(&mut errors, "name", name, NAME_MAX);
        }

        let email =
            validation::required(&mut errors, "email", input.email.as_deref()).map(str::trim);
        if let Some(email) = email {
            validation::email(&mut errors, "email", email);
            validation::max_chars(&mut errors, "email", email, EMAIL_MAX);
        }

        let password = validation::required(&mut errors, "password", input.password.as_deref());
        if let Some(password) = password {
            validation::min_chars(&mut errors, "password", password, PASSWORD_MIN);
        }

        let confirm = validation::required(
            &mut errors,
            "confirm_password",
            input.confirm_password.as_deref(),
        );
        if let Some(confirm) = confirm {
            validation::min_chars(&mut errors, "confirm_password", confirm, PASSWORD_MIN);
            if let Some(password) = password {
                validation::same(&mut errors, "confirm_password", confirm, "password", password);
            }
        }

        if let Some(email) = email {
            if !errors.has("email") && self.users.find_by_email(email).await?.is_some() {
                errors.add("email", validation::taken_message("email"));
            }
        }

        errors.into_result()?;

        // All three are present once validation passed.
        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(DomainError::Internal("validated input missing".to_string()));
        };

        let password_hash = self
            .passwords
            .hash(password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = User::new(name.to_string(), email.to_string(), password_hash);

        // The unique index decides concurrent registrations of one email.
        let user = match self.users.create(user).await {
            Ok(user) => user,
            Err(RepoError::Constraint(_)) => {
                let taken = ValidationErrors::single("email", validation::taken_message("email"));
                return Err(taken.into());
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthSession { user, token })
    }

    /// Exchange credentials for a token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, input: Credentials) -> Result<AuthSession, DomainError> {
        let mut errors = ValidationErrors::new();

        let email =
            validation::required(&mut errors, "email", input.email.as_deref()).map(str::trim);
        if let Some(email) = email {
            validation::email(&mut errors, "email", email);
        }
        let password = validation::required(&mut errors, "password", input.password.as_deref());

        errors.into_result()?;

        let (Some(email), Some(password)) = (email, password) else {
            return Err(DomainError::Internal("validated input missing".to_string()));
        };

        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Login rejected: unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if !valid {
            tracing::debug!(user_id = %user.id, "Login rejected: password mismatch");
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthSession { user, token })
    }

    /// Revoke the caller's token and return who was logged out.
    pub async fn logout(&self, token: &str) -> Result<User, DomainError> {
        let user = self.current_user(token).await?;

        self.tokens.invalidate(token).await.map_err(|e| {
            tracing::error!(user_id = %user.id, error = %e, "Token invalidation failed");
            DomainError::Logout(e.to_string())
        })?;

        tracing::info!(user_id = %user.id, "User logged out");
        Ok(user)
    }

    /// Rotate the caller's token.
    pub async fn refresh_token(&self, token: &str) -> Result<String, DomainError> {
        self.tokens.refresh(token).await.map_err(|e| {
            tracing::warn!(error = %e, "Token refresh failed");
            DomainError::Refresh(e.to_string())
        })
    }

    /// Resolve a token to the user it belongs to.
    pub async fn current_user(&self, token: &str) -> Result<User, DomainError> {
        let claims = self.tokens.validate(token).await.map_err(|e| match e {
            AuthError::Backend(msg) => DomainError::Internal(msg),
            _ => DomainError::Unauthenticated,
        })?;

        self.users
            .find_by_id(claims.user_id)
            .await?
            .ok_or(DomainError::Unauthenticated)
    }

    fn issue_token(&self, user: &User) -> Result<String, DomainError> {
        self.tokens
            .issue(user.id, &user.email)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }
}
