//! Authentication extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;
use std::future::{Ready, ready};

use quill_core::domain::User;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Raw bearer token from the `Authorization` header, not yet validated.
///
/// Used by refresh, which must accept tokens past their expiry.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl BearerToken {
    fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
        let value = req
            .headers()
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthenticated)?
            .to_str()
            .map_err(|_| AppError::Unauthenticated)?;

        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for BearerToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}

/// Authenticated caller.
///
/// Extraction validates the bearer token (signature, expiry, revocation) and
/// loads the user it names:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.user.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    /// The token the request was authenticated with.
    pub token: String,
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = BearerToken::from_headers(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let BearerToken(token) = token?;
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Err(AppError::Domain(quill_core::DomainError::Internal(
                    "server misconfigured".to_string(),
                )));
            };

            let user = state.auth.current_user(&token).await?;

            Ok(Identity { user, token })
        })
    }
}
