//! Authentication handlers.

use actix_web::{HttpResponse, web};

use quill_core::services::{AuthSession, Credentials, Registration};
use quill_shared::dto::{
    AuthResponse, LoginRequest, LogoutResponse, RegisterRequest, TokenResponse, UserEnvelope,
};

use super::user_response;
use crate::middleware::auth::{BearerToken, Identity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

const TOKEN_TYPE: &str = "bearer";

fn auth_response(state: &AppState, session: AuthSession) -> AuthResponse {
    AuthResponse {
        user: user_response(&session.user),
        token: session.token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: state.auth.token_lifetime(),
    }
}

/// POST /api/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let session = state
        .auth
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
        })
        .await?;

    Ok(HttpResponse::Created().json(auth_response(&state, session)))
}

/// POST /api/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let session = state
        .auth
        .login(Credentials {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(HttpResponse::Ok().json(auth_response(&state, session)))
}

/// GET /api/user
pub async fn user(identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(UserEnvelope {
        user: user_response(&identity.user),
    })
}

/// POST /api/logout
pub async fn logout(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.auth.logout(&identity.token).await?;

    Ok(HttpResponse::Ok().json(LogoutResponse {
        user: user_response(&user),
        message: "Successfully logged out".to_string(),
    }))
}

/// POST /api/refresh
///
/// Takes the raw bearer token: an expired token may still be refreshed.
pub async fn refresh(state: web::Data<AppState>, token: BearerToken) -> AppResult<HttpResponse> {
    let token = state.auth.refresh_token(token.as_str()).await?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: state.auth.token_lifetime(),
    }))
}
