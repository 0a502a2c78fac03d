//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode, web};
use quill_core::{DomainError, ValidationErrors};
use quill_shared::{ErrorResponse, FieldErrorBody};

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Missing or unusable bearer credentials.
    #[error("Unauthenticated, kindly try again!")]
    Unauthenticated,

    /// A path id that cannot name any post.
    #[error("The specified blog post does not exist.")]
    MalformedId,

    #[error("{0}")]
    BadRequest(String),

    #[error("You are not allowed to access this route.")]
    RouteNotAllowed,
}

impl AppError {
    fn problem(&self) -> ErrorResponse {
        match self {
            AppError::Domain(err) => domain_problem(err),
            AppError::Unauthenticated => ErrorResponse::unauthorized(self.to_string()),
            AppError::MalformedId => {
                ErrorResponse::new(404, "Blog not found").with_detail(self.to_string())
            }
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail.clone()),
            AppError::RouteNotAllowed => {
                ErrorResponse::new(401, "Error").with_detail(self.to_string())
            }
        }
    }
}

fn domain_problem(err: &DomainError) -> ErrorResponse {
    match err {
        DomainError::Validation(errors) => ErrorResponse::validation(field_errors(errors)),
        DomainError::NotFound { .. } => ErrorResponse::new(404, "Blog not found")
            .with_detail("The specified blog post does not exist."),
        DomainError::InvalidCredentials => ErrorResponse::unauthorized("Invalid credentials"),
        DomainError::Unauthenticated => {
            ErrorResponse::unauthorized("Unauthenticated, kindly try again!")
        }
        DomainError::Forbidden { .. } => ErrorResponse::unauthorized(err.to_string()),
        DomainError::Logout(msg) => ErrorResponse::new(500, "Logout failed").with_detail(msg.clone()),
        DomainError::Refresh(msg) => {
            ErrorResponse::new(500, "Refresh failed").with_detail(msg.clone())
        }
        DomainError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal error");
            ErrorResponse::internal_error()
        }
    }
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldErrorBody> {
    errors
        .errors()
        .iter()
        .map(|e| FieldErrorBody {
            field: e.field.clone(),
            message: e.message.clone(),
        })
        .collect()
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(err) => match err {
                DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::InvalidCredentials
                | DomainError::Unauthenticated
                | DomainError::Forbidden { .. } => StatusCode::UNAUTHORIZED,
                DomainError::Logout(_) | DomainError::Refresh(_) | DomainError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Unauthenticated | AppError::RouteNotAllowed => StatusCode::UNAUTHORIZED,
            AppError::MalformedId => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.problem())
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Malformed JSON bodies become 400 problem documents.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        tracing::debug!(error = %err, "Rejected request body");
        AppError::BadRequest(err.to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        AppError::BadRequest(err.to_string()).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err: PathError, _req: &HttpRequest| AppError::MalformedId.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use uuid::Uuid;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_rt::test]
    async fn test_forbidden_is_reported_as_unauthorized() {
        let err = AppError::from(DomainError::Forbidden {
            entity_type: "blog post",
            action: "delete",
        });

        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "You are not authorized to delete this blog post.");
    }

    #[actix_rt::test]
    async fn test_validation_lists_field_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "The title field is required.");
        errors.add("content", "The content field is required.");

        let (status, body) = body_of(DomainError::Validation(errors).into()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["field"], "title");
        assert_eq!(body["errors"][1]["message"], "The content field is required.");
    }

    #[actix_rt::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) = body_of(DomainError::Internal("pool exhausted".into()).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("detail").is_none());
    }

    #[actix_rt::test]
    async fn test_not_found() {
        let err = DomainError::NotFound {
            entity_type: "Blog",
            id: Uuid::new_v4(),
        };

        let (status, body) = body_of(err.into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["title"], "Blog not found");
    }
}
