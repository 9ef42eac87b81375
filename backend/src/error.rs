//! Error type returned by every HTTP handler.

use crate::clients::auth::AuthError;
use crate::clients::storage::StorageError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::validation::ValidationFailure;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(ValidationFailure),

    #[error("{0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("identity provider error: {0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Internal(String),
}

impl From<ValidationFailure> for ApiError {
    fn from(failure: ValidationFailure) -> Self {
        ApiError::Validation(failure)
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(format!("blocking task failed: {}", err))
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Database(_) => "database",
            ApiError::Storage(_) => "storage",
            ApiError::Auth(_) => "identity_provider",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Auth(AuthError::InvalidCredentials | AuthError::InvalidSession) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Storage(_) | ApiError::Auth(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        match self {
            ApiError::Validation(failure) => HttpResponse::build(status).json(failure),
            // internals stay in the log
            ApiError::Database(_) | ApiError::Internal(_) => HttpResponse::build(status)
                .json(json!({ "error": self.code(), "message": "internal server error" })),
            ApiError::Auth(inner @ (AuthError::InvalidCredentials | AuthError::InvalidSession)) => {
                HttpResponse::build(status)
                    .json(json!({ "error": "unauthorized", "message": inner.to_string() }))
            }
            _ => HttpResponse::build(status)
                .json(json!({ "error": self.code(), "message": self.to_string() })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::from(ValidationFailure::single("ids", "required")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound("import job".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Auth(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
