//! HTTP error mapping for the pastebin service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::session::AuthError;
use crate::store::StoreError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or rejected session
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Details are logged, never sent to the client
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUser => ApiError::Conflict("Username already taken".to_string()),
            StoreError::NotFound => ApiError::NotFound("Not found".to_string()),
            StoreError::ForeignKeyViolation => ApiError::BadRequest("Unknown user".to_string()),
            other => {
                error!("Store operation failed: {}", other);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Unauthorized => ApiError::Unauthorized,
            AuthError::Store(e) => e.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::DatabaseError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ApiError::InternalServerError,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::DuplicateUser),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::NotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::ForeignKeyViolation),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::IdCollision),
            ApiError::InternalServerError
        ));

        let db = StoreError::Database(DatabaseError::Configuration("secret detail".into()));
        assert!(matches!(ApiError::from(db), ApiError::InternalServerError));
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::InvalidCredentials
        ));
        assert!(matches!(
            ApiError::from(AuthError::Unauthorized),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from(AuthError::Store(StoreError::DuplicateUser)),
            ApiError::Conflict(_)
        ));
    }
}
