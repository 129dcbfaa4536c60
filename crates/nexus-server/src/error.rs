use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nexus_auth::AuthError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Renders every failure as `{"error": <message>, "code": <CODE>}`.
/// Internal detail is logged and never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A malformed request body or header.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Auth(auth) => match auth {
                AuthError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                AuthError::DuplicateUsername => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    "username already taken".to_string(),
                ),
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "invalid credentials".to_string(),
                ),
                AuthError::InvalidSession => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "invalid or expired session".to_string(),
                ),
                AuthError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
