use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-boundary error taxonomy. Every variant renders as
/// `{"error": "<reason>"}` with the mapped status; internal detail is logged,
/// never exposed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserExists,

    /// Send targets a receiver id that names no user. The original contract
    /// reports this as a 400, not a 404.
    #[error("Receiver does not exist")]
    ReceiverNotFound,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Bad request")]
    BadRequest,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::UserExists | ApiError::ReceiverNotFound | ApiError::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = match &self {
            ApiError::Internal(err) => {
                error!("internal error: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": reason }))).into_response()
    }
}
