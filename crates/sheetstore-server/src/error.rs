use axum::extract::rejection::{JsonRejection, QueryRejection, StringRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use sheetstore_shared::constants::CORS_ALLOW_ORIGIN;
use sheetstore_shared::HandlerResponse;
use sheetstore_store::StoreError;
use thiserror::Error;

/// Failures a handler reports back to its caller in the response envelope.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Database error: {0}")]
    Database(#[from] StoreError),
}

impl HandlerError {
    pub fn validation(message: impl Into<String>) -> Self {
        HandlerError::Validation(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::Connection(_) | HandlerError::Database(_) => 500,
            HandlerError::Validation(_) => 400,
            HandlerError::NotFound(_) => 404,
            HandlerError::MethodNotAllowed => 405,
        }
    }
}

impl From<HandlerError> for HandlerResponse {
    fn from(err: HandlerError) -> Self {
        HandlerResponse::error(err.status_code(), err.to_string())
    }
}

/// Failures in the HTTP adapter itself, outside any handler.
#[derive(Debug, Error)]
pub enum ServerError {
    /// axum refused the request before a handler saw it (bad UTF-8, body
    /// over the limit, malformed envelope).
    #[error("{1}")]
    Rejected(StatusCode, String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StringRejection> for ServerError {
    fn from(rejection: StringRejection) -> Self {
        ServerError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::Rejected(status, message) => {
                tracing::warn!(%status, %message, "request rejected");
                (status, message)
            }
            ServerError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (
            status,
            [(header::ACCESS_CONTROL_ALLOW_ORIGIN, CORS_ALLOW_ORIGIN)],
            axum::Json(body),
        )
            .into_response()
    }
}
