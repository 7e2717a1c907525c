use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::core::security::WRONG_PASSWORD_MESSAGE;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{}", WRONG_PASSWORD_MESSAGE)]
    WrongPassword,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("Request failed with status {status}, {body}")]
    Upstream { status: u16, body: String },
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    /// Transport-level failure talking to an upstream service (connect, timeout, decode).
    pub fn upstream_transport<E: std::fmt::Display>(err: E) -> Self {
        ApiError::BadGateway(err.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::WrongPassword => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } | ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::WrongPassword | ApiError::Upstream { .. } => self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!("{}", message);
        }

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_message_carries_status_and_body() {
        let err = ApiError::Upstream {
            status: 500,
            body: "boom".to_string(),
        };

        assert_eq!(err.to_string(), "Request failed with status 500, boom");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn wrong_password_maps_to_unauthorized_with_fixed_message() {
        let err = ApiError::WrongPassword;

        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), WRONG_PASSWORD_MESSAGE);
    }
}
