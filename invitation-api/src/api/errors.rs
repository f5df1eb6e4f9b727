use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use common_types::{ErrorResponse, ValidationError};
use thiserror::Error;

use crate::kv::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("failed to parse request: {0}")]
    RequestParsingError(#[from] serde_json::Error),
    #[error("Unauthorized access to admin area")]
    Unauthorized,
    #[error("Invalid admin key")]
    InvalidAdminKey,
    #[error("{0}")]
    NotFound(String),
    #[error("store unavailable")]
    StoreUnavailable,
    #[error("Timed out while talking to the store")]
    StoreTimeout,
    #[error("Failed to parse stored data")]
    DataParsingError,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Error code and HTTP status for each variant, kept in one place so the
    /// two never drift apart.
    fn error_metadata(&self) -> (&'static str, StatusCode) {
        match self {
            ApiError::BadRequest(_) => ("bad_request", StatusCode::BAD_REQUEST),
            ApiError::RequestParsingError(_) => ("request_parsing_error", StatusCode::BAD_REQUEST),
            ApiError::Unauthorized => ("unauthorized", StatusCode::UNAUTHORIZED),
            ApiError::InvalidAdminKey => ("invalid_admin_key", StatusCode::UNAUTHORIZED),
            ApiError::NotFound(_) => ("not_found", StatusCode::NOT_FOUND),
            ApiError::StoreUnavailable => ("store_unavailable", StatusCode::SERVICE_UNAVAILABLE),
            ApiError::StoreTimeout => ("timeout", StatusCode::SERVICE_UNAVAILABLE),
            ApiError::DataParsingError => ("data_parsing_error", StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Internal(_) => ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.error_metadata().0
    }

    pub fn status_code(&self) -> StatusCode {
        self.error_metadata().1
    }

    /// Message shown to the caller. Server-side failures get a generic text;
    /// the details only go to the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::StoreUnavailable | ApiError::StoreTimeout => {
                "Our data store is currently unavailable. Please try again later.".to_string()
            }
            ApiError::DataParsingError | ApiError::Internal(_) => {
                "An internal server error occurred. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => ApiError::StoreTimeout,
            StoreError::Unavailable(reason) => {
                tracing::error!("store unavailable: {}", reason);
                ApiError::StoreUnavailable
            }
            StoreError::ParseError(reason) => {
                tracing::error!("failed to parse stored record: {}", reason);
                ApiError::DataParsingError
            }
            // Callers that expect a missing key handle it before converting.
            StoreError::NotFound => ApiError::Internal("unexpected missing record".to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error_code = self.error_code(), "request failed: {}", self);
        } else {
            tracing::debug!(error_code = self.error_code(), "request rejected: {}", self);
        }
        let body = ErrorResponse {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn store_errors_map_to_service_unavailable() {
        let unavailable: ApiError = StoreError::Unavailable("connection refused".to_string()).into();
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let timeout: ApiError = StoreError::Timeout.into();
        assert_eq!(timeout.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(timeout.error_code(), "timeout");

        let parse: ApiError = StoreError::ParseError("eof".to_string()).into();
        assert_eq!(parse.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn not_found_keeps_its_message() {
        let response =
            ApiError::NotFound("Feature flag 'banana' not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Feature flag 'banana' not found"})
        );
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let response = ApiError::Internal("secret detail".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body["error"].as_str().unwrap().contains("secret detail"));
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let err: ApiError = ValidationError::InvalidEmail.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Valid email is required");
    }
}
