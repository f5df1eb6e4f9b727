use async_trait::async_trait;
use common_types::{
    AdminAuthRequest, AdminAuthResponse, ApproveMediaRequest, ErrorResponse, FeatureFlag,
    FeatureFlagsResponse, MediaListResponse, MediaResponse, RsvpListResponse, ToggleFlagRequest,
    ToggleFlagResponse,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PollError {
    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("timed out waiting for the flag service")]
    Timeout,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("server responded with {status}: {message}")]
    ServerError { status: StatusCode, message: String },
}

impl PollError {
    /// Text suitable for showing to the admin.
    pub fn user_message(&self) -> String {
        match self {
            PollError::NotFound(message) | PollError::Unauthorized(message) => message.clone(),
            PollError::ServerError { message, .. } => message.clone(),
            PollError::Timeout | PollError::RequestError(_) => {
                "Could not reach the server. Please try again.".to_string()
            }
        }
    }
}

/// Where a polling session reads the full flag list from.
#[async_trait]
pub trait FlagSource: Send + Sync {
    async fn fetch_flags(&self) -> Result<Vec<FeatureFlag>, PollError>;
}

/// HTTP client for the invitation API.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClient {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn authenticate(&self, admin_key: &str) -> Result<AdminAuthResponse, PollError> {
        let request = self
            .client
            .post(self.url("/api/admin/auth"))
            .json(&AdminAuthRequest {
                admin_key: Some(admin_key.to_string()),
            });
        send(request).await
    }

    pub async fn set_flag(
        &self,
        admin_key: &str,
        feature_key: &str,
        enabled: bool,
    ) -> Result<ToggleFlagResponse, PollError> {
        let request = self
            .client
            .patch(self.url(&format!("/api/admin/feature-flags/{feature_key}")))
            .bearer_auth(admin_key)
            .json(&ToggleFlagRequest {
                enabled: Some(enabled),
                admin_key: None,
            });
        send(request).await
    }

    pub async fn list_rsvps(&self, admin_key: &str) -> Result<RsvpListResponse, PollError> {
        let request = self
            .client
            .get(self.url("/api/admin/rsvps"))
            .bearer_auth(admin_key);
        send(request).await
    }

    pub async fn list_media(&self, admin_key: &str) -> Result<MediaListResponse, PollError> {
        let request = self
            .client
            .get(self.url("/api/admin/media"))
            .bearer_auth(admin_key);
        send(request).await
    }

    pub async fn approve_media(
        &self,
        admin_key: &str,
        id: i64,
        approved: bool,
    ) -> Result<MediaResponse, PollError> {
        let request = self
            .client
            .patch(self.url(&format!("/api/admin/media/{id}/approve")))
            .bearer_auth(admin_key)
            .json(&ApproveMediaRequest {
                approved: Some(approved),
                admin_key: None,
            });
        send(request).await
    }
}

#[async_trait]
impl FlagSource for ApiClient {
    async fn fetch_flags(&self) -> Result<Vec<FeatureFlag>, PollError> {
        let response: FeatureFlagsResponse =
            send(self.client.get(self.url("/api/feature-flags"))).await?;
        Ok(response.feature_flags)
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, PollError> {
    let response = request.send().await?;
    if response.status().is_success() {
        return Ok(response.json().await?);
    }
    Err(error_from(response).await)
}

async fn error_from(response: Response) -> PollError {
    let status = response.status();
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    match status {
        StatusCode::NOT_FOUND => PollError::NotFound(message),
        StatusCode::UNAUTHORIZED => PollError::Unauthorized(message),
        _ => PollError::ServerError { status, message },
    }
}
