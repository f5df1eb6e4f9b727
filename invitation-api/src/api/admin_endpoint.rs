//! Handlers behind the shared admin secret. Each one authorizes before
//! looking at the request body, since the key may itself be in the body.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json,
};
use bytes::Bytes;
use common_types::{
    AdminAuthRequest, AdminAuthResponse, ApproveMediaRequest, MediaListResponse, MediaResponse,
    RsvpListResponse, ToggleFlagRequest, ToggleFlagResponse,
};

use crate::{
    api::{
        auth::{authorize_admin, AdminQuery},
        decode_body,
        errors::ApiError,
    },
    guests::media::moderation_message,
    router::State as AppState,
};

/// Lets the dashboard check a key before storing it. Only the body is
/// consulted here.
pub async fn authenticate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AdminAuthResponse>, ApiError> {
    let request: AdminAuthRequest = decode_body(&body)?;
    if request.admin_key.as_deref() != Some(state.config.admin_key.as_str()) {
        return Err(ApiError::InvalidAdminKey);
    }
    Ok(Json(AdminAuthResponse {
        success: true,
        message: "Admin authenticated".to_string(),
    }))
}

pub async fn toggle_flag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    Path(feature_key): Path<String>,
    body: Bytes,
) -> Result<Json<ToggleFlagResponse>, ApiError> {
    authorize_admin(&state.config.admin_key, &headers, &body, &query)?;

    let request: ToggleFlagRequest = decode_body(&body)?;
    let enabled = request
        .enabled
        .ok_or_else(|| ApiError::BadRequest("Enabled status is required".to_string()))?;

    let feature_flag = state.flags.set_enabled(&feature_key, enabled).await?;
    let message = format!(
        "Feature flag '{}' {}",
        feature_flag.feature_name,
        if feature_flag.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    Ok(Json(ToggleFlagResponse {
        message,
        feature_flag,
    }))
}

pub async fn list_rsvps(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    body: Bytes,
) -> Result<Json<RsvpListResponse>, ApiError> {
    authorize_admin(&state.config.admin_key, &headers, &body, &query)?;
    Ok(Json(state.rsvps.list_with_statistics().await?))
}

pub async fn list_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    body: Bytes,
) -> Result<Json<MediaListResponse>, ApiError> {
    authorize_admin(&state.config.admin_key, &headers, &body, &query)?;
    let media = state.media.list_all().await?;
    Ok(Json(MediaListResponse { media }))
}

pub async fn approve_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<MediaResponse>, ApiError> {
    authorize_admin(&state.config.admin_key, &headers, &body, &query)?;

    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid media ID".to_string()))?;
    let request: ApproveMediaRequest = decode_body(&body)?;
    let approved = request
        .approved
        .ok_or_else(|| ApiError::BadRequest("Approved status is required".to_string()))?;

    let media = state.media.set_approved(id, approved).await?;
    Ok(Json(MediaResponse {
        message: moderation_message(&media),
        media,
    }))
}
