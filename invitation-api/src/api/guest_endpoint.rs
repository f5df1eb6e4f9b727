use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use bytes::Bytes;
use chrono::Utc;
use common_types::{
    MediaListResponse, MediaResponse, MessageListResponse, MessageResponse, NewMedia, NewMessage,
    NewRsvp, RsvpResponse,
};
use serde::Serialize;

use crate::{
    api::{decode_body, errors::ApiError},
    guests::rsvp::confirmation_message,
    router::State as AppState,
};

pub async fn submit_rsvp(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<RsvpResponse>), ApiError> {
    let submission: NewRsvp = decode_body(&body)?;
    let rsvp = state.rsvps.submit(submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(RsvpResponse {
            message: confirmation_message(&rsvp),
            rsvp,
        }),
    ))
}

pub async fn submit_media(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<MediaResponse>), ApiError> {
    let submission: NewMedia = decode_body(&body)?;
    let media = state.media.create(submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(MediaResponse {
            message: "Media uploaded successfully and pending approval".to_string(),
            media,
        }),
    ))
}

pub async fn approved_media(
    State(state): State<AppState>,
) -> Result<Json<MediaListResponse>, ApiError> {
    let media = state.media.list_approved().await?;
    Ok(Json(MediaListResponse { media }))
}

pub async fn post_message(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let submission: NewMessage = decode_body(&body)?;
    let data = state.messages.submit(submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Message posted successfully".to_string(),
            data,
        }),
    ))
}

pub async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let messages = state.messages.list().await?;
    let count = messages.len();
    Ok(Json(MessageListResponse { messages, count }))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}
