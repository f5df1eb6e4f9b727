use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use serde::Deserialize;

use crate::api::errors::ApiError;

/// Username expected in a Basic authorization header.
const ADMIN_USERNAME: &str = "admin";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuery {
    pub admin_key: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AdminKeySource {
    AuthorizationHeader,
    Body,
    Query,
}

/// Reads the admin key from the Authorization header. Accepts
/// `Basic base64(admin:<key>)` and `Bearer <key>`.
fn key_from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credentials) = value.split_once(' ')?;
    let credentials = credentials.trim();

    if scheme.eq_ignore_ascii_case("bearer") {
        return Some(credentials.to_string());
    }
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(credentials).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    match decoded.split_once(':') {
        Some((ADMIN_USERNAME, password)) => Some(password.to_string()),
        _ => None,
    }
}

fn key_from_body(body: &Bytes) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let json: serde_json::Value = serde_json::from_slice(body).ok()?;
    json.get("adminKey")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Checks the shared admin secret.
///
/// The key is looked for, in order, in the Authorization header, the JSON
/// body (`adminKey`) and the query string (`?adminKey=`). The first location
/// holding the right key wins; a wrong key in one place does not stop the
/// others from being checked.
pub fn authorize_admin(
    expected: &str,
    headers: &HeaderMap,
    body: &Bytes,
    query: &AdminQuery,
) -> Result<AdminKeySource, ApiError> {
    let candidates = [
        (key_from_header(headers), AdminKeySource::AuthorizationHeader),
        (key_from_body(body), AdminKeySource::Body),
        (query.admin_key.clone(), AdminKeySource::Query),
    ];

    for (candidate, source) in candidates {
        if candidate.as_deref() == Some(expected) {
            tracing::debug!(?source, "admin authenticated");
            return Ok(source);
        }
    }

    tracing::warn!("rejected admin request without a valid key");
    Err(ApiError::Unauthorized)
}
