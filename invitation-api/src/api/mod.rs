use bytes::Bytes;
use serde::de::DeserializeOwned;

pub mod admin_endpoint;
pub mod auth;
pub mod errors;
pub mod flags_endpoint;
pub mod guest_endpoint;

use errors::ApiError;

/// Parses a JSON request body. An empty body reads as the default value so
/// that missing fields are reported by the handler, not as a parse error.
pub(crate) fn decode_body<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}
