use axum::{
    extract::{Path, State},
    response::Json,
};
use common_types::{FeatureFlag, FeatureFlagsResponse};

use crate::{api::errors::ApiError, router::State as AppState};

/// Public list of every flag. Never cached server-side, so a toggle is
/// visible to the very next poll.
pub async fn list_flags(
    State(state): State<AppState>,
) -> Result<Json<FeatureFlagsResponse>, ApiError> {
    let feature_flags = state.flags.list_flags().await?;
    Ok(Json(FeatureFlagsResponse { feature_flags }))
}

pub async fn get_flag(
    State(state): State<AppState>,
    Path(feature_key): Path<String>,
) -> Result<Json<FeatureFlag>, ApiError> {
    Ok(Json(state.flags.get_flag(&feature_key).await?))
}
