use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    #[serde(default)]
    pub max_age_hours: Option<i64>,
}

/// Remove stored artifacts older than the cutoff. Booth output only needs to
/// survive long enough for guests to scan their QR codes.
pub async fn cleanup_stale_objects(
    State(state): State<ApiState>,
    Query(query): Query<CleanupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let max_age_hours = query
        .max_age_hours
        .unwrap_or(state.config.cleanup_max_age_hours);
    if max_age_hours < 0 {
        return Err(ApiError::ValidationError(
            "max_age_hours must not be negative".to_string(),
        ));
    }
    let cutoff = chrono::Utc::now() - chrono::Duration::hours(max_age_hours);

    let objects = state
        .storage
        .list(None)
        .await
        .map_err(|e| ApiError::from(common::error::AppError::from(e)))?;

    let stale: Vec<String> = objects
        .into_iter()
        .filter(|meta| meta.last_modified < cutoff)
        .map(|meta| meta.location.to_string())
        .collect();

    for location in &stale {
        state
            .storage
            .delete(location)
            .await
            .map_err(|e| ApiError::from(common::error::AppError::from(e)))?;
    }

    info!(
        removed = stale.len(),
        max_age_hours, "Storage cleanup finished"
    );

    Ok((StatusCode::OK, Json(json!({ "removed": stale.len() }))))
}
