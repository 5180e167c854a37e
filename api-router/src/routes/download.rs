use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub path: Option<String>,
}

/// Resolve an image id + storage path to its public URL.
///
/// The QR code on the kiosk encodes this route; it validates that the path
/// actually belongs to the image id before redirecting.
pub async fn resolve_download(
    State(state): State<ApiState>,
    Path(image_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Redirect, ApiError> {
    let Some(path) = query.path.filter(|p| !p.trim().is_empty()) else {
        return Err(ApiError::ValidationError(
            "path query parameter is required".to_string(),
        ));
    };

    if !path.starts_with(&format!("{image_id}/")) {
        return Err(ApiError::ValidationError(
            "path does not belong to this image".to_string(),
        ));
    }

    let exists = state
        .storage
        .exists(&path)
        .await
        .map_err(|e| ApiError::from(common::error::AppError::from(e)))?;
    if !exists {
        return Err(ApiError::NotFound(format!(
            "no stored image at {path}"
        )));
    }

    Ok(Redirect::temporary(&state.storage.public_url(&path)))
}
