use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub remote_image_url: String,
    #[serde(default)]
    pub prediction_id: Option<String>,
    #[serde(default)]
    pub layout_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub image_id: String,
    pub storage_path: String,
    pub public_url: String,
    pub download_url: String,
    pub prediction_id: Option<String>,
    pub layout_id: Option<String>,
}

/// Persist the generation API's ephemeral output to durable storage and
/// return the stable retrieval URLs.
pub async fn upload_generated_image(
    State(state): State<ApiState>,
    Json(input): Json<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    if input.remote_image_url.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "remote_image_url is required".to_string(),
        ));
    }

    let artifact = state
        .persister
        .persist_output(&input.remote_image_url)
        .await
        .map_err(ApiError::from)?;

    info!(
        image_id = %artifact.image_id,
        prediction_id = input.prediction_id.as_deref().unwrap_or("unspecified"),
        "Generated image uploaded"
    );

    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            image_id: artifact.image_id,
            storage_path: artifact.storage_path,
            public_url: artifact.public_url,
            download_url: artifact.download_url,
            prediction_id: input.prediction_id,
            layout_id: input.layout_id,
        }),
    ))
}
