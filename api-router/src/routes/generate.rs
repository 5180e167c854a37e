use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use common::{
    error::AppError,
    types::generation::{GenerationRequest, GenerationStatus},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub photo_data_url: String,
    #[serde(default)]
    pub background_image_url: String,
    #[serde(default)]
    pub event_logo_data_url: String,
    #[serde(default)]
    pub layout_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub prediction_id: String,
    pub status: GenerationStatus,
}

/// Submit a generation job. The reference images are forwarded in a fixed
/// order the model expects: user photo, background set, event logo.
pub async fn start_generation(
    State(state): State<ApiState>,
    Json(input): Json<GenerateParams>,
) -> Result<impl IntoResponse, ApiError> {
    if input.prompt.trim().is_empty() {
        return Err(ApiError::ValidationError("prompt is required".to_string()));
    }
    if !input.photo_data_url.starts_with("data:image") {
        return Err(ApiError::ValidationError(
            "photo_data_url must be a base64 image data URL".to_string(),
        ));
    }
    if input.background_image_url.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "background_image_url is required".to_string(),
        ));
    }
    if input.event_logo_data_url.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "event_logo_data_url is required".to_string(),
        ));
    }

    info!(
        layout_id = input.layout_id.as_deref().unwrap_or("unspecified"),
        prompt_bytes = input.prompt.len(),
        photo_bytes = input.photo_data_url.len(),
        "Received generation request"
    );

    let request = GenerationRequest::new(
        input.prompt,
        vec![
            input.photo_data_url,
            input.background_image_url,
            input.event_logo_data_url,
        ],
    );

    let receipt = state
        .generation
        .submit(&request)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::OK,
        Json(GenerateResponse {
            prediction_id: receipt.id,
            status: receipt.status,
        }),
    ))
}

/// Fetch the current status of a prediction and pass it through.
pub async fn prediction_status(
    State(state): State<ApiState>,
    Path(prediction_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.generation.get_status(&prediction_id).await {
        Ok(response) => Ok((StatusCode::OK, Json(response))),
        Err(err) => {
            tracing::error!(%prediction_id, error = %err, "prediction status fetch failed");
            match err {
                AppError::Poll(_) => Err(ApiError::InternalError(
                    "Failed to fetch prediction status".to_string(),
                )),
                other => Err(ApiError::from(other)),
            }
        }
    }
}
