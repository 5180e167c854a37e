use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{api_state::ApiState, error::ApiError};

/// Stream a stored object. This is what `public_url` points at when the
/// service itself fronts the storage backend (local and memory backends).
pub async fn serve_stored_file(
    State(state): State<ApiState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    match state.storage.get_stream(&path).await {
        Ok(stream) => {
            let content_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            Ok((
                [(header::CONTENT_TYPE, content_type)],
                Body::from_stream(stream),
            )
                .into_response())
        }
        Err(object_store::Error::NotFound { .. }) => {
            Err(ApiError::NotFound(format!("no stored object at {path}")))
        }
        Err(e) => Err(ApiError::from(common::error::AppError::from(e))),
    }
}
