#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{
    cleanup::cleanup_stale_objects,
    download::resolve_download,
    files::serve_stored_file,
    generate::{prediction_status, start_generation},
    liveness::live,
    readiness::ready,
    upload::upload_generated_image,
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Public, unauthenticated endpoints (for k8s/systemd probes)
    let public = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    // The booth flow: submit, poll, persist, retrieve, expire.
    let booth = Router::new()
        .route(
            "/generate",
            post(start_generation).layer(DefaultBodyLimit::max(
                app_state.config.generate_max_body_bytes,
            )),
        )
        .route("/generate/{prediction_id}", get(prediction_status))
        .route("/upload", post(upload_generated_image))
        .route("/download/{image_id}", get(resolve_download))
        .route("/files/{*path}", get(serve_stored_file))
        .route("/cleanup", post(cleanup_stale_objects));

    public.merge(booth)
}
