use common::{
    error::AppError, storage::store::StorageManager, types::generation::PersistedArtifact,
};
use reqwest::header::CONTENT_TYPE;
use uuid::Uuid;

/// Persists the generation API's ephemeral output as a stable artifact in
/// object storage.
#[derive(Clone)]
pub struct ResultPersister {
    http: reqwest::Client,
    storage: StorageManager,
}

impl ResultPersister {
    pub fn new(storage: StorageManager) -> Self {
        Self {
            http: reqwest::Client::new(),
            storage,
        }
    }

    /// Fetch the produced image from the generation API's result URL and
    /// upload it under a freshly generated identifier.
    ///
    /// The identifier is never derived from the job id, so concurrent
    /// sessions cannot collide; an actual path collision fails loudly
    /// instead of overwriting.
    pub async fn persist_output(&self, remote_url: &str) -> Result<PersistedArtifact, AppError> {
        if remote_url.trim().is_empty() {
            return Err(AppError::Validation(
                "remote image URL is required".to_string(),
            ));
        }

        let response = self
            .http
            .get(remote_url)
            .send()
            .await
            .map_err(|e| AppError::RemoteFetch(format!("failed to fetch remote image: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::RemoteFetch(format!(
                "failed to fetch remote image: upstream returned {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response.bytes().await.map_err(|e| {
            AppError::RemoteFetch(format!("failed to read remote image body: {e}"))
        })?;

        let extension = resolve_extension(&content_type);
        let image_id = Uuid::new_v4().to_string();
        let storage_path = format!("{image_id}/composite.{extension}");

        self.storage
            .put_create(&storage_path, bytes)
            .await
            .map_err(|e| match e {
                object_store::Error::AlreadyExists { .. } => AppError::Persist(format!(
                    "storage collision: an object already exists at {storage_path}"
                )),
                other => AppError::Persist(format!("failed to persist generated image: {other}")),
            })?;

        let public_url = self.storage.public_url(&storage_path);
        let encoded_path: String =
            url::form_urlencoded::byte_serialize(storage_path.as_bytes()).collect();
        let download_url = format!("/api/v1/download/{image_id}?path={encoded_path}");

        tracing::info!(
            %image_id,
            %storage_path,
            content_type = %content_type,
            "generated image persisted"
        );

        Ok(PersistedArtifact {
            image_id,
            storage_path,
            public_url,
            download_url,
        })
    }
}

/// Map a response content type to the stored file extension, defaulting to
/// PNG for anything unrecognized.
fn resolve_extension(content_type: &str) -> &'static str {
    match content_type.parse::<mime::Mime>() {
        Ok(m) if m.type_() == mime::IMAGE && m.subtype() == mime::JPEG => "jpg",
        Ok(m) if m.type_() == mime::IMAGE && m.subtype() == mime::PNG => "png",
        Ok(m) if m.type_() == mime::IMAGE && m.subtype().as_str() == "webp" => "webp",
        _ => "png",
    }
}
