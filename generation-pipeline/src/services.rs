use async_trait::async_trait;
use common::{
    error::AppError,
    storage::store::StorageManager,
    types::generation::{GenerationRequest, PersistedArtifact, PollResponse, SubmitReceipt},
    utils::config::AppConfig,
};

use crate::{client::GenerationApiClient, persister::ResultPersister};

/// Boundary collaborators the orchestrator depends on. The orchestrator is
/// the only writer of job state; these return results and never mutate it.
#[async_trait]
pub trait GenerationServices: Send + Sync {
    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitReceipt, AppError>;

    async fn poll(&self, prediction_id: &str) -> Result<PollResponse, AppError>;

    async fn persist(&self, remote_url: &str) -> Result<PersistedArtifact, AppError>;
}

pub struct DefaultGenerationServices {
    client: GenerationApiClient,
    persister: ResultPersister,
}

impl DefaultGenerationServices {
    pub fn new(config: &AppConfig, storage: StorageManager) -> Self {
        Self {
            client: GenerationApiClient::new(config),
            persister: ResultPersister::new(storage),
        }
    }

    pub fn with_parts(client: GenerationApiClient, persister: ResultPersister) -> Self {
        Self { client, persister }
    }
}

#[async_trait]
impl GenerationServices for DefaultGenerationServices {
    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitReceipt, AppError> {
        self.client.submit(request).await
    }

    async fn poll(&self, prediction_id: &str) -> Result<PollResponse, AppError> {
        self.client.get_status(prediction_id).await
    }

    async fn persist(&self, remote_url: &str) -> Result<PersistedArtifact, AppError> {
        self.persister.persist_output(remote_url).await
    }
}
