use std::sync::Arc;

use common::{storage::store::StorageManager, utils::config::AppConfig};
use generation_pipeline::{GenerationApiClient, ResultPersister};

#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
    pub storage: StorageManager,
    pub generation: Arc<GenerationApiClient>,
    pub persister: Arc<ResultPersister>,
}

impl ApiState {
    pub fn new(config: &AppConfig, storage: StorageManager) -> Self {
        Self {
            config: config.clone(),
            generation: Arc::new(GenerationApiClient::new(config)),
            persister: Arc::new(ResultPersister::new(storage.clone())),
            storage,
        }
    }
}
