//! Component wiring shared by the commands.

use std::sync::Arc;
use tableside_assistant::Assistant;
use tableside_core::{config::AppConfig, AppError, AppResult};
use tableside_knowledge::{
    create_provider, EmbeddingProvider, GenerationStore, IndexBuilder, IndexHandle, RebuildWorker,
};
use tableside_llm::{create_client, LlmClient};

/// The long-lived pieces one command needs.
pub struct Runtime {
    pub handle: IndexHandle,
    pub worker: RebuildWorker,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmClient>,
}

impl Runtime {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let embedder = create_provider(&config.embedding)?;
        let llm = create_client(&config.llm).map_err(AppError::Config)?;

        tracing::debug!(
            embedder = embedder.provider_name(),
            embedding_model = embedder.model_name(),
            llm = llm.provider_name(),
            "Created providers"
        );

        let builder = IndexBuilder::new(
            config.data_dir(),
            &config.corpus,
            &config.index,
            embedder.clone(),
        );
        let handle = IndexHandle::default();
        let worker = RebuildWorker::new(
            Arc::new(builder),
            Some(GenerationStore::new(config.storage_dir())),
            handle.clone(),
        );

        Ok(Self {
            handle,
            worker,
            embedder,
            llm,
        })
    }

    pub fn assistant(&self, config: &AppConfig) -> AppResult<Assistant> {
        Assistant::from_config(
            config,
            self.handle.clone(),
            self.embedder.clone(),
            self.llm.clone(),
        )
    }
}
