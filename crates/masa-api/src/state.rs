use std::sync::Arc;

use anyhow::Result;
use masa_context::{ContextStrategy, DefaultContextStrategy, HistoryWindow, PromptBuilder};
use masa_llm::{ChatClient, ChatOptions, ClientFactory, EmbeddingClient, MistralEmbeddingClient, ProviderConfig};
use masa_persist::{InMemoryPersistence, PersistenceClient};
use masa_search::{PineconeIndex, SemanticSearch, VectorIndex};

use crate::config::{Config, StorageBackend};
use crate::notifier::{NotifierSet, TicketNotifier};
use crate::pipeline::ChatPipeline;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub pipeline: Arc<ChatPipeline>,
    pub notifier: Arc<dyn TicketNotifier>,
}

impl AppState {
    pub fn new(
        config: Config,
        persist: Arc<dyn PersistenceClient>,
        pipeline: ChatPipeline,
        notifier: Arc<dyn TicketNotifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            persist,
            pipeline: Arc::new(pipeline),
            notifier,
        }
    }

    /// Wire the hosted clients and the storage backend named in `config`.
    pub async fn from_config(config: Config) -> Result<Self> {
        tracing::info!(provider = ?config.llm.provider, model = %config.llm.model, "Initializing chat client");
        let mut provider = match config.llm.provider {
            masa_llm::ProviderType::Anthropic => ProviderConfig::anthropic(config.llm_api_key.clone()),
            masa_llm::ProviderType::OpenAI => ProviderConfig::openai(config.llm_api_key.clone()),
        };
        if let Some(base_url) = &config.llm.base_url {
            provider = provider.with_base_url(base_url.clone());
        }
        let llm_client: Arc<dyn ChatClient> = ClientFactory::create_chat_client(provider)?;

        let mut embedder = MistralEmbeddingClient::new(config.mistral_api_key.clone())?
            .with_model(config.embedding.model.clone());
        if let Some(base_url) = &config.embedding.base_url {
            embedder = embedder.with_base_url(base_url.clone());
        }
        let embedder: Arc<dyn EmbeddingClient> = Arc::new(embedder);

        tracing::info!(host = %config.search.index_host, "Connecting to vector index");
        let index: Arc<dyn VectorIndex> = Arc::new(PineconeIndex::with_api_version(
            config.pinecone_api_key.clone(),
            config.search.index_host.clone(),
            &config.search.api_version,
        )?);

        let persist = connect_storage(&config).await?;

        let prompt = match &config.chat.prompt_template_path {
            Some(path) => PromptBuilder::from_file(path)?,
            None => PromptBuilder::default(),
        };
        let context_strategy: Arc<dyn ContextStrategy> = Arc::new(DefaultContextStrategy::new(
            HistoryWindow::new(config.history.max_exchanges, config.history.max_chars),
            prompt,
        ));

        let search = SemanticSearch::new(embedder, index)
            .with_top_k(config.search.top_k)
            .with_relevance_threshold(config.search.relevance_threshold);

        let pipeline = ChatPipeline::new(
            search,
            context_strategy,
            llm_client,
            persist.clone(),
            config.llm.model.clone(),
            ChatOptions::new()
                .temperature(config.llm.temperature)
                .max_tokens(config.llm.max_tokens),
        );

        let notifier: Arc<dyn TicketNotifier> = Arc::new(NotifierSet::from_config(&config)?);

        Ok(Self::new(config, persist, pipeline, notifier))
    }
}

async fn connect_storage(config: &Config) -> Result<Arc<dyn PersistenceClient>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!(
                max_sessions = config.storage.max_sessions,
                "Using in-memory storage; sessions are lost on restart"
            );
            Ok(Arc::new(InMemoryPersistence::with_max_sessions(config.storage.max_sessions)))
        }
        #[cfg(feature = "mongodb")]
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let client = masa_persist::MongoPersistenceClient::connect(
                &config.mongodb_uri,
                &config.storage.database,
            )
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to MongoDB: {}", e))?;
            tracing::info!("MongoDB connected");
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "mongodb"))]
        StorageBackend::Mongodb => {
            anyhow::bail!("storage.backend = \"mongodb\" requires building with the `mongodb` feature")
        }
    }
}
