use std::sync::Arc;

use masa_context::ContextStrategy;
use masa_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use masa_persist::{PersistError, PersistenceClient};
use masa_search::SemanticSearch;
use masa_types::{DifficultySignal, Exchange, FeedbackRecord, Source};
use thiserror::Error;

use crate::difficulty::detect_difficulties;

pub const FAILURE_RESPONSE: &str =
    "Error interno del sistema al procesar la consulta. El equipo ha sido notificado.";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Product retrieval failed: {0:#}")]
    Retrieval(anyhow::Error),

    #[error("Context assembly failed: {0:#}")]
    Context(anyhow::Error),

    #[error("Generation failed: {0:#}")]
    Generation(anyhow::Error),

    #[error("Storage failed: {0}")]
    Storage(#[from] PersistError),
}

/// Outcome of one successful chat turn
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub sources: Vec<Source>,
    pub provider: String,
    pub difficulty: DifficultySignal,
}

/// One chat turn: retrieve, assemble prompt, generate, record.
pub struct ChatPipeline {
    search: SemanticSearch,
    context_strategy: Arc<dyn ContextStrategy>,
    llm_client: Arc<dyn ChatClient>,
    persist: Arc<dyn PersistenceClient>,
    model: String,
    options: ChatOptions,
}

impl ChatPipeline {
    pub fn new(
        search: SemanticSearch,
        context_strategy: Arc<dyn ContextStrategy>,
        llm_client: Arc<dyn ChatClient>,
        persist: Arc<dyn PersistenceClient>,
        model: impl Into<String>,
        options: ChatOptions,
    ) -> Self {
        Self {
            search,
            context_strategy,
            llm_client,
            persist,
            model: model.into(),
            options,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.llm_client.provider_name()
    }

    /// Answer `message` within `session_id`. The session must exist.
    ///
    /// Failures are recorded as lowest-rated system feedback before being
    /// returned.
    pub async fn respond(&self, session_id: &str, message: &str) -> Result<ChatReply, PipelineError> {
        match self.run(session_id, message).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                tracing::error!(session_id, error = %err, "Chat turn failed");
                self.record_failure(session_id, message, &err).await;
                Err(err)
            }
        }
    }

    async fn run(&self, session_id: &str, message: &str) -> Result<ChatReply, PipelineError> {
        let matches = self
            .search
            .search(message)
            .await
            .map_err(PipelineError::Retrieval)?;

        let window = self
            .context_strategy
            .get_context_window(session_id, message, &matches, self.persist.as_ref())
            .await
            .map_err(PipelineError::Context)?;

        let request = ChatRequest::new(self.model.clone(), vec![Message::user(window.prompt)])
            .with_options(self.options.clone());
        let completion = self
            .llm_client
            .chat(request)
            .await
            .map_err(PipelineError::Generation)?;
        let response = completion
            .text()
            .map_err(PipelineError::Generation)?
            .to_string();

        let sources = self.search.filter_sources(&matches);
        self.persist
            .append_exchange(Exchange::new(session_id, message, response.clone(), sources.clone()))
            .await?;

        let difficulty = detect_difficulties(message, &response, window.history_exchanges + 1);
        tracing::info!(
            session_id,
            matches = matches.len(),
            filtered = sources.len(),
            difficulty = %difficulty.reason,
            "Chat turn complete"
        );

        Ok(ChatReply {
            response,
            sources,
            provider: self.provider_name().to_string(),
            difficulty,
        })
    }

    async fn record_failure(&self, session_id: &str, message: &str, err: &PipelineError) {
        let record = FeedbackRecord::system_error(
            session_id,
            message,
            FAILURE_RESPONSE,
            self.provider_name(),
            format!("Error técnico interno: {}", err),
        );
        if let Err(e) = self.persist.save_feedback(record).await {
            tracing::warn!(session_id, error = %e, "Could not record failure feedback");
        }
    }
}
