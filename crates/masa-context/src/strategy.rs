use anyhow::Result;
use async_trait::async_trait;
use masa_persist::PersistenceClient;
use masa_search::ProductMatch;

/// Result of context assembly
#[derive(Debug, Clone, PartialEq)]
pub struct ContextWindow {
    /// Complete prompt sent to the model as a single user turn
    pub prompt: String,
    /// How many past exchanges were rendered into the prompt
    pub history_exchanges: usize,
}

/// Strategy for turning retrieval results and session history into a prompt
#[async_trait]
pub trait ContextStrategy: Send + Sync {
    async fn get_context_window(
        &self,
        session_id: &str,
        question: &str,
        matches: &[ProductMatch],
        persist_client: &dyn PersistenceClient,
    ) -> Result<ContextWindow>;
}
