use anyhow::Result;
use async_trait::async_trait;
use masa_persist::PersistenceClient;
use masa_search::{ProductMatch, SemanticSearch};

use crate::history::HistoryWindow;
use crate::prompt::PromptBuilder;
use crate::strategy::{ContextStrategy, ContextWindow};

/// Product context from every retrieved match, plus a bounded history tail.
///
/// All matches go into the prompt regardless of score; the model is told to
/// ignore irrelevant ones. Only citations are filtered by threshold.
#[derive(Debug, Clone, Default)]
pub struct DefaultContextStrategy {
    history: HistoryWindow,
    prompt: PromptBuilder,
}

impl DefaultContextStrategy {
    pub fn new(history: HistoryWindow, prompt: PromptBuilder) -> Self {
        Self { history, prompt }
    }
}

#[async_trait]
impl ContextStrategy for DefaultContextStrategy {
    async fn get_context_window(
        &self,
        session_id: &str,
        question: &str,
        matches: &[ProductMatch],
        persist_client: &dyn PersistenceClient,
    ) -> Result<ContextWindow> {
        let exchanges = persist_client.get_exchanges(session_id).await?;
        let history_exchanges = self.history.recent(&exchanges).len();

        let product_context = SemanticSearch::format_context(matches);
        let history = self.history.render(&exchanges);
        let prompt = self.prompt.build(&product_context, &history, question);

        tracing::debug!(
            session_id,
            history_exchanges,
            prompt_chars = prompt.chars().count(),
            "Context window assembled"
        );

        Ok(ContextWindow {
            prompt,
            history_exchanges,
        })
    }
}
