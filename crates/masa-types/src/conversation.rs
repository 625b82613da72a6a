use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A product or page cited in a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub price: String,
    pub availability: String,
    pub category: String,
    pub score: f32,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            title: "Producto sin título".to_string(),
            url: String::new(),
            price: "Consultar".to_string(),
            availability: "No disponible".to_string(),
            category: "otro".to_string(),
            score: 0.0,
        }
    }
}

/// One user message and the assistant reply to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Exchange {
    pub id: String,
    pub session_id: String,
    pub query: String,
    pub response: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    pub created_at: DateTime<Utc>,
}

impl Exchange {
    pub fn new(
        session_id: impl Into<String>,
        query: impl Into<String>,
        response: impl Into<String>,
        sources: Vec<Source>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            query: query.into(),
            response: response.into(),
            sources,
            created_at: Utc::now(),
        }
    }
}

/// A chat session. Exchanges are append-only and kept in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Conversation {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
}

impl Conversation {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            created_at: now,
            updated_at: now,
            exchanges: Vec::new(),
        }
    }

    pub fn last_exchange(&self) -> Option<&Exchange> {
        self.exchanges.last()
    }

    pub fn push(&mut self, exchange: Exchange) {
        self.updated_at = exchange.created_at.max(self.updated_at);
        self.exchanges.push(exchange);
    }
}

/// Heuristic hint that the user may be struggling, used by the widget to
/// decide whether to show the feedback form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DifficultySignal {
    pub detected: bool,
    pub reason: String,
}

impl DifficultySignal {
    pub fn none() -> Self {
        Self {
            detected: false,
            reason: "no_signals".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_defaults() {
        let source = Source::default();
        assert_eq!(source.title, "Producto sin título");
        assert_eq!(source.price, "Consultar");
        assert_eq!(source.availability, "No disponible");
        assert_eq!(source.category, "otro");
    }

    #[test]
    fn test_conversation_keeps_arrival_order() {
        let mut conversation = Conversation::new("user_1");
        conversation.push(Exchange::new("user_1", "hola", "¡Hola!", vec![]));
        conversation.push(Exchange::new("user_1", "¿tienen baguettes?", "Sí", vec![]));

        let queries: Vec<&str> = conversation.exchanges.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["hola", "¿tienen baguettes?"]);
        assert_eq!(conversation.last_exchange().unwrap().response, "Sí");
    }

    #[test]
    fn test_exchange_ids_are_unique() {
        let a = Exchange::new("s", "q", "r", vec![]);
        let b = Exchange::new("s", "q", "r", vec![]);
        assert_ne!(a.id, b.id);
    }
}
