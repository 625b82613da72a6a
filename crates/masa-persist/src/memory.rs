use std::collections::HashMap;

use async_trait::async_trait;
use masa_types::{Conversation, Exchange, FeedbackRecord, SupportTicket};
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::trait_client::PersistenceClient;

/// Sessions kept by [`InMemoryPersistence::new`] before the least recently
/// used one is dropped.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Process-local store for development and tests. Everything is lost on
/// restart.
///
/// Conversations are capped at `max_sessions`; opening one more evicts the
/// session that was least recently initialised or written to. Feedback and
/// tickets are kept for the life of the process.
pub struct InMemoryPersistence {
    sessions: RwLock<Sessions>,
    max_sessions: usize,
    feedback: RwLock<Vec<FeedbackRecord>>,
    tickets: RwLock<HashMap<String, SupportTicket>>,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<String, Slot>,
    clock: u64,
}

struct Slot {
    conversation: Conversation,
    last_used: u64,
}

impl Sessions {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            self.entries.remove(&id);
            tracing::debug!(session_id = %id, "Idle conversation evicted");
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
            max_sessions: max_sessions.max(1),
            feedback: RwLock::default(),
            tickets: RwLock::default(),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.entries.len()
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistence {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn create_conversation(&self, session_id: &str) -> Result<Conversation> {
        let mut sessions = self.sessions.write().await;
        let now = sessions.tick();
        if !sessions.entries.contains_key(session_id) && sessions.entries.len() >= self.max_sessions {
            sessions.evict_oldest();
        }
        let slot = sessions.entries.entry(session_id.to_string()).or_insert_with(|| {
            tracing::debug!(session_id, "Conversation created");
            Slot {
                conversation: Conversation::new(session_id),
                last_used: now,
            }
        });
        slot.last_used = now;
        Ok(slot.conversation.clone())
    }

    async fn get_conversation(&self, session_id: &str) -> Result<Option<Conversation>> {
        Ok(self
            .sessions
            .read()
            .await
            .entries
            .get(session_id)
            .map(|slot| slot.conversation.clone()))
    }

    async fn append_exchange(&self, exchange: Exchange) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let now = sessions.tick();
        let slot = sessions
            .entries
            .get_mut(&exchange.session_id)
            .ok_or_else(|| PersistError::SessionNotFound(exchange.session_id.clone()))?;
        slot.last_used = now;
        slot.conversation.push(exchange);
        Ok(())
    }

    async fn get_exchanges(&self, session_id: &str) -> Result<Vec<Exchange>> {
        Ok(self
            .sessions
            .read()
            .await
            .entries
            .get(session_id)
            .map(|slot| slot.conversation.exchanges.clone())
            .unwrap_or_default())
    }

    async fn save_feedback(&self, record: FeedbackRecord) -> Result<()> {
        self.feedback.write().await.push(record);
        Ok(())
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        Ok(self.feedback.read().await.clone())
    }

    async fn save_ticket(&self, ticket: SupportTicket) -> Result<()> {
        self.tickets
            .write()
            .await
            .insert(ticket.ticket_id.clone(), ticket);
        Ok(())
    }

    async fn get_ticket(&self, ticket_id: &str) -> Result<Option<SupportTicket>> {
        Ok(self.tickets.read().await.get(ticket_id).cloned())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
