use async_trait::async_trait;
use masa_types::{Conversation, Exchange, FeedbackRecord, SupportTicket};

use crate::error::Result;

/// Storage operations the chat service relies on
///
/// Implementations must keep exchanges and feedback in arrival order.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Short backend name reported by the health endpoint
    fn backend_name(&self) -> &str;

    /// Open a session, or return the existing one unchanged
    async fn create_conversation(&self, session_id: &str) -> Result<Conversation>;

    /// Session with all of its exchanges
    async fn get_conversation(&self, session_id: &str) -> Result<Option<Conversation>>;

    /// Append an exchange to its session; fails with `SessionNotFound`
    async fn append_exchange(&self, exchange: Exchange) -> Result<()>;

    /// Exchanges for a session, oldest first
    async fn get_exchanges(&self, session_id: &str) -> Result<Vec<Exchange>>;

    async fn save_feedback(&self, record: FeedbackRecord) -> Result<()>;

    /// All feedback, oldest first
    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>>;

    async fn save_ticket(&self, ticket: SupportTicket) -> Result<()>;

    async fn get_ticket(&self, ticket_id: &str) -> Result<Option<SupportTicket>>;

    /// Cheap reachability check for health reporting
    async fn ping(&self) -> Result<()>;
}
