use async_trait::async_trait;
use bson::doc;
use masa_types::{Conversation, Exchange, FeedbackRecord, SupportTicket};
use mongodb::Client;

use super::repositories::{ConversationRepository, FeedbackRepository, TicketRepository};
use crate::error::{PersistError, Result};
use crate::trait_client::PersistenceClient;

pub struct MongoPersistenceClient {
    client: Client,
    database: String,
    conversations: ConversationRepository,
    feedback: FeedbackRepository,
    tickets: TicketRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        tracing::info!(database, "Connected to MongoDB");

        Ok(Self {
            conversations: ConversationRepository::new(&client, database),
            feedback: FeedbackRepository::new(&client, database),
            tickets: TicketRepository::new(&client, database),
            database: database.to_string(),
            client,
        })
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    fn backend_name(&self) -> &str {
        "mongodb"
    }

    async fn create_conversation(&self, session_id: &str) -> Result<Conversation> {
        let doc = self.conversations.ensure_conversation(session_id).await?;
        let exchanges = self.get_exchanges(session_id).await?;
        Ok(doc.into_conversation(exchanges))
    }

    async fn get_conversation(&self, session_id: &str) -> Result<Option<Conversation>> {
        match self.conversations.find_conversation(session_id).await? {
            Some(doc) => {
                let exchanges = self.get_exchanges(session_id).await?;
                Ok(Some(doc.into_conversation(exchanges)))
            }
            None => Ok(None),
        }
    }

    async fn append_exchange(&self, exchange: Exchange) -> Result<()> {
        let session_id = exchange.session_id.clone();
        if self.conversations.find_conversation(&session_id).await?.is_none() {
            return Err(PersistError::SessionNotFound(session_id));
        }
        self.conversations.insert_exchange(exchange.into()).await?;
        self.conversations.touch(&session_id).await
    }

    async fn get_exchanges(&self, session_id: &str) -> Result<Vec<Exchange>> {
        let docs = self.conversations.exchanges(session_id).await?;
        Ok(docs.into_iter().map(Into::into).collect())
    }

    async fn save_feedback(&self, record: FeedbackRecord) -> Result<()> {
        self.feedback.insert(record.into()).await
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        let docs = self.feedback.all().await?;
        Ok(docs.into_iter().map(Into::into).collect())
    }

    async fn save_ticket(&self, ticket: SupportTicket) -> Result<()> {
        self.tickets.insert(ticket.into()).await
    }

    async fn get_ticket(&self, ticket_id: &str) -> Result<Option<SupportTicket>> {
        Ok(self.tickets.find(ticket_id).await?.map(Into::into))
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
