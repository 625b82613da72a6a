use bson::doc;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{Client, Collection};

use super::models::{MongoConversation, MongoExchange, MongoFeedback, MongoTicket};
use crate::error::Result;

#[derive(Clone)]
pub struct ConversationRepository {
    conversations: Collection<MongoConversation>,
    exchanges: Collection<MongoExchange>,
}

impl ConversationRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self {
            conversations: db.collection("conversations"),
            exchanges: db.collection("exchanges"),
        }
    }

    /// Insert the session if absent; never resets an existing one.
    pub async fn ensure_conversation(&self, session_id: &str) -> Result<MongoConversation> {
        let now = bson::DateTime::from_chrono(Utc::now());
        self.conversations
            .update_one(
                doc! { "_id": session_id },
                doc! { "$setOnInsert": { "created_at": now, "updated_at": now } },
            )
            .upsert(true)
            .await?;

        self.find_conversation(session_id)
            .await?
            .ok_or_else(|| crate::PersistError::Internal(format!("upsert lost session {}", session_id)))
    }

    pub async fn find_conversation(&self, session_id: &str) -> Result<Option<MongoConversation>> {
        Ok(self.conversations.find_one(doc! { "_id": session_id }).await?)
    }

    pub async fn touch(&self, session_id: &str) -> Result<()> {
        let now = bson::DateTime::from_chrono(Utc::now());
        self.conversations
            .update_one(doc! { "_id": session_id }, doc! { "$set": { "updated_at": now } })
            .await?;
        Ok(())
    }

    pub async fn insert_exchange(&self, exchange: MongoExchange) -> Result<()> {
        self.exchanges.insert_one(&exchange).await?;
        Ok(())
    }

    pub async fn exchanges(&self, session_id: &str) -> Result<Vec<MongoExchange>> {
        let exchanges = self
            .exchanges
            .find(doc! { "session_id": session_id })
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(exchanges)
    }
}

#[derive(Clone)]
pub struct FeedbackRepository {
    collection: Collection<MongoFeedback>,
}

impl FeedbackRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        Self {
            collection: client.database(db_name).collection("feedback"),
        }
    }

    pub async fn insert(&self, record: MongoFeedback) -> Result<()> {
        self.collection.insert_one(&record).await?;
        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<MongoFeedback>> {
        let records = self
            .collection
            .find(doc! {})
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }
}

#[derive(Clone)]
pub struct TicketRepository {
    collection: Collection<MongoTicket>,
}

impl TicketRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        Self {
            collection: client.database(db_name).collection("support_tickets"),
        }
    }

    pub async fn insert(&self, ticket: MongoTicket) -> Result<()> {
        self.collection.insert_one(&ticket).await?;
        Ok(())
    }

    pub async fn find(&self, ticket_id: &str) -> Result<Option<MongoTicket>> {
        Ok(self.collection.find_one(doc! { "_id": ticket_id }).await?)
    }
}
