use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use masa_types::{
    ContactInfo, Conversation, Exchange, FeedbackOrigin, FeedbackRecord, Priority, Rating,
    Source, SupportTicket, TicketStatus,
};
use serde::{Deserialize, Serialize};

// Timestamps are stored as BSON dates so range queries and sorts work.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConversation {
    #[serde(rename = "_id")]
    pub session_id: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// `_id` is an ObjectId so ties on `created_at` fall back to insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoExchange {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub exchange_id: String,
    pub session_id: String,
    pub query: String,
    pub response: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoFeedback {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub feedback_id: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_id: Option<String>,
    pub query: String,
    pub response: String,
    pub provider: String,
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
    pub origin: FeedbackOrigin,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// The conversation snapshot is embedded so a ticket stays readable even
/// if the session's exchanges are later pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTicket {
    #[serde(rename = "_id")]
    pub ticket_id: String,
    pub session_id: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub query: String,
    pub last_response: String,
    pub conversation: Vec<Exchange>,
    pub contact_info: ContactInfo,
    pub priority: Priority,
    pub reason: String,
    pub status: TicketStatus,
}

impl MongoConversation {
    pub fn into_conversation(self, exchanges: Vec<Exchange>) -> Conversation {
        Conversation {
            session_id: self.session_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            exchanges,
        }
    }
}

impl From<Exchange> for MongoExchange {
    fn from(exchange: Exchange) -> Self {
        Self {
            oid: ObjectId::new(),
            exchange_id: exchange.id,
            session_id: exchange.session_id,
            query: exchange.query,
            response: exchange.response,
            sources: exchange.sources,
            created_at: exchange.created_at,
        }
    }
}

impl From<MongoExchange> for Exchange {
    fn from(doc: MongoExchange) -> Self {
        Self {
            id: doc.exchange_id,
            session_id: doc.session_id,
            query: doc.query,
            response: doc.response,
            sources: doc.sources,
            created_at: doc.created_at,
        }
    }
}

impl From<FeedbackRecord> for MongoFeedback {
    fn from(record: FeedbackRecord) -> Self {
        Self {
            oid: ObjectId::new(),
            feedback_id: record.id,
            session_id: record.session_id,
            exchange_id: record.exchange_id,
            query: record.query,
            response: record.response,
            provider: record.provider,
            rating: record.rating,
            comment: record.comment,
            origin: record.origin,
            created_at: record.created_at,
        }
    }
}

impl From<MongoFeedback> for FeedbackRecord {
    fn from(doc: MongoFeedback) -> Self {
        Self {
            id: doc.feedback_id,
            session_id: doc.session_id,
            exchange_id: doc.exchange_id,
            query: doc.query,
            response: doc.response,
            provider: doc.provider,
            rating: doc.rating,
            comment: doc.comment,
            origin: doc.origin,
            created_at: doc.created_at,
        }
    }
}

impl From<SupportTicket> for MongoTicket {
    fn from(ticket: SupportTicket) -> Self {
        Self {
            ticket_id: ticket.ticket_id,
            session_id: ticket.session_id,
            created_at: ticket.created_at,
            query: ticket.query,
            last_response: ticket.last_response,
            conversation: ticket.conversation,
            contact_info: ticket.contact_info,
            priority: ticket.priority,
            reason: ticket.reason,
            status: ticket.status,
        }
    }
}

impl From<MongoTicket> for SupportTicket {
    fn from(doc: MongoTicket) -> Self {
        Self {
            ticket_id: doc.ticket_id,
            session_id: doc.session_id,
            created_at: doc.created_at,
            query: doc.query,
            last_response: doc.last_response,
            conversation: doc.conversation,
            contact_info: doc.contact_info,
            priority: doc.priority,
            reason: doc.reason,
            status: doc.status,
        }
    }
}
