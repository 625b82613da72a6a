//! Records shared across the chatbot crates: conversations, citations,
//! feedback and support tickets.

mod conversation;
mod feedback;
mod support;

pub use conversation::{Conversation, DifficultySignal, Exchange, Source};
pub use feedback::{FeedbackOrigin, FeedbackRecord, FeedbackSummary, Rating, RatingError, RecentFeedback};
pub use support::{ContactDetails, ContactError, ContactInfo, Priority, SupportTicket, TicketStatus};
