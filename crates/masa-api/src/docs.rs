use utoipa::OpenApi;

use crate::routes::{chat, feedback, health, history, support};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Masa Madre Chatbot API",
        description = "Customer-support assistant for the Masa Madre Monterrey online bakery"
    ),
    paths(
        health::health_check,
        chat::init_chat,
        chat::send_message,
        history::get_history,
        feedback::submit_feedback,
        feedback::feedback_summary,
        support::request_support,
    ),
    components(schemas(
        health::HealthResponse,
        chat::InitChatRequest,
        chat::InitChatResponse,
        chat::SendMessageRequest,
        chat::SendMessageResponse,
        history::HistoryResponse,
        feedback::FeedbackRequest,
        feedback::FeedbackResponse,
        feedback::FeedbackSummaryResponse,
        support::SupportRequest,
        support::SupportResponse,
        masa_types::Source,
        masa_types::Exchange,
        masa_types::DifficultySignal,
        masa_types::FeedbackSummary,
        masa_types::RecentFeedback,
        masa_types::Rating,
        masa_types::ContactInfo,
        masa_types::ContactDetails,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "chat", description = "Chat sessions and messages"),
        (name = "feedback", description = "Ratings of assistant replies"),
        (name = "support", description = "Escalation to a human representative")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_chat_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/health", "/api/chat/init", "/api/chat/message", "/api/chat/support"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
