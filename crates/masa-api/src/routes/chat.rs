use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    Json,
};
use masa_types::{DifficultySignal, Source};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::load_session;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InitChatRequest {
    /// Reuse a known id; a random `user_<uuid>` id is minted otherwise
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InitChatResponse {
    pub status: String,
    pub user_id: String,
    pub message: String,
    pub welcome_message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    pub status: String,
    pub response: String,
    pub sources: Vec<Source>,
    pub user_id: String,
    pub difficulty: DifficultySignal,
}

/// Start (or resume) a chat session
#[utoipa::path(
    post,
    path = "/api/chat/init",
    request_body = InitChatRequest,
    responses(
        (status = 200, description = "Session ready", body = InitChatResponse),
        (status = 400, description = "Malformed body")
    ),
    tag = "chat"
)]
pub async fn init_chat(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<InitChatResponse>> {
    // The widget may post an empty body
    let req: InitChatRequest = if body.iter().all(u8::is_ascii_whitespace) {
        InitChatRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!("Rejected init body: {}", e);
            ApiError::bad_request("Solicitud inválida")
        })?
    };

    let user_id = req
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("user_{}", Uuid::new_v4().simple()));

    state
        .persist
        .create_conversation(&user_id)
        .await
        .map_err(ApiError::internal("Error al iniciar la sesión de chat"))?;

    tracing::info!(user_id = %user_id, "Chat session started");

    Ok(Json(InitChatResponse {
        status: "success".to_string(),
        user_id,
        message: "Sesión de chat iniciada".to_string(),
        welcome_message: state.config.chat.welcome_message.clone(),
    }))
}

/// Answer a customer message
#[utoipa::path(
    post,
    path = "/api/chat/message",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = SendMessageResponse),
        (status = 400, description = "Missing user id, unknown session or empty message"),
        (status = 500, description = "Retrieval or generation failed")
    ),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<Json<SendMessageResponse>> {
    let Json(req) = payload?;

    let user_id = req
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("user_id es requerido"))?;

    load_session(
        &state,
        Some(user_id.as_str()),
        "Sesión no válida. Por favor, inicia una nueva sesión.",
        "Error al procesar tu mensaje",
    )
    .await?;

    let message = req.message.as_deref().unwrap_or_default().trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("El mensaje no puede estar vacío"));
    }

    tracing::info!(user_id = %user_id, chars = message.chars().count(), "Message received");

    let reply = state
        .pipeline
        .respond(&user_id, message)
        .await
        .map_err(ApiError::internal("Error al procesar tu mensaje"))?;

    Ok(Json(SendMessageResponse {
        status: "success".to_string(),
        response: reply.response,
        sources: reply.sources,
        user_id,
        difficulty: reply.difficulty,
    }))
}
