use axum::{
    extract::{Path, State},
    Json,
};
use masa_types::Exchange;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::load_session;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub status: String,
    pub user_id: String,
    pub exchanges: Vec<Exchange>,
}

/// Full conversation of a session, oldest first
#[utoipa::path(
    get,
    path = "/api/chat/history/{user_id}",
    params(
        ("user_id" = String, Path, description = "Session id returned by /api/chat/init")
    ),
    responses(
        (status = 200, description = "Conversation history", body = HistoryResponse),
        (status = 400, description = "Unknown session")
    ),
    tag = "chat"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let conversation = load_session(
        &state,
        Some(user_id.as_str()),
        "Sesión no válida",
        "Error al obtener el historial",
    )
    .await?;

    Ok(Json(HistoryResponse {
        status: "success".to_string(),
        user_id,
        exchanges: conversation.exchanges,
    }))
}
