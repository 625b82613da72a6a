use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use masa_persist::feedback::summarize;
use masa_types::{FeedbackRecord, FeedbackSummary, Rating};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use super::load_session;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    /// Integer from 1 to 5; anything else is rejected
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedbackResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedbackSummaryResponse {
    pub status: String,
    pub summary: FeedbackSummary,
}

const APOLOGY: &str = "Error al registrar tu retroalimentación";

/// Rate the last reply of a session
#[utoipa::path(
    post,
    path = "/api/chat/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback recorded", body = FeedbackResponse),
        (status = 400, description = "Unknown session, invalid rating or nothing to rate")
    ),
    tag = "feedback"
)]
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> ApiResult<Json<FeedbackResponse>> {
    let Json(req) = payload?;
    let conversation = load_session(&state, req.user_id.as_deref(), "Sesión no válida", APOLOGY).await?;

    let rating = req
        .rating
        .as_ref()
        .and_then(Value::as_i64)
        .and_then(|v| Rating::new(v).ok())
        .ok_or_else(|| ApiError::bad_request("Calificación inválida. Debe ser un número entre 1 y 5."))?;

    let last = conversation
        .last_exchange()
        .ok_or_else(|| ApiError::bad_request("No hay historial de conversación para calificar"))?;

    let record = FeedbackRecord::for_exchange(
        last,
        state.pipeline.provider_name(),
        rating,
        req.comment.unwrap_or_default(),
    );
    state
        .persist
        .save_feedback(record)
        .await
        .map_err(ApiError::internal(APOLOGY))?;

    tracing::info!(
        session_id = %conversation.session_id,
        rating = rating.value(),
        "Feedback recorded"
    );

    Ok(Json(FeedbackResponse {
        status: "success".to_string(),
        message: "¡Gracias por tu retroalimentación!".to_string(),
    }))
}

/// Aggregate ratings across all sessions
#[utoipa::path(
    get,
    path = "/api/feedback/summary",
    responses(
        (status = 200, description = "Feedback summary", body = FeedbackSummaryResponse)
    ),
    tag = "feedback"
)]
pub async fn feedback_summary(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FeedbackSummaryResponse>> {
    let records = state
        .persist
        .list_feedback()
        .await
        .map_err(ApiError::internal("Error al obtener el resumen de retroalimentación"))?;

    Ok(Json(FeedbackSummaryResponse {
        status: "success".to_string(),
        summary: summarize(&records),
    }))
}
