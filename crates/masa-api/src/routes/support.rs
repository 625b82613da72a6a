use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use masa_types::{ContactError, ContactInfo, Priority, SupportTicket};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use super::load_session;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

const APOLOGY: &str = "Error al crear tu ticket de soporte";
const WIDGET_REASON: &str = "Solicitud de soporte humano desde el widget de chat";

#[derive(Debug, Deserialize, ToSchema)]
pub struct SupportRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    /// Free text (email or phone) or `{name, email, phone}`
    #[serde(default)]
    #[schema(value_type = Option<ContactInfo>)]
    pub contact_info: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupportResponse {
    pub status: String,
    pub ticket_id: String,
    pub message: String,
}

fn parse_contact(raw: Option<Value>) -> Result<ContactInfo, ContactError> {
    let info = match raw {
        None | Some(Value::Null) => return Err(ContactError::Missing),
        Some(value) => {
            serde_json::from_value::<ContactInfo>(value).map_err(|_| ContactError::Missing)?
        }
    };
    if info.is_blank() {
        return Err(ContactError::Missing);
    }
    info.validate()?;
    Ok(info)
}

/// Hand the conversation over to a human
#[utoipa::path(
    post,
    path = "/api/chat/support",
    request_body = SupportRequest,
    responses(
        (status = 200, description = "Ticket created", body = SupportResponse),
        (status = 400, description = "Unknown session, missing or invalid contact, or empty conversation")
    ),
    tag = "support"
)]
pub async fn request_support(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SupportRequest>, JsonRejection>,
) -> ApiResult<Json<SupportResponse>> {
    let Json(req) = payload?;
    let conversation = load_session(&state, req.user_id.as_deref(), "Sesión no válida", APOLOGY).await?;

    let contact_info = parse_contact(req.contact_info)?;

    let ticket = SupportTicket::open(
        conversation.session_id.clone(),
        conversation.exchanges,
        contact_info,
        Priority::Media,
        WIDGET_REASON,
    )
    .ok_or_else(|| ApiError::bad_request("No hay historial de conversación"))?;

    state
        .persist
        .save_ticket(ticket.clone())
        .await
        .map_err(ApiError::internal(APOLOGY))?;

    tracing::info!(
        ticket_id = %ticket.ticket_id,
        session_id = %ticket.session_id,
        "Support ticket created"
    );

    if let Err(e) = state.notifier.notify(&ticket).await {
        tracing::warn!(ticket_id = %ticket.ticket_id, "Ticket notification failed: {:#}", e);
    }

    Ok(Json(SupportResponse {
        status: "success".to_string(),
        ticket_id: ticket.ticket_id,
        message: "Ticket de soporte creado. Un representante se contactará contigo pronto.".to_string(),
    }))
}
