use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Always answers 200; storage reachability is reported under `services`.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let storage = match state.persist.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            tracing::warn!("Storage health check failed: {}", e);
            "disconnected".to_string()
        }
    };

    let mut services = HashMap::new();
    services.insert(
        "storage".to_string(),
        format!("{} ({})", storage, state.persist.backend_name()),
    );

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "masa-madre-chatbot-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        services,
    })
}
