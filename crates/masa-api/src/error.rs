use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use masa_types::ContactError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to the widget.
///
/// Client errors carry the Spanish message shown to the customer. Server
/// errors carry a fixed apology for the endpoint and keep the cause for
/// the logs only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid contact info: {0}")]
    Contact(#[from] ContactError),

    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] JsonRejection),

    #[error("{message}: {source:#}")]
    Internal {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Map any error into a 500 with the given customer-facing apology
    pub fn internal<E>(message: &'static str) -> impl FnOnce(E) -> ApiError
    where
        E: Into<anyhow::Error>,
    {
        move |err| ApiError::Internal {
            message,
            source: err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Contact(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::MalformedBody(e) => {
                tracing::warn!("Rejected request body: {}", e.body_text());
                (StatusCode::BAD_REQUEST, "Solicitud inválida".to_string())
            }
            ApiError::Internal { message, ref source } => {
                tracing::error!("{}: {:#}", message, source);
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
